//! Core data models shared by the indexer, storage and query layers.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc};
use serde::Serialize;

use crate::error::WindowError;

/// One entry of an upstream closed-pull-request listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct PullSummary {
    pub number: i64,
    pub title: String,
    pub author_login: String,
    pub created_at: DateTime<Utc>,
    /// `None` for entries the upstream lists without a close time.
    pub closed_at: Option<DateTime<Utc>>,
    pub diff_url: String,
}

/// A persisted pull request, one row per `(repo_name, pr_number)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequest {
    pub repo_name: String,
    pub pr_number: i64,
    pub title: String,
    pub author_login: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    /// Unified diff; empty when it could not be fetched.
    pub diff: String,
}

impl PullRequest {
    pub fn from_summary(
        repo_name: &str,
        summary: &PullSummary,
        closed_at: DateTime<Utc>,
        diff: String,
    ) -> Self {
        Self {
            repo_name: repo_name.to_string(),
            pr_number: summary.number,
            title: summary.title.clone(),
            author_login: summary.author_login.clone(),
            created_at: summary.created_at,
            closed_at,
            diff,
        }
    }
}

/// Where a timestamp falls relative to a [`DateWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    Before,
    Within,
    After,
}

/// Inclusive `[start, end]` range of UTC timestamps.
///
/// Bounds are truncated to whole seconds, the resolution timestamps are
/// stored at, so in-memory and SQL comparisons agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::Inverted {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self {
            start: start.trunc_subsecs(0),
            end: end.trunc_subsecs(0),
        })
    }

    /// The `days` days ending at `now`.
    pub fn last_days(now: DateTime<Utc>, days: i64) -> Self {
        let end = now.trunc_subsecs(0);
        Self {
            start: end - Duration::days(days.max(0)),
            end,
        }
    }

    /// Parses user-supplied bounds.
    ///
    /// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC),
    /// or a bare `YYYY-MM-DD`. A bare date covers the whole day: midnight
    /// for `start`, `23:59:59` for `end`.
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        let start = parse_timestamp(start, NaiveTime::MIN)?;
        let end = parse_timestamp(
            end,
            NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
        )?;
        Self::new(start, end)
    }

    pub fn position(&self, ts: DateTime<Utc>) -> WindowPosition {
        if ts < self.start {
            WindowPosition::Before
        } else if ts > self.end {
            WindowPosition::After
        } else {
            WindowPosition::Within
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.position(ts) == WindowPosition::Within
    }
}

fn parse_timestamp(input: &str, day_time: NaiveTime) -> Result<DateTime<Utc>, WindowError> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(|date| date.and_time(day_time).and_utc())
        .map_err(|_| WindowError::InvalidDate(input.to_string()))
}

/// Payload of `GET /api/dashboard`, in the shape the frontend renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub date_range: DateRange,
    pub team_metrics: TeamMetrics,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMetrics {
    pub prs_merged: i64,
    pub merge_conflicts_resolved: i64,
    pub lines_of_code: i64,
    pub average_review_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub icon: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_parse_bare_dates_cover_whole_days() {
        let w = DateWindow::parse("2024-01-01", "2024-01-31").unwrap();
        assert_eq!(w.start, utc(2024, 1, 1, 0, 0, 0));
        assert_eq!(w.end, utc(2024, 1, 31, 23, 59, 59));
    }

    #[test]
    fn test_parse_rfc3339_from_frontend() {
        let w = DateWindow::parse("2024-03-01T12:30:00.000Z", "2024-03-02T12:30:00+02:00").unwrap();
        assert_eq!(w.start, utc(2024, 3, 1, 12, 30, 0));
        assert_eq!(w.end, utc(2024, 3, 2, 10, 30, 0));
    }

    #[test]
    fn test_parse_naive_datetime_is_utc() {
        let w = DateWindow::parse("2024-03-01T08:00:00", "2024-03-01 09:00:00").unwrap();
        assert_eq!(w.start, utc(2024, 3, 1, 8, 0, 0));
        assert_eq!(w.end, utc(2024, 3, 1, 9, 0, 0));
    }

    #[test]
    fn test_parse_rejects_garbage_and_inverted() {
        assert_eq!(
            DateWindow::parse("yesterday", "2024-01-01"),
            Err(WindowError::InvalidDate("yesterday".to_string()))
        );
        assert!(matches!(
            DateWindow::parse("2024-02-01", "2024-01-01"),
            Err(WindowError::Inverted { .. })
        ));
    }

    #[test]
    fn test_bounds_are_whole_seconds() {
        let w = DateWindow::parse("2024-01-01T00:00:00.750Z", "2024-01-01T00:00:10.250Z").unwrap();
        assert_eq!(w.start, utc(2024, 1, 1, 0, 0, 0));
        assert_eq!(w.end, utc(2024, 1, 1, 0, 0, 10));

        let now = utc(2024, 1, 8, 12, 0, 0) + Duration::milliseconds(600);
        let w = DateWindow::last_days(now, 7);
        assert_eq!(w.start, utc(2024, 1, 1, 12, 0, 0));
        assert_eq!(w.end, utc(2024, 1, 8, 12, 0, 0));
        // A row stored at the start second is inside on both sides.
        assert!(w.contains(utc(2024, 1, 1, 12, 0, 0)));
    }

    #[test]
    fn test_position_is_inclusive() {
        let w = DateWindow::parse("2024-01-01", "2024-01-31").unwrap();
        assert_eq!(w.position(w.start), WindowPosition::Within);
        assert_eq!(w.position(w.end), WindowPosition::Within);
        assert_eq!(w.position(utc(2023, 12, 31, 23, 59, 59)), WindowPosition::Before);
        assert_eq!(w.position(utc(2024, 2, 1, 0, 0, 0)), WindowPosition::After);
    }
}
