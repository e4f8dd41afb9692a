//! Read side over the `pull_requests` table.
//!
//! The dashboard never fails: storage errors and an empty table both fall
//! back to [`mock_dashboard`]. The placeholder metrics
//! (`merge_conflicts_resolved`, `lines_of_code`, `average_review_time`) are
//! derived from the PR count by fixed formulas, not from review or diff data.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::StorageError;
use crate::mock::mock_dashboard;
use crate::models::{DashboardSnapshot, DateRange, DateWindow, Highlight, PullRequest, TeamMetrics};
use crate::store::PullRequestStore;

pub const DASHBOARD_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_RECENT_LIMIT: i64 = 10;
pub const DIFF_PREVIEW_CHARS: usize = 200;
const AVERAGE_REVIEW_TIME: f64 = 4.5;
const MAX_PR_HIGHLIGHTS: i64 = 3;

#[derive(Clone)]
pub struct QueryService {
    store: PullRequestStore,
}

impl QueryService {
    pub fn new(store: PullRequestStore) -> Self {
        Self { store }
    }

    /// Metrics for PRs closed in `[now - 7 days, now]`.
    pub async fn dashboard_snapshot(&self, now: DateTime<Utc>) -> DashboardSnapshot {
        match self.try_dashboard_snapshot(now).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => mock_dashboard(),
            Err(e) => {
                warn!(error = %e, "dashboard read failed, serving mock data");
                mock_dashboard()
            }
        }
    }

    async fn try_dashboard_snapshot(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DashboardSnapshot>, StorageError> {
        if self.store.count().await? == 0 {
            return Ok(None);
        }

        let window = DateWindow::last_days(now, DASHBOARD_WINDOW_DAYS);
        let prs_merged = self.store.count_closed_between(&window).await?;
        let recent = self
            .store
            .list_closed_between(&window, MAX_PR_HIGHLIGHTS)
            .await?;

        let mut highlights = vec![Highlight {
            icon: "📈".to_string(),
            content: format!("This week, {} PRs were closed.", prs_merged),
        }];
        highlights.extend(recent.iter().map(|pr| Highlight {
            icon: "🚀".to_string(),
            content: format!(
                "{} closed #{} \"{}\" in {}",
                pr.author_login, pr.pr_number, pr.title, pr.repo_name
            ),
        }));

        Ok(Some(DashboardSnapshot {
            date_range: DateRange {
                start: window.start.format("%Y-%m-%d").to_string(),
                end: window.end.format("%Y-%m-%d").to_string(),
            },
            team_metrics: team_metrics(prs_merged),
            highlights,
        }))
    }

    pub async fn total_count(&self) -> Result<i64, StorageError> {
        self.store.count().await
    }

    /// The first `limit` rows with each diff cut to [`DIFF_PREVIEW_CHARS`].
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<PullRequest>, StorageError> {
        let mut prs = self.store.list(limit).await?;
        for pr in &mut prs {
            pr.diff = truncate_chars(&pr.diff, DIFF_PREVIEW_CHARS);
        }
        Ok(prs)
    }

    pub async fn clear_all(&self) -> Result<u64, StorageError> {
        self.store.clear().await
    }
}

pub fn team_metrics(prs_merged: i64) -> TeamMetrics {
    TeamMetrics {
        prs_merged,
        merge_conflicts_resolved: prs_merged / 3,
        lines_of_code: prs_merged * 100,
        average_review_time: AVERAGE_REVIEW_TIME,
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
