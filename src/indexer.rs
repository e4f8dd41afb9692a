//! Paginated, date-bounded pull request indexer.
//!
//! Walks the upstream listing for a repository page by page (newest first),
//! keeps the pull requests whose `closed_at` falls inside the requested
//! window, fetches their diffs, and upserts each page in one transaction.
//!
//! # Stop conditions
//!
//! - an empty page, or
//! - a pull request closed before the window start. Pages are
//!   reverse-chronological, so everything after it is older still.
//!
//! # Failure policy
//!
//! | Failure | Effect |
//! |---------|--------|
//! | page fetch | abort this repository; committed pages stay |
//! | diff fetch | store the PR with an empty diff, keep going |
//! | page commit | abort this repository |
//!
//! [`Indexer::index_all_repositories`] runs one task per repository. A
//! failing task is logged and reported without touching the others.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::IndexError;
use crate::models::{DateWindow, PullRequest, WindowPosition};
use crate::store::PullRequestStore;
use crate::upstream::Upstream;

/// Summary of one repository's indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOutcome {
    pub repo: String,
    pub pages_fetched: u32,
    pub upserted: u64,
    pub skipped_unclosed: u64,
    pub skipped_outside_window: u64,
    pub diff_failures: u64,
    /// True when a PR older than the window ended pagination.
    pub reached_window_start: bool,
}

/// Per-repository result of a fan-out run.
#[derive(Debug)]
pub struct RepoResult {
    pub repo: String,
    pub result: Result<IndexOutcome, IndexError>,
}

#[derive(Clone)]
pub struct Indexer {
    upstream: Arc<dyn Upstream>,
    store: PullRequestStore,
    page_size: u32,
}

impl Indexer {
    pub fn new(upstream: Arc<dyn Upstream>, store: PullRequestStore, page_size: u32) -> Self {
        Self {
            upstream,
            store,
            page_size,
        }
    }

    /// Indexes every closed pull request of `repo` whose `closed_at` lies in
    /// `window`.
    pub async fn index_repository(
        &self,
        repo: &str,
        window: &DateWindow,
    ) -> Result<IndexOutcome, IndexError> {
        let mut outcome = IndexOutcome {
            repo: repo.to_string(),
            ..Default::default()
        };
        let mut page = 1u32;

        info!(repo, start = %window.start, end = %window.end, "indexing repository");

        loop {
            let summaries = self
                .upstream
                .list_closed_pulls(repo, page, self.page_size)
                .await
                .inspect_err(|e| error!(repo, page, error = %e, "page fetch failed"))?;
            outcome.pages_fetched += 1;

            if summaries.is_empty() {
                debug!(repo, page, "empty page, done");
                break;
            }

            let mut staged: Vec<PullRequest> = Vec::with_capacity(summaries.len());

            for summary in &summaries {
                let Some(closed_at) = summary.closed_at else {
                    debug!(repo, pr = summary.number, "no closed_at, skipping");
                    outcome.skipped_unclosed += 1;
                    continue;
                };

                match window.position(closed_at) {
                    WindowPosition::Before => {
                        debug!(repo, pr = summary.number, %closed_at, "passed window start");
                        outcome.reached_window_start = true;
                        break;
                    }
                    WindowPosition::After => {
                        outcome.skipped_outside_window += 1;
                    }
                    WindowPosition::Within => {
                        let diff = match self.upstream.fetch_diff(&summary.diff_url).await {
                            Ok(diff) => diff,
                            Err(e) => {
                                warn!(repo, pr = summary.number, error = %e, "diff fetch failed, storing empty diff");
                                outcome.diff_failures += 1;
                                String::new()
                            }
                        };
                        staged.push(PullRequest::from_summary(repo, summary, closed_at, diff));
                    }
                }
            }

            outcome.upserted += self
                .store
                .upsert_page(&staged)
                .await
                .inspect_err(|e| error!(repo, page, error = %e, "page commit failed"))?;
            debug!(repo, page, rows = staged.len(), "committed page");

            if outcome.reached_window_start {
                break;
            }
            page += 1;
        }

        info!(
            repo,
            pages = outcome.pages_fetched,
            upserted = outcome.upserted,
            diff_failures = outcome.diff_failures,
            "repository indexed"
        );
        Ok(outcome)
    }

    /// Indexes every repository concurrently, one task each.
    ///
    /// Results come back in the order of `repos`. Errors and panics are
    /// isolated to the repository they occurred in.
    pub async fn index_all_repositories(
        &self,
        repos: &[String],
        window: &DateWindow,
    ) -> Vec<RepoResult> {
        let mut tasks = JoinSet::new();

        for (slot, repo) in repos.iter().enumerate() {
            let indexer = self.clone();
            let repo = repo.clone();
            let window = *window;
            tasks.spawn(async move {
                let result = indexer.index_repository(&repo, &window).await;
                (slot, repo, result)
            });
        }

        let mut results: Vec<Option<RepoResult>> = repos.iter().map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, repo, result)) => {
                    if let Err(e) = &result {
                        error!(repo = %repo, error = %e, "repository indexing aborted");
                    }
                    results[slot] = Some(RepoResult { repo, result });
                }
                Err(e) => error!(error = %e, "indexing task panicked"),
            }
        }

        results
            .into_iter()
            .zip(repos)
            .map(|(result, repo)| {
                result.unwrap_or_else(|| RepoResult {
                    repo: repo.clone(),
                    result: Err(IndexError::TaskFailed(repo.clone())),
                })
            })
            .collect()
    }
}
