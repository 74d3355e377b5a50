//! Completion poller.
//!
//! Queries a relationship's status until the service reports `("Sync",
//! "DONE")`, the caller opts out of waiting, or an optional ceiling from
//! [`MonitorOptions`] is reached.
//!
//! ```text
//! Querying --(Sync, DONE)--------------------------> Completed
//! Querying --(other, !wait)------------------------> Aborted
//! Querying --(other, wait)--> Running --sleep-----> Querying
//! ```

use std::future::Future;

use tokio::time::Instant;

use crate::auth::Credential;
use crate::client::CloudSyncClient;
use crate::config::MonitorOptions;
use crate::error::ReplError;
use crate::status::{JobStatus, PollOutcome};

/// Anything that can report the latest activity of a relationship.
pub trait StatusSource: Send + Sync {
    fn fetch_status(
        &self,
        relationship_id: &str,
    ) -> impl Future<Output = Result<JobStatus, ReplError>> + Send;
}

/// A [`CloudSyncClient`] paired with the credential it queries with.
pub struct AuthenticatedClient<'a> {
    pub client: &'a CloudSyncClient,
    pub credential: &'a Credential,
}

impl StatusSource for AuthenticatedClient<'_> {
    async fn fetch_status(&self, relationship_id: &str) -> Result<JobStatus, ReplError> {
        self.client
            .relationship_status(self.credential, relationship_id)
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollState {
    Querying,
    Running,
    Completed,
    Aborted,
    GaveUp,
}

/// Poll `source` until the relationship's latest sync completes.
///
/// With `wait_for_completion == false` exactly one query is made. Otherwise
/// the loop sleeps `options.interval` between queries and, unless a ceiling
/// is configured, never gives up.
pub async fn monitor<S: StatusSource>(
    source: &S,
    relationship_id: &str,
    options: &MonitorOptions,
) -> Result<PollOutcome, ReplError> {
    let started = Instant::now();
    let mut attempts: u32 = 0;
    let mut state = PollState::Querying;

    loop {
        state = match state {
            PollState::Querying => {
                attempts += 1;
                let status = source.fetch_status(relationship_id).await?;
                tracing::debug!(
                    relationship_id,
                    attempt = attempts,
                    activity_type = %status.activity_type,
                    activity_status = %status.activity_status,
                    "Relationship status"
                );

                if status.is_complete() {
                    PollState::Completed
                } else {
                    tracing::info!(
                        relationship_id,
                        activity_type = %status.activity_type,
                        activity_status = %status.activity_status,
                        "Cloud Sync update is not yet complete"
                    );
                    if !options.wait_for_completion {
                        PollState::Aborted
                    } else if ceiling_reached(options, attempts, started) {
                        PollState::GaveUp
                    } else {
                        PollState::Running
                    }
                }
            }
            PollState::Running => {
                tracing::info!(
                    relationship_id,
                    interval_secs = options.interval.as_secs(),
                    "Checking again after interval"
                );
                tokio::time::sleep(options.interval).await;
                PollState::Querying
            }
            PollState::Completed => {
                tracing::info!(relationship_id, attempts, "Cloud Sync update is complete");
                return Ok(PollOutcome::Completed);
            }
            PollState::Aborted => return Ok(PollOutcome::AbortedByCaller),
            PollState::GaveUp => {
                tracing::warn!(
                    relationship_id,
                    attempts,
                    elapsed_secs = started.elapsed().as_secs(),
                    "Stopped monitoring with sync still running"
                );
                return Ok(PollOutcome::StillRunning);
            }
        };
    }
}

/// True if another sleep-and-query cycle would exceed a configured ceiling.
fn ceiling_reached(options: &MonitorOptions, attempts: u32, started: Instant) -> bool {
    if options.max_attempts.is_some_and(|max| attempts >= max) {
        return true;
    }
    options
        .deadline
        .is_some_and(|deadline| started.elapsed() + options.interval > deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::RawResponse;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays a fixed script of statuses and records when each query happened.
    struct Scripted {
        script: Mutex<VecDeque<JobStatus>>,
        queries: Mutex<Vec<Instant>>,
    }

    impl Scripted {
        fn new(statuses: &[(&str, &str)]) -> Self {
            Self {
                script: Mutex::new(
                    statuses
                        .iter()
                        .map(|(t, s)| JobStatus::new(*t, *s))
                        .collect(),
                ),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn query_count(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    impl StatusSource for Scripted {
        async fn fetch_status(&self, _relationship_id: &str) -> Result<JobStatus, ReplError> {
            self.queries.lock().unwrap().push(Instant::now());
            let mut script = self.script.lock().unwrap();
            // The last entry repeats forever.
            if script.len() > 1 {
                Ok(script.pop_front().unwrap())
            } else {
                Ok(script.front().cloned().unwrap())
            }
        }
    }

    fn waiting(interval_secs: u64) -> MonitorOptions {
        MonitorOptions::default().interval(Duration::from_secs(interval_secs))
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_after_n_plus_one_queries() {
        let source = Scripted::new(&[
            ("Sync", "RUNNING"),
            ("Sync", "RUNNING"),
            ("Sync", "RUNNING"),
            ("Sync", "DONE"),
        ]);
        let outcome = monitor(&source, "rel-42", &waiting(60)).await.unwrap();

        assert_eq!(outcome, PollOutcome::Completed);
        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.len(), 4);
        for pair in queries.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_secs(60));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_completion_does_not_sleep() {
        let source = Scripted::new(&[("Sync", "DONE")]);
        let started = Instant::now();
        let outcome = monitor(&source, "rel-1", &waiting(60)).await.unwrap();
        assert_eq!(outcome, PollOutcome::Completed);
        assert_eq!(source.query_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_queries_exactly_once() {
        for status in [("Sync", "RUNNING"), ("Restore", "DONE"), ("Sync", "FAILED")] {
            let source = Scripted::new(&[status, ("Sync", "DONE")]);
            let outcome = monitor(&source, "rel-1", &MonitorOptions::check_once())
                .await
                .unwrap();
            assert_eq!(outcome, PollOutcome::AbortedByCaller);
            assert_eq!(source.query_count(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_still_reports_completion() {
        let source = Scripted::new(&[("Sync", "DONE")]);
        let outcome = monitor(&source, "rel-1", &MonitorOptions::check_once())
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Completed);
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_activity_types_never_complete() {
        let source = Scripted::new(&[("Restore", "DONE")]);
        let options = waiting(60).max_attempts(Some(25));
        let outcome = monitor(&source, "rel-1", &options).await.unwrap();
        assert_eq!(outcome, PollOutcome::StillRunning);
        assert_eq!(source.query_count(), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_stops_without_oversleeping() {
        let source = Scripted::new(&[("Sync", "RUNNING")]);
        let options = waiting(60).deadline(Some(Duration::from_secs(150)));
        let started = Instant::now();
        let outcome = monitor(&source, "rel-1", &options).await.unwrap();

        assert_eq!(outcome, PollOutcome::StillRunning);
        // Queries at t=0, 60 and 120; another cycle would end at 180 > 150.
        assert_eq!(source.query_count(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(120));
    }

    struct Failing;

    impl StatusSource for Failing {
        async fn fetch_status(&self, _relationship_id: &str) -> Result<JobStatus, ReplError> {
            Err(ReplError::status_parse(RawResponse {
                endpoint: "GET http://localhost/api/relationships-v2/rel-1".to_string(),
                status: 502,
                headers: vec![],
                body: "Bad Gateway".to_string(),
            }))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_error_ends_monitoring() {
        let err = monitor(&Failing, "rel-1", &waiting(60)).await.unwrap_err();
        assert!(matches!(err, ReplError::StatusParse { .. }));
        assert_eq!(err.response().map(|r| r.status), Some(502));
    }
}
