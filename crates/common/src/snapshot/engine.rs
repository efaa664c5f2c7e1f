use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::query::{PeerError, QueryError, QueryOptions, SnapshotQuery, MAX_WAIT};
use super::session::{ResponseSink, SearchSession};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search unavailable: {0}")]
    Unavailable(String),
    #[error("search error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Whatever resolves a snapshot query across the network.
///
/// Implementations push into the sink as answers come in and return once
///  there is nothing left to ask. They may be dropped mid-flight when the
///  session ends.
#[async_trait]
pub trait SnapshotSearch: Send + Sync + std::fmt::Debug + 'static {
    async fn search(
        &self,
        query: &SnapshotQuery,
        options: &QueryOptions,
        sink: &ResponseSink,
    ) -> Result<(), SearchError>;
}

/// How a search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchEnd {
    Cancelled,
    Deadline,
    LimitReached,
    Drained,
}

#[derive(Debug, Clone)]
pub struct SnapshotEngine {
    search: Arc<dyn SnapshotSearch>,
    max_wait: Duration,
}

impl SnapshotEngine {
    pub fn new(search: Arc<dyn SnapshotSearch>) -> Self {
        Self {
            search,
            max_wait: MAX_WAIT,
        }
    }

    /// Lower the ceiling on wait windows. It never goes above [`MAX_WAIT`].
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait.min(MAX_WAIT);
        self
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Issue a search and hand back the session collecting its responses.
    ///
    /// The search runs on its own task until the wait window elapses, the
    ///  provider has nothing more to say, the result limit is hit, or the
    ///  session is cancelled. Either way both channels close behind it.
    pub fn search(
        &self,
        address: &str,
        options: QueryOptions,
    ) -> Result<SearchSession, QueryError> {
        let query = SnapshotQuery::new(address)?;
        let wait = options.clamped_wait(self.max_wait);
        let deadline = Instant::now() + wait;

        let (results_tx, results_rx) = flume::unbounded();
        let (errors_tx, errors_rx) = flume::unbounded();
        let cancel = CancellationToken::new();
        let sink = ResponseSink::new(
            results_tx,
            errors_tx,
            options.max_results(),
            cancel.clone(),
        );

        tracing::debug!(
            address = query.address(),
            wait_ms = wait.as_millis() as u64,
            limit = options.limit,
            local = options.local,
            "issuing snapshot search"
        );

        let search = self.search.clone();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let end = tokio::select! {
                biased;
                _ = task_cancel.cancelled() => SearchEnd::Cancelled,
                _ = tokio::time::sleep_until(deadline) => SearchEnd::Deadline,
                _ = sink.filled() => SearchEnd::LimitReached,
                outcome = search.search(&query, &options, &sink) => {
                    if let Err(e) = outcome {
                        sink.push_error(PeerError::new("search", e));
                    }
                    SearchEnd::Drained
                }
            };
            tracing::debug!(
                address = query.address(),
                ?end,
                delivered = sink.delivered(),
                "snapshot search finished"
            );
            // closes both channels
            drop(sink);
        });

        Ok(SearchSession::new(results_rx, errors_rx, cancel, deadline))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::snapshot::SessionEvent;
    use crate::testkit::{snapshot_result, ScriptedSearch};

    const ADDRESS: &str = "P8rW2RCMn75Dcb96Eiyk8gL2H4pR9MLHGqDcb5ZEpgJJ3ksu";

    #[tokio::test]
    async fn test_empty_address_fails_before_search() {
        let engine = SnapshotEngine::new(Arc::new(ScriptedSearch::new(vec![])));
        assert!(matches!(
            engine.search("  ", QueryOptions::default()),
            Err(QueryError::EmptyAddress)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_closes_session() {
        // one peer answers after a second, the rest never do
        let search = ScriptedSearch::new(vec![(Duration::from_secs(1), snapshot_result("a"))])
            .then_hang();
        let engine = SnapshotEngine::new(Arc::new(search));
        let started = Instant::now();

        let session = engine
            .search(ADDRESS, QueryOptions::default().with_wait_secs(3))
            .unwrap();
        let (results, errors) = session.collect().await;

        assert_eq!(results.len(), 1);
        assert!(errors.is_empty());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_clamped_to_max() {
        let search = ScriptedSearch::pending();
        let engine = SnapshotEngine::new(Arc::new(search));
        let started = Instant::now();

        let session = engine
            .search(ADDRESS, QueryOptions::default().with_wait_secs(60))
            .unwrap();
        assert_eq!(session.deadline() - started, MAX_WAIT);
        let (results, _) = session.collect().await;
        assert!(results.is_empty());
        assert!(started.elapsed() <= MAX_WAIT + Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drained_search_closes_early() {
        let search = ScriptedSearch::new(vec![
            (Duration::from_millis(100), snapshot_result("a")),
            (Duration::from_millis(200), snapshot_result("b")),
        ]);
        let engine = SnapshotEngine::new(Arc::new(search));
        let started = Instant::now();

        let (results, _) = engine
            .search(ADDRESS, QueryOptions::default())
            .unwrap()
            .collect()
            .await;

        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_ends_search() {
        let search = ScriptedSearch::new(vec![
            (Duration::from_millis(100), snapshot_result("a")),
            (Duration::from_millis(200), snapshot_result("b")),
            (Duration::from_millis(300), snapshot_result("c")),
        ]);
        let engine = SnapshotEngine::new(Arc::new(search));

        let (results, _) = engine
            .search(ADDRESS, QueryOptions::default().with_limit(2))
            .unwrap()
            .collect()
            .await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_is_reported_not_fatal() {
        let search = ScriptedSearch::new(vec![(Duration::from_millis(100), snapshot_result("a"))])
            .then_fail("peer table unavailable");
        let engine = SnapshotEngine::new(Arc::new(search));

        let (results, errors) = engine
            .search(ADDRESS, QueryOptions::default())
            .unwrap()
            .collect()
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("peer table unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_delivery() {
        let search = ScriptedSearch::new(vec![
            (Duration::from_millis(100), snapshot_result("a")),
            (Duration::from_millis(500), snapshot_result("b")),
        ]);
        let engine = SnapshotEngine::new(Arc::new(search));
        let mut session = engine.search(ADDRESS, QueryOptions::default()).unwrap();

        let first = session.next().await;
        assert!(matches!(first, Some(SessionEvent::Result(ref r)) if r.id == "a"));

        session.cancel();
        session.cancel();
        assert!(session.is_cancelled());
        assert_eq!(session.next().await, None);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(session.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_completion_is_harmless() {
        let engine = SnapshotEngine::new(Arc::new(ScriptedSearch::new(vec![])));
        let mut session = engine.search(ADDRESS, QueryOptions::default()).unwrap();
        assert_eq!(session.next().await, None);
        session.cancel();
        assert_eq!(session.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_max_wait_only_lowers() {
        let engine = SnapshotEngine::new(Arc::new(ScriptedSearch::pending()))
            .with_max_wait(Duration::from_secs(30));
        assert_eq!(engine.max_wait(), MAX_WAIT);

        let engine = engine.with_max_wait(Duration::from_secs(2));
        let started = Instant::now();
        let session = engine.search(ADDRESS, QueryOptions::default()).unwrap();
        assert_eq!(session.deadline() - started, Duration::from_secs(2));
    }
}
