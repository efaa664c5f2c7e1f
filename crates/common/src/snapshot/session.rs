use std::sync::atomic::{AtomicUsize, Ordering};

use futures::Stream;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::query::{PeerError, QueryResult};

/// Write half of a search, handed to the [`super::SnapshotSearch`] provider.
///
/// Not `Clone`: a provider can only push while the engine lends it the
///  sink, so nothing can feed a session after the engine has let go.
#[derive(Debug)]
pub struct ResponseSink {
    results: flume::Sender<QueryResult>,
    errors: flume::Sender<PeerError>,
    limit: Option<usize>,
    delivered: AtomicUsize,
    full: CancellationToken,
    cancel: CancellationToken,
}

impl ResponseSink {
    pub(crate) fn new(
        results: flume::Sender<QueryResult>,
        errors: flume::Sender<PeerError>,
        limit: Option<usize>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            results,
            errors,
            limit,
            delivered: AtomicUsize::new(0),
            full: CancellationToken::new(),
            cancel,
        }
    }

    /// Push a result. Returns `false` once the session takes no more
    ///  results, at which point the provider should stop.
    pub fn push_result(&self, result: QueryResult) -> bool {
        if self.is_closed() {
            return false;
        }
        let delivered = self.delivered.fetch_add(1, Ordering::SeqCst) + 1;
        if matches!(self.limit, Some(limit) if delivered > limit) {
            return false;
        }
        if self.results.send(result).is_err() {
            return false;
        }
        if matches!(self.limit, Some(limit) if delivered >= limit) {
            self.full.cancel();
            return false;
        }
        true
    }

    /// Report a peer failure; the search carries on
    pub fn push_error(&self, error: PeerError) {
        if self.cancel.is_cancelled() {
            return;
        }
        tracing::debug!(peer = %error.peer, message = %error.message, "snapshot peer failed");
        let _ = self.errors.send(error);
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.full.is_cancelled() || self.results.is_disconnected()
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Resolves once the result limit has been hit
    pub(crate) async fn filled(&self) {
        self.full.cancelled().await
    }
}

/// Something a session yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Result(QueryResult),
    Error(PeerError),
}

/**
 * Search sessions
 * ===============
 * Read half of a search: results and peer errors, each on their
 *  own channel in arrival order, until the engine closes both
 *  channels (deadline, drained, limit) or the owner cancels.
 * The owner holds the only cancellation handle. Cancelling is
 *  idempotent, and dropping the session cancels it.
 */
#[derive(Debug)]
pub struct SearchSession {
    results: flume::Receiver<QueryResult>,
    errors: flume::Receiver<PeerError>,
    results_open: bool,
    errors_open: bool,
    cancel: CancellationToken,
    deadline: Instant,
}

impl SearchSession {
    pub(crate) fn new(
        results: flume::Receiver<QueryResult>,
        errors: flume::Receiver<PeerError>,
        cancel: CancellationToken,
        deadline: Instant,
    ) -> Self {
        Self {
            results,
            errors,
            results_open: true,
            errors_open: true,
            cancel,
            deadline,
        }
    }

    /// Wait for the next result or error.
    ///
    /// Returns `None` once the session is over: both channels closed, the
    ///  deadline passed, or the session was cancelled. Nothing is yielded
    ///  after [`SearchSession::cancel`] returns.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            if self.cancel.is_cancelled() || !(self.results_open || self.errors_open) {
                return None;
            }
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                _ = tokio::time::sleep_until(self.deadline) => {
                    self.cancel.cancel();
                    return None;
                }
                result = self.results.recv_async(), if self.results_open => match result {
                    Ok(result) => return Some(SessionEvent::Result(result)),
                    Err(_) => self.results_open = false,
                },
                error = self.errors.recv_async(), if self.errors_open => match error {
                    Ok(error) => return Some(SessionEvent::Error(error)),
                    Err(_) => self.errors_open = false,
                },
            }
        }
    }

    /// Stop the search. Safe to call any number of times, including after
    ///  the session has already finished.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("cancelling snapshot search");
        }
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Drain the session, returning everything in arrival order
    pub async fn collect(mut self) -> (Vec<QueryResult>, Vec<PeerError>) {
        let mut results = Vec::new();
        let mut errors = Vec::new();
        while let Some(event) = self.next().await {
            match event {
                SessionEvent::Result(r) => results.push(r),
                SessionEvent::Error(e) => errors.push(e),
            }
        }
        (results, errors)
    }

    /// The session as a stream of events. Dropping the stream cancels the
    ///  search.
    pub fn into_stream(self) -> impl Stream<Item = SessionEvent> + Send {
        futures::stream::unfold(self, |mut session| async move {
            session.next().await.map(|event| (event, session))
        })
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
