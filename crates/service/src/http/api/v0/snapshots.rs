//! Snapshot search over HTTP.
//!
//! A search either drains into a JSON array of results or, with
//! `events=true`, streams as server-sent events. Peer failures only show
//! up as `error` events, a buffered search logs them instead. Dropping the
//! event stream (the client hung up) cancels the search.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::stream::{self, Stream};
use http::{HeaderMap, StatusCode};
use common::snapshot::{QueryError, QueryOptions, QueryResult, SearchSession, SessionEvent};

use crate::ServiceState;

/// Header carrying search options as `k=v,k=v`
pub const OPTS_HEADER: &str = "x-cafe-opts";

pub async fn handler(
    State(state): State<ServiceState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, SnapshotsError> {
    let opts = read_opts(&query, &headers);
    let options = query_options(&opts);
    let live = opts.get("events").is_some_and(|v| v == "true");

    let address = state.account_address();
    let session = state.snapshots().search(address, options)?;
    tracing::info!(address, wait = ?options.wait, live, "snapshot search started");

    if live {
        Ok(present_live(session).into_response())
    } else {
        Ok(present_buffered(session).await.into_response())
    }
}

/// Merge options from the query string and the opts header. The header
///  wins where both set a key; pairs without `=` are ignored.
fn read_opts(query: &HashMap<String, String>, headers: &HeaderMap) -> HashMap<String, String> {
    let mut opts = query.clone();
    let header = headers.get(OPTS_HEADER).and_then(|v| v.to_str().ok());
    for pair in header.into_iter().flat_map(|h| h.split(',')) {
        if let Some((key, value)) = pair.split_once('=') {
            opts.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    opts
}

fn query_options(opts: &HashMap<String, String>) -> QueryOptions {
    let options = QueryOptions::default();
    match opts.get("wait").map(|w| w.parse::<u64>()) {
        Some(Ok(secs)) => options.with_wait_secs(secs),
        Some(Err(_)) => {
            tracing::debug!("unreadable wait option, using default");
            options
        }
        None => options,
    }
}

async fn present_buffered(session: SearchSession) -> Json<Vec<QueryResult>> {
    let (results, errors) = session.collect().await;
    for error in &errors {
        tracing::warn!(peer = %error.peer, "snapshot peer failed: {}", error.message);
    }
    Json(results)
}

fn present_live(session: SearchSession) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let live = LiveSession {
        session,
        finished: false,
    };
    let events = stream::unfold(Some(live), |live| async move {
        let mut live = live?;
        match live.session.next().await {
            Some(event) => Some((Ok(to_event(event)), Some(live))),
            None => {
                live.finished = true;
                Some((Ok(Event::default().event("done").data("")), None))
            }
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

fn to_event(event: SessionEvent) -> Event {
    match event {
        SessionEvent::Result(result) => Event::default()
            .event("result")
            .json_data(&result)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())),
        SessionEvent::Error(error) => Event::default().event("error").data(error.to_string()),
    }
}

/// Owns the session for the life of an event stream.
struct LiveSession {
    session: SearchSession,
    finished: bool,
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        if !self.finished {
            tracing::info!("snapshot event stream dropped, cancelling search");
            self.session.cancel();
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct SnapshotsError(#[from] QueryError);

impl IntoResponse for SnapshotsError {
    fn into_response(self) -> Response {
        let msg = serde_json::json!({"error": self.0.to_string()});
        (StatusCode::BAD_REQUEST, Json(msg)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::snapshot::DEFAULT_WAIT;

    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_header_opts_override_query() {
        let mut headers = HeaderMap::new();
        headers.insert(OPTS_HEADER, "wait=2, events=true,junk".parse().unwrap());
        let merged = read_opts(&opts(&[("wait", "7")]), &headers);
        assert_eq!(merged.get("wait").map(String::as_str), Some("2"));
        assert_eq!(merged.get("events").map(String::as_str), Some("true"));
        assert!(!merged.contains_key("junk"));
    }

    #[test]
    fn test_wait_parsing() {
        assert_eq!(query_options(&opts(&[])).wait, DEFAULT_WAIT);
        assert_eq!(
            query_options(&opts(&[("wait", "3")])).wait,
            Duration::from_secs(3)
        );
        assert_eq!(query_options(&opts(&[("wait", "soon")])).wait, DEFAULT_WAIT);
        assert_eq!(query_options(&opts(&[("wait", "-1")])).wait, DEFAULT_WAIT);
    }

    #[test]
    fn test_query_error_is_bad_request() {
        let response = SnapshotsError(QueryError::EmptyAddress).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
