//! The node's own snapshot index.
//!
//! Publishing and removing need a token. The read side is open, it is what
//! other nodes query when they fan a search out to us.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use common::snapshot::{
    QueryError, QueryOptions, QueryResult, SnapshotPeer, SnapshotQuery, ThreadSnapshot,
};

use crate::http::auth::Authorized;
use crate::ServiceState;

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct LocalQuery {
    pub address: Option<String>,
}

/// Store a snapshot under this node's account, replacing any earlier one
///  for the same thread
pub async fn publish(
    State(state): State<ServiceState>,
    Authorized(claims): Authorized,
    Json(snapshot): Json<ThreadSnapshot>,
) -> Result<impl IntoResponse, LocalSnapshotsError> {
    if snapshot.id.trim().is_empty() {
        return Err(LocalSnapshotsError::MissingId);
    }

    let id = snapshot.id.clone();
    state
        .local_snapshots()
        .insert(state.account_address(), snapshot);
    tracing::info!(thread = %id, sub = %claims.sub, "snapshot published");

    Ok((StatusCode::CREATED, Json(PublishResponse { id })))
}

pub async fn remove(
    State(state): State<ServiceState>,
    Authorized(claims): Authorized,
    Path(thread_id): Path<String>,
) -> Result<StatusCode, LocalSnapshotsError> {
    if !state
        .local_snapshots()
        .remove(state.account_address(), &thread_id)
    {
        return Err(LocalSnapshotsError::NotFound(thread_id));
    }
    tracing::info!(thread = %thread_id, sub = %claims.sub, "snapshot removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Snapshots held by this node for an address, defaulting to our account
pub async fn list(
    State(state): State<ServiceState>,
    Query(params): Query<LocalQuery>,
) -> Result<Json<Vec<QueryResult>>, LocalSnapshotsError> {
    let address = params
        .address
        .unwrap_or_else(|| state.account_address().to_string());
    let query = SnapshotQuery::new(address)?;

    // the local index never fails
    let results = state
        .local_snapshots()
        .snapshots(&query, &QueryOptions::default().local(true))
        .await
        .unwrap_or_default();
    tracing::debug!(
        address = query.address(),
        results = results.len(),
        "local snapshots listed"
    );
    Ok(Json(results))
}

#[derive(Debug, thiserror::Error)]
pub enum LocalSnapshotsError {
    #[error("snapshot id is required")]
    MissingId,
    #[error("no snapshot for thread {0}")]
    NotFound(String),
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl IntoResponse for LocalSnapshotsError {
    fn into_response(self) -> Response {
        let status = match self {
            LocalSnapshotsError::MissingId | LocalSnapshotsError::Query(_) => {
                StatusCode::BAD_REQUEST
            }
            LocalSnapshotsError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        let msg = serde_json::json!({"error": self.to_string()});
        (status, Json(msg)).into_response()
    }
}
