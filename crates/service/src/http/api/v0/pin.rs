use std::io;

use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::TryStreamExt;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use tokio_util::io::StreamReader;

use common::ingest::PinError;

use crate::http::auth::Authorized;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinResponse {
    /// Link to the pinned blob, or to the directory node for archives
    pub id: String,
}

/// Pin the request body.
///
/// `application/octet-stream` bodies are stored as a single blob,
///  `application/gzip` bodies are unpacked as a flat tarball and stored
///  as a directory of files.
#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    Authorized(claims): Authorized,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, PinHandlerError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    tracing::debug!(subject = %claims.sub, content_type, "pin requested");

    let reader = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
    let link = state.pins().pin(content_type, reader).await?;

    Ok((
        StatusCode::CREATED,
        Json(PinResponse {
            id: link.to_string(),
        }),
    ))
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct PinHandlerError(#[from] PinError);

impl IntoResponse for PinHandlerError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            tracing::debug!(error = %self.0, "rejecting upload");
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!(error = %self.0, "failed to pin upload");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let msg = serde_json::json!({"error": self.0.to_string()});
        (status, Json(msg)).into_response()
    }
}
