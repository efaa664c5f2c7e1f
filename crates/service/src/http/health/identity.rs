use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;

use crate::ServiceState;

#[derive(Serialize)]
pub struct IdentityResponse {
    /// Hex encoded public key, the issuer tokens are checked against
    pub node_id: String,
    /// Account whose snapshots this node searches for
    pub account_address: String,
    /// Audience accepted on bearer tokens
    pub protocol: String,
}

#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    let body = IdentityResponse {
        node_id: state.node_id().to_hex(),
        account_address: state.account_address().to_string(),
        protocol: state.protocol().to_string(),
    };
    (StatusCode::OK, Json(body)).into_response()
}
