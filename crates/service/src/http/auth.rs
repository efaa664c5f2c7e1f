//! Bearer token gate for mutating routes.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::header::AUTHORIZATION;
use http::request::Parts;
use http::StatusCode;

use common::auth::{bearer_token, validate, Claims, TokenError};

use crate::ServiceState;

/// Extracting this proves the request carried a live access token issued
///  by this node for its protocol.
#[derive(Debug, Clone)]
pub struct Authorized(pub Claims);

#[async_trait]
impl FromRequestParts<ServiceState> for Authorized {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = bearer_token(header)?;
        let claims = validate(token, state.node_secret(), state.protocol())?;
        tracing::debug!(subject = %claims.sub, "request authorized");
        Ok(Authorized(claims))
    }
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct AuthError(#[from] TokenError);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.0.is_forbidden() {
            tracing::warn!(reason = %self.0, "rejecting request with invalid token");
            let msg = serde_json::json!({"error": "forbidden"});
            (StatusCode::FORBIDDEN, Json(msg)).into_response()
        } else {
            tracing::debug!(reason = %self.0, "rejecting unauthenticated request");
            let msg = serde_json::json!({"error": "unauthorized"});
            (StatusCode::UNAUTHORIZED, Json(msg)).into_response()
        }
    }
}
