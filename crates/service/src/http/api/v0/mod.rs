use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

pub mod local_snapshots;
pub mod pin;
pub mod snapshots;

use crate::http::MAX_UPLOAD_SIZE_BYTES;
use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        // uploads are streamed, so the default extractor limit never sees them
        .route(
            "/pin",
            post(pin::handler).layer(RequestBodyLimitLayer::new(MAX_UPLOAD_SIZE_BYTES)),
        )
        .route(
            "/snapshots",
            post(snapshots::handler).put(local_snapshots::publish),
        )
        .route("/snapshots/local", get(local_snapshots::list))
        .route("/snapshots/:thread_id", delete(local_snapshots::remove))
        .with_state(state)
}
