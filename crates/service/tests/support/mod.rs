//! Shared helpers for driving the router in-process
#![allow(dead_code)]

use axum::body::Body;
use axum::response::Response;
use axum::Router;
use http::Request;

use common::crypto::SecretKey;
use common::store::BlobsStore;
use service::ServiceState;

pub const PROTOCOL: &str = "/cafe/1.0.0";
pub const ADDRESS: &str = "P8rW2RCMn75Dcb96Eiyk8gL2H4pR9MLHGqDcb5ZEpgJJ3ksu";

/// State over an in-memory store with a fresh node key
pub async fn setup_state() -> ServiceState {
    let blobs = BlobsStore::memory().await.unwrap();
    ServiceState::new(SecretKey::generate(), PROTOCOL, ADDRESS, blobs)
}

pub fn app(state: &ServiceState) -> Router {
    service::http::router(state.clone())
}

pub fn pin_request(token: Option<&str>, content_type: &str, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v0/pin")
        .header("content-type", content_type);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
