mod support;

use std::time::{Duration, Instant};

use axum::body::Body;
use http::{Request, StatusCode};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

use common::testkit::{thread_snapshot, TokenMinter};
use service::{Config, ServiceState};

use support::*;

/// Serve `state` on an ephemeral local port
async fn spawn_node(state: &ServiceState) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}", addr)).unwrap()
}

/// Accepts connections and never writes a byte back
async fn spawn_silent_node() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    Url::parse(&format!("http://{}", addr)).unwrap()
}

async fn node_with_peers(peers: Vec<Url>) -> ServiceState {
    let config = Config {
        account_address: Some(ADDRESS.to_string()),
        protocol: PROTOCOL.to_string(),
        peers,
        ..Default::default()
    };
    ServiceState::from_config(&config).await.unwrap()
}

#[tokio::test]
async fn test_search_reaches_configured_peer() {
    let remote = setup_state().await;
    let remote_url = spawn_node(&remote).await;

    let token = TokenMinter::new(remote.node_secret(), PROTOCOL).access();
    let published = reqwest::Client::new()
        .put(remote_url.join("/api/v0/snapshots").unwrap())
        .bearer_auth(&token)
        .json(&thread_snapshot("shared"))
        .send()
        .await
        .unwrap();
    assert_eq!(published.status(), StatusCode::CREATED);

    let local = node_with_peers(vec![remote_url]).await;
    let response = app(&local)
        .oneshot(
            Request::post("/api/v0/snapshots?wait=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "shared");
    assert_eq!(results[0]["local"], false);
    assert_eq!(results[0]["peer"], remote.node_id().to_hex());
}

#[tokio::test]
async fn test_silent_peer_is_cut_off_at_the_wait() {
    let silent = spawn_silent_node().await;
    let local = node_with_peers(vec![silent]).await;
    let started = Instant::now();

    let response = app(&local)
        .oneshot(
            Request::post("/api/v0/snapshots?wait=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.as_array().unwrap().is_empty());

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(3));
}
