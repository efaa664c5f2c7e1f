use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use url::Url;

use common::snapshot::{QueryOptions, QueryResult, SearchError, SnapshotPeer, SnapshotQuery};

/// Path a node serves its own snapshot index on
pub const LOCAL_SNAPSHOTS_PATH: &str = "/api/v0/snapshots/local";

#[derive(Debug, thiserror::Error)]
pub enum PeerClientError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
}

/// Another cafe node, asked for snapshots over its HTTP API.
///
/// Answers carry the remote's peer id and are never local.
#[derive(Debug, Clone)]
pub struct HttpSnapshotPeer {
    remote: Url,
    client: Client,
}

impl HttpSnapshotPeer {
    pub fn new(remote: &Url) -> Result<Self, PeerClientError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    async fn fetch(&self, address: &str) -> Result<Vec<QueryResult>, PeerClientError> {
        let mut url = self.remote.join(LOCAL_SNAPSHOTS_PATH)?;
        url.query_pairs_mut().append_pair("address", address);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(PeerClientError::HttpStatus(
                response.status(),
                response.text().await?,
            ));
        }
        Ok(response.json::<Vec<QueryResult>>().await?)
    }
}

#[async_trait]
impl SnapshotPeer for HttpSnapshotPeer {
    fn id(&self) -> String {
        self.remote.to_string()
    }

    async fn snapshots(
        &self,
        query: &SnapshotQuery,
        _options: &QueryOptions,
    ) -> Result<Vec<QueryResult>, SearchError> {
        let results = self
            .fetch(query.address())
            .await
            .map_err(|e| SearchError::Unavailable(e.to_string()))?;
        tracing::debug!(
            peer = %self.remote,
            results = results.len(),
            "peer answered snapshot query"
        );
        Ok(results
            .into_iter()
            .map(|mut result| {
                result.local = false;
                result
            })
            .collect())
    }
}
