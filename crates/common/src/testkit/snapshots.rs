use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::snapshot::{
    QueryOptions, QueryResult, ResponseSink, SearchError, SnapshotPeer, SnapshotQuery,
    SnapshotSearch, ThreadSnapshot,
};

const SCRIPTED_PEER: &str = "scripted";

fn fixed_date() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

pub fn thread_snapshot(id: &str) -> ThreadSnapshot {
    ThreadSnapshot {
        id: id.to_string(),
        key: format!("key-{}", id),
        name: id.to_string(),
        schema: None,
        head: None,
        members: Vec::new(),
    }
}

pub fn snapshot_result(id: &str) -> QueryResult {
    peer_result(SCRIPTED_PEER, id)
}

fn peer_result(peer: &str, id: &str) -> QueryResult {
    QueryResult {
        id: id.to_string(),
        date: fixed_date(),
        local: false,
        peer: peer.to_string(),
        value: thread_snapshot(id),
    }
}

#[derive(Debug, Clone)]
enum ScriptEnd {
    Finish,
    Hang,
    Fail(String),
}

/// A search provider that replays results at fixed offsets from the start
///  of the search
#[derive(Debug, Clone)]
pub struct ScriptedSearch {
    script: Vec<(Duration, QueryResult)>,
    end: ScriptEnd,
}

impl ScriptedSearch {
    /// Replays `script`, then reports it has nothing more
    pub fn new(script: Vec<(Duration, QueryResult)>) -> Self {
        Self {
            script,
            end: ScriptEnd::Finish,
        }
    }

    /// Never answers and never finishes
    pub fn pending() -> Self {
        Self::new(Vec::new()).then_hang()
    }

    /// Keep the search open after the script, like peers that never reply
    pub fn then_hang(mut self) -> Self {
        self.end = ScriptEnd::Hang;
        self
    }

    pub fn then_fail(mut self, message: &str) -> Self {
        self.end = ScriptEnd::Fail(message.to_string());
        self
    }
}

#[async_trait]
impl SnapshotSearch for ScriptedSearch {
    async fn search(
        &self,
        _query: &SnapshotQuery,
        _options: &QueryOptions,
        sink: &ResponseSink,
    ) -> Result<(), SearchError> {
        let start = Instant::now();
        for (at, result) in &self.script {
            tokio::time::sleep_until(start + *at).await;
            if !sink.push_result(result.clone()) {
                return Ok(());
            }
        }
        match &self.end {
            ScriptEnd::Finish => Ok(()),
            ScriptEnd::Hang => {
                futures::future::pending::<()>().await;
                Ok(())
            }
            ScriptEnd::Fail(message) => Err(SearchError::Unavailable(message.clone())),
        }
    }
}

/// A peer that answers (or fails) once after a fixed delay
#[derive(Debug, Clone)]
pub struct ScriptedPeer {
    id: String,
    local: bool,
    delay: Duration,
    answer: Result<Vec<String>, String>,
}

impl ScriptedPeer {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            local: false,
            delay: Duration::ZERO,
            answer: Ok(Vec::new()),
        }
    }

    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }

    pub fn answer_after(mut self, delay: Duration, ids: &[&str]) -> Self {
        self.delay = delay;
        self.answer = Ok(ids.iter().map(|id| id.to_string()).collect());
        self
    }

    pub fn fail_after(mut self, delay: Duration, message: &str) -> Self {
        self.delay = delay;
        self.answer = Err(message.to_string());
        self
    }
}

#[async_trait]
impl SnapshotPeer for ScriptedPeer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn is_local(&self) -> bool {
        self.local
    }

    async fn snapshots(
        &self,
        _query: &SnapshotQuery,
        _options: &QueryOptions,
    ) -> Result<Vec<QueryResult>, SearchError> {
        tokio::time::sleep(self.delay).await;
        match &self.answer {
            Ok(ids) => Ok(ids
                .iter()
                .map(|id| {
                    let mut result = peer_result(&self.id, id);
                    result.local = self.local;
                    result
                })
                .collect()),
            Err(message) => Err(SearchError::Unavailable(message.clone())),
        }
    }
}

/// A peer that never answers and records when its query is abandoned
#[derive(Debug, Clone, Default)]
pub struct HangingPeer {
    abandoned: Arc<AtomicBool>,
}

impl HangingPeer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a query in flight was dropped before it could answer
    pub fn abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotPeer for HangingPeer {
    fn id(&self) -> String {
        "hanging".to_string()
    }

    async fn snapshots(
        &self,
        _query: &SnapshotQuery,
        _options: &QueryOptions,
    ) -> Result<Vec<QueryResult>, SearchError> {
        let _guard = SetOnDrop(self.abandoned.clone());
        futures::future::pending::<()>().await;
        Ok(Vec::new())
    }
}
