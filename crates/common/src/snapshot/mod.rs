//! Snapshot search
//!
//! A search is issued against an account address and collects responses
//! for a bounded wait window. Results and peer failures travel on two
//! separate channels so one bad peer never ends the search. The
//! [`SearchSession`] handed back to the caller is the only way to read
//! them, and the only way to stop the search early.

mod engine;
mod fanout;
mod local;
mod query;
mod session;

pub use engine::{SearchError, SnapshotEngine, SnapshotSearch};
pub use fanout::{PeerFanout, SnapshotPeer};
pub use local::LocalSnapshots;
pub use query::{
    PeerError, QueryError, QueryOptions, QueryResult, SnapshotQuery, ThreadSnapshot, DEFAULT_WAIT,
    MAX_WAIT,
};
pub use session::{ResponseSink, SearchSession, SessionEvent};
