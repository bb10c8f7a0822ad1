//! Session tracking data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use uuid::Uuid;

/// Lifecycle state of a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// The upstream connection is being established.
    Connecting,
    /// Both relay directions are running.
    Relaying,
    /// One direction observed peer loss; the sibling is being torn down.
    Closing,
    /// Both directions have stopped and both sockets are closed.
    Closed,
}

/// Identity and accounting for one paired client/upstream connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Unique session identifier.
    pub id: Uuid,

    /// Accepted client address.
    pub client_addr: SocketAddr,

    /// Upstream address the client was paired with.
    pub upstream_addr: SocketAddr,

    /// Current state.
    pub state: SessionState,

    /// When the session was established.
    pub connected_at: DateTime<Utc>,

    /// When the session was closed (if applicable).
    pub closed_at: Option<DateTime<Utc>>,

    /// Bytes forwarded client to upstream.
    pub bytes_to_upstream: u64,

    /// Bytes forwarded upstream to client.
    pub bytes_to_client: u64,
}

impl SessionInfo {
    /// Create a new session info in the `Connecting` state.
    pub fn new(client_addr: SocketAddr, upstream_addr: SocketAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_addr,
            upstream_addr,
            state: SessionState::Connecting,
            connected_at: Utc::now(),
            closed_at: None,
            bytes_to_upstream: 0,
            bytes_to_client: 0,
        }
    }

    /// Mark both relay directions as running.
    pub fn set_relaying(&mut self) {
        self.state = SessionState::Relaying;
    }

    /// Mark the session as tearing down.
    pub fn set_closing(&mut self) {
        self.state = SessionState::Closing;
    }

    /// Mark the session as closed.
    pub fn set_closed(&mut self) {
        self.state = SessionState::Closed;
        self.closed_at = Some(Utc::now());
    }

    /// Add bytes to the client-to-upstream counter.
    pub fn add_bytes_to_upstream(&mut self, bytes: u64) {
        self.bytes_to_upstream += bytes;
    }

    /// Add bytes to the upstream-to-client counter.
    pub fn add_bytes_to_client(&mut self, bytes: u64) {
        self.bytes_to_client += bytes;
    }

    /// Session duration in seconds.
    pub fn duration_secs(&self) -> i64 {
        let end = self.closed_at.unwrap_or_else(Utc::now);
        (end - self.connected_at).num_seconds()
    }
}
