//! Error types for the relay proxy.

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during relay operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to bind the listening socket. Fatal: the supervisor cannot
    /// proceed without a listener.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address the listener tried to bind.
        addr: SocketAddr,
        /// The underlying bind failure.
        #[source]
        source: std::io::Error,
    },

    /// Failed to connect to the upstream. Recoverable: only the pending
    /// client is rejected.
    #[error("failed to connect to upstream {addr}: {source}")]
    UpstreamConnect {
        /// The upstream address that was dialed.
        addr: SocketAddr,
        /// The underlying connect failure.
        #[source]
        source: std::io::Error,
    },

    /// The upstream dial did not complete within the configured timeout.
    #[error("timed out connecting to upstream {addr}")]
    UpstreamTimeout {
        /// The upstream address that was dialed.
        addr: SocketAddr,
    },

    /// I/O error during relay operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
