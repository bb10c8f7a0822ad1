//! Inbound listening socket.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{Error, Result};

/// Owns the listening socket and produces accepted client connections.
pub struct ListenerEndpoint {
    /// Bound listener.
    listener: TcpListener,

    /// Actual bound address (resolves port 0).
    local_addr: SocketAddr,
}

impl ListenerEndpoint {
    /// Bind and listen on `addr`.
    ///
    /// Failure here is fatal to the supervisor: there is nothing to serve
    /// without a listener.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// The address the listener actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept the next client, or return `None` once `cancel` fires.
    ///
    /// Transient accept errors (a peer aborting mid-handshake, a descriptor
    /// shortage) are logged and retried after `retry_delay`; they never end
    /// the accept loop. The listening socket stays owned by `self` either
    /// way, so cancellation cannot leak it.
    pub async fn accept(
        &self,
        cancel: &CancellationToken,
        retry_delay: Duration,
    ) -> Option<(TcpStream, SocketAddr)> {
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => return None,

                result = self.listener.accept() => match result {
                    Ok((stream, addr)) => return Some((stream, addr)),
                    Err(e) => {
                        warn!("failed to accept connection: {}", e);
                        tokio::time::sleep(retry_delay).await;
                    }
                }
            }
        }
    }
}
