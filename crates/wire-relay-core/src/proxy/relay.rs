//! Connection pairing and byte relay.
//!
//! A [`ConnectionSession`] binds one accepted client to one upstream
//! connection and drives two relay directions, one per flow, until both have
//! stopped. Peer loss in either direction cancels a token shared with the
//! sibling, which unwinds the sibling's blocked read; the session can never
//! hang with one direction alive after the other has died.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::hooks::RelayHooks;
use crate::session::SessionInfo;

/// Read ceiling per receive call. Only affects syscall batching, not
/// correctness; a read never waits for the buffer to fill.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Which peer a relay direction reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Client,
    Server,
}

impl Side {
    fn opposite(self) -> Side {
        match self {
            Side::Client => Side::Server,
            Side::Server => Side::Client,
        }
    }
}

/// Guards so each peer's lost hook fires at most once per session, no matter
/// which direction reports it first.
#[derive(Default)]
struct LostFlags {
    client: AtomicBool,
    server: AtomicBool,
}

impl LostFlags {
    /// Returns true exactly once per side.
    fn first(&self, side: Side) -> bool {
        let flag = match side {
            Side::Client => &self.client,
            Side::Server => &self.server,
        };
        !flag.swap(true, Ordering::SeqCst)
    }
}

/// One unidirectional forwarding loop between two socket halves.
struct RelayDirection {
    source: OwnedReadHalf,
    sink: OwnedWriteHalf,
    source_side: Side,
    info: SessionInfo,
    hooks: Arc<dyn RelayHooks>,
    cancel: CancellationToken,
    lost: Arc<LostFlags>,
}

impl RelayDirection {
    /// Forward bytes from source to sink until the source peer is lost.
    ///
    /// Returns the number of bytes forwarded. Only read failures end the
    /// loop: a failed write to the sink is reported through the sink side's
    /// lost hook, but the source keeps draining until its own read fails.
    async fn run(mut self) -> u64 {
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let mut forwarded: u64 = 0;

        loop {
            // None when the sibling direction tore the session down; our
            // source socket is as good as gone then.
            let read = tokio::select! {
                _ = self.cancel.cancelled() => None,
                result = self.source.read(&mut buf) => Some(result),
            };

            let n = match read {
                None => {
                    self.report_lost(self.source_side);
                    break;
                }
                Some(Ok(0)) => {
                    // A zero-length read always means the peer half-closed,
                    // never "no data yet".
                    self.report_lost(self.source_side);
                    self.cancel.cancel();
                    break;
                }
                Some(Err(e)) => {
                    debug!(side = ?self.source_side, "read failed: {}", e);
                    self.report_lost(self.source_side);
                    self.cancel.cancel();
                    break;
                }
                Some(Ok(n)) => n,
            };

            let chunk = Bytes::copy_from_slice(&buf[..n]);
            let Some(out) = self.transform(chunk) else {
                continue;
            };
            if out.is_empty() {
                continue;
            }

            if let Err(e) = self.sink.write_all(&out).await {
                debug!(side = ?self.source_side.opposite(), "write failed: {}", e);
                // The sink peer is gone. Report it, but keep draining the
                // source; our own read will fail once the teardown reaches
                // this socket.
                self.report_lost(self.source_side.opposite());
                continue;
            }
            forwarded += out.len() as u64;
        }

        // Half-close the sink so the peer sees EOF promptly. The full close
        // happens when both halves drop, and is idempotent.
        let _ = self.sink.shutdown().await;
        forwarded
    }

    fn transform(&self, data: Bytes) -> Option<Bytes> {
        match self.source_side {
            Side::Client => self.hooks.on_from_client(data),
            Side::Server => self.hooks.on_from_server(data),
        }
    }

    fn report_lost(&self, side: Side) {
        if self.lost.first(side) {
            match side {
                Side::Client => self.hooks.on_client_lost(&self.info),
                Side::Server => self.hooks.on_server_lost(&self.info),
            }
        }
    }
}

/// Pairs one accepted client with one upstream connection and coordinates
/// the joint lifetime of both relay directions.
pub struct ConnectionSession {
    info: SessionInfo,
    client: TcpStream,
    server: TcpStream,
    hooks: Arc<dyn RelayHooks>,
}

impl ConnectionSession {
    /// Dial the upstream and pair it with `client`.
    ///
    /// On connect failure or timeout, `on_server_error` fires, the client
    /// socket is shut down, and the error is returned; no partial session is
    /// ever handed to the caller. On success, `on_new_client` then
    /// `on_new_server` fire, in that order.
    pub async fn connect(
        mut client: TcpStream,
        client_addr: SocketAddr,
        upstream_addr: SocketAddr,
        connect_timeout: Duration,
        hooks: Arc<dyn RelayHooks>,
    ) -> Result<Self> {
        let server = match timeout(connect_timeout, TcpStream::connect(upstream_addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                let err = Error::UpstreamConnect {
                    addr: upstream_addr,
                    source,
                };
                hooks.on_server_error(&err);
                let _ = client.shutdown().await;
                return Err(err);
            }
            Err(_) => {
                let err = Error::UpstreamTimeout {
                    addr: upstream_addr,
                };
                hooks.on_server_error(&err);
                let _ = client.shutdown().await;
                return Err(err);
            }
        };

        let info = SessionInfo::new(client_addr, upstream_addr);
        hooks.on_new_client(&info);
        hooks.on_new_server(&info);

        Ok(Self {
            info,
            client,
            server,
            hooks,
        })
    }

    /// Session identity and accounting so far.
    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// Drive both relay directions to completion.
    ///
    /// Blocks until both directions have stopped, then returns the final
    /// accounting with the session closed and both sockets released.
    pub async fn run(mut self) -> SessionInfo {
        self.info.set_relaying();
        debug!(session = %self.info.id, "session relaying");

        let cancel = CancellationToken::new();
        let lost = Arc::new(LostFlags::default());

        let (client_read, client_write) = self.client.into_split();
        let (server_read, server_write) = self.server.into_split();

        let client_to_server = RelayDirection {
            source: client_read,
            sink: server_write,
            source_side: Side::Client,
            info: self.info.clone(),
            hooks: Arc::clone(&self.hooks),
            cancel: cancel.clone(),
            lost: Arc::clone(&lost),
        };
        let server_to_client = RelayDirection {
            source: server_read,
            sink: client_write,
            source_side: Side::Server,
            info: self.info.clone(),
            hooks: Arc::clone(&self.hooks),
            cancel: cancel.clone(),
            lost,
        };

        let relay = async { tokio::join!(client_to_server.run(), server_to_client.run()) };
        tokio::pin!(relay);

        // Watch the shared token so the session state reflects the teardown
        // window between the first direction dying and the second stopping.
        let mut closing_seen = false;
        let (to_upstream, to_client) = loop {
            tokio::select! {
                totals = &mut relay => break totals,
                _ = cancel.cancelled(), if !closing_seen => {
                    self.info.set_closing();
                    closing_seen = true;
                }
            }
        };

        self.info.add_bytes_to_upstream(to_upstream);
        self.info.add_bytes_to_client(to_client);
        self.info.set_closed();

        debug!(
            session = %self.info.id,
            to_upstream,
            to_client,
            "session closed"
        );

        self.info
    }
}
