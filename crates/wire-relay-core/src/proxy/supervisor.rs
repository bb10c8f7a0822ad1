//! Top-level accept/connect/relay control loop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ProxyConfig;
use crate::error::Result;
use crate::hooks::RelayHooks;
use crate::proxy::listener::ListenerEndpoint;
use crate::proxy::relay::ConnectionSession;

/// Serves clients one session at a time: accept, dial upstream, relay to
/// completion, loop. A second client is not accepted until the previous
/// session's both directions have stopped.
pub struct ProxySupervisor {
    /// Immutable proxy configuration.
    config: ProxyConfig,

    /// Embedder-supplied hooks, shared with every session.
    hooks: Arc<dyn RelayHooks>,

    /// Shutdown signal observed by the accept loop and live sessions.
    shutdown: CancellationToken,
}

impl ProxySupervisor {
    /// Create a new supervisor.
    pub fn new(config: ProxyConfig, hooks: Arc<dyn RelayHooks>) -> Self {
        Self {
            config,
            hooks,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that makes [`ProxySupervisor::run`] return promptly when
    /// cancelled, closing the listener and any live session sockets.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bind the listening socket.
    ///
    /// Split from [`ProxySupervisor::serve`] so embedders can learn the
    /// bound address (port 0 resolves here) before the loop starts. Bind and
    /// address-configuration failures are fatal and reported through the
    /// matching error hook before propagating.
    pub async fn bind(&self) -> Result<ListenerEndpoint> {
        let listen_addr = match self.config.listen.socket_addr() {
            Ok(addr) => addr,
            Err(e) => {
                self.hooks.on_client_error(&e);
                return Err(e);
            }
        };

        match ListenerEndpoint::bind(listen_addr).await {
            Ok(endpoint) => Ok(endpoint),
            Err(e) => {
                self.hooks.on_client_error(&e);
                Err(e)
            }
        }
    }

    /// Run the accept loop over an already-bound endpoint until shut down.
    ///
    /// Upstream connect failures reject only the in-flight client; relay
    /// errors end only their own session. Neither stops the loop.
    pub async fn serve(&self, endpoint: ListenerEndpoint) -> Result<()> {
        let upstream_addr = match self.config.upstream.socket_addr() {
            Ok(addr) => addr,
            Err(e) => {
                self.hooks.on_server_error(&e);
                return Err(e);
            }
        };

        info!(
            "relay listening on {}, upstream {}",
            endpoint.local_addr(),
            upstream_addr
        );

        loop {
            self.hooks.on_waiting_for_client();

            let Some((client, client_addr)) = endpoint
                .accept(&self.shutdown, self.config.timing.poll_interval())
                .await
            else {
                info!("shutdown requested, supervisor stopping");
                break;
            };

            debug!("accepted client {}", client_addr);

            let session = match ConnectionSession::connect(
                client,
                client_addr,
                upstream_addr,
                self.config.timing.connect_timeout(),
                Arc::clone(&self.hooks),
            )
            .await
            {
                Ok(session) => session,
                Err(e) => {
                    warn!("rejecting client {}: {}", client_addr, e);
                    continue;
                }
            };

            tokio::select! {
                summary = session.run() => {
                    info!(
                        session = %summary.id,
                        to_upstream = summary.bytes_to_upstream,
                        to_client = summary.bytes_to_client,
                        duration_secs = summary.duration_secs(),
                        "session finished"
                    );
                }
                _ = self.shutdown.cancelled() => {
                    // Dropping the session future drops both sockets.
                    info!("shutdown requested mid-session");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Bind and serve.
    pub async fn run(&self) -> Result<()> {
        let endpoint = self.bind().await?;
        self.serve(endpoint).await
    }
}
