//! Lifecycle and data-path hook points.
//!
//! [`RelayHooks`] is the only extension surface of the core. The embedding
//! application implements the callbacks it cares about; every method has a
//! no-op (or pass-through) default. Hooks are shared as `Arc<dyn RelayHooks>`
//! and may be called from both relay directions concurrently, so
//! implementations must be `Send + Sync`. The core takes no lock around hook
//! invocation.

use bytes::Bytes;

use crate::error::Error;
use crate::session::SessionInfo;

/// Callbacks fired at connection lifecycle and data-path points.
///
/// Lifecycle order per session: `on_new_client` then `on_new_server` once the
/// upstream connect succeeds, then at most one `on_client_lost` and at most
/// one `on_server_lost` during teardown.
pub trait RelayHooks: Send + Sync {
    /// The supervisor is idle and about to wait for the next client.
    fn on_waiting_for_client(&self) {}

    /// A client has been accepted and paired with an upstream connection.
    fn on_new_client(&self, _session: &SessionInfo) {}

    /// The upstream connection for the session has been established.
    fn on_new_server(&self, _session: &SessionInfo) {}

    /// The client side of the session closed or errored.
    fn on_client_lost(&self, _session: &SessionInfo) {}

    /// The upstream side of the session closed or errored.
    fn on_server_lost(&self, _session: &SessionInfo) {}

    /// Binding or listening failed; the supervisor is about to stop.
    fn on_client_error(&self, _err: &Error) {}

    /// The upstream dial failed; only the pending client is rejected.
    fn on_server_error(&self, _err: &Error) {}

    /// Transform a chunk flowing client to upstream.
    ///
    /// Returning `None` (or an empty buffer) drops the chunk without
    /// forwarding it. The default forwards the chunk unchanged.
    fn on_from_client(&self, data: Bytes) -> Option<Bytes> {
        Some(data)
    }

    /// Transform a chunk flowing upstream to client.
    ///
    /// Same contract as [`RelayHooks::on_from_client`].
    fn on_from_server(&self, data: Bytes) -> Option<Bytes> {
        Some(data)
    }
}

/// Hook set that observes nothing and forwards everything unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl RelayHooks for NoopHooks {}
