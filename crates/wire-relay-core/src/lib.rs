//! # Wire-Relay Core
//!
//! Core library for the wire-relay TCP proxy. Accepts one client at a time,
//! pairs it with a connection to a fixed upstream, and relays opaque bytes in
//! both directions until either side disconnects. The embedding application
//! observes and shapes traffic through the [`RelayHooks`] extension surface.

pub mod config;
pub mod error;
pub mod hooks;
pub mod proxy;
pub mod session;

pub use config::{EndpointConfig, LoggingConfig, ProxyConfig, TimingConfig};
pub use error::{Error, Result};
pub use hooks::{NoopHooks, RelayHooks};
pub use proxy::{ConnectionSession, ListenerEndpoint, ProxySupervisor};
pub use session::{SessionInfo, SessionState};
