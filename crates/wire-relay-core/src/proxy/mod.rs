//! Listener, relay and supervisor implementations.

pub mod listener;
pub mod relay;
pub mod supervisor;

pub use listener::ListenerEndpoint;
pub use relay::ConnectionSession;
pub use supervisor::ProxySupervisor;
