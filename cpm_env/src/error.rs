//! Error types for the environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Transport send failed (buffer full, router gone, etc.)
    #[error("Transport error: {0}")]
    TransportError(String),

    /// No route to the radio/router (link down or simulated partition)
    #[error("Link unavailable: {0}")]
    LinkUnavailable(String),

    /// Operation timed out
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl EnvError {
    /// Creates a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    /// Creates a link-unavailable error.
    pub fn link_unavailable(msg: impl std::fmt::Display) -> Self {
        Self::LinkUnavailable(msg.to_string())
    }
}
