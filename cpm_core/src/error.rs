//! Error taxonomy for the CPM core.

use thiserror::Error;

/// Errors that can occur while generating or interpreting CPMs.
#[derive(Debug, Error)]
pub enum CpmError {
    /// Inbound packet does not parse as a CPM. Logged and dropped by the
    /// receive path, never escalated.
    #[error("inbound packet does not decode as a CPM")]
    NotDecodable,

    /// Geodetic input outside the valid projection domain. Aborts the
    /// current encode/decode rather than producing a wrong coordinate.
    #[error("geodetic position outside projection domain: lat {lat}, lon {lon}")]
    Projection { lat: f64, lon: f64 },

    /// Outbound rebuild skipped because an encode is in progress. A
    /// flow-control signal, not a failure: the previous snapshot is kept.
    #[error("object stack rebuild skipped: encode in progress")]
    Skipped,

    /// The transport gateway declined the outbound message. Fatal for the
    /// current send cycle only; the scheduler retries on its next tick.
    #[error("transport rejected the outbound CPM")]
    SendRejected,

    /// Serializer failure at the codec boundary.
    #[error("codec failure: {0}")]
    Codec(String),
}
