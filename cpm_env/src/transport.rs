//! Transport gateway abstraction for V2X messaging.

use crate::error::EnvError;
use crate::types::{DataConfirm, DataRequest, RxMetadata};
use async_trait::async_trait;

/// Abstraction over the lower-layer GeoNetworking/BTP stack.
///
/// The station hands over fully-encoded message bytes together with a
/// [`DataRequest`] describing dissemination, and pulls inbound packets that
/// arrived on its registered port. Framing, addressing and security live
/// below this boundary.
///
/// # Packet Flow
///
/// ```text
/// Station A                  Transport                  Station B
///   |                           |                          |
///   |-- request(req, bytes) --->|                          |
///   |<- DataConfirm             |-- [radio broadcast] ---->|
///   |                           |                          |-- recv() -> bytes
/// ```
#[async_trait]
pub trait V2xTransport: Send + Sync + 'static {
    /// Hands an encoded message to the transport for dissemination.
    ///
    /// # Returns
    /// * `Ok(DataConfirm { accepted: true })` - message taken over by the stack
    /// * `Ok(DataConfirm { accepted: false })` - stack declined the message
    /// * `Err(EnvError)` - the transport itself is unusable
    ///
    /// # Note
    /// Acceptance does not guarantee reception by anyone - this is an
    /// unacknowledged broadcast medium.
    async fn request(&self, request: DataRequest, payload: Vec<u8>)
        -> Result<DataConfirm, EnvError>;

    /// Receives the next inbound packet addressed to this station's port.
    ///
    /// # Returns
    /// * `Some((metadata, bytes))` - a packet was received
    /// * `None` - the transport was shut down
    ///
    /// # Blocking
    /// This method blocks until a packet arrives or the transport closes.
    async fn recv(&self) -> Option<(RxMetadata, Vec<u8>)>;
}
