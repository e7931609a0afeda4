//! CPM Core - Collective Perception Message generation and interpretation
//!
//! A Collective Perception Message is a periodic single-hop V2X broadcast in
//! which a station advertises its own state and the objects it currently
//! perceives, expressed relative to itself. This library covers:
//! 1. **Outbound**: snapshotting perceived objects against the ego state and
//!    encoding them into wire message fields on a fixed schedule
//! 2. **Inbound**: reconstructing the objects described by a received message
//!    in the shared grid frame for downstream fusion
//! 3. **Frames**: geodetic-to-grid projection and the ego-relative rotation
//!    used on both paths

pub mod coords;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod scheduler;
pub mod stack;
pub mod station;
pub mod units;
pub mod wire;

// Re-export key types for convenience
pub use decoder::CpmDecoder;
pub use encoder::CpmEncoder;
pub use error::CpmError;
pub use stack::{EgoState, ObjectStack, PerceivedObject, RawPerception, ReceivedObject};
pub use station::{CpmStation, StationConfig};
pub use wire::CollectivePerceptionMessage;
