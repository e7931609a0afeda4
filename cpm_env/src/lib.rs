//! CPM Environment Abstraction Layer
//!
//! This crate provides the boundary between the CPM engines and the outside
//! world, so the same station code runs in **Production** (tokio, a real
//! GeoNetworking/BTP router) and in **Simulation** (virtual radio, virtual
//! clock).
//!
//! Three collaborators are abstracted:
//! - Time and task spawning (`V2xContext`)
//! - The lower-layer V2X transport (`V2xTransport`) — framing, addressing
//!   and delivery of already-encoded messages
//! - The downstream consumer of reconstructed objects (`PerceptionSink`)
//!
//! # Example
//!
//! ```ignore
//! use cpm_env::{V2xContext, V2xTransport};
//!
//! async fn rx_loop<Ctx: V2xContext, Net: V2xTransport>(ctx: &Ctx, net: &Net) {
//!     while let Some((meta, raw)) = net.recv().await {
//!         handle_packet(meta, raw);
//!     }
//! }
//! ```

mod context;
mod error;
mod sink;
mod tokio_impl;
mod transport;
mod types;

pub use context::V2xContext;
pub use error::EnvError;
pub use sink::PerceptionSink;
pub use tokio_impl::TokioContext;
pub use transport::V2xTransport;
pub use types::{
    BtpPort, CommunicationProfile, DataConfirm, DataRequest, ItsAid, RxMetadata, StationId,
    TransportType,
};
