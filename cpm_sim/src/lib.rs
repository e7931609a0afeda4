//! Simulation harness for the CPM stack.
//!
//! Provides a virtual broadcast radio cell with fault injection and a small
//! kinematic world, so full stations can be exercised end to end without a
//! GeoNetworking router or a real perception pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                      RadioRouter                      │
//! │   latency / loss / partitions via RadioController     │
//! └──────▲──────────────────▲──────────────────▲──────────┘
//!        │                  │                  │
//!   ┌────┴────┐        ┌────┴────┐        ┌────┴────┐
//!   │ Station │        │ Station │        │ Station │
//!   │   #1    │        │   #2    │        │   #3    │
//!   └────▲────┘        └────▲────┘        └────▲────┘
//!        │                  │                  │
//!   ┌────┴──────────────────┴──────────────────┴────┐
//!   │                   SimWorld                    │
//!   │      (vehicle kinematics + perception)        │
//!   └───────────────────────────────────────────────┘
//! ```

mod radio;
mod world;

pub use radio::{RadioController, RadioMessage, RadioRouter, SimRadio};
pub use world::{SimVehicle, SimWorld, WorldConfig};
