//! Inbound path: wire message fields -> grid-frame object list.

use crate::coords;
use crate::error::CpmError;
use crate::stack::ReceivedObject;
use crate::units::{self, Centimeters, TenthsOfDegree};
use crate::wire::CollectivePerceptionMessage;
use nalgebra::{Point3, UnitQuaternion};
use tracing::{debug, trace};

/// Interprets received CPMs into grid-frame objects.
///
/// Packets that do not parse as a CPM are reported as
/// [`CpmError::NotDecodable`]; callers drop them without escalation. A
/// message without an object list decodes to an empty collection, which is
/// a valid result.
#[derive(Debug, Clone, Default)]
pub struct CpmDecoder;

impl CpmDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Parses a raw packet and reconstructs the described objects in the
    /// shared grid frame.
    pub fn decode(&self, raw: &[u8]) -> Result<Vec<ReceivedObject>, CpmError> {
        let message = CollectivePerceptionMessage::from_bytes(raw)?;
        self.interpret(&message)
    }

    /// Reconstructs objects from an already-parsed message.
    pub fn interpret(
        &self,
        message: &CollectivePerceptionMessage,
    ) -> Result<Vec<ReceivedObject>, CpmError> {
        let reference = &message.management.reference_position;
        let latitude = units::from_tenth_microdegree(reference.latitude);
        let longitude = units::from_tenth_microdegree(reference.longitude);

        let sender_grid = coords::project(latitude, longitude)?;
        let sender_heading =
            TenthsOfDegree::new(message.originating_vehicle.heading.value).to_heading_rad();

        let Some(entries) = &message.perceived_objects else {
            debug!(
                station = message.header.station_id,
                "cpm carries no perceived objects"
            );
            return Ok(Vec::new());
        };

        let mut objects = Vec::with_capacity(entries.len());
        for entry in entries {
            let world = coords::ego_relative_to_world(
                Centimeters(entry.x_distance.value),
                Centimeters(entry.y_distance.value),
                sender_grid.as_vector(),
                sender_heading,
            );

            let yaw_rad = TenthsOfDegree::new(entry.yaw_angle.value).to_yaw_rad();

            trace!(
                id = entry.object_id,
                x = world.x,
                y = world.y,
                "reconstructed perceived object"
            );

            objects.push(ReceivedObject {
                object_id: entry.object_id,
                position: Point3::new(world.x, world.y, 0.0),
                orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, yaw_rad),
                // Undo the wire axis swap: dimension 2 is the X extent
                dimension_x: Centimeters(i32::from(entry.planar_dimension_2.value)),
                dimension_y: Centimeters(i32::from(entry.planar_dimension_1.value)),
                dimension_z: Centimeters(i32::from(entry.vertical_dimension.value)),
            });
        }

        Ok(objects)
    }
}
