//! Object stack management: the ego-state cache and the outbound/inbound
//! object snapshots.
//!
//! Two independent activity sources touch this state: the scheduled encode
//! cycle and the perception/position feeds, which arrive at an uncontrolled
//! rate. Snapshots are immutable `Arc`s swapped atomically, and an atomic
//! busy flag makes the rebuild skip (not block) while an encode holds the
//! current snapshot.

use crate::coords;
use crate::error::CpmError;
use crate::units::{Centimeters, CentimetersPerSecond, TenthsOfDegree};
use nalgebra::{Point3, Rotation2, UnitQuaternion, Vector2, Vector3};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Fixed time-of-measurement placeholder until perception supplies per-object
/// measurement ages.
pub const TIME_OF_MEASUREMENT_MS: i16 = 100;

/// The broadcasting vehicle's own state.
///
/// A process-wide latest-value cache fed by the positioning subsystem via
/// discrete setters, with no staleness check and no ordering guarantee
/// between the individual fields. Grid and geodetic coordinates are only
/// consistent at the moment of projection; callers must update the geodetic
/// position before a grid-based encode.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EgoState {
    /// Planar grid position, meters (1 m resolution source).
    pub grid_x: f64,
    pub grid_y: f64,

    /// Geodetic position, degrees / meters.
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,

    /// Heading in the grid frame, radians (0 = grid east, CCW positive).
    pub heading_rad: f64,

    /// Wrapping millisecond counter supplied by positioning.
    pub generation_delta_time_ms: u16,
}

impl EgoState {
    /// Grid position as a vector, for frame math.
    pub fn grid_position(&self) -> Vector2<f64> {
        Vector2::new(self.grid_x, self.grid_y)
    }
}

/// A raw detected object as delivered by the perception feed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPerception {
    /// World position in the grid frame, meters.
    pub position: Point3<f64>,

    /// World orientation.
    pub orientation: UnitQuaternion<f64>,

    /// Bounding-box extents, meters (x, y, z).
    pub dimensions: Vector3<f64>,

    /// World-frame velocity, m/s.
    pub velocity: Vector3<f64>,
}

/// A perceived object prepared for encoding: ego-relative, fixed-point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerceivedObject {
    /// Sequential identifier, unique within one snapshot.
    pub object_id: u32,

    pub time_of_measurement_ms: i16,

    /// Ego-relative distance in the sender's heading frame.
    pub x_distance: Centimeters,
    pub y_distance: Centimeters,

    /// Relative speed in the sender's heading frame.
    pub x_speed: CentimetersPerSecond,
    pub y_speed: CentimetersPerSecond,

    /// Bounding-box extents.
    pub dimension_x: Centimeters,
    pub dimension_y: Centimeters,
    pub dimension_z: Centimeters,

    /// World yaw as a wire angle.
    pub yaw: TenthsOfDegree,
}

/// An object reconstructed from a received message, in the grid frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedObject {
    /// Identifier as assigned by the sender.
    pub object_id: u32,

    /// World position in the grid frame, meters (z = 0; the wire carries
    /// no vertical offset).
    pub position: Point3<f64>,

    /// Planar orientation (roll = pitch = 0).
    pub orientation: UnitQuaternion<f64>,

    /// Bounding-box extents.
    pub dimension_x: Centimeters,
    pub dimension_y: Centimeters,
    pub dimension_z: Centimeters,
}

/// The outbound snapshot: perceived objects plus the ego state they were
/// built against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutboundSnapshot {
    pub ego: EgoState,
    pub objects: Vec<PerceivedObject>,
}

/// Holds the latest outbound and inbound snapshots.
pub struct ObjectStack {
    /// Latest-value ego cache, written by positioning callbacks.
    ego: Mutex<EgoState>,

    /// Current outbound snapshot, replaced wholesale on rebuild.
    outbound: Mutex<Arc<OutboundSnapshot>>,

    /// Set while an encode cycle reads the snapshot; rebuilds skip.
    encoding: AtomicBool,

    /// Latest decoded inbound collection, replaced wholesale per message.
    inbound: Mutex<Arc<Vec<ReceivedObject>>>,
}

impl ObjectStack {
    pub fn new() -> Self {
        Self {
            ego: Mutex::new(EgoState::default()),
            outbound: Mutex::new(Arc::new(OutboundSnapshot::default())),
            encoding: AtomicBool::new(false),
            inbound: Mutex::new(Arc::new(Vec::new())),
        }
    }

    /// Positioning callback: planar grid position, meters.
    pub fn update_grid_position(&self, x: f64, y: f64) {
        let mut ego = self.ego.lock().unwrap();
        ego.grid_x = x;
        ego.grid_y = y;
    }

    /// Positioning callback: geodetic reference position.
    pub fn update_reference_position(&self, latitude: f64, longitude: f64, altitude: f64) {
        let mut ego = self.ego.lock().unwrap();
        ego.latitude = latitude;
        ego.longitude = longitude;
        ego.altitude = altitude;
    }

    /// Positioning callback: heading in the grid frame, radians.
    pub fn update_heading(&self, heading_rad: f64) {
        self.ego.lock().unwrap().heading_rad = heading_rad;
    }

    /// Positioning callback: generation-delta-time counter, milliseconds.
    pub fn update_generation_delta_time(&self, millis: u16) {
        self.ego.lock().unwrap().generation_delta_time_ms = millis;
    }

    /// Returns a copy of the current ego state.
    pub fn ego_state(&self) -> EgoState {
        *self.ego.lock().unwrap()
    }

    /// Rebuilds the outbound snapshot from a fresh perception batch.
    ///
    /// Assigns sequential ids in enumeration order and computes the
    /// ego-relative distance and speed of every object against the current
    /// heading. The snapshot is replaced atomically, or - when an encode is
    /// in flight - not at all: the call returns [`CpmError::Skipped`] and
    /// the previous snapshot stays.
    pub fn rebuild_outbound(&self, raw: &[RawPerception]) -> Result<usize, CpmError> {
        if self.encoding.load(Ordering::Acquire) {
            debug!("outbound rebuild skipped, encode in progress");
            return Err(CpmError::Skipped);
        }

        let ego = self.ego_state();
        let rotate = Rotation2::new(-ego.heading_rad);
        let mut objects = Vec::with_capacity(raw.len());

        for (index, detection) in raw.iter().enumerate() {
            let (x_distance, y_distance) = coords::world_to_ego_relative(
                detection.position.coords.xy(),
                ego.grid_position(),
                ego.heading_rad,
            );
            let relative_speed = rotate * detection.velocity.xy();
            let (_, _, yaw_rad) = detection.orientation.euler_angles();

            objects.push(PerceivedObject {
                object_id: index as u32,
                time_of_measurement_ms: TIME_OF_MEASUREMENT_MS,
                x_distance,
                y_distance,
                x_speed: CentimetersPerSecond::from_meters_per_second(relative_speed.x),
                y_speed: CentimetersPerSecond::from_meters_per_second(relative_speed.y),
                dimension_x: Centimeters::from_meters(detection.dimensions.x),
                dimension_y: Centimeters::from_meters(detection.dimensions.y),
                dimension_z: Centimeters::from_meters(detection.dimensions.z),
                yaw: TenthsOfDegree::from_yaw_rad(yaw_rad),
            });
        }

        let count = objects.len();
        *self.outbound.lock().unwrap() = Arc::new(OutboundSnapshot { ego, objects });
        debug!(objects = count, "outbound stack rebuilt");
        Ok(count)
    }

    /// Read-only view of the current outbound snapshot.
    pub fn outbound_snapshot(&self) -> Arc<OutboundSnapshot> {
        self.outbound.lock().unwrap().clone()
    }

    /// Marks an encode cycle as in progress until the guard drops.
    pub fn begin_encode(&self) -> EncodeGuard<'_> {
        self.encoding.store(true, Ordering::Release);
        EncodeGuard { stack: self }
    }

    /// Atomically replaces the inbound collection after a successful decode.
    ///
    /// Returns the new snapshot so the caller can publish it downstream
    /// immediately.
    pub fn replace_inbound(&self, objects: Vec<ReceivedObject>) -> Arc<Vec<ReceivedObject>> {
        let snapshot = Arc::new(objects);
        *self.inbound.lock().unwrap() = snapshot.clone();
        snapshot
    }

    /// Read-only view of the latest inbound collection.
    pub fn inbound_snapshot(&self) -> Arc<Vec<ReceivedObject>> {
        self.inbound.lock().unwrap().clone()
    }
}

impl Default for ObjectStack {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII marker for an in-progress encode cycle.
///
/// Held across compose-and-send; rebuilds arriving meanwhile are skipped.
pub struct EncodeGuard<'a> {
    stack: &'a ObjectStack,
}

impl EncodeGuard<'_> {
    /// The snapshot the encode operates on.
    pub fn snapshot(&self) -> Arc<OutboundSnapshot> {
        self.stack.outbound_snapshot()
    }
}

impl Drop for EncodeGuard<'_> {
    fn drop(&mut self) {
        self.stack.encoding.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection_at(x: f64, y: f64) -> RawPerception {
        RawPerception {
            position: Point3::new(x, y, 0.0),
            orientation: UnitQuaternion::identity(),
            dimensions: Vector3::new(4.5, 1.8, 1.5),
            velocity: Vector3::zeros(),
        }
    }

    #[test]
    fn test_sequential_unique_ids() {
        let stack = ObjectStack::new();
        let raw: Vec<_> = (0..5).map(|i| detection_at(10.0 * i as f64, 0.0)).collect();

        stack.rebuild_outbound(&raw).unwrap();

        let snapshot = stack.outbound_snapshot();
        let ids: Vec<u32> = snapshot.objects.iter().map(|o| o.object_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_relative_distance_uses_current_heading() {
        let stack = ObjectStack::new();
        stack.update_grid_position(1000.0, 2000.0);
        stack.update_heading(0.0);

        stack
            .rebuild_outbound(&[detection_at(1010.0, 2000.0)])
            .unwrap();

        let snapshot = stack.outbound_snapshot();
        assert_eq!(snapshot.objects[0].x_distance, Centimeters(1000));
        assert_eq!(snapshot.objects[0].y_distance, Centimeters(0));
        assert_eq!(snapshot.ego.grid_x, 1000.0);
    }

    #[test]
    fn test_rebuild_skipped_while_encoding() {
        let stack = ObjectStack::new();
        stack.rebuild_outbound(&[detection_at(5.0, 5.0)]).unwrap();
        let before = stack.outbound_snapshot();

        let guard = stack.begin_encode();
        let result = stack.rebuild_outbound(&[detection_at(1.0, 1.0), detection_at(2.0, 2.0)]);
        assert!(matches!(result, Err(CpmError::Skipped)));
        // Previous snapshot retained untouched
        assert!(Arc::ptr_eq(&before, &stack.outbound_snapshot()));
        drop(guard);

        // Once the flag clears, the next rebuild fully replaces the snapshot
        let count = stack
            .rebuild_outbound(&[detection_at(1.0, 1.0), detection_at(2.0, 2.0)])
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(stack.outbound_snapshot().objects.len(), 2);
    }

    #[test]
    fn test_inbound_replace_is_wholesale() {
        let stack = ObjectStack::new();
        let first = stack.replace_inbound(vec![ReceivedObject {
            object_id: 0,
            position: Point3::new(1.0, 2.0, 0.0),
            orientation: UnitQuaternion::identity(),
            dimension_x: Centimeters(450),
            dimension_y: Centimeters(180),
            dimension_z: Centimeters(150),
        }]);
        assert_eq!(first.len(), 1);

        let second = stack.replace_inbound(Vec::new());
        assert!(second.is_empty());
        assert!(stack.inbound_snapshot().is_empty());
    }

    #[test]
    fn test_ego_setters_are_independent(){
        let stack = ObjectStack::new();
        stack.update_reference_position(35.0, 139.0, 40.0);
        stack.update_generation_delta_time(1234);

        let ego = stack.ego_state();
        assert_eq!(ego.latitude, 35.0);
        assert_eq!(ego.altitude, 40.0);
        assert_eq!(ego.generation_delta_time_ms, 1234);
        assert_eq!(ego.grid_x, 0.0);
    }
}
