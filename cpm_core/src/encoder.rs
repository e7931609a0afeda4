//! Outbound path: ego state + object snapshot -> wire message fields.

use crate::stack::{EgoState, OutboundSnapshot};
use crate::units::{self, TenthsOfDegree};
use crate::wire::{
    CartesianAngle, CollectivePerceptionMessage, ConfidenceEllipse, HeadingValue, ItsPduHeader,
    ManagementContainer, ObjectDimension, ObjectDistance, ObjectSpeed,
    OriginatingVehicleContainer, ReferencePosition, SpeedValue, WirePerceivedObject,
    CONFIDENCE_PLACEHOLDER, MESSAGE_ID_CPM, PROTOCOL_VERSION, STATION_TYPE_PASSENGER_CAR,
};
use cpm_env::StationId;
use tracing::trace;

/// Builds outbound CPMs for one station.
///
/// Construction is deterministic: the same ego state and snapshot always
/// yield the same message. The returned message is fully populated and
/// immutable; transmission is the caller's job.
#[derive(Debug, Clone)]
pub struct CpmEncoder {
    station_id: StationId,
}

impl CpmEncoder {
    pub fn new(station_id: StationId) -> Self {
        Self { station_id }
    }

    pub fn station_id(&self) -> StationId {
        self.station_id
    }

    /// Assembles the wire message from the latest ego state and the current
    /// outbound snapshot.
    ///
    /// An empty snapshot produces a message with a zero object count and no
    /// object list - a valid state distinguishable from any error.
    pub fn encode(
        &self,
        ego: &EgoState,
        snapshot: &OutboundSnapshot,
    ) -> CollectivePerceptionMessage {
        let perceived_objects = if snapshot.objects.is_empty() {
            None
        } else {
            Some(
                snapshot
                    .objects
                    .iter()
                    .map(|object| {
                        trace!(
                            id = object.object_id,
                            dx = object.x_distance.0,
                            dy = object.y_distance.0,
                            yaw = object.yaw.raw(),
                            "encoding perceived object"
                        );
                        WirePerceivedObject {
                            object_id: object.object_id,
                            time_of_measurement: object.time_of_measurement_ms,
                            x_distance: ObjectDistance {
                                value: object.x_distance.0,
                                confidence: CONFIDENCE_PLACEHOLDER,
                            },
                            y_distance: ObjectDistance {
                                value: object.y_distance.0,
                                confidence: CONFIDENCE_PLACEHOLDER,
                            },
                            x_speed: ObjectSpeed {
                                value: object.x_speed.0,
                                confidence: CONFIDENCE_PLACEHOLDER,
                            },
                            y_speed: ObjectSpeed {
                                value: object.y_speed.0,
                                confidence: CONFIDENCE_PLACEHOLDER,
                            },
                            // Wire axis swap: dimension 1 is the Y extent,
                            // dimension 2 the X extent
                            planar_dimension_1: dimension(object.dimension_y.0),
                            planar_dimension_2: dimension(object.dimension_x.0),
                            vertical_dimension: dimension(object.dimension_z.0),
                            yaw_angle: CartesianAngle {
                                value: object.yaw.raw(),
                                confidence: CONFIDENCE_PLACEHOLDER,
                            },
                        }
                    })
                    .collect(),
            )
        };

        CollectivePerceptionMessage {
            header: ItsPduHeader {
                protocol_version: PROTOCOL_VERSION,
                message_id: MESSAGE_ID_CPM,
                station_id: self.station_id.0,
            },
            generation_delta_time: ego.generation_delta_time_ms,
            management: ManagementContainer {
                station_type: STATION_TYPE_PASSENGER_CAR,
                reference_position: ReferencePosition {
                    latitude: units::to_tenth_microdegree(ego.latitude),
                    longitude: units::to_tenth_microdegree(ego.longitude),
                    confidence_ellipse: ConfidenceEllipse::default(),
                },
            },
            originating_vehicle: OriginatingVehicleContainer {
                heading: HeadingValue {
                    value: TenthsOfDegree::from_heading_rad(ego.heading_rad).raw(),
                    confidence: CONFIDENCE_PLACEHOLDER,
                },
                // No speed estimate is supplied by positioning; a fixed
                // zero with placeholder confidence goes on the wire
                speed: SpeedValue {
                    value: 0,
                    confidence: CONFIDENCE_PLACEHOLDER,
                },
            },
            number_of_perceived_objects: snapshot.objects.len() as u32,
            perceived_objects,
        }
    }
}

fn dimension(cm: i32) -> ObjectDimension {
    ObjectDimension {
        value: cm.clamp(0, i32::from(u16::MAX)) as u16,
        confidence: CONFIDENCE_PLACEHOLDER,
    }
}
