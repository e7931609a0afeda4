//! Typed wire message model for the Collective Perception Message.
//!
//! The structs here are the in-memory shape of the serialized PDU: built
//! fully populated by the encoder, handed wholesale to the codec boundary,
//! never mutated field-by-field. The byte codec at that boundary is
//! swappable; this crate ships a JSON codec so the decode-rejection path is
//! exercised end to end.

use crate::error::CpmError;
use serde::{Deserialize, Serialize};

/// ITS PDU protocol version carried by every message.
pub const PROTOCOL_VERSION: u8 = 1;

/// Message type tag identifying a CPM.
pub const MESSAGE_ID_CPM: u8 = 14;

/// Station classification for a passenger car.
pub const STATION_TYPE_PASSENGER_CAR: u8 = 5;

/// Default confidence placeholder carried by value/confidence pairs when no
/// richer estimate is available.
pub const CONFIDENCE_PLACEHOLDER: u8 = 1;

/// Default confidence ellipse axis: 1.0 m in 0.01 m units.
pub const DEFAULT_CONFIDENCE_ELLIPSE_CM: u16 = 100;

/// Common PDU header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItsPduHeader {
    pub protocol_version: u8,
    pub message_id: u8,
    pub station_id: u32,
}

/// Position uncertainty ellipse, axes in 0.01 m units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceEllipse {
    pub semi_major: u16,
    pub semi_minor: u16,
}

impl Default for ConfidenceEllipse {
    fn default() -> Self {
        Self {
            semi_major: DEFAULT_CONFIDENCE_ELLIPSE_CM,
            semi_minor: DEFAULT_CONFIDENCE_ELLIPSE_CM,
        }
    }
}

/// Sender reference position, geodetic coordinates at 1e-7 degree fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePosition {
    pub latitude: i64,
    pub longitude: i64,
    pub confidence_ellipse: ConfidenceEllipse,
}

/// Management block: who is sending and from where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementContainer {
    pub station_type: u8,
    pub reference_position: ReferencePosition,
}

/// Heading in tenths of a degree with a confidence scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingValue {
    pub value: u16,
    pub confidence: u8,
}

/// Speed in 0.01 m/s with a confidence scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedValue {
    pub value: u16,
    pub confidence: u8,
}

/// Origin vehicle block: sender kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginatingVehicleContainer {
    pub heading: HeadingValue,
    pub speed: SpeedValue,
}

/// Signed distance in centimeters with a confidence scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDistance {
    pub value: i32,
    pub confidence: u8,
}

/// Signed speed in cm/s with a confidence scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSpeed {
    pub value: i32,
    pub confidence: u8,
}

/// Object extent in centimeters with a confidence scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDimension {
    pub value: u16,
    pub confidence: u8,
}

/// Angle in tenths of a degree, [0, 3600), with a confidence scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartesianAngle {
    pub value: u16,
    pub confidence: u8,
}

/// One entry of the perceived-object list.
///
/// `planar_dimension_1` carries the object's Y extent and
/// `planar_dimension_2` its X extent; the swap is part of the wire format
/// and is undone on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePerceivedObject {
    pub object_id: u32,
    /// Milliseconds relative to the message generation time.
    pub time_of_measurement: i16,
    pub x_distance: ObjectDistance,
    pub y_distance: ObjectDistance,
    pub x_speed: ObjectSpeed,
    pub y_speed: ObjectSpeed,
    pub planar_dimension_1: ObjectDimension,
    pub planar_dimension_2: ObjectDimension,
    pub vertical_dimension: ObjectDimension,
    pub yaw_angle: CartesianAngle,
}

/// The full Collective Perception Message.
///
/// An absent `perceived_objects` list is a valid state meaning "zero
/// objects observed", distinct from an error, and pairs with a zero count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectivePerceptionMessage {
    pub header: ItsPduHeader,
    /// Wrapping millisecond counter from the positioning subsystem.
    pub generation_delta_time: u16,
    pub management: ManagementContainer,
    pub originating_vehicle: OriginatingVehicleContainer,
    pub number_of_perceived_objects: u32,
    pub perceived_objects: Option<Vec<WirePerceivedObject>>,
}

impl CollectivePerceptionMessage {
    /// True when the header carries the CPM protocol version and type tag.
    pub fn is_cpm(&self) -> bool {
        self.header.protocol_version == PROTOCOL_VERSION
            && self.header.message_id == MESSAGE_ID_CPM
    }

    /// Serializes the message for the transport gateway.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CpmError> {
        serde_json::to_vec(self).map_err(|err| CpmError::Codec(err.to_string()))
    }

    /// Parses raw packet bytes, rejecting anything that is not a CPM.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, CpmError> {
        let message: Self =
            serde_json::from_slice(raw).map_err(|_| CpmError::NotDecodable)?;
        if !message.is_cpm() {
            return Err(CpmError::NotDecodable);
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_message() -> CollectivePerceptionMessage {
        CollectivePerceptionMessage {
            header: ItsPduHeader {
                protocol_version: PROTOCOL_VERSION,
                message_id: MESSAGE_ID_CPM,
                station_id: 1,
            },
            generation_delta_time: 42,
            management: ManagementContainer {
                station_type: STATION_TYPE_PASSENGER_CAR,
                reference_position: ReferencePosition {
                    latitude: 356_812_000,
                    longitude: 1_397_671_000,
                    confidence_ellipse: ConfidenceEllipse::default(),
                },
            },
            originating_vehicle: OriginatingVehicleContainer {
                heading: HeadingValue {
                    value: 900,
                    confidence: CONFIDENCE_PLACEHOLDER,
                },
                speed: SpeedValue {
                    value: 0,
                    confidence: CONFIDENCE_PLACEHOLDER,
                },
            },
            number_of_perceived_objects: 0,
            perceived_objects: None,
        }
    }

    #[test]
    fn test_byte_round_trip() {
        let message = minimal_message();
        let bytes = message.to_bytes().unwrap();
        let parsed = CollectivePerceptionMessage::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_garbage_is_not_decodable() {
        let raw = [0x13u8, 0x37, 0x00, 0xff, 0x42];
        assert!(matches!(
            CollectivePerceptionMessage::from_bytes(&raw),
            Err(CpmError::NotDecodable)
        ));
    }

    #[test]
    fn test_wrong_message_id_is_not_decodable() {
        let mut message = minimal_message();
        message.header.message_id = 2;
        let bytes = message.to_bytes().unwrap();
        assert!(matches!(
            CollectivePerceptionMessage::from_bytes(&bytes),
            Err(CpmError::NotDecodable)
        ));
    }

    #[test]
    fn test_default_confidence_ellipse_is_one_meter() {
        let ellipse = ConfidenceEllipse::default();
        assert_eq!(ellipse.semi_major, 100);
        assert_eq!(ellipse.semi_minor, 100);
    }
}
