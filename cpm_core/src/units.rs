//! Fixed-point value types used by the wire format.
//!
//! The wire message encodes angles as tenths of a degree in [0, 3600) and
//! lengths as integer centimeters. Every conversion between those and the
//! internal radian/meter representation lives here, so call sites never
//! multiply by magic constants.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Offset between the grid-frame heading (0 = grid east, counterclockwise
/// positive) and the wire heading reference axis, in degrees.
///
/// TODO: verify this 90 degree reference against the TS 102 894-2 heading
/// convention before interop testing with third-party stacks.
pub const WIRE_HEADING_OFFSET_DEG: f64 = 90.0;

/// Radian form of [`WIRE_HEADING_OFFSET_DEG`].
pub const WIRE_HEADING_OFFSET_RAD: f64 = FRAC_PI_2;

/// Tenths of a degree per radian.
const TENTHS_PER_RAD: f64 = 1800.0 / PI;

/// Maps any degree value into [0, 360).
pub fn normalize_deg(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// A wire angle in tenths of a degree, always in [0, 3600).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenthsOfDegree(u16);

impl TenthsOfDegree {
    /// Wraps a raw wire value into the valid range.
    pub fn new(value: u16) -> Self {
        Self(value % 3600)
    }

    /// Encodes a grid-frame heading (radians) as a wire heading.
    ///
    /// `wire = round(normalize_deg(90 - heading * 180/pi) * 10) mod 3600`
    pub fn from_heading_rad(heading_rad: f64) -> Self {
        let deg = normalize_deg(WIRE_HEADING_OFFSET_DEG - heading_rad.to_degrees());
        Self(((deg * 10.0).round() as u32 % 3600) as u16)
    }

    /// Decodes a wire heading back to a grid-frame heading in radians.
    ///
    /// Exact inverse of [`Self::from_heading_rad`] up to the 0.1 degree
    /// quantization.
    pub fn to_heading_rad(self) -> f64 {
        WIRE_HEADING_OFFSET_RAD - f64::from(self.0) / TENTHS_PER_RAD
    }

    /// Encodes an object yaw (radians) as a wire angle.
    ///
    /// Negative yaw is shifted by a full turn first, so the encoded value is
    /// always non-negative: yaw in (-pi, 0) lands in [1800, 3600).
    pub fn from_yaw_rad(yaw_rad: f64) -> Self {
        let yaw = yaw_rad.rem_euclid(TAU);
        Self(((yaw.to_degrees() * 10.0).round() as u32 % 3600) as u16)
    }

    /// Decodes a wire yaw angle to radians in [0, 2*pi).
    pub fn to_yaw_rad(self) -> f64 {
        f64::from(self.0) / TENTHS_PER_RAD
    }

    /// Returns the raw wire value.
    pub fn raw(self) -> u16 {
        self.0
    }
}

/// A length in integer centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Centimeters(pub i32);

impl Centimeters {
    pub const ZERO: Centimeters = Centimeters(0);

    /// Converts from meters, rounding half away from zero.
    pub fn from_meters(meters: f64) -> Self {
        Self((meters * 100.0).round() as i32)
    }

    /// Converts back to meters.
    pub fn to_meters(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

/// A speed in integer centimeters per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CentimetersPerSecond(pub i32);

impl CentimetersPerSecond {
    pub const ZERO: CentimetersPerSecond = CentimetersPerSecond(0);

    /// Converts from meters per second, rounding half away from zero.
    pub fn from_meters_per_second(mps: f64) -> Self {
        Self((mps * 100.0).round() as i32)
    }

    /// Converts back to meters per second.
    pub fn to_meters_per_second(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

/// Encodes a geodetic coordinate (degrees) at the 1e-7 degree fixed point
/// used by the reference position.
pub fn to_tenth_microdegree(deg: f64) -> i64 {
    (deg * 1.0e7).round() as i64
}

/// Decodes a 1e-7 degree fixed-point coordinate back to degrees.
pub fn from_tenth_microdegree(value: i64) -> f64 {
    value as f64 / 1.0e7
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_heading_zero_maps_to_offset_axis() {
        assert_eq!(TenthsOfDegree::from_heading_rad(0.0).raw(), 900);
    }

    #[test]
    fn test_heading_round_trip() {
        for raw in [0u16, 1, 900, 1800, 2700, 3599] {
            let heading = TenthsOfDegree::new(raw).to_heading_rad();
            assert_eq!(TenthsOfDegree::from_heading_rad(heading).raw(), raw);
        }
    }

    #[test]
    fn test_yaw_boundaries() {
        assert_eq!(TenthsOfDegree::from_yaw_rad(0.0).raw(), 0);
        assert_eq!(TenthsOfDegree::from_yaw_rad(PI).raw(), 1800);
        assert_eq!(TenthsOfDegree::from_yaw_rad(-FRAC_PI_2).raw(), 2700);
        // A full turn wraps back to zero
        assert_eq!(TenthsOfDegree::from_yaw_rad(TAU).raw(), 0);
    }

    #[test]
    fn test_centimeters_round_half_away_from_zero() {
        assert_eq!(Centimeters::from_meters(0.125).0, 13);
        assert_eq!(Centimeters::from_meters(-0.125).0, -13);
        assert_eq!(Centimeters::from_meters(10.0).0, 1000);
    }

    #[test]
    fn test_tenth_microdegree_round_trip() {
        let lat = 35.6812;
        let encoded = to_tenth_microdegree(lat);
        assert_eq!(encoded, 356_812_000);
        assert_relative_eq!(from_tenth_microdegree(encoded), lat, epsilon = 1e-9);
    }

    proptest! {
        #[test]
        fn prop_heading_periodic(heading in -10.0f64..10.0) {
            let a = TenthsOfDegree::from_heading_rad(heading);
            let b = TenthsOfDegree::from_heading_rad(heading + TAU);
            prop_assert_eq!(a.raw(), b.raw());
        }

        #[test]
        fn prop_heading_inverse(raw in 0u16..3600) {
            let rad = TenthsOfDegree::new(raw).to_heading_rad();
            prop_assert_eq!(TenthsOfDegree::from_heading_rad(rad).raw(), raw);
        }

        #[test]
        fn prop_negative_yaw_normalizes_to_upper_half(yaw in -3.14f64..-0.001) {
            let encoded = TenthsOfDegree::from_yaw_rad(yaw).raw();
            prop_assert!((1800..3600).contains(&encoded), "encoded = {}", encoded);
        }

        #[test]
        fn prop_positive_yaw_stays_in_lower_half(yaw in 0.0f64..=3.1415) {
            let encoded = TenthsOfDegree::from_yaw_rad(yaw).raw();
            prop_assert!(encoded <= 1800, "encoded = {}", encoded);
        }

        #[test]
        fn prop_yaw_quantization_error_bounded(yaw in -3.1f64..3.1) {
            let decoded = TenthsOfDegree::from_yaw_rad(yaw).to_yaw_rad();
            let original = if yaw < 0.0 { yaw + TAU } else { yaw };
            let diff = (decoded - original).abs();
            // Half a tenth of a degree, with wrap-around at the full turn
            let tol = 0.05f64.to_radians() + 1e-9;
            prop_assert!(diff <= tol || (TAU - diff) <= tol, "diff = {}", diff);
        }
    }
}
