//! Geodetic-to-grid projection and ego-relative frame rotation.
//!
//! Positions travel on the wire in two shapes: the sender's reference
//! position as geodetic coordinates, and each perceived object as a
//! centimeter offset rotated into the sender's heading frame. This module
//! holds both conversions. The planar grid is the 100 km UTM square of the
//! position, with the zone/band prefix dropped: a local, meter-resolution
//! frame that nearby stations share as long as they sit in the same square.

use crate::error::CpmError;
use crate::units::Centimeters;
use nalgebra::{Rotation2, Vector2};

// WGS-84 ellipsoid
const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

// Transverse Mercator / UTM parameters
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

// UTM is undefined toward the poles
const UTM_LAT_MIN_DEG: f64 = -80.0;
const UTM_LAT_MAX_DEG: f64 = 84.0;

/// Side length of the grid square the zone/band prefix is dropped from.
const GRID_SQUARE_M: f64 = 100_000.0;

/// A planar grid position in meters within the local 100 km square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPosition {
    pub x: f64,
    pub y: f64,
}

impl GridPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn as_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

/// Projects a geodetic position to the local planar grid.
///
/// Transverse Mercator forward projection on WGS-84, truncated to integer
/// meters within the 100 km grid square. Deterministic and pure. Inputs
/// outside the projection domain are rejected with
/// [`CpmError::Projection`].
pub fn project(lat_deg: f64, lon_deg: f64) -> Result<GridPosition, CpmError> {
    if !lat_deg.is_finite()
        || !lon_deg.is_finite()
        || !(UTM_LAT_MIN_DEG..=UTM_LAT_MAX_DEG).contains(&lat_deg)
    {
        return Err(CpmError::Projection {
            lat: lat_deg,
            lon: lon_deg,
        });
    }

    // Wrap longitude into [-180, 180) and find the zone's central meridian
    let lon_deg = (lon_deg + 180.0).rem_euclid(360.0) - 180.0;
    let zone = ((lon_deg + 180.0) / 6.0).floor() as i32 + 1;
    let zone = zone.clamp(1, 60);
    let central_meridian_deg = f64::from(zone * 6 - 183);

    let phi = lat_deg.to_radians();
    let lam = (lon_deg - central_meridian_deg).to_radians();

    let e2 = WGS84_F * (2.0 - WGS84_F);
    let ep2 = e2 / (1.0 - e2);

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    // Radius of curvature in the prime vertical
    let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let a = cos_phi * lam;

    // Meridional arc length from the equator
    let m = WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e2 * e2 / 32.0 + 45.0 * e2 * e2 * e2 / 1024.0)
                * (2.0 * phi).sin()
            + (15.0 * e2 * e2 / 256.0 + 45.0 * e2 * e2 * e2 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e2 * e2 * e2 / 3072.0) * (6.0 * phi).sin());

    let a2 = a * a;
    let a3 = a2 * a;
    let a4 = a3 * a;
    let a5 = a4 * a;
    let a6 = a5 * a;

    let easting = UTM_K0
        * n
        * (a + (1.0 - t + c) * a3 / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
        + UTM_FALSE_EASTING;

    let mut northing = UTM_K0
        * (m + n
            * tan_phi
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));
    if phi < 0.0 {
        northing += UTM_FALSE_NORTHING_SOUTH;
    }

    // Drop the zone/band prefix: keep the meter digits within the square
    Ok(GridPosition::new(
        easting.floor().rem_euclid(GRID_SQUARE_M),
        northing.floor().rem_euclid(GRID_SQUARE_M),
    ))
}

/// Rotates a world-frame object position into the sender's heading frame.
///
/// Standard 2D rotation by `-heading` of the offset from the ego position,
/// quantized to centimeters (round half away from zero).
pub fn world_to_ego_relative(
    object: Vector2<f64>,
    ego: Vector2<f64>,
    heading_rad: f64,
) -> (Centimeters, Centimeters) {
    let relative = Rotation2::new(-heading_rad) * (object - ego);
    (
        Centimeters::from_meters(relative.x),
        Centimeters::from_meters(relative.y),
    )
}

/// Reconstructs a world-frame position from an ego-relative offset.
///
/// Inverse of [`world_to_ego_relative`]: centimeters back to meters,
/// rotation by `+heading`, translation by the sender's grid position.
pub fn ego_relative_to_world(
    dx: Centimeters,
    dy: Centimeters,
    sender: Vector2<f64>,
    sender_heading_rad: f64,
) -> Vector2<f64> {
    let offset = Vector2::new(dx.to_meters(), dy.to_meters());
    sender + Rotation2::new(sender_heading_rad) * offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_project_central_meridian_equator() {
        // Zone 31 central meridian: easting 500000, northing 0
        let grid = project(0.0, 3.0).unwrap();
        assert_eq!(grid.x, 0.0);
        assert_eq!(grid.y, 0.0);
    }

    #[test]
    fn test_project_eastward_step() {
        // 0.001 deg of longitude at the equator is ~111.3 m, scaled by k0
        let grid = project(0.0, 3.001).unwrap();
        assert!((grid.x - 111.0).abs() <= 1.0, "grid.x = {}", grid.x);
        assert_eq!(grid.y, 0.0);
    }

    #[test]
    fn test_project_rejects_out_of_domain() {
        assert!(matches!(
            project(85.0, 10.0),
            Err(CpmError::Projection { .. })
        ));
        assert!(matches!(
            project(-81.0, 10.0),
            Err(CpmError::Projection { .. })
        ));
        assert!(matches!(
            project(f64::NAN, 10.0),
            Err(CpmError::Projection { .. })
        ));
    }

    #[test]
    fn test_project_southern_hemisphere_in_range() {
        let grid = project(-33.87, 151.21).unwrap();
        assert!((0.0..GRID_SQUARE_M).contains(&grid.x));
        assert!((0.0..GRID_SQUARE_M).contains(&grid.y));
    }

    #[test]
    fn test_relative_heading_zero() {
        let (dx, dy) = world_to_ego_relative(
            Vector2::new(1010.0, 2000.0),
            Vector2::new(1000.0, 2000.0),
            0.0,
        );
        assert_eq!(dx, Centimeters(1000));
        assert_eq!(dy, Centimeters(0));
    }

    #[test]
    fn test_relative_heading_quarter_turn() {
        // Facing +y, an object 10 m east sits at -10 m on the lateral axis
        let (dx, dy) = world_to_ego_relative(
            Vector2::new(1010.0, 2000.0),
            Vector2::new(1000.0, 2000.0),
            FRAC_PI_2,
        );
        assert_eq!(dx, Centimeters(0));
        assert_eq!(dy, Centimeters(-1000));
    }

    proptest! {
        #[test]
        fn prop_relative_round_trip(
            ox in -500.0f64..500.0,
            oy in -500.0f64..500.0,
            ex in -500.0f64..500.0,
            ey in -500.0f64..500.0,
            heading in -3.2f64..3.2,
        ) {
            let object = Vector2::new(ox, oy);
            let ego = Vector2::new(ex, ey);
            let (dx, dy) = world_to_ego_relative(object, ego, heading);
            let restored = ego_relative_to_world(dx, dy, ego, heading);
            // Half a centimeter of quantization per rotated axis, up to
            // sqrt(2)/2 cm once rotated back
            prop_assert!((restored.x - ox).abs() <= 0.0075);
            prop_assert!((restored.y - oy).abs() <= 0.0075);
        }
    }

    #[test]
    fn test_projection_is_deterministic() {
        let a = project(35.6812, 139.7671).unwrap();
        let b = project(35.6812, 139.7671).unwrap();
        assert_relative_eq!(a.x, b.x);
        assert_relative_eq!(a.y, b.y);
    }
}
