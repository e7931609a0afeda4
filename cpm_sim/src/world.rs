//! A small kinematic world: vehicles on a shared stretch of road.
//!
//! Each vehicle carries a geodetic position and a grid-frame heading. On
//! every step it advances along its heading; the grid coordinates handed to
//! the stations are always re-derived from the geodetic position, the same
//! way a positioning subsystem would.

use cpm_core::coords::{self, GridPosition};
use cpm_core::error::CpmError;
use cpm_core::stack::RawPerception;
use cpm_env::StationId;
use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Mean earth radius used for the small-step geodetic advance.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Bounding box of a simulated passenger car, meters.
const CAR_DIMENSIONS_M: [f64; 3] = [4.6, 1.8, 1.5];

/// One simulated vehicle.
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub station_id: StationId,
    pub latitude: f64,
    pub longitude: f64,

    /// Grid-frame heading, radians (0 = grid east).
    pub heading_rad: f64,

    pub speed_mps: f64,
}

impl SimVehicle {
    /// Current planar grid position.
    pub fn grid(&self) -> Result<GridPosition, CpmError> {
        coords::project(self.latitude, self.longitude)
    }

    /// Advances the vehicle along its heading.
    fn step(&mut self, dt: f64) {
        let dx = self.speed_mps * self.heading_rad.cos() * dt;
        let dy = self.speed_mps * self.heading_rad.sin() * dt;

        self.latitude += (dy / EARTH_RADIUS_M).to_degrees();
        self.longitude +=
            (dx / (EARTH_RADIUS_M * self.latitude.to_radians().cos())).to_degrees();
    }
}

/// Configuration for a simulated scenario.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    pub num_vehicles: usize,

    /// Geodetic position of the first vehicle.
    pub origin_lat: f64,
    pub origin_lon: f64,

    /// Along-road gap between consecutive vehicles, meters.
    pub spacing_m: f64,

    /// Perception range of every vehicle, meters.
    pub sensing_radius_m: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            num_vehicles: 3,
            origin_lat: 35.6812,
            origin_lon: 139.7671,
            spacing_m: 25.0,
            sensing_radius_m: 150.0,
        }
    }
}

/// The scenario container: vehicles plus the clock driving them.
pub struct SimWorld {
    pub config: WorldConfig,
    pub vehicles: Vec<SimVehicle>,
    elapsed_ms: u64,
}

impl SimWorld {
    /// Lines the vehicles up eastward with the configured spacing.
    pub fn new(config: WorldConfig) -> Self {
        let lat_rad = config.origin_lat.to_radians();
        let vehicles = (0..config.num_vehicles)
            .map(|i| {
                let east_offset = config.spacing_m * i as f64;
                SimVehicle {
                    station_id: StationId(i as u32 + 1),
                    latitude: config.origin_lat,
                    longitude: config.origin_lon
                        + (east_offset / (EARTH_RADIUS_M * lat_rad.cos())).to_degrees(),
                    heading_rad: 0.0,
                    speed_mps: 8.0 + i as f64,
                }
            })
            .collect();

        Self {
            config,
            vehicles,
            elapsed_ms: 0,
        }
    }

    /// Advances the world by one time step.
    pub fn step(&mut self, dt: f64) {
        for vehicle in &mut self.vehicles {
            vehicle.step(dt);
        }
        self.elapsed_ms += (dt * 1000.0).round() as u64;
    }

    /// Wrapping millisecond counter for the generation-delta-time feed.
    pub fn generation_delta_time(&self) -> u16 {
        (self.elapsed_ms % 65_536) as u16
    }

    /// The raw detections the given vehicle's perception would deliver:
    /// every other vehicle within sensing range, in the grid frame.
    pub fn detections_for(&self, index: usize) -> Result<Vec<RawPerception>, CpmError> {
        let observer = &self.vehicles[index];
        let observer_grid = observer.grid()?;

        let mut detections = Vec::new();
        for (other_index, other) in self.vehicles.iter().enumerate() {
            if other_index == index {
                continue;
            }
            let other_grid = other.grid()?;
            let dx = other_grid.x - observer_grid.x;
            let dy = other_grid.y - observer_grid.y;
            if (dx * dx + dy * dy).sqrt() > self.config.sensing_radius_m {
                continue;
            }

            let velocity = Vector3::new(
                other.speed_mps * other.heading_rad.cos(),
                other.speed_mps * other.heading_rad.sin(),
                0.0,
            );
            detections.push(RawPerception {
                position: Point3::new(other_grid.x, other_grid.y, 0.0),
                orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, other.heading_rad),
                dimensions: Vector3::new(
                    CAR_DIMENSIONS_M[0],
                    CAR_DIMENSIONS_M[1],
                    CAR_DIMENSIONS_M[2],
                ),
                velocity,
            });
        }

        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_world_lines_up_vehicles() {
        let world = SimWorld::new(WorldConfig::default());
        assert_eq!(world.vehicles.len(), 3);

        let g0 = world.vehicles[0].grid().unwrap();
        let g1 = world.vehicles[1].grid().unwrap();
        // Second vehicle sits ~25 m east of the first (integer grid)
        assert!((g1.x - g0.x - 25.0).abs() <= 1.5, "gap = {}", g1.x - g0.x);
        assert_relative_eq!(g1.y, g0.y, epsilon = 1.5);
    }

    #[test]
    fn test_vehicles_perceive_neighbors() {
        let world = SimWorld::new(WorldConfig::default());
        let detections = world.detections_for(0).unwrap();
        assert_eq!(detections.len(), 2);
    }

    #[test]
    fn test_sensing_radius_limits_detections() {
        let config = WorldConfig {
            spacing_m: 500.0,
            sensing_radius_m: 100.0,
            ..WorldConfig::default()
        };
        let world = SimWorld::new(config);
        assert!(world.detections_for(0).unwrap().is_empty());
    }

    #[test]
    fn test_step_moves_eastbound_vehicle() {
        let mut world = SimWorld::new(WorldConfig::default());
        let before = world.vehicles[0].grid().unwrap();

        // 10 seconds at 8 m/s heading east
        for _ in 0..100 {
            world.step(0.1);
        }
        let after = world.vehicles[0].grid().unwrap();
        assert!((after.x - before.x - 80.0).abs() <= 2.0, "moved {}", after.x - before.x);
        assert_eq!(world.generation_delta_time(), 10_000);
    }
}
