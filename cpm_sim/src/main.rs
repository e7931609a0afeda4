//! CPM simulation CLI
//!
//! Runs a handful of stations in one radio cell, drives them from the
//! kinematic world and reports how many object batches made it across.

use clap::Parser;
use cpm_core::stack::ReceivedObject;
use cpm_core::station::{CpmStation, StationConfig};
use cpm_env::{TokioContext, V2xContext};
use cpm_sim::{RadioController, RadioRouter, SimWorld, WorldConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "cpm-sim", about = "Collective perception over a simulated radio cell")]
struct Args {
    /// Number of stations sharing the cell
    #[arg(long, default_value_t = 3)]
    stations: usize,

    /// Number of world ticks to run
    #[arg(long, default_value_t = 50)]
    ticks: u64,

    /// World tick length in milliseconds
    #[arg(long, default_value_t = 100)]
    tick_millis: u64,

    /// CPM transmit interval in milliseconds
    #[arg(long, default_value_t = 250)]
    interval_millis: u64,

    /// Packet loss rate applied to every link (0.0 - 1.0)
    #[arg(long, default_value_t = 0.0)]
    loss: f64,

    /// Verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing subscriber");

    info!(
        stations = args.stations,
        ticks = args.ticks,
        loss = args.loss,
        "starting cpm simulation"
    );

    let mut world = SimWorld::new(WorldConfig {
        num_vehicles: args.stations,
        ..WorldConfig::default()
    });

    let ctx = TokioContext::shared();
    let controller = Arc::new(RadioController::new());
    controller.set_default_loss(args.loss);
    let router = RadioRouter::spawn(controller);

    let published = Arc::new(AtomicUsize::new(0));

    let mut stations = Vec::new();
    for vehicle in &world.vehicles {
        let counter = published.clone();
        let station_id = vehicle.station_id;
        let sink = Arc::new(move |objects: Arc<Vec<ReceivedObject>>| {
            counter.fetch_add(1, Ordering::Relaxed);
            info!(%station_id, objects = objects.len(), "published received objects");
        });

        let station = CpmStation::spawn(
            StationConfig {
                station_id,
                tx_interval: Duration::from_millis(args.interval_millis),
            },
            ctx.clone(),
            router.attach(station_id),
            sink,
        );
        stations.push(station);
    }

    let dt = args.tick_millis as f64 / 1000.0;
    for tick in 0..args.ticks {
        world.step(dt);

        for (index, station) in stations.iter().enumerate() {
            let vehicle = &world.vehicles[index];
            match vehicle.grid() {
                Ok(grid) => {
                    station.update_reference_position(vehicle.latitude, vehicle.longitude, 0.0);
                    station.update_grid_position(grid.x, grid.y);
                    station.update_heading(vehicle.heading_rad);
                    station.update_generation_delta_time(world.generation_delta_time());
                }
                Err(err) => warn!(%err, "positioning update failed"),
            }

            match world.detections_for(index) {
                Ok(detections) => {
                    // A skipped rebuild is flow control, not a failure
                    let _ = station.update_objects(&detections);
                }
                Err(err) => warn!(%err, "perception update failed"),
            }
        }

        if tick % 10 == 0 {
            info!(tick, time_ms = world.generation_delta_time(), "world tick");
        }
        ctx.sleep(Duration::from_millis(args.tick_millis)).await;
    }

    for station in &stations {
        station.shutdown();
    }

    info!(
        batches = published.load(Ordering::Relaxed),
        "simulation finished"
    );
}
