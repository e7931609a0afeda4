//! Station runtime - wires the stack, codec and schedule to the transport.
//!
//! # Architecture
//!
//! ```text
//! perception feed ──> ObjectStack ──(tick)──> CpmEncoder ──> V2xTransport
//! positioning    ──>     │                                       │
//!                        │<── replace ── CpmDecoder <── recv ────┘
//!                        └──> PerceptionSink (downstream fusion)
//! ```
//!
//! Generic over the context, transport and sink implementations, so the
//! same station runs against the production stack or a simulated radio.

use crate::decoder::CpmDecoder;
use crate::encoder::CpmEncoder;
use crate::error::CpmError;
use crate::scheduler::PeriodicTask;
use crate::stack::{ObjectStack, RawPerception, ReceivedObject};
use cpm_env::{DataRequest, PerceptionSink, StationId, V2xContext, V2xTransport};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Static configuration for one station.
#[derive(Debug, Clone)]
pub struct StationConfig {
    /// Station identity carried in every PDU header, constant for the
    /// vehicle's lifetime.
    pub station_id: StationId,

    /// Transmit period.
    pub tx_interval: Duration,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            station_id: StationId(1),
            tx_interval: Duration::from_millis(1000),
        }
    }
}

/// A running CPM station: periodic transmit plus inbound interpretation.
pub struct CpmStation<T, S>
where
    T: V2xTransport,
    S: PerceptionSink<Arc<Vec<ReceivedObject>>>,
{
    config: StationConfig,
    transport: Arc<T>,
    sink: Arc<S>,
    stack: Arc<ObjectStack>,
    encoder: CpmEncoder,
    decoder: CpmDecoder,
    tx_task: Mutex<Option<PeriodicTask>>,
}

impl<T, S> CpmStation<T, S>
where
    T: V2xTransport,
    S: PerceptionSink<Arc<Vec<ReceivedObject>>>,
{
    /// Starts the station: arms the transmit schedule and the receive loop.
    pub fn spawn<C: V2xContext>(
        config: StationConfig,
        ctx: Arc<C>,
        transport: Arc<T>,
        sink: Arc<S>,
    ) -> Arc<Self> {
        let station = Arc::new(Self {
            encoder: CpmEncoder::new(config.station_id),
            decoder: CpmDecoder::new(),
            config,
            transport,
            sink,
            stack: Arc::new(ObjectStack::new()),
            tx_task: Mutex::new(None),
        });

        info!(station = %station.config.station_id, "cpm station started");

        let tx_station = station.clone();
        let task = PeriodicTask::spawn(
            ctx.clone(),
            "cpm-tx",
            station.config.tx_interval,
            move || {
                let station = tx_station.clone();
                async move {
                    if let Err(err) = station.send_cycle().await {
                        warn!(%err, "cpm transmission failed");
                    }
                }
            },
        );
        *station.tx_task.lock().unwrap() = Some(task);

        let rx_station = station.clone();
        ctx.spawn("cpm-rx", async move {
            rx_station.run_rx_loop().await;
        });

        station
    }

    /// Perception feed: replaces the outbound snapshot unless an encode is
    /// in progress, in which case the batch is dropped and `Skipped`
    /// reported back.
    pub fn update_objects(&self, raw: &[RawPerception]) -> Result<usize, CpmError> {
        self.stack.rebuild_outbound(raw)
    }

    /// Positioning feed, forwarded to the ego cache.
    pub fn update_grid_position(&self, x: f64, y: f64) {
        self.stack.update_grid_position(x, y);
    }

    pub fn update_reference_position(&self, latitude: f64, longitude: f64, altitude: f64) {
        self.stack.update_reference_position(latitude, longitude, altitude);
    }

    pub fn update_heading(&self, heading_rad: f64) {
        self.stack.update_heading(heading_rad);
    }

    pub fn update_generation_delta_time(&self, millis: u16) {
        self.stack.update_generation_delta_time(millis);
    }

    /// Reschedules the transmit period; effective from the next tick.
    pub fn set_interval(&self, interval: Duration) {
        if let Some(task) = self.tx_task.lock().unwrap().as_ref() {
            task.set_interval(interval);
        }
    }

    /// Stops the transmit schedule. The receive loop ends when the
    /// transport closes.
    pub fn shutdown(&self) {
        if let Some(task) = self.tx_task.lock().unwrap().as_ref() {
            task.cancel();
        }
    }

    /// The station's object stack (test and integration access).
    pub fn stack(&self) -> &Arc<ObjectStack> {
        &self.stack
    }

    /// One encode-and-send cycle.
    ///
    /// The encode guard is held across the transport hand-off, so
    /// perception updates arriving meanwhile skip rather than mutate the
    /// snapshot under the encoder. A declined confirm is fatal for this
    /// cycle only; the schedule simply tries again next tick.
    async fn send_cycle(&self) -> Result<(), CpmError> {
        let guard = self.stack.begin_encode();
        let ego = self.stack.ego_state();
        let snapshot = guard.snapshot();

        let message = self.encoder.encode(&ego, &snapshot);
        let payload = message.to_bytes()?;
        info!(
            station = %self.config.station_id,
            objects = snapshot.objects.len(),
            "tx cpm"
        );

        let confirm = self
            .transport
            .request(DataRequest::cpm_broadcast(), payload)
            .await
            .map_err(|err| {
                warn!(%err, "transport unavailable");
                CpmError::SendRejected
            })?;

        if !confirm.accepted {
            return Err(CpmError::SendRejected);
        }
        Ok(())
    }

    /// Pulls inbound packets until the transport closes.
    ///
    /// Undecodable packets are dropped silently at the protocol level -
    /// observable only in logs. A successful decode atomically replaces
    /// the inbound collection and publishes it downstream immediately.
    async fn run_rx_loop(&self) {
        while let Some((metadata, raw)) = self.transport.recv().await {
            match self.decoder.decode(&raw) {
                Ok(objects) => {
                    debug!(
                        source = %metadata.source,
                        objects = objects.len(),
                        "rx cpm"
                    );
                    let published = self.stack.replace_inbound(objects);
                    self.sink.publish(published);
                }
                Err(err) => {
                    debug!(source = %metadata.source, %err, "dropping packet");
                }
            }
        }
        debug!("transport closed, rx loop ending");
    }
}
