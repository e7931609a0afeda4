//! Simulated single-hop broadcast radio with fault injection.

use async_trait::async_trait;
use cpm_env::{DataConfirm, DataRequest, EnvError, RxMetadata, StationId, V2xTransport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Internal message from a station radio to the central router.
#[derive(Debug)]
pub struct RadioMessage {
    pub from: StationId,
    pub request: DataRequest,
    pub payload: Vec<u8>,
}

/// Simulated radio interface for one station.
///
/// `request` hands the payload to the central router, which delivers it to
/// every other attached station (single-hop broadcast semantics). A jammed
/// radio declines outbound requests, mimicking a congested access layer.
pub struct SimRadio {
    /// This station's ID
    local_id: StationId,

    /// Declines outbound requests while set
    jammed: AtomicBool,

    /// Sender to central router
    tx: mpsc::Sender<RadioMessage>,

    /// Receiver for inbound packets (behind tokio mutex for async)
    rx: tokio::sync::Mutex<mpsc::Receiver<(RxMetadata, Vec<u8>)>>,
}

impl SimRadio {
    pub fn local_id(&self) -> StationId {
        self.local_id
    }

    /// Makes the access layer decline outbound requests.
    pub fn set_jammed(&self, jammed: bool) {
        self.jammed.store(jammed, Ordering::Release);
    }
}

#[async_trait]
impl V2xTransport for SimRadio {
    async fn request(
        &self,
        request: DataRequest,
        payload: Vec<u8>,
    ) -> Result<DataConfirm, EnvError> {
        if self.jammed.load(Ordering::Acquire) {
            return Ok(DataConfirm::rejected());
        }

        let msg = RadioMessage {
            from: self.local_id,
            request,
            payload,
        };
        self.tx
            .send(msg)
            .await
            .map_err(|_| EnvError::transport("radio router closed"))?;
        Ok(DataConfirm::accepted())
    }

    async fn recv(&self) -> Option<(RxMetadata, Vec<u8>)> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }
}

/// Fault-injection knobs for the simulated medium.
pub struct RadioController {
    /// Per-link latency in milliseconds
    link_latency: Mutex<HashMap<(StationId, StationId), u64>>,

    /// Per-link packet loss rate (0.0 - 1.0)
    link_loss: Mutex<HashMap<(StationId, StationId), f64>>,

    /// Loss applied to every link unless overridden
    default_loss: Mutex<f64>,

    /// Active partitions (stations that cannot communicate)
    partitions: Mutex<Vec<(Vec<StationId>, Vec<StationId>)>>,
}

impl RadioController {
    pub fn new() -> Self {
        Self {
            link_latency: Mutex::new(HashMap::new()),
            link_loss: Mutex::new(HashMap::new()),
            default_loss: Mutex::new(0.0),
            partitions: Mutex::new(Vec::new()),
        }
    }

    /// Sets latency for a specific link.
    pub fn set_latency(&self, from: StationId, to: StationId, latency_ms: u64) {
        let mut latencies = self.link_latency.lock().unwrap();
        latencies.insert((from, to), latency_ms);
    }

    /// Sets packet loss rate for a link.
    pub fn set_loss(&self, from: StationId, to: StationId, loss_rate: f64) {
        let mut losses = self.link_loss.lock().unwrap();
        losses.insert((from, to), loss_rate.clamp(0.0, 1.0));
    }

    /// Sets the loss rate applied to links without an override.
    pub fn set_default_loss(&self, loss_rate: f64) {
        *self.default_loss.lock().unwrap() = loss_rate.clamp(0.0, 1.0);
    }

    /// Creates a radio partition between two groups.
    pub fn partition(&self, group_a: Vec<StationId>, group_b: Vec<StationId>) {
        let mut partitions = self.partitions.lock().unwrap();
        partitions.push((group_a, group_b));
    }

    /// Heals all active partitions.
    pub fn heal_all(&self) {
        let mut partitions = self.partitions.lock().unwrap();
        partitions.clear();
    }

    /// Checks if two stations are in radio range (not partitioned).
    pub fn can_communicate(&self, from: StationId, to: StationId) -> bool {
        let partitions = self.partitions.lock().unwrap();

        for (group_a, group_b) in partitions.iter() {
            let from_in_a = group_a.contains(&from);
            let from_in_b = group_b.contains(&from);
            let to_in_a = group_a.contains(&to);
            let to_in_b = group_b.contains(&to);

            if (from_in_a && to_in_b) || (from_in_b && to_in_a) {
                return false;
            }
        }

        true
    }

    /// Gets the latency for a link (default 0).
    pub fn get_latency(&self, from: StationId, to: StationId) -> u64 {
        let latencies = self.link_latency.lock().unwrap();
        *latencies.get(&(from, to)).unwrap_or(&0)
    }

    /// Gets the loss rate for a link.
    pub fn get_loss(&self, from: StationId, to: StationId) -> f64 {
        let losses = self.link_loss.lock().unwrap();
        losses
            .get(&(from, to))
            .copied()
            .unwrap_or_else(|| *self.default_loss.lock().unwrap())
    }
}

impl Default for RadioController {
    fn default() -> Self {
        Self::new()
    }
}

/// Central broadcast router: one instance per simulated radio cell.
pub struct RadioRouter {
    tx: mpsc::Sender<RadioMessage>,
    inboxes: Arc<Mutex<HashMap<StationId, mpsc::Sender<(RxMetadata, Vec<u8>)>>>>,
    controller: Arc<RadioController>,
}

impl RadioRouter {
    /// Creates the router and spawns its delivery loop on the current
    /// tokio runtime.
    pub fn spawn(controller: Arc<RadioController>) -> Arc<Self> {
        let (tx, rx) = mpsc::channel::<RadioMessage>(1024);
        let inboxes = Arc::new(Mutex::new(HashMap::new()));

        let router = Arc::new(Self {
            tx,
            inboxes: inboxes.clone(),
            controller: controller.clone(),
        });

        tokio::spawn(Self::route_loop(rx, inboxes, controller));
        router
    }

    /// The cell's fault-injection controller.
    pub fn controller(&self) -> &Arc<RadioController> {
        &self.controller
    }

    /// Attaches a station to the cell and returns its radio.
    pub fn attach(&self, station: StationId) -> Arc<SimRadio> {
        let (inbox_tx, inbox_rx) = mpsc::channel(256);
        self.inboxes.lock().unwrap().insert(station, inbox_tx);

        Arc::new(SimRadio {
            local_id: station,
            jammed: AtomicBool::new(false),
            tx: self.tx.clone(),
            rx: tokio::sync::Mutex::new(inbox_rx),
        })
    }

    async fn route_loop(
        mut rx: mpsc::Receiver<RadioMessage>,
        inboxes: Arc<Mutex<HashMap<StationId, mpsc::Sender<(RxMetadata, Vec<u8>)>>>>,
        controller: Arc<RadioController>,
    ) {
        while let Some(msg) = rx.recv().await {
            // Snapshot receivers so the lock is not held across awaits
            let targets: Vec<(StationId, mpsc::Sender<(RxMetadata, Vec<u8>)>)> = inboxes
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, _)| **id != msg.from)
                .map(|(id, tx)| (*id, tx.clone()))
                .collect();

            for (to, inbox) in targets {
                if !controller.can_communicate(msg.from, to) {
                    continue;
                }
                let loss = controller.get_loss(msg.from, to);
                if loss > 0.0 && rand::random::<f64>() < loss {
                    debug!(from = %msg.from, to = %to, "packet lost");
                    continue;
                }

                let metadata = RxMetadata {
                    source: msg.from,
                    destination_port: msg.request.destination_port,
                };
                let payload = msg.payload.clone();
                let latency_ms = controller.get_latency(msg.from, to);

                if latency_ms == 0 {
                    let _ = inbox.send((metadata, payload)).await;
                } else {
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_millis(latency_ms)).await;
                        let _ = inbox.send((metadata, payload)).await;
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_partition() {
        let controller = RadioController::new();

        let a = StationId(1);
        let b = StationId(2);
        let c = StationId(3);

        // Initially all can communicate
        assert!(controller.can_communicate(a, b));
        assert!(controller.can_communicate(a, c));
        assert!(controller.can_communicate(b, c));

        // Partition: {a} vs {b, c}
        controller.partition(vec![a], vec![b, c]);

        assert!(!controller.can_communicate(a, b));
        assert!(!controller.can_communicate(a, c));
        assert!(controller.can_communicate(b, c));

        controller.heal_all();
        assert!(controller.can_communicate(a, b));
    }

    #[test]
    fn test_controller_loss_fallback() {
        let controller = RadioController::new();
        let a = StationId(1);
        let b = StationId(2);

        assert_eq!(controller.get_loss(a, b), 0.0);
        controller.set_default_loss(0.25);
        assert_eq!(controller.get_loss(a, b), 0.25);

        controller.set_loss(a, b, 0.5);
        assert_eq!(controller.get_loss(a, b), 0.5);
        // Reverse direction still uses the default
        assert_eq!(controller.get_loss(b, a), 0.25);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_but_sender() {
        let controller = Arc::new(RadioController::new());
        let router = RadioRouter::spawn(controller);

        let radio_a = router.attach(StationId(1));
        let radio_b = router.attach(StationId(2));
        let radio_c = router.attach(StationId(3));

        let confirm = radio_a
            .request(DataRequest::cpm_broadcast(), vec![1, 2, 3])
            .await
            .unwrap();
        assert!(confirm.accepted);

        let (meta_b, payload_b) = radio_b.recv().await.unwrap();
        let (meta_c, payload_c) = radio_c.recv().await.unwrap();
        assert_eq!(meta_b.source, StationId(1));
        assert_eq!(meta_c.source, StationId(1));
        assert_eq!(payload_b, vec![1, 2, 3]);
        assert_eq!(payload_c, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_jammed_radio_declines() {
        let controller = Arc::new(RadioController::new());
        let router = RadioRouter::spawn(controller);
        let radio = router.attach(StationId(1));

        radio.set_jammed(true);
        let confirm = radio
            .request(DataRequest::cpm_broadcast(), vec![0])
            .await
            .unwrap();
        assert!(!confirm.accepted);
    }

    #[tokio::test]
    async fn test_partitioned_station_receives_nothing() {
        let controller = Arc::new(RadioController::new());
        let router = RadioRouter::spawn(controller.clone());

        let radio_a = router.attach(StationId(1));
        let radio_b = router.attach(StationId(2));

        controller.partition(vec![StationId(1)], vec![StationId(2)]);
        radio_a
            .request(DataRequest::cpm_broadcast(), vec![9])
            .await
            .unwrap();

        let outcome =
            tokio::time::timeout(Duration::from_millis(50), radio_b.recv()).await;
        assert!(outcome.is_err(), "expected no delivery across partition");
    }
}
