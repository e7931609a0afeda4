//! Core environment context trait for CPM stations.

use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, SystemTime};

/// The central interface for environment interaction.
///
/// This trait abstracts time and task spawning so the station runtime can
/// run against the production clock (tokio) or a simulated one.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`
/// - **Simulation**: a virtual clock owned by the test harness
#[async_trait]
pub trait V2xContext: Send + Sync + 'static {
    /// Returns the monotonic time since context creation.
    ///
    /// Used for internal timers and duration measurements.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time.
    ///
    /// Source for the generation-delta-time counter when the positioning
    /// subsystem does not supply one.
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
