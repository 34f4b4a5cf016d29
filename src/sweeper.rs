//! Background sweep task for the event store
//!
//! Evicts entries whose TTL elapsed without a refreshing event.

use crate::metrics;
use crate::signals::ShutdownSignal;
use crate::store::EventStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

/// Sweep configuration
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    /// How often expired entries are removed
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// Spawn the background sweep task
///
/// The task runs until a shutdown signal is broadcast or the sender is dropped.
pub fn spawn_sweep_task(
    store: Arc<EventStore>,
    config: SweepConfig,
    shutdown_rx: broadcast::Receiver<ShutdownSignal>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        sweep_loop(store, config, shutdown_rx).await;
    })
}

/// Main sweep loop
async fn sweep_loop(
    store: Arc<EventStore>,
    config: SweepConfig,
    mut shutdown_rx: broadcast::Receiver<ShutdownSignal>,
) {
    let mut interval = time::interval(config.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_sweep_now(&store, Utc::now());
            }
            _ = shutdown_rx.recv() => {
                tracing::debug!("Sweep task stopping");
                break;
            }
        }
    }
}

/// Run one sweep pass at `now`
///
/// Returns the number of evicted entries.
pub fn run_sweep_now(store: &EventStore, now: DateTime<Utc>) -> usize {
    let evicted = store.sweep(now);
    let remaining = store.len();

    metrics::update_tracked_entities(remaining);

    if evicted > 0 {
        metrics::record_evicted(evicted);
        tracing::info!(evicted, remaining, "Evicted expired cache entries");
    } else {
        tracing::trace!(remaining, "Sweep completed");
    }

    evicted
}
