//! HTTP handlers
//!
//! - webhook: GitLab pipeline/job event intake
//! - metrics_handler: Prometheus scrape endpoint
//! - health: liveness probe

pub mod health;
pub mod metrics_handler;
pub mod webhook;

use crate::store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EventStore>,
    pub metrics_handle: Arc<PrometheusHandle>,
}
