use crate::snapshot::{build_observations, Gauge, Observation};
use crate::store::EventStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge, Label};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the global Prometheus recorder for process-level metrics
///
/// Entity gauges are not recorded here; they are rebuilt on every scrape by
/// [`render_observations`].
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "gitlab_exporter_events_total",
        "Webhook events received, by kind and outcome"
    );
    describe_gauge!(
        "gitlab_exporter_tracked_entities",
        "Pipelines and jobs currently held in the cache"
    );
    describe_counter!(
        "gitlab_exporter_evicted_total",
        "Cache entries removed after their TTL elapsed"
    );
    describe_gauge!(
        "gitlab_exporter_info",
        "Exporter version information"
    );

    gauge!("gitlab_exporter_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record an ingested webhook event
pub fn record_event(kind: &'static str, outcome: &'static str) {
    counter!(
        "gitlab_exporter_events_total",
        "kind" => kind,
        "outcome" => outcome,
    )
    .increment(1);
}

/// Update the number of cached entities
pub fn update_tracked_entities(count: usize) {
    gauge!("gitlab_exporter_tracked_entities").set(count as f64);
}

/// Record entries evicted by a sweep
pub fn record_evicted(count: usize) {
    counter!("gitlab_exporter_evicted_total").increment(count as u64);
}

/// Render an observation set into Prometheus exposition text
///
/// A new recorder is built for every call, so samples from a previous read
/// never leak into this one. Observations without a value are omitted.
pub fn render_observations(observations: &[Observation]) -> String {
    let recorder = PrometheusBuilder::new().build_recorder();

    metrics::with_local_recorder(&recorder, || {
        for g in Gauge::ALL {
            describe_gauge!(g.name(), g.help());
        }

        for observation in observations {
            let Some(value) = observation.value else {
                continue;
            };

            let labels: Vec<Label> = observation
                .labels
                .iter()
                .map(|(name, label_value)| Label::new(*name, label_value.clone()))
                .collect();

            gauge!(observation.gauge.name(), labels).set(value);
        }
    });

    recorder.handle().render()
}

/// Build the full scrape body: entity gauges followed by process metrics
pub fn render_scrape(store: &EventStore, process: &PrometheusHandle, now: DateTime<Utc>) -> String {
    let entries = store.snapshot();
    update_tracked_entities(entries.len());

    let observations = build_observations(&entries, now);
    tracing::debug!(
        entries = entries.len(),
        observations = observations.len(),
        "Built metrics snapshot"
    );

    let mut body = render_observations(&observations);
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }
    body.push_str(&process.render());
    body
}
