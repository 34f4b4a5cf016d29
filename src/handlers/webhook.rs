use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use super::AppState;
use crate::ingest::{ingest_body, IngestOutcome};

/// Handle a GitLab webhook delivery
///
/// Always acknowledges with 200, whether the event was tracked, removed or skipped.
pub async fn handle_webhook(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let outcome = ingest_body(&state.store, &body, Utc::now());

    if let IngestOutcome::Tracked(key) = outcome {
        tracing::debug!(key = %key, tracked_entities = state.store.len(), "Webhook accepted");
    }

    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EntityKey;
    use crate::store::EventStore;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::Arc;

    fn test_state() -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            store: Arc::new(EventStore::new(chrono::Duration::hours(6))),
            metrics_handle: Arc::new(recorder.handle()),
        }
    }

    #[tokio::test]
    async fn test_webhook_tracks_running_pipeline() {
        let state = test_state();
        let body = Bytes::from_static(
            br#"{
                "object_kind": "pipeline",
                "object_attributes": {
                    "id": 9, "ref": "main", "status": "running",
                    "created_at": "2024-05-01 10:00:00 UTC", "finished_at": null
                },
                "project": { "path_with_namespace": "group/app" }
            }"#,
        );

        let response = handle_webhook(State(state.clone()), body).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.store.get(&EntityKey::pipeline(9)).is_some());
    }

    #[tokio::test]
    async fn test_webhook_acknowledges_garbage() {
        let state = test_state();

        let response = handle_webhook(State(state.clone()), Bytes::from_static(b"{oops"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.store.is_empty());
    }
}
