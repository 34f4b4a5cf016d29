use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;

use super::AppState;
use crate::{error::AppError, metrics::render_scrape};

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Handle the scrape endpoint
///
/// Builds a fresh snapshot of the store on every request.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = tokio::task::spawn_blocking(move || {
        render_scrape(&state.store, &state.metrics_handle, Utc::now())
    })
    .await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        body,
    ))
}
