use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use batchfetch_core::{AdmissionStatus, Config, DispatchStrategy};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

#[derive(Debug, Serialize)]
pub struct DownloaderStatus {
    pub fetcher: String,
    pub workers: usize,
    pub dispatch: DispatchStrategy,
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub admission: AdmissionStatus,
    pub downloader: DownloaderStatus,
    pub shutting_down: bool,
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let downloader = state.downloader();
    let config = downloader.config();
    Json(StatusResponse {
        admission: state.limiter().status(),
        downloader: DownloaderStatus {
            fetcher: downloader.fetcher_name().to_string(),
            workers: config.workers,
            dispatch: config.dispatch,
            fetch_timeout_ms: config.fetch_timeout_ms,
        },
        shutting_down: state.shutdown_token().is_cancelled(),
    })
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

pub async fn method_not_allowed() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::new("method not allowed")),
    )
}

pub async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("not found")))
}
