//! Batch download endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::handlers::ErrorResponse;
use crate::metrics::ADMISSION_REJECTED_TOTAL;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadResponse {
    /// Decoded body per URL.
    pub responses: HashMap<String, Value>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

/// POST a JSON array of URLs, get every decoded body back keyed by URL.
pub async fn download(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let Json(urls) = payload.map_err(|rejection| {
        debug!("Rejected download body: {}", rejection);
        api_error(StatusCode::UNPROCESSABLE_ENTITY, "unprocessable entity")
    })?;

    let max = state.config().server.max_urls_per_batch;
    if urls.is_empty() || urls.len() > max {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("urls count must be in range of 1 and {}", max),
        ));
    }

    let Some(_permit) = state.limiter().try_admit() else {
        ADMISSION_REJECTED_TOTAL.inc();
        warn!(
            max = state.limiter().max(),
            "Rejecting batch, admission limit reached"
        );
        return Err(api_error(
            StatusCode::TOO_MANY_REQUESTS,
            "max number of concurrent batches reached",
        ));
    };

    let responses = state
        .downloader()
        .download(state.shutdown_token(), urls)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(DownloadResponse {
        responses: responses
            .into_iter()
            .map(|response| (response.url, response.value))
            .collect(),
    }))
}
