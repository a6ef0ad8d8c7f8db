// HTTP request handlers
//
// The trigger runs one full pipeline per request. Configuration is reloaded
// and a fresh store opened each time, so nothing carries over between runs.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::{info, warn};

use countylake_writer::{open_store, run_pipeline, PipelineContext};

use crate::{AppError, AppState};

/// GET|POST /api/process-bronze-to-silver - run bronze → silver → gold
pub(crate) async fn process_bronze_to_silver(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let config = state.config.load()?;
    let ctx = PipelineContext::from_config(&config)?;
    info!(ingest_date = %ctx.ingest_date, backend = ctx.store.backend(), "Pipeline triggered");

    let summary = run_pipeline(&ctx).await?;
    Ok((
        StatusCode::OK,
        Json(json!({"status": "ok", "outputs": summary})),
    ))
}

/// GET /health - Basic health check
pub(crate) async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}

/// GET /ready - Readiness check (includes storage connectivity)
pub(crate) async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let probe = async {
        let config = state.config.load()?;
        let store = open_store(&config.storage)?;
        store.probe().await?;
        anyhow::Ok(store.backend())
    };

    match probe.await {
        Ok(backend) => (
            StatusCode::OK,
            Json(json!({"status": "ready", "storage": backend})),
        ),
        Err(e) => {
            warn!("Storage readiness check failed: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "not ready", "error": e.to_string()})),
            )
        }
    }
}
