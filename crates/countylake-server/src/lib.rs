// Server mode - HTTP trigger for the pipeline
//
// One route runs the whole pipeline for the configured ingest date; the
// other two report liveness and storage readiness. Runs are synchronous
// with the request: the response carries the run summary or the error.

use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use countylake_config::RuntimeConfig;
use countylake_writer::{ErrorCode, PipelineError};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

mod handlers;
mod init;

use handlers::{health_check, process_bronze_to_silver, ready_check};
pub use init::init_tracing;

/// Where each request gets its configuration from
#[derive(Clone)]
pub enum ConfigSource {
    /// Reload from the environment (and the given file, if any) per request
    Environment { path: Option<PathBuf> },
    /// Use a fixed, already validated configuration
    Fixed(Arc<RuntimeConfig>),
}

impl ConfigSource {
    pub fn load(&self) -> Result<RuntimeConfig> {
        match self {
            ConfigSource::Environment { path: Some(path) } => {
                RuntimeConfig::load_from_file_path(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))
            }
            ConfigSource::Environment { path: None } => {
                RuntimeConfig::load().context("Failed to load configuration")
            }
            ConfigSource::Fixed(config) => Ok(config.as_ref().clone()),
        }
    }
}

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigSource,
}

/// Error type that implements IntoResponse
///
/// Pipeline errors keep their own code; anything else reached the handler
/// while loading configuration and is reported as `E006`.
pub(crate) struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    fn code(&self) -> ErrorCode {
        self.error
            .downcast_ref::<PipelineError>()
            .map(PipelineError::code)
            .unwrap_or(ErrorCode::E006InvalidConfig)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        error!(code = %code, "Request error: {:#}", self.error);
        (
            self.status,
            Json(json!({
                "status": "error",
                "code": code.as_str(),
                "message": format!("{:#}", self.error),
            })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.into(),
        }
    }
}

/// Build the router with all routes and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/process-bronze-to-silver",
            get(process_bronze_to_silver).post(process_bronze_to_silver),
        )
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

/// Entry point for server mode with a resolved startup configuration
///
/// `config` decides the listen address; each request loads its own
/// configuration from `source`.
pub async fn run_with_config(config: RuntimeConfig, source: ConfigSource) -> Result<()> {
    let addr = config.server.listen_addr.clone();
    info!(
        storage = %config.storage.mode,
        "Server mode - HTTP trigger for bronze → silver → gold"
    );

    let app = router(AppState { config: source });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("Routes:");
    info!("  GET|POST http://{}/api/process-bronze-to-silver - Run the pipeline", addr);
    info!("  GET      http://{}/health  - Health check", addr);
    info!("  GET      http://{}/ready   - Readiness check", addr);
    info!("Press Ctrl+C or send SIGTERM to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_keeps_its_code() {
        let err = AppError::from(PipelineError::missing_silver_input("special_education", "x"));
        assert_eq!(err.code(), ErrorCode::E004MissingSilverInput);
    }

    #[test]
    fn test_context_wrapped_pipeline_error_keeps_its_code() {
        let wrapped = anyhow::Error::new(PipelineError::not_found("bronze/x.csv"))
            .context("while running");
        let err = AppError::from(wrapped);
        assert_eq!(err.code(), ErrorCode::E001NotFound);
    }

    #[test]
    fn test_other_errors_are_config_errors() {
        let err = AppError::from(anyhow::anyhow!("bad toml"));
        assert_eq!(err.code(), ErrorCode::E006InvalidConfig);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_fixed_source_returns_config() {
        let source = ConfigSource::Fixed(Arc::new(RuntimeConfig::default()));
        assert_eq!(source.load().unwrap(), RuntimeConfig::default());
    }
}
