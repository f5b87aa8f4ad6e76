use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde::Serialize;
use teloxide::types::{Update, UpdateKind};
use url::Url;

use crate::app::Lifecycle;
use crate::commands::Dispatch;
use crate::config::{Config, WEBHOOK_PATH};
use crate::error::AppError;

pub const HEALTH_TEXT: &str = "Simple bot is running.";

/// JSON body returned by the webhook route.
#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusBody {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: Some(message.into()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lifecycle: Arc<Lifecycle>,
}

impl AppState {
    pub fn new(config: Config, lifecycle: Lifecycle) -> Self {
        Self {
            config: Arc::new(config),
            lifecycle: Arc::new(lifecycle),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route(WEBHOOK_PATH, post(webhook))
        .route("/set_webhook", get(set_webhook))
        .with_state(state)
}

pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = state.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn health() -> &'static str {
    HEALTH_TEXT
}

/// POST /api - receives one update from Telegram. Failures never escape:
/// they are logged and turned into a JSON error body.
async fn webhook(State(state): State<AppState>, body: Bytes) -> Response {
    match process_update(&state, &body).await {
        Ok(outcome) => {
            info!("Webhook processed successfully ({outcome:?})");
            Json(StatusBody::ok()).into_response()
        }
        Err(err) => {
            error!("Error in webhook: {err:?}");
            err.into_response()
        }
    }
}

async fn process_update(state: &AppState, body: &[u8]) -> Result<Dispatch, AppError> {
    let app = state.lifecycle.application()?;
    let update = parse_update(body)?;

    let outcome = app.session().dispatch(&update).await?;

    Ok(outcome)
}

/// teloxide falls back to `UpdateKind::Error` for payloads that don't match
/// any known update shape; those are malformed input, not updates to skip.
fn parse_update(body: &[u8]) -> Result<Update, AppError> {
    let update: Update = serde_json::from_slice(body)?;

    match update.kind {
        UpdateKind::Error(payload) => Err(AppError::UnrecognizedUpdate(payload)),
        _ => Ok(update),
    }
}

/// GET /set_webhook - points Telegram at this deployment. Run once per deploy.
async fn set_webhook(State(state): State<AppState>) -> (StatusCode, String) {
    match register_webhook(&state).await {
        Ok(url) => {
            info!("Webhook set to {url}");
            (StatusCode::OK, format!("Webhook set successfully to {url}"))
        }
        Err(err @ AppError::RegistrationRejected) => {
            error!("Webhook setup failed.");
            (err.status_code(), err.to_string())
        }
        Err(err) => {
            error!("Error in set_webhook: {err:?}");
            (err.status_code(), format!("Error: {err}"))
        }
    }
}

async fn register_webhook(state: &AppState) -> Result<Url, AppError> {
    let url = state.config.webhook_url()?;
    let app = state.lifecycle.application()?;

    if !app.session().register_webhook(&url).await? {
        return Err(AppError::RegistrationRejected);
    }

    Ok(url)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {err}");
                wait_for_ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await;
    }

    info!("Shutting down");
}

async fn wait_for_ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // Without a handler the server runs until killed.
        warn!("Failed to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}
