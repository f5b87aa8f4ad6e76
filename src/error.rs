use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::client::ClientError;
use crate::server::StatusBody;

/// Why the bot application could not be constructed at startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InitError {
    #[error("TELEGRAM_TOKEN environment variable is not set")]
    MissingToken,

    #[error("TELEGRAM_TOKEN is malformed, expected `<bot id>:<secret>`")]
    MalformedToken,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

/// Everything a route can fail with. Each variant maps to its own 5xx status
/// so failures stay distinguishable in logs and responses.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bot is not initialized: {0}")]
    NotInitialized(InitError),

    #[error("failed to parse update: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("failed to parse update: unrecognized payload {0}")]
    UnrecognizedUpdate(serde_json::Value),

    #[error("bot backend call failed: {0}")]
    Backend(#[from] ClientError),

    #[error("{0} environment variable is not set.")]
    MissingConfig(&'static str),

    #[error("invalid webhook url {url:?}: {source}")]
    InvalidWebhookUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Webhook setup failed.")]
    RegistrationRejected,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotInitialized(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Backend(ClientError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Deserialize(_)
            | Self::UnrecognizedUpdate(_)
            | Self::MissingConfig(_)
            | Self::InvalidWebhookUrl { .. }
            | Self::RegistrationRejected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = StatusBody::error(self.to_string());

        (self.status_code(), Json(body)).into_response()
    }
}
