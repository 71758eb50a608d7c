//! Typed errors and HTTP mapping.

use crate::response::{send, Envelope};
use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const MSG_BODY_TOO_LARGE: &str = "Request body too large.";
pub const MSG_BAD_BODY: &str = "Request body could not be read.";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Errors a handler can end with. The message is what the client sees.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    TooLarge(String),
    /// `public` goes to the client; `source` only to the log.
    #[error("{public}")]
    Internal {
        public: &'static str,
        #[source]
        source: BoxError,
    },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn internal(public: &'static str, source: impl Into<BoxError>) -> Self {
        AppError::Internal {
            public,
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body buffering failures from the form extractor, as JSON envelopes.
impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::TooLarge(MSG_BODY_TOO_LARGE.into())
        } else {
            tracing::debug!(error = %rejection.body_text(), "request body rejected");
            AppError::validation(MSG_BAD_BODY)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal { public, source } = &self {
            tracing::error!(error = %source, "{}", public);
        }
        send(status, Envelope::error(self.to_string())).into_response()
    }
}
