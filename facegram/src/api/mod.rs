pub mod image;
pub mod rest;
pub mod types;

use crate::feed::FetchError;
use std::collections::BTreeMap;
use thiserror::Error;

pub use rest::FacegramRest;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    /// 422 with per-field messages.
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, Vec<String>>,
    },
    /// The request could not be built; nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("malformed response ({status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::Server { status, .. } | ApiError::Decode { status, .. } => Some(*status),
            ApiError::Validation { .. } => Some(422),
            ApiError::InvalidRequest(_) => None,
        }
    }

    /// Text suitable for showing to the user. Validation errors list every
    /// field message on its own line.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation { message, errors } => {
                let lines: Vec<&str> = errors.values().flatten().map(String::as_str).collect();
                if lines.is_empty() {
                    message.clone()
                } else {
                    lines.join("\n")
                }
            }
            ApiError::Server { message, .. } | ApiError::InvalidRequest(message) => message.clone(),
            ApiError::Network(_) => "Could not reach the server. Please try again.".to_string(),
            ApiError::Decode { .. } => "The server sent an unexpected response.".to_string(),
        }
    }
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(e) => FetchError::Network(e.to_string()),
            ApiError::Server { status, message } => FetchError::Server { status, message },
            ApiError::Validation { message, .. } => FetchError::Server {
                status: 422,
                message,
            },
            ApiError::InvalidRequest(message) => FetchError::Server {
                status: 400,
                message,
            },
            ApiError::Decode { status, source } => FetchError::Server {
                status,
                message: format!("malformed response: {}", source),
            },
        }
    }
}
