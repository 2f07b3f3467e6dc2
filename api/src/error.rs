use reqwest::StatusCode;
use serde::Deserialize;

/// Why a request to the complaint service failed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    #[error("service responded with {status}")]
    Status {
        status: StatusCode,
        /// The `msg` field of the error body, if the service sent one.
        message: Option<String>,
    },

    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ApiError {
    /// The human-readable message the service attached to an error response.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(error) => error.status(),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    pub msg: Option<String>,
}
