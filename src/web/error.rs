//! Request-surface error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::warn;
use serde_json::json;

use crate::app::ports::TagError;
use crate::error::Error;

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum WebError {
    /// Tag unreadable (503) or not on the allow-list (401).
    Credential(TagError),
    UnknownRoom(usize),
    /// Form fields missing or of the wrong type.
    BadRequest(String),
    /// `/sync` with mirroring disabled.
    MirrorDisabled,
    Internal(String),
}

impl WebError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Credential(TagError::NotAllowed) => StatusCode::UNAUTHORIZED,
            Self::Credential(_) | Self::MirrorDisabled => StatusCode::SERVICE_UNAVAILABLE,
            Self::UnknownRoom(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl core::fmt::Display for WebError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Credential(e) => write!(f, "{}", e),
            Self::UnknownRoom(id) => write!(f, "unknown room {}", id),
            Self::BadRequest(msg) => write!(f, "bad request: {}", msg),
            Self::MirrorDisabled => write!(f, "remote mirror is not configured"),
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl From<Error> for WebError {
    fn from(e: Error) -> Self {
        match e {
            Error::UnknownRoom(id) => Self::UnknownRoom(id),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<TagError> for WebError {
    fn from(e: TagError) -> Self {
        Self::Credential(e)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("web: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
