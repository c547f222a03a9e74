//! Failure classification and HTTP error mapping.

use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::gemini::GeminiError;
use crate::image_input::ImageInputError;
use crate::wizard::WizardError;

pub const CREDENTIAL_FAILURE: &str =
    "Your API key seems to be invalid or has exceeded its quota. Please check your key and billing details.";
pub const GENERIC_FAILURE: &str = "An unexpected error occurred. Please try again.";

/// How a session-fatal provider failure is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bad key, missing permission, or exhausted quota.
    Credential,
    Generic,
}

impl FailureKind {
    pub fn classify(err: &GeminiError) -> Self {
        if let GeminiError::Status { status: 401 | 403 | 429, .. } = err {
            return FailureKind::Credential;
        }
        let text = err.to_string();
        let lower = text.to_lowercase();
        if lower.contains("api key") || lower.contains("permission denied") || text.contains("429") || text.contains("quota") {
            FailureKind::Credential
        } else {
            FailureKind::Generic
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            FailureKind::Credential => CREDENTIAL_FAILURE,
            FailureKind::Generic => GENERIC_FAILURE,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Upload(#[from] ImageInputError),
    #[error("{0}")]
    BadRequest(String),
    /// A path, body or multipart extractor refused the request.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),*) => {$(
        impl From<$rejection> for ApiError {
            fn from(rejection: $rejection) -> Self {
                ApiError::Rejected { status: rejection.status(), message: rejection.body_text() }
            }
        }
    )*};
}

impl_from_rejection!(JsonRejection, PathRejection, MultipartRejection);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Wizard(WizardError::InvalidTransition { .. } | WizardError::StillLoading) => StatusCode::CONFLICT,
            ApiError::Wizard(_) | ApiError::Upload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            tracing::debug!(%status, "request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
