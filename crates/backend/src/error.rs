// =============================================================================
// Somoco Backend - Error Types
// =============================================================================

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use somoco_common::{ApiResponse, ValidationError};

use crate::cms::CmsError;
use crate::mail::MailError;

/// Error returned by every handler. Rendered as the `{success: false, error}`
/// envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Bad username/password. Never says which part was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{context}: {source}")]
    Cms {
        context: &'static str,
        #[source]
        source: CmsError,
    },

    #[error("{context}: {source}")]
    Mail {
        context: &'static str,
        #[source]
        source: MailError,
    },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Wrap a CMS failure with what the handler was trying to do.
    pub fn cms(context: &'static str) -> impl FnOnce(CmsError) -> ApiError {
        move |source| ApiError::Cms { context, source }
    }

    pub fn mail(context: &'static str) -> impl FnOnce(MailError) -> ApiError {
        move |source| ApiError::Mail { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Cms { .. } | ApiError::Mail { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Malformed requests are client errors whatever axum's own status would be.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Cms { source, .. } => tracing::error!("CMS error: {:?}", source),
            ApiError::Mail { source, .. } => tracing::error!("Mail error: {:?}", source),
            ApiError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            _ => {}
        }

        let body = Json(ApiResponse::<()>::err(self.to_string()));
        (status, body).into_response()
    }
}
