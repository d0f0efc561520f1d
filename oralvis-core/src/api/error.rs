//! Error to HTTP response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::result::{CredentialRejection, Error};

/// Wraps a core error so handlers can use `?`
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Unauthenticated(CredentialRejection::Missing) => StatusCode::UNAUTHORIZED,
            Error::Unauthenticated(_) | Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::ImageUnavailable(_) => StatusCode::BAD_GATEWAY,
            Error::UploadFailed(_)
            | Error::Storage(_)
            | Error::Config(_)
            | Error::Render(_)
            | Error::Io(_)
            | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short caller-facing text; internal details stay in the logs
    fn public_message(&self) -> String {
        match &self.0 {
            Error::InvalidCredentials => "Invalid credentials".to_string(),
            Error::Unauthenticated(CredentialRejection::Missing) => {
                "A Bearer credential is required".to_string()
            }
            Error::Unauthenticated(_) => "Credential is invalid or expired".to_string(),
            Error::Forbidden { required } => format!("Requires the {} role", required),
            Error::Validation(msg) | Error::Conflict(msg) => msg.clone(),
            Error::NotFound(_) => "Not found".to_string(),
            Error::UploadFailed(_) => "Image upload failed".to_string(),
            Error::ImageUnavailable(_) => "Scan image is unavailable".to_string(),
            Error::Storage(_) => "Storage error".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();
        if status.is_server_error() {
            tracing::error!(code, error = %self.0, "request failed");
        } else {
            tracing::debug!(code, "request rejected");
        }

        let body = json!({
            "error": code,
            "message": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}
