//! Result and error types for the core library

use std::fmt;

use thiserror::Error;

use super::Role;

/// Why a session credential was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialRejection {
    /// No credential was presented at all
    Missing,
    /// The credential could not be decoded
    Malformed,
    /// The signature did not verify against the process signing secret
    BadSignature,
    /// The credential's validity window has passed
    Expired,
}

impl fmt::Display for CredentialRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CredentialRejection::Missing => "missing",
            CredentialRejection::Malformed => "malformed",
            CredentialRejection::BadSignature => "bad signature",
            CredentialRejection::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Core library error type
///
/// Variants map one-to-one onto the externally visible failure kinds; see
/// [`Error::code`] for the stable machine-readable reason of each.
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown identity or wrong secret. Deliberately carries no detail.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthenticated: credential {0}")]
    Unauthenticated(CredentialRejection),

    #[error("Forbidden: requires role {required}")]
    Forbidden { required: Role },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Image unavailable: {0}")]
    ImageUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an upload failure
    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    /// Create an image-unavailable error
    pub fn image_unavailable(msg: impl Into<String>) -> Self {
        Self::ImageUnavailable(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidCredentials => "invalid_credentials",
            Error::Unauthenticated(CredentialRejection::Missing) => "missing_credential",
            Error::Unauthenticated(_) => "invalid_credential",
            Error::Forbidden { .. } => "forbidden",
            Error::Validation(_) => "validation_error",
            Error::UploadFailed(_) => "upload_failed",
            Error::NotFound(_) => "not_found",
            Error::ImageUnavailable(_) => "image_unavailable",
            Error::Storage(_) => "storage_error",
            Error::Conflict(_) => "conflict",
            Error::Config(_) | Error::Render(_) | Error::Io(_) | Error::Json(_) => {
                "internal_error"
            }
        }
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
