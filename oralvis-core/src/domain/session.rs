//! Session credential model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// Signed claims carried inside a session credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account identity
    pub sub: String,
    pub role: Role,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// A freshly issued credential, returned to the client after login
#[derive(Debug, Clone)]
pub struct SessionCredential {
    pub token: String,
    pub identity: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
