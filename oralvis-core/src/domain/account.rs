//! Account domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Role carried by an account and by every session credential issued for it.
///
/// Authorization compares against a declared required role, so adding a
/// variant here does not touch any call site that gates on an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Technician,
    Dentist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Technician => "Technician",
            Role::Dentist => "Dentist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    /// Case-insensitive, so CLI input like `dentist` works
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "technician" => Ok(Role::Technician),
            "dentist" => Ok(Role::Dentist),
            other => Err(Error::validation(format!("unknown role: {}", other))),
        }
    }
}

/// A provisioned login. The secret is only ever held as an argon2 PHC string.
#[derive(Debug, Clone)]
pub struct Account {
    pub identity: String,
    pub secret_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(identity: impl Into<String>, secret_hash: impl Into<String>, role: Role) -> Self {
        Self {
            identity: Self::normalize_identity(&identity.into()),
            secret_hash: secret_hash.into(),
            role,
            created_at: Utc::now(),
        }
    }

    /// Identities are compared trimmed and lowercased (they are email addresses)
    pub fn normalize_identity(identity: &str) -> String {
        identity.trim().to_lowercase()
    }

    /// Public view without the hash
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            identity: self.identity.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Account listing entry, safe to print or serialize
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub identity: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Account to provision at startup or on reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAccount {
    pub identity: String,
    pub secret: String,
    pub role: Role,
}
