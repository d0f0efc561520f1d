//! Session credential signing (HS256 JWT)

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::domain::result::{CredentialRejection, Error, Result};
use crate::domain::{Role, SessionClaims, SessionCredential};

/// Shortest signing secret accepted, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Default credential lifetime
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Issues and verifies session credentials with a process-wide secret
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionSigner {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(Error::config(format!(
                "signing secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if ttl_secs == 0 {
            return Err(Error::config("session lifetime must be positive"));
        }
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| Error::config("session lifetime too large"))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, identity: &str, role: Role) -> Result<SessionCredential> {
        self.issue_at(identity, role, Utc::now())
    }

    /// Issue a credential as if the current time were `now`
    pub fn issue_at(
        &self,
        identity: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<SessionCredential> {
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub: identity.to_string(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::config(format!("failed to sign credential: {}", e)))?;

        Ok(SessionCredential {
            token,
            identity: claims.sub,
            role,
            issued_at: now,
            expires_at,
        })
    }

    /// Check signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => CredentialRejection::Expired,
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        CredentialRejection::BadSignature
                    }
                    _ => CredentialRejection::Malformed,
                };
                Error::Unauthenticated(reason)
            })
    }
}
