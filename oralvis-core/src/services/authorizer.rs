//! Role gate in front of every data-returning operation

use std::sync::Arc;

use crate::domain::result::{CredentialRejection, Error, Result};
use crate::domain::{Principal, Role};
use crate::services::SessionSigner;

pub struct Authorizer {
    signer: Arc<SessionSigner>,
}

impl Authorizer {
    pub fn new(signer: Arc<SessionSigner>) -> Self {
        Self { signer }
    }

    /// Accept `credential` only if it verifies, is unexpired, and carries `required`.
    ///
    /// Stateless: no lookup happens, so a rejection says nothing about
    /// whichever resource the caller was after.
    pub fn authorize(&self, credential: Option<&str>, required: Role) -> Result<Principal> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(Error::Unauthenticated(CredentialRejection::Missing))?;

        let claims = self.signer.verify(token).map_err(|e| {
            tracing::debug!(code = e.code(), "credential rejected");
            e
        })?;

        if claims.role != required {
            tracing::debug!(role = %claims.role, required = %required, "role mismatch");
            return Err(Error::Forbidden { required });
        }

        Ok(Principal::new(claims.sub, claims.role))
    }
}
