//! Login: identity + secret in, signed session credential out

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, SessionCredential};
use crate::ports::AccountStore;
use crate::services::{timeouts, SecretHasher, SessionSigner, Timeouts};

pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    hasher: Arc<SecretHasher>,
    signer: Arc<SessionSigner>,
    timeouts: Timeouts,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        hasher: Arc<SecretHasher>,
        signer: Arc<SessionSigner>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            accounts,
            hasher,
            signer,
            timeouts,
        }
    }

    /// Verify the secret and issue a credential carrying the account's role.
    ///
    /// Unknown identity and wrong secret both end in `InvalidCredentials`
    /// after the same amount of hashing work.
    pub async fn authenticate(&self, identity: &str, secret: &str) -> Result<SessionCredential> {
        let identity = Account::normalize_identity(identity);
        let account = timeouts::storage(
            self.timeouts.storage,
            self.accounts.find_account(&identity),
        )
        .await?;

        let hasher = Arc::clone(&self.hasher);
        let secret = secret.to_string();
        let stored_hash = account.as_ref().map(|a| a.secret_hash.clone());
        let verified = tokio::task::spawn_blocking(move || match stored_hash {
            Some(phc) => hasher.verify(&secret, &phc),
            None => hasher.verify_dummy(&secret),
        })
        .await
        .map_err(|e| Error::storage(format!("verification task failed: {}", e)))?;

        let account = match account {
            Some(account) if verified => account,
            _ => {
                tracing::info!("login rejected");
                return Err(Error::InvalidCredentials);
            }
        };

        let credential = self.signer.issue(&account.identity, account.role)?;
        tracing::info!(role = %account.role, "login succeeded");
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::duckdb::DuckDbRepository;
    use crate::domain::{Argon2Params, Role};

    async fn setup() -> AuthService {
        let repo = Arc::new(DuckDbRepository::open_in_memory().unwrap());
        repo.ensure_schema().unwrap();
        let hasher = Arc::new(SecretHasher::new(&Argon2Params::insecure_fast()).unwrap());
        let phc = hasher.hash("secret1").unwrap();
        repo.create_account(&Account::new("tech@example.com", phc, Role::Technician))
            .await
            .unwrap();
        let signer = Arc::new(SessionSigner::new(&[1u8; 32], 3600).unwrap());
        AuthService::new(repo, hasher, signer, Timeouts::default())
    }

    #[tokio::test]
    async fn test_valid_login_carries_account_role() {
        let auth = setup().await;
        let cred = auth.authenticate("tech@example.com", "secret1").await.unwrap();
        assert_eq!(cred.role, Role::Technician);
        assert_eq!(cred.identity, "tech@example.com");
    }

    #[tokio::test]
    async fn test_identity_is_normalized() {
        let auth = setup().await;
        assert!(auth.authenticate("  TECH@example.com", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_identity_and_wrong_secret_look_the_same() {
        let auth = setup().await;
        let wrong = auth.authenticate("tech@example.com", "nope").await.unwrap_err();
        let unknown = auth.authenticate("ghost@example.com", "secret1").await.unwrap_err();
        assert!(matches!(wrong, Error::InvalidCredentials));
        assert!(matches!(unknown, Error::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(wrong.code(), unknown.code());
    }
}
