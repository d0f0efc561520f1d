//! Account provisioning (operator side; no HTTP endpoint)

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, AccountSummary, Role, SeedAccount};
use crate::ports::AccountStore;
use crate::services::SecretHasher;

/// Shortest secret accepted when provisioning
pub const MIN_SECRET_CHARS: usize = 6;

pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    hasher: Arc<SecretHasher>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountStore>, hasher: Arc<SecretHasher>) -> Self {
        Self { accounts, hasher }
    }

    /// Create one account. The identity must not exist yet.
    pub async fn create_account(
        &self,
        identity: &str,
        secret: &str,
        role: Role,
    ) -> Result<AccountSummary> {
        let identity = Account::normalize_identity(identity);
        if identity.is_empty() {
            return Err(Error::validation("identity must not be empty"));
        }
        if secret.chars().count() < MIN_SECRET_CHARS {
            return Err(Error::validation(format!(
                "secret must be at least {} characters",
                MIN_SECRET_CHARS
            )));
        }

        let hasher = Arc::clone(&self.hasher);
        let secret = secret.to_string();
        let secret_hash = tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| Error::storage(format!("hashing task failed: {}", e)))??;

        let account = Account::new(identity, secret_hash, role);
        self.accounts.create_account(&account).await?;
        tracing::info!(role = %role, "account created");
        Ok(account.summary())
    }

    /// Insert each seed account that does not exist yet; returns how many were created
    pub async fn seed(&self, seeds: &[SeedAccount]) -> Result<usize> {
        let mut created = 0;
        for seed in seeds {
            let identity = Account::normalize_identity(&seed.identity);
            if self.accounts.find_account(&identity).await?.is_some() {
                continue;
            }
            match self.create_account(&identity, &seed.secret, seed.role).await {
                Ok(_) => created += 1,
                // Another process seeded it first
                Err(Error::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }
        if created > 0 {
            tracing::info!(created, "seed accounts provisioned");
        }
        Ok(created)
    }

    /// Remove every account, then seed. Scans are not touched.
    pub async fn reset(&self, seeds: &[SeedAccount]) -> Result<usize> {
        let removed = self.accounts.delete_all_accounts().await?;
        tracing::warn!(removed, "all accounts removed");
        self.seed(seeds).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
        Ok(self
            .accounts
            .list_accounts()
            .await?
            .iter()
            .map(Account::summary)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::duckdb::DuckDbRepository;
    use crate::domain::Argon2Params;

    fn service() -> AccountService {
        let repo = Arc::new(DuckDbRepository::open_in_memory().unwrap());
        repo.ensure_schema().unwrap();
        let hasher = Arc::new(SecretHasher::new(&Argon2Params::insecure_fast()).unwrap());
        AccountService::new(repo, hasher)
    }

    fn seeds() -> Vec<SeedAccount> {
        vec![
            SeedAccount {
                identity: "tech@example.com".into(),
                secret: "secret1".into(),
                role: Role::Technician,
            },
            SeedAccount {
                identity: "doc@example.com".into(),
                secret: "secret2".into(),
                role: Role::Dentist,
            },
        ]
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let svc = service();
        assert!(matches!(
            svc.create_account("  ", "longenough", Role::Dentist).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            svc.create_account("a@example.com", "short", Role::Dentist).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_created_secret_verifies_against_stored_hash() {
        let repo = Arc::new(DuckDbRepository::open_in_memory().unwrap());
        repo.ensure_schema().unwrap();
        let hasher = Arc::new(SecretHasher::new(&Argon2Params::insecure_fast()).unwrap());
        let svc = AccountService::new(repo.clone(), Arc::clone(&hasher));

        // Several creations in flight on a single-threaded runtime
        let (a, b) = tokio::join!(
            svc.create_account("a@example.com", "secret1", Role::Dentist),
            svc.create_account("b@example.com", "secret2", Role::Technician),
        );
        a.unwrap();
        b.unwrap();

        let stored = repo.find_account("a@example.com").await.unwrap().unwrap();
        assert!(hasher.verify("secret1", &stored.secret_hash));
        assert!(!hasher.verify("secret2", &stored.secret_hash));
    }

    #[tokio::test]
    async fn test_duplicate_identity_conflicts() {
        let svc = service();
        svc.create_account("a@example.com", "secret1", Role::Dentist)
            .await
            .unwrap();
        assert!(matches!(
            svc.create_account("A@Example.com", "secret2", Role::Technician).await,
            Err(Error::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let svc = service();
        assert_eq!(svc.seed(&seeds()).await.unwrap(), 2);
        assert_eq!(svc.seed(&seeds()).await.unwrap(), 0);

        let listed = svc.list_accounts().await.unwrap();
        let identities: Vec<&str> = listed.iter().map(|a| a.identity.as_str()).collect();
        assert_eq!(identities, ["doc@example.com", "tech@example.com"]);
    }

    #[tokio::test]
    async fn test_reset_drops_extra_accounts() {
        let svc = service();
        svc.seed(&seeds()).await.unwrap();
        svc.create_account("extra@example.com", "secret3", Role::Dentist)
            .await
            .unwrap();

        assert_eq!(svc.reset(&seeds()).await.unwrap(), 2);
        assert_eq!(svc.list_accounts().await.unwrap().len(), 2);
    }
}
