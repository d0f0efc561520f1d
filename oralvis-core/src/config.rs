//! Configuration management
//!
//! Read from `settings.json` in the data directory; every field is optional:
//! ```json
//! {
//!   "server": { "bind": "127.0.0.1:5000", "publicBaseUrl": "...", "maxUploadBytes": 10485760 },
//!   "auth": { "sessionTtlSecs": 3600, "argon2": { "timeCost": 2 } },
//!   "imageStore": { "kind": "filesystem", "folder": "oralvis" },
//!   "timeouts": { "imageStoreSecs": 30, "storageSecs": 10 },
//!   "seedAccounts": [ { "identity": "...", "secret": "...", "role": "Technician" } ]
//! }
//! ```
//! Secrets (credential signing key, Cloudinary API secret) only come from the
//! environment.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::{Argon2Params, Role, SeedAccount};
use crate::services::{Timeouts, DEFAULT_IMAGE_FOLDER, DEFAULT_SESSION_TTL_SECS, MIN_SECRET_LEN};

pub const SETTINGS_FILE: &str = "settings.json";
pub const DATABASE_FILE: &str = "oralvis.duckdb";
pub const IMAGES_DIR: &str = "images";

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const ENV_BIND: &str = "ORALVIS_BIND";
pub const ENV_PUBLIC_URL: &str = "ORALVIS_PUBLIC_URL";
pub const ENV_JWT_SECRET: &str = "ORALVIS_JWT_SECRET";
pub const ENV_CLOUDINARY_CLOUD_NAME: &str = "CLOUDINARY_CLOUD_NAME";
pub const ENV_CLOUDINARY_API_KEY: &str = "CLOUDINARY_API_KEY";
pub const ENV_CLOUDINARY_API_SECRET: &str = "CLOUDINARY_API_SECRET";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    server: ServerSettings,
    #[serde(default)]
    auth: AuthSettings,
    #[serde(default)]
    image_store: ImageStoreSettings,
    #[serde(default)]
    timeouts: TimeoutSettings,
    #[serde(default)]
    seed_accounts: Option<Vec<SeedAccount>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSettings {
    bind: Option<String>,
    public_base_url: Option<String>,
    max_upload_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthSettings {
    session_ttl_secs: Option<u64>,
    #[serde(default)]
    argon2: Argon2Params,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageStoreSettings {
    #[serde(default)]
    kind: ImageStoreKind,
    folder: Option<String>,
    cloud_name: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeoutSettings {
    image_store_secs: Option<u64>,
    storage_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStoreKind {
    #[default]
    Filesystem,
    Cloudinary,
}

/// Cloudinary account, complete only when all three parts are present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone)]
pub struct ImageStoreConfig {
    pub kind: ImageStoreKind,
    pub folder: String,
    pub cloudinary: Option<CloudinaryCredentials>,
}

impl ImageStoreConfig {
    pub fn cloudinary_credentials(&self) -> Result<&CloudinaryCredentials> {
        self.cloudinary.as_ref().ok_or_else(|| {
            Error::config(format!(
                "cloudinary image store needs {}, {} and {}",
                ENV_CLOUDINARY_CLOUD_NAME, ENV_CLOUDINARY_API_KEY, ENV_CLOUDINARY_API_SECRET
            ))
        })
    }
}

/// OralVis configuration (resolved view of settings + environment)
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub session_ttl_secs: u64,
    pub argon2: Argon2Params,
    pub image_store: ImageStoreConfig,
    pub timeouts: Timeouts,
    pub seed_accounts: Vec<SeedAccount>,
    /// Whether `public_base_url` was configured rather than derived from `bind`
    explicit_public_url: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(SettingsFile::default(), |_| None)
    }
}

/// Accounts provisioned when none are configured
pub fn default_seed_accounts() -> Vec<SeedAccount> {
    vec![
        SeedAccount {
            identity: "tech@oralvis.com".to_string(),
            secret: "password123".to_string(),
            role: Role::Technician,
        },
        SeedAccount {
            identity: "dentist@oralvis.com".to_string(),
            secret: "password123".to_string(),
            role: Role::Dentist,
        },
    ]
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl Config {
    /// Load config from the data directory, applying environment overrides
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with_env(data_dir, process_env)
    }

    /// Same as [`Config::load`] with an explicit environment lookup
    pub fn load_with_env<F>(data_dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::config(format!("invalid {}: {}", settings_path.display(), e))
            })?
        } else {
            SettingsFile::default()
        };

        let config = Self::resolve(raw, env);
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.public_base_url).map_err(|e| {
            Error::config(format!("invalid public base URL {:?}: {}", self.public_base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config("public base URL must use http or https"));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::config("maxUploadBytes must be positive"));
        }
        Ok(())
    }

    fn resolve<F>(raw: SettingsFile, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let bind = env(ENV_BIND)
            .or(raw.server.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let configured_url = env(ENV_PUBLIC_URL).or(raw.server.public_base_url);
        let explicit_public_url = configured_url.is_some();
        let public_base_url = configured_url
            .unwrap_or_else(|| format!("http://{}", bind))
            .trim_end_matches('/')
            .to_string();

        let cloud_name = env(ENV_CLOUDINARY_CLOUD_NAME).or(raw.image_store.cloud_name);
        let api_key = env(ENV_CLOUDINARY_API_KEY).or(raw.image_store.api_key);
        let api_secret = env(ENV_CLOUDINARY_API_SECRET);
        let cloudinary = match (cloud_name, api_key, api_secret) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryCredentials {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        let defaults = Timeouts::default();
        let timeouts = Timeouts {
            image_store: raw
                .timeouts
                .image_store_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.image_store),
            storage: raw
                .timeouts
                .storage_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.storage),
        };

        Self {
            bind,
            public_base_url,
            max_upload_bytes: raw.server.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            session_ttl_secs: raw.auth.session_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS),
            argon2: raw.auth.argon2,
            image_store: ImageStoreConfig {
                kind: raw.image_store.kind,
                folder: raw
                    .image_store
                    .folder
                    .unwrap_or_else(|| DEFAULT_IMAGE_FOLDER.to_string()),
                cloudinary,
            },
            timeouts,
            seed_accounts: raw.seed_accounts.unwrap_or_else(default_seed_accounts),
            explicit_public_url,
        }
    }

    /// Override the listen address; a derived public URL follows it
    pub fn with_bind(mut self, bind: &str) -> Self {
        self.bind = bind.to_string();
        if !self.explicit_public_url {
            self.public_base_url = format!("http://{}", bind);
        }
        self
    }
}

/// Read the credential-signing secret from `ORALVIS_JWT_SECRET`
pub fn load_signing_secret() -> Result<Vec<u8>> {
    signing_secret_from(process_env(ENV_JWT_SECRET))
}

fn signing_secret_from(value: Option<String>) -> Result<Vec<u8>> {
    let secret = value.ok_or_else(|| Error::config(format!("{} is not set", ENV_JWT_SECRET)))?;
    if secret.len() < MIN_SECRET_LEN {
        return Err(Error::config(format!(
            "{} must be at least {} bytes",
            ENV_JWT_SECRET, MIN_SECRET_LEN
        )));
    }
    Ok(secret.into_bytes())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_with_env(dir.path(), no_env).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.public_base_url, "http://127.0.0.1:5000");
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.session_ttl_secs, 3600);
        assert_eq!(config.image_store.kind, ImageStoreKind::Filesystem);
        assert_eq!(config.image_store.folder, "oralvis");
        assert_eq!(config.timeouts, Timeouts::default());
        assert_eq!(config.seed_accounts.len(), 2);
    }

    #[test]
    fn test_settings_file_and_env_overrides() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{
                "server": { "bind": "0.0.0.0:9000", "maxUploadBytes": 1024 },
                "imageStore": { "kind": "cloudinary", "cloudName": "demo", "apiKey": "k" },
                "timeouts": { "storageSecs": 3 },
                "seedAccounts": []
            }"#,
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            (ENV_PUBLIC_URL, "https://scans.example/"),
            (ENV_CLOUDINARY_API_SECRET, "shh"),
        ]
        .into_iter()
        .collect();
        let config =
            Config::load_with_env(dir.path(), |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.public_base_url, "https://scans.example");
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.timeouts.storage, Duration::from_secs(3));
        assert_eq!(config.timeouts.image_store, Duration::from_secs(30));
        assert!(config.seed_accounts.is_empty());

        let creds = config.image_store.cloudinary_credentials().unwrap();
        assert_eq!(creds.cloud_name, "demo");
        assert_eq!(creds.api_secret, "shh");
    }

    #[test]
    fn test_cloudinary_incomplete_without_secret() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{ "imageStore": { "kind": "cloudinary", "cloudName": "demo", "apiKey": "k" } }"#,
        )
        .unwrap();
        let config = Config::load_with_env(dir.path(), no_env).unwrap();
        assert!(matches!(
            config.image_store.cloudinary_credentials(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();
        assert!(matches!(
            Config::load_with_env(dir.path(), no_env),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_bind_override_moves_derived_url_only() {
        let config = Config::default().with_bind("0.0.0.0:8080");
        assert_eq!(config.public_base_url, "http://0.0.0.0:8080");

        let dir = TempDir::new().unwrap();
        let env = |k: &str| (k == ENV_PUBLIC_URL).then(|| "https://scans.example".to_string());
        let config = Config::load_with_env(dir.path(), env).unwrap().with_bind("0.0.0.0:8080");
        assert_eq!(config.public_base_url, "https://scans.example");
    }

    #[test]
    fn test_public_url_must_be_http() {
        let dir = TempDir::new().unwrap();
        let env = |k: &str| (k == ENV_PUBLIC_URL).then(|| "ftp://files.example".to_string());
        assert!(matches!(
            Config::load_with_env(dir.path(), env),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_signing_secret_length() {
        assert!(signing_secret_from(None).is_err());
        assert!(signing_secret_from(Some("too-short".into())).is_err());
        let secret = signing_secret_from(Some("x".repeat(32))).unwrap();
        assert_eq!(secret.len(), 32);
    }
}
