//! Configuration management
//!
//! Settings live in `<data-dir>/settings.json`:
//! ```json
//! {
//!   "auth": { "tokenSecret": "...", "argon2": { "timeCost": 3, ... } },
//!   "expenses": { "defaultPageSize": 10, "maxPageSize": 100 }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::{Argon2Params, QueryLimits};
use crate::services::token::MIN_SECRET_LEN;

pub const SETTINGS_FILE: &str = "settings.json";

/// Overrides `auth.tokenSecret` without touching the settings file
pub const TOKEN_SECRET_ENV: &str = "SPENDLOG_TOKEN_SECRET";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    auth: AuthSettings,
    #[serde(default)]
    expenses: ExpenseSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_secret: Option<String>,
    #[serde(default)]
    argon2: Argon2Params,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseSettings {
    #[serde(default = "default_page_size")]
    default_page_size: u32,
    #[serde(default = "max_page_size")]
    max_page_size: u32,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl Default for ExpenseSettings {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: max_page_size(),
            other: HashMap::new(),
        }
    }
}

fn default_page_size() -> u32 {
    QueryLimits::default().default_page_size
}

fn max_page_size() -> u32 {
    QueryLimits::default().max_page_size
}

/// What the auth core needs at construction
#[derive(Clone)]
pub struct AuthConfig {
    pub token_secret: Vec<u8>,
    pub argon2: Argon2Params,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"<redacted>")
            .field("argon2", &self.argon2)
            .finish()
    }
}

/// Spendlog configuration (simplified view of settings)
#[derive(Clone)]
pub struct Config {
    pub token_secret: String,
    pub argon2: Argon2Params,
    pub query_limits: QueryLimits,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token_secret", &"<redacted>")
            .field("argon2", &self.argon2)
            .field("query_limits", &self.query_limits)
            .finish()
    }
}

impl Config {
    /// Config with default costs and limits around a given secret
    pub fn with_secret(token_secret: impl Into<String>) -> Self {
        Self {
            token_secret: token_secret.into(),
            argon2: Argon2Params::default(),
            query_limits: QueryLimits::default(),
        }
    }

    /// Load config from the data directory.
    ///
    /// The secret comes from `SPENDLOG_TOKEN_SECRET` when set, otherwise from
    /// the file. When neither has one, a random secret is generated and
    /// written back so tokens survive restarts. Keys spendlog does not manage
    /// are kept in the rewritten file.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let mut raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content)?
        } else {
            SettingsFile::default()
        };

        let env_secret = std::env::var(TOKEN_SECRET_ENV)
            .ok()
            .filter(|s| !s.is_empty());

        let token_secret = match (env_secret, raw.auth.token_secret.clone()) {
            (Some(secret), _) => secret,
            (None, Some(secret)) => secret,
            (None, None) => {
                let secret = generate_secret();
                raw.auth.token_secret = Some(secret.clone());
                std::fs::create_dir_all(data_dir)?;
                let content = serde_json::to_string_pretty(&raw)?;
                std::fs::write(&settings_path, content)?;
                tracing::info!(path = %settings_path.display(), "generated token secret");
                secret
            }
        };

        if token_secret.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "auth.tokenSecret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if raw.expenses.default_page_size == 0 || raw.expenses.max_page_size == 0 {
            return Err(Error::Config("page sizes must be positive".to_string()));
        }

        Ok(Self {
            token_secret,
            argon2: raw.auth.argon2,
            query_limits: QueryLimits {
                default_page_size: raw.expenses.default_page_size,
                max_page_size: raw.expenses.max_page_size,
            },
        })
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            token_secret: self.token_secret.as_bytes().to_vec(),
            argon2: self.argon2,
        }
    }
}

/// 32 random bytes, base64 encoded
fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests below assume SPENDLOG_TOKEN_SECRET is not set in the environment.

    #[test]
    fn test_first_load_generates_and_persists_secret() {
        let dir = tempfile::tempdir().unwrap();
        let first = Config::load(dir.path()).unwrap();
        assert!(first.token_secret.len() >= MIN_SECRET_LEN);
        assert!(dir.path().join(SETTINGS_FILE).exists());

        let second = Config::load(dir.path()).unwrap();
        assert_eq!(first.token_secret, second.token_secret);
        assert_eq!(second.query_limits, QueryLimits::default());
        assert_eq!(second.argon2, Argon2Params::default());
    }

    #[test]
    fn test_reads_settings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{
                "auth": { "tokenSecret": "abcdefghijklmnopqrstuvwxyz0123456789", "argon2": { "timeCost": 2 } },
                "expenses": { "maxPageSize": 50 }
            }"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.token_secret, "abcdefghijklmnopqrstuvwxyz0123456789");
        assert_eq!(config.argon2.time_cost, 2);
        assert_eq!(config.argon2.memory_cost, 65536);
        assert_eq!(config.query_limits.max_page_size, 50);
        assert_eq!(config.query_limits.default_page_size, 10);
    }

    #[test]
    fn test_generated_secret_keeps_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"{
                "expenses": { "maxPageSize": 50, "theme": "dark" },
                "ui": { "color": true }
            }"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["auth"]["tokenSecret"], serde_json::json!(config.token_secret));
        assert_eq!(saved["ui"]["color"], serde_json::json!(true));
        assert_eq!(saved["expenses"]["theme"], serde_json::json!("dark"));
        assert_eq!(saved["expenses"]["maxPageSize"], serde_json::json!(50));
    }

    #[test]
    fn test_short_secret_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{ "auth": { "tokenSecret": "too-short" } }"#,
        )
        .unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_auth_config_debug_hides_secret() {
        let config = Config::with_secret("s3cr3t-s3cr3t-s3cr3t-s3cr3t-s3cr3t");
        assert!(!format!("{:?}", config.auth_config()).contains("s3cr3t"));
        assert!(!format!("{:?}", config).contains("s3cr3t"));
    }
}
