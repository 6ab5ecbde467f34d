// Application configuration, read from the environment (and `.env`).

use crate::core::moderation::{FailurePolicy, ModerationConfig};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/movies.db?mode=rwc";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Connection string for the backing store
    pub database_url: String,
    /// Collection (table) holding moderation rules
    pub rules_collection: String,
    /// Collection (table) holding catalog entries
    pub movies_collection: String,
    /// Optional JSON file of rules imported at start-up
    pub rules_seed_file: Option<PathBuf>,
    pub refresh_interval: Duration,
    pub refresh_timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            rules_collection: "banned_words".to_string(),
            movies_collection: "movies".to_string(),
            rules_seed_file: None,
            refresh_interval: Duration::from_secs(300),
            refresh_timeout: Duration::from_secs(10),
            failure_policy: FailurePolicy::FailOpen,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, so tests don't have to touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => {
                    let secs = raw
                        .trim()
                        .parse::<u64>()
                        .with_context(|| format!("{} must be a whole number of seconds", key))?;
                    if secs == 0 {
                        bail!("{} must be greater than zero", key);
                    }
                    Ok(Duration::from_secs(secs))
                }
                None => Ok(default),
            }
        };

        let config = Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            rules_collection: lookup("RULES_COLLECTION").unwrap_or(defaults.rules_collection),
            movies_collection: lookup("MOVIES_COLLECTION").unwrap_or(defaults.movies_collection),
            rules_seed_file: lookup("RULES_SEED_FILE").map(PathBuf::from),
            refresh_interval: secs("MODERATION_REFRESH_INTERVAL_SECS", defaults.refresh_interval)?,
            refresh_timeout: secs("MODERATION_REFRESH_TIMEOUT_SECS", defaults.refresh_timeout)?,
            failure_policy: match lookup("MODERATION_FAILURE_POLICY") {
                Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
                None => defaults.failure_policy,
            },
        };

        validate_identifier("RULES_COLLECTION", &config.rules_collection)?;
        validate_identifier("MOVIES_COLLECTION", &config.movies_collection)?;
        Ok(config)
    }

    pub fn moderation(&self) -> ModerationConfig {
        ModerationConfig {
            failure_policy: self.failure_policy,
            refresh_timeout: Some(self.refresh_timeout),
        }
    }
}

// Collection names end up inside SQL, so only plain identifiers are allowed.
fn validate_identifier(key: &str, value: &str) -> Result<()> {
    let mut chars = value.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        bail!("{} must be a plain identifier, got {:?}", key, value);
    }
    Ok(())
}
