//! Runtime configuration read from the environment.
//!
//! A `.env` file in the working directory is honored outside of tests.
//! Command-line flags applied in `main` take precedence over these values.

use std::time::Duration;

use prep_core::model::UserId;
use thiserror::Error;

pub const DEFAULT_DB_URL: &str = "sqlite://prep.sqlite3";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_POLL_SECS: u64 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_url: String,
    pub log_filter: String,
    /// Acting user; `None` means the stored current user.
    pub user_id: Option<UserId>,
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.into(),
            log_filter: DEFAULT_LOG_FILTER.into(),
            user_id: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
        }
    }
}

impl Config {
    /// Load `PREP_DB_URL`, `PREP_LOG`, `PREP_USER_ID` and `PREP_POLL_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but unparsable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let db_url = get("PREP_DB_URL").unwrap_or(defaults.db_url);
        let log_filter = get("PREP_LOG").unwrap_or(defaults.log_filter);

        let user_id = get("PREP_USER_ID")
            .map(|raw| {
                raw.parse::<UserId>().map_err(|e| ConfigError::InvalidValue {
                    var: "PREP_USER_ID",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let poll_interval = match get("PREP_POLL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "PREP_POLL_SECS",
                        reason: format!("'{raw}' is not a positive number of seconds"),
                    });
                }
            },
            None => defaults.poll_interval,
        };

        Ok(Self {
            db_url,
            log_filter,
            user_id,
            poll_interval,
        })
    }
}
