//! Runtime settings read from the environment.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{ConfigError, Result, SoongError};

/// Environment variable holding the Lambda Cloud API key.
pub const API_KEY_VAR: &str = "LAMBDA_API_KEY";

/// Environment variable overriding the readiness timeout, in seconds.
pub const READY_TIMEOUT_VAR: &str = "SOONG_READY_TIMEOUT_SECS";

/// Environment variable overriding the poll interval, in seconds.
pub const POLL_INTERVAL_VAR: &str = "SOONG_POLL_INTERVAL_SECS";

const DEFAULT_READY_TIMEOUT_SECS: u64 = 600;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Resolved runtime settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    api_key: String,
    /// How long to wait for a launched instance to become ready.
    pub ready_timeout: Duration,
    /// Interval between status polls.
    pub poll_interval: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("ready_timeout", &self.ready_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or a value is malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or a value is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(API_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar {
                name: API_KEY_VAR.to_string(),
            })?;

        let ready_timeout = read_secs(&lookup, READY_TIMEOUT_VAR, DEFAULT_READY_TIMEOUT_SECS, 0)?;
        let poll_interval = read_secs(&lookup, POLL_INTERVAL_VAR, DEFAULT_POLL_INTERVAL_SECS, 1)?;

        Ok(Self {
            api_key,
            ready_timeout,
            poll_interval,
        })
    }

    /// The API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

fn read_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
    min: u64,
) -> Result<Duration> {
    let Some(raw) = lookup(name) else {
        return Ok(Duration::from_secs(default));
    };

    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_value(name, &raw, "expected whole seconds"))?;

    if secs < min {
        return Err(ConfigError::invalid_value(name, &raw, format!("must be at least {min}")).into());
    }

    Ok(Duration::from_secs(secs))
}

/// Loads `.env` from `dir` into the process environment, if present.
///
/// Variables already set take precedence.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be parsed.
pub fn load_dotenv(dir: &Path) -> Result<()> {
    let env_path = dir.join(".env");

    if !env_path.exists() {
        debug!(".env file not found at: {}", env_path.display());
        return Ok(());
    }

    info!("Loading environment from: {}", env_path.display());
    dotenvy::from_path(&env_path).map_err(|e| {
        SoongError::Config(ConfigError::DotenvLoad {
            path: env_path.clone(),
            message: e.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[(API_KEY_VAR, "secret")]))
            .expect("settings should load");

        assert_eq!(settings.api_key(), "secret");
        assert_eq!(settings.ready_timeout, Duration::from_secs(600));
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_api_key() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(
            err,
            SoongError::Config(ConfigError::MissingEnvVar { ref name }) if name == API_KEY_VAR
        ));

        let err = Settings::from_lookup(lookup(&[(API_KEY_VAR, "   ")])).unwrap_err();
        assert!(matches!(err, SoongError::Config(ConfigError::MissingEnvVar { .. })));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            (READY_TIMEOUT_VAR, "900"),
            (POLL_INTERVAL_VAR, " 5 "),
        ]))
        .expect("settings should load");

        assert_eq!(settings.ready_timeout, Duration::from_secs(900));
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values() {
        let err = Settings::from_lookup(lookup(&[(API_KEY_VAR, "k"), (READY_TIMEOUT_VAR, "ten")]))
            .unwrap_err();
        assert!(err.to_string().contains(READY_TIMEOUT_VAR));

        let err = Settings::from_lookup(lookup(&[(API_KEY_VAR, "k"), (POLL_INTERVAL_VAR, "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = Settings::from_lookup(lookup(&[(API_KEY_VAR, "secret")]))
            .expect("settings should load");
        assert!(!format!("{settings:?}").contains("secret"));
    }

    #[test]
    fn test_missing_dotenv_is_ok() {
        let dir = std::env::temp_dir().join("soong-no-dotenv-here");
        assert!(load_dotenv(&dir).is_ok());
    }
}
