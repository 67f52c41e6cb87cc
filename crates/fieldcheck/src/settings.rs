//! Engine settings loaded from the environment.
//!
//! Variables are read with the `FIELDCHECK_` prefix:
//!
//! - `FIELDCHECK_LOOKUP_TIMEOUT_MS` - abort remote lookups after this many
//!   milliseconds (unset: no timeout)
//! - `FIELDCHECK_QUERY_PARAM` - query parameter carrying the value (default `q`)
//! - `FIELDCHECK_SCOPE` - default scope selector for markers (default `fieldset`)
//!
//! # Example
//!
//! ```ignore
//! use fieldcheck::Settings;
//!
//! // Reads .env if present, then the process environment
//! let settings = Settings::load()?;
//! let selection = Selection::of(field).with_settings(settings);
//! ```

use crate::error::SettingsError;
use crate::options::{DEFAULT_QUERY_PARAM, DEFAULT_SCOPE};
use serde::Deserialize;
use std::time::Duration;

const ENV_PREFIX: &str = "FIELDCHECK_";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub lookup_timeout_ms: Option<u64>,
    #[serde(default = "default_query_param")]
    pub query_param: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_query_param() -> String {
    DEFAULT_QUERY_PARAM.to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: None,
            query_param: default_query_param(),
            scope: default_scope(),
        }
    }
}

impl Settings {
    /// Load a `.env` file if one exists, then read the environment.
    pub fn load() -> Result<Self, SettingsError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }
        Self::from_env()
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(envy::prefixed(ENV_PREFIX).from_env::<Settings>()?)
    }

    /// Read settings from explicit key/value pairs (keys carry the prefix).
    pub fn from_pairs<I>(pairs: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter::<_, Settings>(pairs)?)
    }

    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }
}
