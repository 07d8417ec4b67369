//! Configuration file and environment handling for the CLI.
//!
//! The connection string is taken from the first of:
//! 1. the `--connection` flag
//! 2. the `connection` field of `.mollerdb.json` in the current directory
//! 3. the `MOLLERDB_CONNECTION` environment variable
//!
//! Timeouts set in the config file apply whichever source supplied the string.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::db::{ConnectionConfig, DbError};

/// Config file looked up in the current directory.
pub const CONFIG_FILE: &str = ".mollerdb.json";

/// Environment variable holding a fallback connection string.
pub const CONNECTION_ENV: &str = "MOLLERDB_CONNECTION";

/// Contents of `.mollerdb.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// libpq-style connection string
    #[serde(default)]
    pub connection: Option<String>,

    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    #[serde(default)]
    pub query_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Load `.mollerdb.json` from the current directory, if present.
    pub fn load() -> Result<Option<Self>, Box<dyn Error>> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load a config file. A missing file is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not valid
    /// JSON for this structure.
    pub fn load_from(path: &Path) -> Result<Option<Self>, Box<dyn Error>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid JSON in {}: {}", path.display(), e))?;

        Ok(Some(config))
    }

    /// Apply the file's timeouts on top of a parsed connection config.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] when a timeout is zero.
    pub fn apply(&self, mut config: ConnectionConfig) -> Result<ConnectionConfig, DbError> {
        if let Some(secs) = self.connect_timeout_secs {
            config = config.with_connect_timeout(positive_secs("connect_timeout_secs", secs)?);
        }
        if let Some(secs) = self.query_timeout_secs {
            config = config.with_query_timeout(positive_secs("query_timeout_secs", secs)?);
        }
        Ok(config)
    }
}

fn positive_secs(key: &str, secs: u64) -> Result<Duration, DbError> {
    if secs == 0 {
        return Err(DbError::config(format!("invalid value for {}", key)));
    }
    Ok(Duration::from_secs(secs))
}

/// Pick a connection string by precedence and parse it.
///
/// # Errors
///
/// Returns an error if no source supplies a string or the chosen string is
/// rejected by the parser.
pub fn resolve(
    flag: Option<&str>,
    file: Option<&ConfigFile>,
    env: Option<&str>,
) -> Result<ConnectionConfig, Box<dyn Error>> {
    let raw = flag
        .or_else(|| file.and_then(|f| f.connection.as_deref()))
        .or(env)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            format!(
                "No connection string given.\n\n\
                 Pass --connection, add a \"connection\" field to {}, or set {}.\n\n\
                 Example:\n  \
                 mollerdb -c \"host=localhost dbname=moller user=reader password=secret\" ping",
                CONFIG_FILE, CONNECTION_ENV
            )
        })?;

    let config = ConnectionConfig::parse(raw)?;
    Ok(match file {
        Some(file) => file.apply(config)?,
        None => config,
    })
}

/// Resolve the connection for this process from the flag, the config file in
/// the current directory, and the environment.
pub fn resolve_from_environment(flag: Option<&str>) -> Result<ConnectionConfig, Box<dyn Error>> {
    let file = ConfigFile::load()?;
    let env = std::env::var(CONNECTION_ENV).ok();
    resolve(flag, file.as_ref(), env.as_deref())
}
