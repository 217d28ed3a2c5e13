//! Configuration file handling
//!
//! Configuration comes from three layers, later layers winning: built-in
//! defaults, an optional TOML file, and `APIFLOW_*` process environment
//! variables. A `.env` file in the working directory is honored before the
//! environment is read, the same way the original suites used dotenv.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{Error, Result};

/// Default location of the config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "apiflow.toml";

/// Scope of the fail-fast policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FailFast {
    /// Record failures but keep running every step (default)
    #[default]
    Off,
    /// Skip the remaining steps of the suite that failed
    Suite,
    /// Skip the remaining steps of the failing suite and all later suites
    Run,
}

/// Main configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL prepended to relative request paths
    pub base_url: Option<String>,

    /// Directory holding JSON fixtures
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: PathBuf,

    /// Fail-fast scope
    #[serde(default)]
    pub fail_fast: FailFast,

    /// Whether a non-2xx response fails a step by default
    #[serde(default = "default_fail_on_status_code")]
    pub fail_on_status_code: bool,

    /// Values seeded into the run environment before any step executes
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Credentials seeded into the run environment (username, password, ...)
    #[serde(default)]
    pub credentials: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            fixtures_dir: default_fixtures_dir(),
            fail_fast: FailFast::default(),
            fail_on_status_code: default_fail_on_status_code(),
            env: HashMap::new(),
            credentials: HashMap::new(),
        }
    }
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from("fixtures")
}

fn default_fail_on_status_code() -> bool {
    true
}

impl Config {
    /// Load configuration from the given file, or `apiflow.toml` if present
    ///
    /// A missing default file yields the built-in defaults; an explicitly
    /// requested file must exist. Process environment overrides are applied
    /// on top either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // Populate the process environment from a .env file if there is one
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides(std::env::vars())?;
        Ok(config)
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Apply `APIFLOW_*` overrides from an environment-shaped iterator
    ///
    /// Recognized: `APIFLOW_BASE_URL`, `APIFLOW_FIXTURES_DIR`,
    /// `APIFLOW_FAIL_FAST`, `APIFLOW_FAIL_ON_STATUS_CODE`, and
    /// `APIFLOW_ENV_<KEY>` / `APIFLOW_CREDENTIAL_<KEY>` for the seed tables
    /// (keys are lowercased).
    pub fn apply_env_overrides(
        &mut self,
        vars: impl Iterator<Item = (String, String)>,
    ) -> Result<()> {
        for (key, value) in vars {
            match key.as_str() {
                "APIFLOW_BASE_URL" => self.base_url = Some(value),
                "APIFLOW_FIXTURES_DIR" => self.fixtures_dir = PathBuf::from(value),
                "APIFLOW_FAIL_FAST" => {
                    self.fail_fast = match value.as_str() {
                        "off" => FailFast::Off,
                        "suite" => FailFast::Suite,
                        "run" => FailFast::Run,
                        other => {
                            return Err(Error::ConfigParse(format!(
                                "invalid APIFLOW_FAIL_FAST value '{other}' (expected off, suite or run)"
                            )))
                        }
                    }
                }
                "APIFLOW_FAIL_ON_STATUS_CODE" => {
                    self.fail_on_status_code = value != "false" && value != "0";
                }
                _ => {
                    if let Some(name) = key.strip_prefix("APIFLOW_ENV_") {
                        self.env.insert(name.to_lowercase(), value);
                    } else if let Some(name) = key.strip_prefix("APIFLOW_CREDENTIAL_") {
                        self.credentials.insert(name.to_lowercase(), value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Values to seed into the run environment, credentials included
    pub fn seed_values(&self) -> Vec<(String, serde_json::Value)> {
        let mut seeds = Vec::new();
        if let Some(base_url) = &self.base_url {
            seeds.push(("base_url".to_string(), base_url.clone().into()));
        }
        for (key, value) in &self.env {
            seeds.push((key.clone(), value.clone().into()));
        }
        for (key, value) in &self.credentials {
            seeds.push((key.clone(), value.clone().into()));
        }
        seeds
    }
}
