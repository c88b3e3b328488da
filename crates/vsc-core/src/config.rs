//! Client configuration
//!
//! The server address is persisted as plain text in `address.txt` in the
//! working directory, e.g. `http://example.com:8080`.
//!
//! Environment variables (VSC_* prefix) override the defaults:
//! - `VSC_ADDRESS_FILE`: alternative location of the address file
//! - `VSC_SERVER`: server URL, used instead of the file content
//! - `VSC_TIMEOUT_SECS`: per-request timeout, `0` disables it

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;

/// Environment variable prefix
const ENV_PREFIX: &str = "VSC";

/// Name of the file holding the server address
pub const ADDRESS_FILE_NAME: &str = "address.txt";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Base URL of the file-storage server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress(String);

impl ServerAddress {
    /// Build the address stored by `set`: `http://` followed by the host
    ///
    /// A host that already carries an http(s) scheme is kept as given.
    pub fn from_host(host: &str) -> Result<Self, ConfigError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ConfigError::InvalidHost {
                host: host.to_string(),
                reason: "address is empty",
            });
        }
        if host.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidHost {
                host: host.to_string(),
                reason: "address contains whitespace",
            });
        }

        let url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };
        Ok(Self(url))
    }

    /// Parse persisted content; `None` when there is nothing usable
    fn from_stored(content: &str) -> Option<Self> {
        let url = content.trim().trim_end_matches('/');
        if url.is_empty() {
            None
        } else {
            Some(Self(url.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// File the server address is persisted in
    pub address_file: PathBuf,

    /// Address that takes precedence over the file
    pub server_override: Option<String>,

    /// Per-request HTTP timeout
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address_file: PathBuf::from(ADDRESS_FILE_NAME),
            server_override: None,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

impl Config {
    /// Load configuration from defaults and environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Configuration with the address file placed in `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            address_file: dir.join(ADDRESS_FILE_NAME),
            ..Self::default()
        }
    }

    /// Use a specific address file (CLI override)
    pub fn with_address_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.address_file = path.into();
        self
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // VSC_ADDRESS_FILE
        if let Ok(val) = std::env::var(format!("{}_ADDRESS_FILE", ENV_PREFIX)) {
            if !val.is_empty() {
                self.address_file = PathBuf::from(val);
            }
        }

        // VSC_SERVER
        if let Ok(val) = std::env::var(format!("{}_SERVER", ENV_PREFIX)) {
            self.server_override = if val.trim().is_empty() {
                None
            } else {
                Some(val)
            };
        }

        // VSC_TIMEOUT_SECS
        if let Ok(val) = std::env::var(format!("{}_TIMEOUT_SECS", ENV_PREFIX)) {
            let secs: u64 = val
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout { value: val.clone() })?;
            self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(())
    }

    /// Resolve the server address
    ///
    /// Fails with [`ConfigError::Missing`] when no address has been set,
    /// before any network activity.
    pub fn server_address(&self) -> Result<ServerAddress, ConfigError> {
        if let Some(ref server) = self.server_override {
            return ServerAddress::from_host(server);
        }

        let content = match fs::read_to_string(&self.address_file) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing {
                    path: self.address_file.clone(),
                })
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.address_file.clone(),
                    source,
                })
            }
        };

        ServerAddress::from_stored(&content).ok_or_else(|| ConfigError::Missing {
            path: self.address_file.clone(),
        })
    }

    /// Persist `http://<host>` to the address file
    pub fn save_server_address(&self, host: &str) -> Result<ServerAddress, ConfigError> {
        let address = ServerAddress::from_host(host)?;
        fs::write(&self.address_file, address.as_str()).map_err(|source| ConfigError::Write {
            path: self.address_file.clone(),
            source,
        })?;
        debug!("Saved server address {} to {:?}", address, self.address_file);
        Ok(address)
    }
}
