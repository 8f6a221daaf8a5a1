//! Client configuration.
//!
//! Values are layered, later layers winning:
//!
//! 1. Built-in defaults (`127.0.0.1:5001`, 1 s retry, 2 s reconnect)
//! 2. TOML file, `$XDG_CONFIG_HOME/simview/config.toml` by default
//! 3. `SIMVIEW_HOST` / `SIMVIEW_PORT` environment variables
//! 4. Command-line flags (applied by the binary)
//!
//! # Example file
//!
//! ```toml
//! host = "10.0.0.12"
//! port = 5001
//! connect_retry_delay_ms = 1000
//! reconnect_delay_ms = 2000
//! max_line_length = 65536
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Environment variable overriding the server host.
pub const HOST_ENV: &str = "SIMVIEW_HOST";

/// Environment variable overriding the server port.
pub const PORT_ENV: &str = "SIMVIEW_PORT";

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the simulation client.
///
/// # Example
///
/// ```rust
/// use simview_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig {
///     host: "10.0.0.12".to_string(),
///     reconnect_delay: Duration::from_millis(500),
///     ..Default::default()
/// };
/// assert_eq!(config.address(), "10.0.0.12:5001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host name or address of the simulation server.
    pub host: String,

    /// TCP port of the simulation server.
    pub port: u16,

    /// Delay between two failed connection attempts.
    pub connect_retry_delay: Duration,

    /// Delay after losing an established connection before reconnecting.
    pub reconnect_delay: Duration,

    /// Longest line accepted from the server, in bytes.
    pub max_line_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            connect_retry_delay: Duration::from_secs(1),
            reconnect_delay: Duration::from_secs(2),
            max_line_length: 64 * 1024,
        }
    }
}

/// On-disk form. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    host: Option<String>,
    port: Option<u16>,
    connect_retry_delay_ms: Option<u64>,
    reconnect_delay_ms: Option<u64>,
    max_line_length: Option<usize>,
}

impl ClientConfig {
    /// Default config file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("simview").join("config.toml"))
    }

    /// Parses TOML text on top of the defaults.
    ///
    /// # Errors
    ///
    /// `ClientError::ConfigParse` for invalid TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text)?;
        Ok(Self::default().merge(file))
    }

    /// Loads a config file on top of the defaults.
    ///
    /// # Errors
    ///
    /// `ClientError::ConfigRead` if the file cannot be read, or
    /// `ClientError::ConfigParse` if it is not valid.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ClientError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads the default config file if it exists, otherwise the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::load`] when the file exists.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Applies `SIMVIEW_HOST` / `SIMVIEW_PORT` from the process environment.
    ///
    /// # Errors
    ///
    /// `ClientError::InvalidConfig` if `SIMVIEW_PORT` is not a port number.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies host/port overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// `ClientError::InvalidConfig` if the port value is not a port number.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV).filter(|h| !h.trim().is_empty()) {
            self.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.port = port.trim().parse().map_err(|_| {
                ClientError::InvalidConfig(format!("{PORT_ENV} is not a valid port: {port:?}"))
            })?;
        }
        Ok(self)
    }

    /// Checks that the values can be used to run a client.
    ///
    /// # Errors
    ///
    /// `ClientError::InvalidConfig` describing the first offending value.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ClientError::InvalidConfig("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ClientError::InvalidConfig("port must be non-zero".to_string()));
        }
        if self.max_line_length == 0 {
            return Err(ClientError::InvalidConfig(
                "max_line_length must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` as used for logging and connecting.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn merge(mut self, file: ConfigFile) -> Self {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(ms) = file.connect_retry_delay_ms {
            self.connect_retry_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file.reconnect_delay_ms {
            self.reconnect_delay = Duration::from_millis(ms);
        }
        if let Some(max) = file.max_line_length {
            self.max_line_length = max;
        }
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
