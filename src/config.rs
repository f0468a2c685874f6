//! Code for the configuration of the application.

use std::{collections::BTreeMap, fmt, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{coordinator::DEFAULT_POLL_INTERVAL, sensors::DEFAULT_ONLINE_WINDOW};

/// Problems reading or validating a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file could not be read.
    #[error("failed to read config file {path}")]
    Read {
        /// Path that was read.
        path: String,

        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid toml, or doesn't match the expected layout.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// No `[installations.*]` table was given.
    #[error("no installations configured")]
    NoInstallations,

    /// An installation lacks a client id or client secret.
    #[error("installation {0} needs both client_id and client_secret")]
    MissingCredentials(String),

    /// An installation asks to be polled every zero seconds.
    #[error("installation {0} has a poll_interval_secs of zero")]
    ZeroPollInterval(String),
}

/// The configuration of the application.
#[derive(Default, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Settings for the http server.
    #[serde(default)]
    pub server: ServerConfig,

    /// Formlabs accounts to poll, by name.
    #[serde(default)]
    pub installations: BTreeMap<String, InstallationConfig>,
}

impl Config {
    /// Parse and validate a configuration from a toml file.
    pub fn from_file(file: &Path) -> Result<Self, Error> {
        let config = std::fs::read_to_string(file).map_err(|source| Error::Read {
            path: file.display().to_string(),
            source,
        })?;
        Self::from_str(&config)
    }

    /// Parse and validate a configuration from a toml string.
    pub fn from_str(config: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(config)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration describes something that can run.
    pub fn validate(&self) -> Result<(), Error> {
        if self.installations.is_empty() {
            return Err(Error::NoInstallations);
        }

        for (name, installation) in self.installations.iter() {
            if installation.client_id.trim().is_empty() || installation.client_secret.trim().is_empty() {
                return Err(Error::MissingCredentials(name.clone()));
            }
            if installation.poll_interval_secs == 0 {
                return Err(Error::ZeroPollInterval(name.clone()));
            }
        }

        Ok(())
    }
}

/// Settings for the http server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// `host:port` to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// How recently a printer must have pinged to count as online.
    #[serde(default = "default_online_window_secs")]
    pub online_window_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            online_window_secs: default_online_window_secs(),
        }
    }
}

impl ServerConfig {
    /// The online window as a [Duration].
    pub fn online_window(&self) -> Duration {
        Duration::from_secs(self.online_window_secs)
    }
}

/// One set of Formlabs api credentials.
#[derive(Clone, PartialEq, Deserialize, Serialize)]
pub struct InstallationConfig {
    /// OAuth client id.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Root of the developer api.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Seconds between refreshes.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl fmt::Debug for InstallationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}

impl InstallationConfig {
    /// Build an api client for this installation.
    pub fn client(&self) -> formlabs::Client {
        formlabs::Client::new(formlabs::Credentials::new(
            self.client_id.trim(),
            self.client_secret.trim(),
        ))
        .with_base_url(self.base_url.as_str())
    }

    /// The poll interval as a [Duration].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_owned()
}

fn default_online_window_secs() -> u64 {
    DEFAULT_ONLINE_WINDOW.as_secs()
}

fn default_base_url() -> String {
    formlabs::DEFAULT_BASE_URL.to_owned()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}
