//! Client configuration: endpoints, credentials and session timings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Exchange environment / region selecting the pair of socket URLs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    #[default]
    Production,
    /// AWS-hosted region
    Aws,
    /// Simulated trading
    Demo,
    /// Business socket carrying the candlestick families
    Business,
}

impl Destination {
    /// URL of the endpoint that requires login
    pub fn private_url(&self) -> &'static str {
        match self {
            Destination::Production => "wss://ws.okx.com:8443/ws/v5/private",
            Destination::Aws => "wss://wsaws.okx.com:8443/ws/v5/private",
            Destination::Demo => "wss://wspap.okx.com:8443/ws/v5/private?brokerId=9999",
            Destination::Business => "wss://wsaws.okx.com:8443/ws/v5/private",
        }
    }

    /// URL of the anonymous endpoint
    pub fn public_url(&self) -> &'static str {
        match self {
            Destination::Production => "wss://ws.okx.com:8443/ws/v5/public",
            Destination::Aws => "wss://wsaws.okx.com:8443/ws/v5/public",
            Destination::Demo => "wss://wspap.okx.com:8443/ws/v5/public?brokerId=9999",
            Destination::Business => "wss://ws.okx.com:8443/ws/v5/business",
        }
    }
}

/// API credentials; the secret never appears in `Debug` output
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Read `OKWS_API_KEY`, `OKWS_SECRET_KEY` and `OKWS_PASSPHRASE`
    pub fn from_env() -> Result<Self, ConfigError> {
        let var = |name: &'static str| std::env::var(name).map_err(|_| ConfigError::MissingEnv(name));
        Ok(Self {
            api_key: var("OKWS_API_KEY")?,
            secret_key: var("OKWS_SECRET_KEY")?,
            passphrase: var("OKWS_PASSPHRASE")?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Session configuration
///
/// All durations are given in milliseconds so the file format stays plain
/// JSON numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub destination: Destination,
    /// Overrides the destination's login endpoint
    pub private_url: Option<String>,
    /// Overrides the destination's anonymous endpoint
    pub public_url: Option<String>,
    pub credentials: Option<Credentials>,

    /// Deadline for a single socket write
    pub write_wait_ms: u64,
    /// Read deadline; the keepalive ping runs at 80% of it
    pub pong_wait_ms: u64,
    /// Minimum spacing between two login requests
    pub login_throttle_ms: u64,
    pub auth_poll_interval_ms: u64,
    /// Upper bound for waiting on a login confirmation
    pub auth_timeout_ms: u64,
    pub redial_min_delay_ms: u64,
    pub redial_max_delay_ms: u64,
    /// Capacity of the per-session outbound queue
    pub send_queue_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            destination: Destination::default(),
            private_url: None,
            public_url: None,
            credentials: None,
            write_wait_ms: 3_000,
            pong_wait_ms: 30_000,
            login_throttle_ms: 30_000,
            auth_poll_interval_ms: 300,
            auth_timeout_ms: 30_000,
            redial_min_delay_ms: 250,
            redial_max_delay_ms: 10_000,
            send_queue_capacity: 3,
        }
    }
}

impl ClientConfig {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Point both sessions at explicit URLs
    pub fn with_urls(mut self, private_url: impl Into<String>, public_url: impl Into<String>) -> Self {
        self.private_url = Some(private_url.into());
        self.public_url = Some(public_url.into());
        self
    }

    /// URL for the session selected by `needs_auth`
    pub fn url(&self, needs_auth: bool) -> &str {
        if needs_auth {
            self.private_url
                .as_deref()
                .unwrap_or_else(|| self.destination.private_url())
        } else {
            self.public_url
                .as_deref()
                .unwrap_or_else(|| self.destination.public_url())
        }
    }

    pub fn write_wait(&self) -> Duration {
        Duration::from_millis(self.write_wait_ms)
    }

    pub fn pong_wait(&self) -> Duration {
        Duration::from_millis(self.pong_wait_ms)
    }

    pub fn ping_period(&self) -> Duration {
        self.pong_wait() * 4 / 5
    }

    pub fn login_throttle(&self) -> Duration {
        Duration::from_millis(self.login_throttle_ms)
    }

    pub fn auth_poll_interval(&self) -> Duration {
        Duration::from_millis(self.auth_poll_interval_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }

    pub fn redial_min_delay(&self) -> Duration {
        Duration::from_millis(self.redial_min_delay_ms)
    }

    pub fn redial_max_delay(&self) -> Duration {
        Duration::from_millis(self.redial_max_delay_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.send_queue_capacity == 0 {
            return Err(ConfigError::Invalid("send_queue_capacity must be > 0".into()));
        }
        if self.write_wait_ms == 0 || self.pong_wait_ms == 0 {
            return Err(ConfigError::Invalid("socket deadlines must be > 0".into()));
        }
        if self.ping_period().is_zero() || self.ping_period() >= self.pong_wait() {
            return Err(ConfigError::Invalid(
                "ping period must be shorter than the read deadline".into(),
            ));
        }
        if self.auth_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("auth_poll_interval_ms must be > 0".into()));
        }
        if self.redial_min_delay_ms > self.redial_max_delay_ms {
            return Err(ConfigError::Invalid(
                "redial_min_delay_ms exceeds redial_max_delay_ms".into(),
            ));
        }
        Ok(())
    }
}

/// Load client configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}
