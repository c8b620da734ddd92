//! # Server Configuration
//!
//! Builds the [`AppConfig`] the server runs with, either from process
//! environment variables or through [`AppConfigBuilder`].
//!
//! ## Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `CLIENT_ID` | required |
//! | `CLIENT_SECRET` | required |
//! | `PORT` | `3000` |
//! | `BIND_ADDRESS` | `0.0.0.0` |
//! | `ACCOUNT_COUNT` | `15` |
//! | `REDIRECT_URI_ACCOUNT{N}` | `http://localhost:{PORT}/google/redirect/{N-1}` |
//! | `CREDENTIALS_DIR` | `.` |
//! | `TOKEN_RENEWAL_INTERVAL_SECS` | `3600` |
//! | `MIN_FILE_SIZE_BYTES` | `500000` |
//! | `STREAM_HORIZON_DAYS` | `7` |
//! | `STREAM_QUERY` | `mimeType='image/jpeg'` |
//! | `LOG_LEVEL` / `LOG_FORMAT` | `info` / build-dependent |
//!
//! Account numbering in variable and file names is 1-based; account indices
//! in URLs are 0-based.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::from_env()?;
//! println!("listening on {}", config.listen_addr());
//! ```
//!
//! ```
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::builder()
//!     .client_id("id.apps.googleusercontent.com")
//!     .client_secret("secret")
//!     .account_count(2)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.accounts.len(), 2);
//! assert_eq!(config.accounts[1].credential_key, "creds_account2.json");
//! ```

use crate::error::{Error, Result};
use crate::logging::{redact_if_sensitive, LogFormat, LogLevel, LoggingConfig};
use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ACCOUNT_COUNT: usize = 15;
pub const DEFAULT_RENEWAL_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MIN_FILE_SIZE: u64 = 500_000;
pub const DEFAULT_HORIZON_DAYS: u32 = 7;
pub const DEFAULT_STREAM_QUERY: &str = "mimeType='image/jpeg'";

/// Fixed per-account settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// OAuth redirect target registered for this account.
    pub redirect_uri: String,
    /// Credential store key holding this account's token record.
    pub credential_key: String,
}

/// Server-wide defaults for the sampling stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDefaults {
    /// Files must be strictly larger than this to be considered.
    pub min_file_size: u64,
    /// Window after the first accepted file, in days.
    pub horizon_days: u32,
    /// Provider-side listing filter.
    pub query: String,
}

impl Default for StreamDefaults {
    fn default() -> Self {
        Self {
            min_file_size: DEFAULT_MIN_FILE_SIZE,
            horizon_days: DEFAULT_HORIZON_DAYS,
            query: DEFAULT_STREAM_QUERY.to_string(),
        }
    }
}

/// Complete server configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub bind_address: IpAddr,
    pub port: u16,
    /// Ordered account table; position is the public account index.
    pub accounts: Vec<AccountConfig>,
    pub credentials_dir: PathBuf,
    pub renewal_interval: Duration,
    pub stream: StreamDefaults,
    pub logging: LoggingConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &redact_if_sensitive("client_secret", &self.client_secret),
            )
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("accounts", &self.accounts.len())
            .field("credentials_dir", &self.credentials_dir)
            .field("renewal_interval", &self.renewal_interval)
            .field("stream", &self.stream)
            .field("logging", &self.logging)
            .finish()
    }
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when `CLIENT_ID` or `CLIENT_SECRET` is missing
    /// or when any variable holds an unparsable value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = AppConfig::builder();

        if let Some(id) = var("CLIENT_ID") {
            builder = builder.client_id(id);
        }
        if let Some(secret) = var("CLIENT_SECRET") {
            builder = builder.client_secret(secret);
        }
        if let Some(port) = parse_var::<u16>(&var, "PORT")? {
            builder = builder.port(port);
        }
        if let Some(addr) = parse_var::<IpAddr>(&var, "BIND_ADDRESS")? {
            builder = builder.bind_address(addr);
        }

        let account_count =
            parse_var::<usize>(&var, "ACCOUNT_COUNT")?.unwrap_or(DEFAULT_ACCOUNT_COUNT);
        builder = builder.account_count(account_count);
        for number in 1..=account_count {
            if let Some(uri) = var(&format!("REDIRECT_URI_ACCOUNT{}", number)) {
                builder = builder.redirect_uri(number - 1, uri);
            }
        }

        if let Some(dir) = var("CREDENTIALS_DIR") {
            builder = builder.credentials_dir(dir);
        }
        if let Some(secs) = parse_var::<u64>(&var, "TOKEN_RENEWAL_INTERVAL_SECS")? {
            builder = builder.renewal_interval(Duration::from_secs(secs));
        }
        if let Some(size) = parse_var::<u64>(&var, "MIN_FILE_SIZE_BYTES")? {
            builder = builder.min_file_size(size);
        }
        if let Some(days) = parse_var::<u32>(&var, "STREAM_HORIZON_DAYS")? {
            builder = builder.horizon_days(days);
        }
        if let Some(query) = var("STREAM_QUERY") {
            builder = builder.stream_query(query);
        }

        let mut logging = LoggingConfig::default();
        if let Some(level) = parse_var::<LogLevel>(&var, "LOG_LEVEL")? {
            logging = logging.with_level(level);
        }
        if let Some(format) = parse_var::<LogFormat>(&var, "LOG_FORMAT")? {
            logging = logging.with_format(format);
        }

        builder.logging(logging).build()
    }

    /// Socket address the HTTP server binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config("CLIENT_ID must be set".to_string()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(Error::Config("CLIENT_SECRET must be set".to_string()));
        }
        if self.accounts.is_empty() {
            return Err(Error::Config(
                "At least one account must be configured".to_string(),
            ));
        }
        for (index, account) in self.accounts.iter().enumerate() {
            if !account.redirect_uri.starts_with("http://")
                && !account.redirect_uri.starts_with("https://")
            {
                return Err(Error::Config(format!(
                    "Redirect URI for account {} must be an http(s) URL, got {:?}",
                    index + 1,
                    account.redirect_uri
                )));
            }
            if account.credential_key.is_empty() {
                return Err(Error::Config(format!(
                    "Credential key for account {} cannot be empty",
                    index + 1
                )));
            }
        }
        if self.renewal_interval < Duration::from_secs(60) {
            return Err(Error::Config(
                "Token renewal interval must be at least 60 seconds".to_string(),
            ));
        }
        if self.stream.horizon_days == 0 {
            return Err(Error::Config(
                "Stream horizon must be at least one day".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

/// Builder for [`AppConfig`].
#[derive(Default)]
pub struct AppConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    bind_address: Option<IpAddr>,
    port: Option<u16>,
    account_count: Option<usize>,
    redirect_uris: HashMap<usize, String>,
    credentials_dir: Option<PathBuf>,
    renewal_interval: Option<Duration>,
    stream: StreamDefaults,
    logging: Option<LoggingConfig>,
}

impl AppConfigBuilder {
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn bind_address(mut self, addr: IpAddr) -> Self {
        self.bind_address = Some(addr);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn account_count(mut self, count: usize) -> Self {
        self.account_count = Some(count);
        self
    }

    /// Redirect target for the account at 0-based `index`.
    pub fn redirect_uri(mut self, index: usize, uri: impl Into<String>) -> Self {
        self.redirect_uris.insert(index, uri.into());
        self
    }

    pub fn credentials_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.credentials_dir = Some(dir.into());
        self
    }

    pub fn renewal_interval(mut self, interval: Duration) -> Self {
        self.renewal_interval = Some(interval);
        self
    }

    pub fn min_file_size(mut self, bytes: u64) -> Self {
        self.stream.min_file_size = bytes;
        self
    }

    pub fn horizon_days(mut self, days: u32) -> Self {
        self.stream.horizon_days = days;
        self
    }

    pub fn stream_query(mut self, query: impl Into<String>) -> Self {
        self.stream.query = query.into();
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds the configuration, filling per-account defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the client credentials are missing or
    /// any value fails [`AppConfig::validate`].
    pub fn build(self) -> Result<AppConfig> {
        let client_id = self
            .client_id
            .ok_or_else(|| Error::Config("CLIENT_ID must be set".to_string()))?;
        let client_secret = self
            .client_secret
            .ok_or_else(|| Error::Config("CLIENT_SECRET must be set".to_string()))?;

        let port = self.port.unwrap_or(DEFAULT_PORT);
        let account_count = self.account_count.unwrap_or(DEFAULT_ACCOUNT_COUNT);

        if let Some(stray) = self.redirect_uris.keys().find(|&&i| i >= account_count) {
            return Err(Error::Config(format!(
                "Redirect URI given for account {} but only {} accounts are configured",
                stray + 1,
                account_count
            )));
        }

        let mut redirect_uris = self.redirect_uris;
        let accounts = (0..account_count)
            .map(|index| {
                let redirect_uri = redirect_uris.remove(&index).unwrap_or_else(|| {
                    let fallback = format!("http://localhost:{}/google/redirect/{}", port, index);
                    warn!(
                        account = index + 1,
                        redirect_uri = %fallback,
                        "No redirect URI configured, using local default"
                    );
                    fallback
                });
                AccountConfig {
                    redirect_uri,
                    credential_key: format!("creds_account{}.json", index + 1),
                }
            })
            .collect();

        let config = AppConfig {
            client_id,
            client_secret,
            bind_address: self
                .bind_address
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port,
            accounts,
            credentials_dir: self.credentials_dir.unwrap_or_else(|| PathBuf::from(".")),
            renewal_interval: self.renewal_interval.unwrap_or(DEFAULT_RENEWAL_INTERVAL),
            stream: self.stream,
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_from_minimal_env() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("CLIENT_ID", "client"),
            ("CLIENT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.accounts.len(), DEFAULT_ACCOUNT_COUNT);
        assert_eq!(config.accounts[0].credential_key, "creds_account1.json");
        assert_eq!(config.accounts[14].credential_key, "creds_account15.json");
        assert_eq!(
            config.accounts[3].redirect_uri,
            "http://localhost:3000/google/redirect/3"
        );
        assert_eq!(config.renewal_interval, Duration::from_secs(3600));
        assert_eq!(config.stream, StreamDefaults::default());
        assert_eq!(config.listen_addr().port(), 3000);
    }

    #[test]
    fn test_missing_client_credentials_is_fatal() {
        let err = AppConfig::from_lookup(lookup_from(&[("CLIENT_SECRET", "secret")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("CLIENT_ID")));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("CLIENT_ID", "client"),
            ("CLIENT_SECRET", "  "),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("CLIENT_SECRET")));
    }

    #[test]
    fn test_per_account_redirect_uris() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("CLIENT_ID", "client"),
            ("CLIENT_SECRET", "secret"),
            ("PORT", "8080"),
            ("ACCOUNT_COUNT", "3"),
            ("REDIRECT_URI_ACCOUNT1", "https://cams.example.com/google/redirect/0"),
            ("REDIRECT_URI_ACCOUNT3", "https://cams.example.com/google/redirect/2"),
        ]))
        .unwrap();

        assert_eq!(config.accounts.len(), 3);
        assert_eq!(
            config.accounts[0].redirect_uri,
            "https://cams.example.com/google/redirect/0"
        );
        assert_eq!(
            config.accounts[1].redirect_uri,
            "http://localhost:8080/google/redirect/1"
        );
        assert_eq!(
            config.accounts[2].redirect_uri,
            "https://cams.example.com/google/redirect/2"
        );
    }

    #[test]
    fn test_invalid_numbers_are_config_errors() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("CLIENT_ID", "client"),
            ("CLIENT_SECRET", "secret"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("PORT")));
    }

    #[test]
    fn test_stream_and_logging_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("CLIENT_ID", "client"),
            ("CLIENT_SECRET", "secret"),
            ("MIN_FILE_SIZE_BYTES", "1024"),
            ("STREAM_HORIZON_DAYS", "2"),
            ("STREAM_QUERY", "mimeType='image/png'"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "compact"),
            ("TOKEN_RENEWAL_INTERVAL_SECS", "600"),
        ]))
        .unwrap();

        assert_eq!(config.stream.min_file_size, 1024);
        assert_eq!(config.stream.horizon_days, 2);
        assert_eq!(config.stream.query, "mimeType='image/png'");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.renewal_interval, Duration::from_secs(600));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = || AppConfig::builder().client_id("c").client_secret("s");

        assert!(base().account_count(0).build().is_err());
        assert!(base()
            .renewal_interval(Duration::from_secs(5))
            .build()
            .is_err());
        assert!(base().horizon_days(0).build().is_err());
        assert!(base()
            .account_count(2)
            .redirect_uri(0, "ftp://nope")
            .build()
            .is_err());
        assert!(base()
            .account_count(2)
            .redirect_uri(5, "https://x.example.com/cb")
            .build()
            .is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AppConfig::builder()
            .client_id("client")
            .client_secret("super-secret")
            .account_count(1)
            .build()
            .unwrap();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
