//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::RelayError;

/// Default HTTP / realtime port.
pub const DEFAULT_HTTP_PORT: u16 = 3010;

/// Default producer ingestion port.
pub const DEFAULT_PRODUCER_PORT: u16 = 9998;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(RelayError::Config(format!("unknown LOG_FORMAT: {other}"))),
        }
    }
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address of the HTTP / realtime listener.
    pub http_addr: SocketAddr,

    /// Address of the raw producer listener.
    pub producer_addr: SocketAddr,

    /// Directory containing `index.html` and the `js/` asset directory.
    pub public_dir: PathBuf,

    /// Maximum bytes read from a producer in one chunk.
    pub read_buffer_size: usize,

    /// Outbound queue length per client session.
    pub session_queue_capacity: usize,

    /// Interval between keepalive pings to each session.
    pub ping_interval: Duration,

    /// A session silent for this long is closed.
    pub idle_timeout: Duration,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let any = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        Self {
            http_addr: SocketAddr::new(any, DEFAULT_HTTP_PORT),
            producer_addr: SocketAddr::new(any, DEFAULT_PRODUCER_PORT),
            public_dir: PathBuf::from("public"),
            read_buffer_size: 64 * 1024,
            session_queue_capacity: 1024,
            ping_interval: Duration::from_secs(25),
            idle_timeout: Duration::from_secs(60),
            log_format: LogFormat::Pretty,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set. Calls
    /// `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if a port, host or `LOG_FORMAT` is set
    /// but cannot be parsed.
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let http_addr = SocketAddr::new(
            parse_required("HTTP_HOST", defaults.http_addr.ip())?,
            parse_required("PORT", DEFAULT_HTTP_PORT)?,
        );
        let producer_addr = SocketAddr::new(
            parse_required("PRODUCER_HOST", defaults.producer_addr.ip())?,
            parse_required("PRODUCER_PORT", DEFAULT_PRODUCER_PORT)?,
        );

        let public_dir = std::env::var("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.public_dir);

        let read_buffer_size = parse_env("READ_BUFFER_SIZE", defaults.read_buffer_size);
        let session_queue_capacity =
            parse_env("SESSION_QUEUE_CAPACITY", defaults.session_queue_capacity);
        let ping_interval = Duration::from_secs(parse_env(
            "WS_PING_INTERVAL_SECS",
            defaults.ping_interval.as_secs(),
        ));
        let idle_timeout = Duration::from_secs(parse_env(
            "WS_IDLE_TIMEOUT_SECS",
            defaults.idle_timeout.as_secs(),
        ));
        let log_format = parse_required("LOG_FORMAT", defaults.log_format)?;

        Ok(Self {
            http_addr,
            producer_addr,
            public_dir,
            read_buffer_size: read_buffer_size.max(1),
            session_queue_capacity,
            ping_interval,
            idle_timeout,
            log_format,
        })
    }

    /// Path of the root HTML page.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.public_dir.join("index.html")
    }

    /// Directory served under `/js`.
    #[must_use]
    pub fn assets_dir(&self) -> PathBuf {
        self.public_dir.join("js")
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as `T`, returning `default` when it is
/// missing and an error when it is present but invalid.
fn parse_required<T>(key: &str, default: T) -> Result<T, RelayError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| RelayError::Config(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(default),
    }
}
