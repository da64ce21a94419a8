//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Application configuration loaded from environment variables
///
/// Every knob has a default; the server boots with no environment at all,
/// which suits the guest-friendly deployment model.
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origin for CORS ("*" for any)
    pub client_origin: String,

    /// World grid width in tiles (platform-wide, all rooms)
    pub world_width: usize,
    /// World grid height in tiles
    pub world_height: usize,
    /// Maximum retained change-log entries per room
    pub change_log_cap: usize,

    /// Evict a room after this long without activity
    pub room_idle_timeout: Duration,
    /// How often the registry sweep checks for idle rooms
    pub room_sweep_interval: Duration,
    /// Presence liveness threshold
    pub presence_ttl: Duration,
    /// How often the sweep purges stale presence
    pub presence_sweep_interval: Duration,

    /// Per-player mutation submissions per second
    pub mutation_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            client_origin: env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "*".to_string()),

            world_width: parse_env("WORLD_WIDTH", 150)?,
            world_height: parse_env("WORLD_HEIGHT", 80)?,
            change_log_cap: parse_env("CHANGE_LOG_CAP", 1000)?,

            room_idle_timeout: Duration::from_secs(parse_env("ROOM_IDLE_TIMEOUT_SECS", 3600)?),
            room_sweep_interval: Duration::from_secs(parse_env("ROOM_SWEEP_INTERVAL_SECS", 300)?),
            presence_ttl: Duration::from_secs(parse_env("PRESENCE_TTL_SECS", 30)?),
            // A zero interval would panic the sweep timer; floor at 1s
            presence_sweep_interval: Duration::from_secs(
                parse_env("PRESENCE_SWEEP_INTERVAL_SECS", 10u64)?.max(1),
            ),

            mutation_rate_limit: parse_env("MUTATION_RATE_LIMIT", 30)?,
        })
    }

    /// Small, fast configuration for unit and integration tests
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".parse().expect("valid test addr"),
            log_level: "warn".to_string(),
            client_origin: "*".to_string(),
            world_width: 150,
            world_height: 80,
            change_log_cap: 1000,
            room_idle_timeout: Duration::from_secs(3600),
            room_sweep_interval: Duration::from_secs(300),
            presence_ttl: Duration::from_secs(30),
            presence_sweep_interval: Duration::from_secs(10),
            mutation_rate_limit: 10_000,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
