//! Configuration for Telereach

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Outreach engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Follow-up queue configuration
    #[serde(default)]
    pub followup: FollowUpConfig,

    /// Gateway session cache configuration
    #[serde(default)]
    pub sessions: SessionConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: Option<String>,

    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

/// Outreach engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Substitute for `{name}` when a contact has no display name
    #[serde(default = "default_fallback_name")]
    pub fallback_name: String,

    /// Greeting substituted for `{time}` before noon
    #[serde(default = "default_greeting_morning")]
    pub greeting_morning: String,

    /// Greeting substituted for `{time}` between noon and 18:00
    #[serde(default = "default_greeting_afternoon")]
    pub greeting_afternoon: String,

    /// Greeting substituted for `{time}` from 18:00 onward
    #[serde(default = "default_greeting_evening")]
    pub greeting_evening: String,

    /// How many per-contact error details a run summary retains
    #[serde(default = "default_max_error_reports")]
    pub max_error_reports: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_name: default_fallback_name(),
            greeting_morning: default_greeting_morning(),
            greeting_afternoon: default_greeting_afternoon(),
            greeting_evening: default_greeting_evening(),
            max_error_reports: default_max_error_reports(),
        }
    }
}

fn default_fallback_name() -> String {
    "friend".to_string()
}

fn default_greeting_morning() -> String {
    "Good morning".to_string()
}

fn default_greeting_afternoon() -> String {
    "Good afternoon".to_string()
}

fn default_greeting_evening() -> String {
    "Good evening".to_string()
}

fn default_max_error_reports() -> usize {
    10
}

/// Follow-up queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpConfig {
    /// Fixed delay between voice sends during a drain, in seconds
    #[serde(default = "default_send_gap_secs")]
    pub send_gap_secs: u64,

    /// Only process items whose scheduled_at has elapsed.
    /// When false the drain sweeps every pending item and scheduled_at
    /// stays advisory.
    #[serde(default)]
    pub enforce_schedule: bool,
}

impl Default for FollowUpConfig {
    fn default() -> Self {
        Self {
            send_gap_secs: default_send_gap_secs(),
            enforce_schedule: false,
        }
    }
}

fn default_send_gap_secs() -> u64 {
    15
}

/// Gateway session cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle time after which a cached session is evicted, in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum number of live sessions kept at once
    #[serde(default = "default_session_capacity")]
    pub capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
            capacity: default_session_capacity(),
        }
    }
}

fn default_session_ttl_secs() -> u64 {
    1800
}

fn default_session_capacity() -> usize {
    64
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> crate::Result<Self> {
        let paths = [
            std::path::PathBuf::from("./telereach.toml"),
            std::path::PathBuf::from("/etc/telereach/config.toml"),
        ];

        for path in paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(crate::Error::Config(
            "No configuration file found".to_string(),
        ))
    }
}
