//! Configuration loading, validation, and management for harvestbot.
//!
//! Loads configuration from `~/.harvestbot/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use harvestbot_core::{ControlState, DEFAULT_TARGET_KIND, MIN_HEALTH_FLOOR};
use serde::{Deserialize, Serialize};

/// The root configuration structure.
///
/// Maps directly to `~/.harvestbot/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// World server to join (fixed for the process lifetime)
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// What to harvest and when to offload
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Travel retry policy
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// Self-feeding thresholds
    #[serde(default)]
    pub vitals: VitalsConfig,

    /// Retaliation settings
    #[serde(default)]
    pub combat: CombatConfig,

    /// Reconnect and reporting cadence
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: String,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    25565
}
fn default_username() -> String {
    "HarvestBot".into()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    #[serde(default = "default_target_kind")]
    pub target_kind: String,

    #[serde(default)]
    pub auto_replant: bool,

    /// Health below which the loop feeds before searching
    #[serde(default = "default_min_health")]
    pub min_health: u32,

    #[serde(default = "default_search_radius")]
    pub search_radius: f64,

    /// Session count that triggers a deposit
    #[serde(default = "default_deposit_after")]
    pub deposit_after: u32,

    /// Carried stack count that triggers a deposit
    #[serde(default = "default_max_carried_stacks")]
    pub max_carried_stacks: usize,

    /// Maximum horizontal offset of a wander target
    #[serde(default = "default_wander_radius")]
    pub wander_radius: f64,

    /// Keep harvesting after feeding even if health stays below `min_health`
    #[serde(default = "default_true")]
    pub keep_working_when_hurt: bool,

    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

fn default_target_kind() -> String {
    DEFAULT_TARGET_KIND.into()
}
fn default_min_health() -> u32 {
    2
}
fn default_search_radius() -> f64 {
    256.0
}
fn default_deposit_after() -> u32 {
    64
}
fn default_max_carried_stacks() -> usize {
    35
}
fn default_wander_radius() -> f64 {
    40.0
}
fn default_command_prefix() -> String {
    "?".into()
}
fn default_true() -> bool {
    true
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            target_kind: default_target_kind(),
            auto_replant: false,
            min_health: default_min_health(),
            search_radius: default_search_radius(),
            deposit_after: default_deposit_after(),
            max_carried_stacks: default_max_carried_stacks(),
            wander_radius: default_wander_radius(),
            keep_working_when_hurt: true,
            command_prefix: default_command_prefix(),
        }
    }
}

impl HarvestConfig {
    /// The control state the process starts with.
    pub fn initial_control_state(&self) -> ControlState {
        let mut state = ControlState {
            auto_replant: self.auto_replant,
            ..ControlState::default()
        };
        state.set_target(&self.target_kind);
        state.set_min_health(self.min_health);
        state
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait between failed attempts toward a harvest target
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Wait between failed attempts toward a chest
    #[serde(default = "default_chest_retry_delay_ms")]
    pub chest_retry_delay_ms: u64,

    /// Run obstacle clearing on every attempt divisible by this
    #[serde(default = "default_clear_every")]
    pub clear_every: u32,

    #[serde(default = "default_wander_timeout_ms")]
    pub wander_timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    20
}
fn default_retry_delay_ms() -> u64 {
    200
}
fn default_chest_retry_delay_ms() -> u64 {
    300
}
fn default_clear_every() -> u32 {
    5
}
fn default_wander_timeout_ms() -> u64 {
    10_000
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            chest_retry_delay_ms: default_chest_retry_delay_ms(),
            clear_every: default_clear_every(),
            wander_timeout_ms: default_wander_timeout_ms(),
        }
    }
}

impl NavigationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn chest_retry_delay(&self) -> Duration {
        Duration::from_millis(self.chest_retry_delay_ms)
    }

    pub fn wander_timeout(&self) -> Duration {
        Duration::from_millis(self.wander_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalsConfig {
    #[serde(default = "default_vitals_interval")]
    pub interval_secs: u64,

    /// Monitor feeds when food drops below this
    #[serde(default = "default_food_below")]
    pub food_below: u32,

    /// Monitor feeds when health drops below this
    #[serde(default = "default_health_below")]
    pub health_below: f32,

    /// The loop's own emergency food threshold
    #[serde(default = "default_emergency_food_below")]
    pub emergency_food_below: u32,

    #[serde(default = "default_eat_settle_ms")]
    pub eat_settle_ms: u64,
}

fn default_vitals_interval() -> u64 {
    5
}
fn default_food_below() -> u32 {
    18
}
fn default_health_below() -> f32 {
    15.0
}
fn default_emergency_food_below() -> u32 {
    6
}
fn default_eat_settle_ms() -> u64 {
    2000
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_vitals_interval(),
            food_below: default_food_below(),
            health_below: default_health_below(),
            emergency_food_below: default_emergency_food_below(),
            eat_settle_ms: default_eat_settle_ms(),
        }
    }
}

impl VitalsConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn eat_settle(&self) -> Duration {
        Duration::from_millis(self.eat_settle_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Only retaliate for entities closer than this
    #[serde(default = "default_reach")]
    pub reach: f64,

    #[serde(default = "default_follow_up_ms")]
    pub follow_up_ms: u64,
}

fn default_reach() -> f64 {
    5.0
}
fn default_follow_up_ms() -> u64 {
    500
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reach: default_reach(),
            follow_up_ms: default_follow_up_ms(),
        }
    }
}

impl CombatConfig {
    pub fn follow_up(&self) -> Duration {
        Duration::from_millis(self.follow_up_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,
}

fn default_reconnect_delay() -> u64 {
    5
}
fn default_stats_interval() -> u64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: default_reconnect_delay(),
            stats_interval_secs: default_stats_interval(),
        }
    }
}

impl SessionConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.harvestbot/config.toml).
    ///
    /// Environment variables override the file:
    /// - `HARVESTBOT_HOST`, `HARVESTBOT_PORT`, `HARVESTBOT_USERNAME`
    /// - `HARVESTBOT_TARGET`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;

        if let Ok(host) = std::env::var("HARVESTBOT_HOST") {
            config.connection.host = host;
        }

        if let Ok(port) = std::env::var("HARVESTBOT_PORT") {
            config.connection.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("HARVESTBOT_PORT is not a port: {port}"))
            })?;
        }

        if let Ok(username) = std::env::var("HARVESTBOT_USERNAME") {
            config.connection.username = username;
        }

        if let Ok(target) = std::env::var("HARVESTBOT_TARGET") {
            config.harvest.target_kind = target;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".harvestbot")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.harvest.target_kind.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "harvest.target_kind must not be empty".into(),
            ));
        }

        if self.harvest.min_health < MIN_HEALTH_FLOOR {
            return Err(ConfigError::ValidationError(format!(
                "harvest.min_health must be at least {MIN_HEALTH_FLOOR}"
            )));
        }

        if self.harvest.search_radius <= 0.0 {
            return Err(ConfigError::ValidationError(
                "harvest.search_radius must be > 0".into(),
            ));
        }

        if self.harvest.command_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "harvest.command_prefix must not be empty".into(),
            ));
        }

        if self.navigation.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "navigation.max_attempts must be > 0".into(),
            ));
        }

        if self.navigation.clear_every == 0 {
            return Err(ConfigError::ValidationError(
                "navigation.clear_every must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
