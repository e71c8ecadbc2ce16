//! Configuration module - environment variable parsing and simulation tunables

use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Seed for deterministic spawn randomness
    pub sim_seed: u64,

    pub discovery: DiscoveryConfig,
    pub gesture: GestureConfig,
    pub round: RoundConfig,
    pub targets: TargetConfig,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut discovery = DiscoveryConfig::default();
        if let Some(ms) = parse_env_u64("DISCOVERY_TIMEOUT_MS")? {
            discovery.timeout = Duration::from_millis(ms);
        }

        let mut round = RoundConfig::default();
        if let Some(secs) = parse_env_f32("ROUND_DURATION_SECS")? {
            round.duration_secs = secs;
        }

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            sim_seed: parse_env_u64("SIM_SEED")?.unwrap_or_else(crate::util::time::unix_millis),
            discovery,
            gesture: GestureConfig::default(),
            round,
            targets: TargetConfig::default(),
        })
    }
}

/// Wireless device discovery tunables
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    /// Total time budget for discovery
    pub timeout: Duration,
    /// Length of one scan sub-interval before the radio is cycled
    pub scan_interval: Duration,
    /// Pause between scan sub-intervals
    pub cooldown: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            scan_interval: Duration::from_secs(15),
            cooldown: Duration::from_secs(1),
        }
    }
}

/// Draw-and-release gesture tunables
#[derive(Clone, Debug)]
pub struct GestureConfig {
    /// Vertical acceleration above which a draw is recognized
    pub draw_threshold: f32,
    /// Vertical acceleration below which a drawn bow settles to ready
    pub ready_threshold: f32,
    /// Seconds after loading before ready is forced
    pub ready_timeout_secs: f32,
    /// Haptic pulse length on recenter
    pub rumble_millis: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            draw_threshold: 140.0,
            ready_threshold: 130.0,
            ready_timeout_secs: 1.0,
            rumble_millis: 100,
        }
    }
}

/// Round timing tunables
#[derive(Clone, Debug)]
pub struct RoundConfig {
    /// Scored round length in seconds
    pub duration_secs: f32,
    /// Count presented before the round starts
    pub pre_countdown: u32,
    /// Count presented over the final seconds of the round
    pub end_countdown: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            duration_secs: 30.0,
            pre_countdown: 3,
            end_countdown: 5,
        }
    }
}

/// Target population and motion tunables
#[derive(Clone, Debug)]
pub struct TargetConfig {
    /// Field is backfilled up to this count every tick
    pub min_targets: usize,
    /// Cadence spawns stop at this count
    pub max_targets: usize,
    /// Lower bound of the random wait between cadence spawns (seconds)
    pub spawn_wait_min: f32,
    /// Upper bound of the random wait between cadence spawns (seconds)
    pub spawn_wait_max: f32,
    /// Travel speed of every target (world units per second)
    pub speed: f32,
    /// Depth at which a target escapes past the player
    pub escape_depth: f32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            min_targets: 2,
            max_targets: 5,
            spawn_wait_min: 1.0,
            spawn_wait_max: 2.0,
            speed: 20.0,
            escape_depth: 1.5,
        }
    }
}

fn parse_env_u64(name: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(None),
    }
}

fn parse_env_f32(name: &'static str) -> Result<Option<f32>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
