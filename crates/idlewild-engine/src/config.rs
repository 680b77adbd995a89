//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `idlewild-config.yaml` next to
//! the binary's working directory. Every field has a default matching the
//! values in the design notes, so a missing file (or a file with only a
//! few overrides) is always valid.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// World identity settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Progression constants applied each tick.
    #[serde(default)]
    pub progression: ProgressionConfig,

    /// Infrastructure connection strings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for infrastructure:
    /// `DRAGONFLY_URL` overrides `infrastructure.dragonfly_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

/// World identity configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable world name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Canonical id of the engine's own agent identity, excluded from
    /// tick progression.
    #[serde(default = "default_agent")]
    pub agent: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            agent: default_agent(),
        }
    }
}

/// Progression constants applied by the tick scheduler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressionConfig {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Probability of an encounter per player per tick, in `[0, 1]`.
    #[serde(default = "default_luck")]
    pub luck: f64,

    /// Wealth granted to each active player per tick.
    #[serde(default = "default_tick_reward")]
    pub tick_wealth: u64,

    /// Experience granted to each active player per tick.
    #[serde(default = "default_tick_reward")]
    pub tick_experience: u64,

    /// Cooldown drained per tick, floored at zero.
    #[serde(default = "default_cooldown_decay")]
    pub cooldown_decay: u64,

    /// Items a profile can carry before found items are skipped.
    #[serde(default = "default_inventory_capacity")]
    pub inventory_capacity: usize,

    /// Timeout for calls into chat services, in milliseconds.
    #[serde(default = "default_service_timeout_ms")]
    pub service_timeout_ms: u64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            luck: default_luck(),
            tick_wealth: default_tick_reward(),
            tick_experience: default_tick_reward(),
            cooldown_decay: default_cooldown_decay(),
            inventory_capacity: default_inventory_capacity(),
            service_timeout_ms: default_service_timeout_ms(),
        }
    }
}

/// Infrastructure connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// Redis URL of the Dragonfly durable store.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            dragonfly_url: default_dragonfly_url(),
        }
    }
}

impl InfrastructureConfig {
    /// Apply environment-variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DRAGONFLY_URL") {
            if !url.is_empty() {
                self.dragonfly_url = url;
            }
        }
    }
}

fn default_world_name() -> String {
    String::from("Idlewild")
}

fn default_agent() -> String {
    String::from("local/users/idlewild")
}

const fn default_tick_interval_ms() -> u64 {
    600_000
}

const fn default_luck() -> f64 {
    0.05
}

const fn default_tick_reward() -> u64 {
    10
}

const fn default_cooldown_decay() -> u64 {
    100
}

const fn default_inventory_capacity() -> usize {
    10
}

const fn default_service_timeout_ms() -> u64 {
    5_000
}

fn default_dragonfly_url() -> String {
    String::from("redis://127.0.0.1:6379")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = EngineConfig::parse("{}").unwrap();
        assert_eq!(config.progression.tick_interval_ms, 600_000);
        assert!((config.progression.luck - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.progression.tick_wealth, 10);
        assert_eq!(config.progression.tick_experience, 10);
        assert_eq!(config.world.agent, "local/users/idlewild");
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let yaml = "progression:\n  tick_interval_ms: 1000\n  luck: 0.5\n";
        let config = EngineConfig::parse(yaml).unwrap();
        assert_eq!(config.progression.tick_interval_ms, 1000);
        assert!((config.progression.luck - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.progression.tick_wealth, 10);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(EngineConfig::parse("progression: [not a map").is_err());
    }
}
