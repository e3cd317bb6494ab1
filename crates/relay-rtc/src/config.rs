use ::config::{Config as ConfigSource, Environment};
use serde::Deserialize;
use std::sync::Arc;

use crate::buffer::{PacketHistory, RetentionBuffer, DEFAULT_MAX_PACKETS};
use crate::error::{Error, Result};

/// Environment prefix, e.g. `RELAY_RETENTION__MAX_PACKETS=2048`
pub const ENV_PREFIX: &str = "RELAY";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Keep recent packets around for NACK handling
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Packets retained per SSRC
    #[serde(default = "default_max_packets")]
    pub max_packets: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_max_packets() -> usize {
    DEFAULT_MAX_PACKETS
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_packets: default_max_packets(),
        }
    }
}

impl Config {
    /// Load from `RELAY_*` environment variables, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::load_with_prefix(ENV_PREFIX)
    }

    pub fn load_with_prefix(prefix: &str) -> Result<Self> {
        let config: Config = ConfigSource::builder()
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        if !config.retention.enabled {
            tracing::warn!("Packet retention disabled, NACKs will not be answered from history");
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retention.enabled && self.retention.max_packets == 0 {
            return Err(Error::InvalidConfig(
                "retention.max_packets must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the retention buffer receivers should share, if retention is on
    pub fn retention_buffer(&self) -> Option<Arc<dyn RetentionBuffer>> {
        if !self.retention.enabled {
            return None;
        }
        Some(Arc::new(PacketHistory::new(self.retention.max_packets)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = Config::load_with_prefix("RELAY_TEST_UNSET").unwrap();
        assert!(config.retention.enabled);
        assert_eq!(config.retention.max_packets, DEFAULT_MAX_PACKETS);
        assert!(config.retention_buffer().is_some());
    }

    #[test]
    fn test_env_overrides() {
        // SAFETY: prefix is unique to this test, nothing else reads these vars
        unsafe {
            std::env::set_var("RELAY_TEST_OVERRIDE_RETENTION__MAX_PACKETS", "256");
        }
        let config = Config::load_with_prefix("RELAY_TEST_OVERRIDE").unwrap();
        assert_eq!(config.retention.max_packets, 256);
        assert!(config.retention.enabled);
    }

    #[test]
    fn test_disabled_retention_has_no_buffer() {
        // SAFETY: prefix is unique to this test, nothing else reads these vars
        unsafe {
            std::env::set_var("RELAY_TEST_DISABLED_RETENTION__ENABLED", "false");
        }
        let config = Config::load_with_prefix("RELAY_TEST_DISABLED").unwrap();
        assert!(!config.retention.enabled);
        assert!(config.retention_buffer().is_none());
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let config = Config {
            retention: RetentionConfig {
                enabled: true,
                max_packets: 0,
            },
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
