use serde::{Deserialize, Serialize};

/// Default number of units a pump moves per tick.
pub const DEFAULT_PER_TICK_TRANSFER: u32 = 50;

/// Errors from validating a [`PumpConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("per_tick_transfer must be greater than zero")]
    ZeroTransfer,
}

/// Tunables shared by every pump.
///
/// Deserialization does not validate; callers run
/// [`validate`](PumpConfig::validate) before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    per_tick_transfer: u32,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            per_tick_transfer: DEFAULT_PER_TICK_TRANSFER,
        }
    }
}

impl PumpConfig {
    /// A validated config moving `per_tick_transfer` units per tick.
    pub fn new(per_tick_transfer: u32) -> Result<Self, ConfigError> {
        let config = Self { per_tick_transfer };
        config.validate()?;
        Ok(config)
    }

    /// Maximum units a single pump moves per tick.
    pub fn per_tick_transfer(&self) -> u32 {
        self.per_tick_transfer
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_tick_transfer == 0 {
            return Err(ConfigError::ZeroTransfer);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = PumpConfig::default();
        assert_eq!(config.per_tick_transfer(), DEFAULT_PER_TICK_TRANSFER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_transfer_rejected() {
        assert_eq!(PumpConfig::new(0), Err(ConfigError::ZeroTransfer));
        assert_eq!(PumpConfig::new(1).unwrap().per_tick_transfer(), 1);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: PumpConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PumpConfig::default());

        let config: PumpConfig = serde_json::from_str(r#"{"per_tick_transfer": 7}"#).unwrap();
        assert_eq!(config.per_tick_transfer(), 7);
    }

    #[test]
    fn deserialized_zero_fails_validation() {
        let config: PumpConfig = serde_json::from_str(r#"{"per_tick_transfer": 0}"#).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::ZeroTransfer));
    }
}
