use std::sync::Arc;

use crate::event_sourcing::compressor::{Compressor, ZlibCompressor};
use crate::event_sourcing::core::DomainEvent;
use crate::event_sourcing::store::Mapper;
use crate::event_sourcing::transcoding::TranscodingError;
use crate::utils::RetryConfig;

// ============================================================================
// Configuration
// ============================================================================
//
// EVENTSOURCING_COMPRESSION     "none" or a zlib level 0-9 (default 6)
// EVENTSOURCING_RETRY_PROFILE   default, aggressive, conservative or none
// EVENTSOURCING_MAX_RETRIES     attempts per command, at least 1; overrides
//                               the profile's attempt count
//
// ============================================================================

pub const COMPRESSION_VAR: &str = "EVENTSOURCING_COMPRESSION";
pub const RETRY_PROFILE_VAR: &str = "EVENTSOURCING_RETRY_PROFILE";
pub const MAX_RETRIES_VAR: &str = "EVENTSOURCING_MAX_RETRIES";

const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSourcingConfig {
    /// zlib level for stored events; `None` stores plain JSON text
    pub compression: Option<u32>,
    pub retry: RetryConfig,
}

impl Default for EventSourcingConfig {
    fn default() -> Self {
        Self {
            compression: Some(DEFAULT_COMPRESSION_LEVEL),
            retry: RetryConfig::default(),
        }
    }
}

impl EventSourcingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(COMPRESSION_VAR) {
            config.compression = parse_compression(&value)?;
        }

        if let Some(value) = lookup(RETRY_PROFILE_VAR) {
            config.retry = parse_retry_profile(&value)?;
        }

        if let Some(value) = lookup(MAX_RETRIES_VAR) {
            config.retry.max_attempts = match value.trim().parse::<u32>() {
                Ok(attempts) if attempts >= 1 => attempts,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: MAX_RETRIES_VAR,
                        value,
                        reason: "expected a positive integer",
                    })
                }
            };
        }

        tracing::debug!(
            compression = ?config.compression,
            max_attempts = config.retry.max_attempts,
            "Config loaded"
        );
        Ok(config)
    }

    pub fn compressor(&self) -> Option<Arc<dyn Compressor>> {
        self.compression
            .map(|level| Arc::new(ZlibCompressor::with_level(level)) as Arc<dyn Compressor>)
    }

    /// Mapper for events of type `E` with the configured compression.
    pub fn mapper<E: DomainEvent>(&self) -> Result<Mapper<E>, TranscodingError> {
        let mapper = Mapper::for_events()?;
        Ok(match self.compressor() {
            Some(compressor) => mapper.with_compressor(compressor),
            None => mapper,
        })
    }
}

fn parse_retry_profile(value: &str) -> Result<RetryConfig, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "default" => Ok(RetryConfig::default()),
        "aggressive" => Ok(RetryConfig::aggressive()),
        "conservative" => Ok(RetryConfig::conservative()),
        "none" => Ok(RetryConfig::none()),
        _ => Err(ConfigError::InvalidValue {
            var: RETRY_PROFILE_VAR,
            value: value.to_string(),
            reason: "expected default, aggressive, conservative or none",
        }),
    }
}

fn parse_compression(value: &str) -> Result<Option<u32>, ConfigError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    match trimmed.parse::<u32>() {
        Ok(level) if level <= 9 => Ok(Some(level)),
        _ => Err(ConfigError::InvalidValue {
            var: COMPRESSION_VAR,
            value: value.to_string(),
            reason: "expected \"none\" or a level from 0 to 9",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EventSourcingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EventSourcingConfig::default());
        assert_eq!(config.compression, Some(6));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_reads_compression_and_retries() {
        let config = EventSourcingConfig::from_lookup(lookup(&[
            (COMPRESSION_VAR, "9"),
            (MAX_RETRIES_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.compression, Some(9));
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_retry_profile_selects_preset() {
        for (profile, expected) in [
            ("aggressive", RetryConfig::aggressive()),
            ("Conservative", RetryConfig::conservative()),
            ("none", RetryConfig::none()),
            ("default", RetryConfig::default()),
        ] {
            let config =
                EventSourcingConfig::from_lookup(lookup(&[(RETRY_PROFILE_VAR, profile)])).unwrap();
            assert_eq!(config.retry, expected, "profile {profile}");
        }
    }

    #[test]
    fn test_max_retries_overrides_profile_attempts() {
        let config = EventSourcingConfig::from_lookup(lookup(&[
            (RETRY_PROFILE_VAR, "aggressive"),
            (MAX_RETRIES_VAR, "8"),
        ]))
        .unwrap();
        assert_eq!(config.retry.max_attempts, 8);
        assert_eq!(config.retry.initial_delay, RetryConfig::aggressive().initial_delay);
    }

    #[test]
    fn test_compression_can_be_disabled() {
        let config =
            EventSourcingConfig::from_lookup(lookup(&[(COMPRESSION_VAR, "None")])).unwrap();
        assert_eq!(config.compression, None);
        assert!(config.compressor().is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (var, value) in [
            (COMPRESSION_VAR, "10"),
            (COMPRESSION_VAR, "fast"),
            (MAX_RETRIES_VAR, "0"),
            (MAX_RETRIES_VAR, "-1"),
            (RETRY_PROFILE_VAR, "eager"),
        ] {
            let result = EventSourcingConfig::from_lookup(lookup(&[(var, value)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { var: v, .. }) if v == var),
                "{var}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_mapper_uses_configured_compression() {
        use crate::domain::bank_account::BankAccountEvent;

        let compressed = EventSourcingConfig::default()
            .mapper::<BankAccountEvent>()
            .unwrap();
        assert!(compressed.is_compressed());

        let plain = EventSourcingConfig {
            compression: None,
            ..Default::default()
        }
        .mapper::<BankAccountEvent>()
        .unwrap();
        assert!(!plain.is_compressed());
    }
}
