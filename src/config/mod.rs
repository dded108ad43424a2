use crate::common::timestamp::{ClockZone, DEFAULT_TIMESTAMP_FORMAT, TimestampFormat};
use crate::error::{AdviceError, Result};
use dashmap::DashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

/// Environment key overriding the strftime pattern of `ErrorResponse::timestamp`
pub const TIMESTAMP_FORMAT_KEY: &str = "ADVICE_TIMESTAMP_FORMAT";

/// Environment key selecting the wall clock (`local` or `utc`)
pub const TIMEZONE_KEY: &str = "ADVICE_TIMEZONE";

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Create a service seeded from the process environment
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    /// Create an empty service; nothing is read from the environment
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

/// Settings of the exception advice
///
/// The only observable setting is the timestamp rendering. By default it
/// matches the `MMM d, yyyy h:m:s a` pattern existing clients parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceConfig {
    pub timestamp_format: TimestampFormat,
    pub clock_zone: ClockZone,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            timestamp_format: TimestampFormat::default(),
            clock_zone: ClockZone::Local,
        }
    }
}

impl AdviceConfig {
    /// Read the advice settings from a config service
    ///
    /// # Errors
    /// Returns an error if the timestamp pattern is not a valid strftime
    /// pattern or the time zone is neither `local` nor `utc`.
    pub fn from_service(service: &ConfigService) -> Result<Self> {
        let format = service
            .get(TIMESTAMP_FORMAT_KEY)
            .unwrap_or_else(|| DEFAULT_TIMESTAMP_FORMAT.to_string());
        let timestamp_format = TimestampFormat::parse(format)?;

        let clock_zone = match service.get(TIMEZONE_KEY) {
            Some(raw) => ClockZone::from_str(raw.trim())
                .map_err(|_| AdviceError::invalid_config(TIMEZONE_KEY, raw))?,
            None => ClockZone::Local,
        };

        Ok(Self {
            timestamp_format,
            clock_zone,
        })
    }

    /// Read the advice settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_service(&ConfigService::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_keys() {
        let config = AdviceConfig::from_service(&ConfigService::empty()).unwrap();
        assert_eq!(config, AdviceConfig::default());
        assert_eq!(config.timestamp_format.as_str(), DEFAULT_TIMESTAMP_FORMAT);
    }

    #[test]
    fn test_overrides() {
        let service = ConfigService::empty();
        service.set(TIMESTAMP_FORMAT_KEY, "%Y-%m-%d %H:%M:%S");
        service.set(TIMEZONE_KEY, "UTC");

        let config = AdviceConfig::from_service(&service).unwrap();
        assert_eq!(config.timestamp_format.as_str(), "%Y-%m-%d %H:%M:%S");
        assert_eq!(config.clock_zone, ClockZone::Utc);
    }

    #[test]
    fn test_invalid_timezone() {
        let service = ConfigService::empty();
        service.set(TIMEZONE_KEY, "mars");

        let err = AdviceConfig::from_service(&service).unwrap_err();
        assert_eq!(err, AdviceError::invalid_config(TIMEZONE_KEY, "mars"));
    }

    #[test]
    fn test_invalid_timestamp_format() {
        let service = ConfigService::empty();
        service.set(TIMESTAMP_FORMAT_KEY, "%Y %");

        let err = AdviceConfig::from_service(&service).unwrap_err();
        assert!(matches!(err, AdviceError::InvalidTimestampFormat { .. }));
    }

    #[test]
    fn test_offset_timestamp_format_rejected() {
        let service = ConfigService::empty();
        service.set(TIMESTAMP_FORMAT_KEY, "%b %-d, %Y %z");

        let err = AdviceConfig::from_service(&service).unwrap_err();
        assert_eq!(
            err,
            AdviceError::InvalidTimestampFormat {
                format: "%b %-d, %Y %z".to_string()
            }
        );
    }
}
