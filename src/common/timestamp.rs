use crate::error::{AdviceError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDateTime, Utc};
use std::fmt::Write;
use strum_macros::{Display, EnumString};

/// strftime rendering of `MMM d, yyyy h:m:s a`, e.g. `Mar 7, 2015 2:5:9 PM`
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%b %-d, %Y %-I:%-M:%-S %p";

/// A validated strftime pattern for `ErrorResponse::timestamp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFormat(String);

impl Default for TimestampFormat {
    fn default() -> Self {
        Self(DEFAULT_TIMESTAMP_FORMAT.to_string())
    }
}

impl TimestampFormat {
    /// Validate a strftime pattern
    ///
    /// # Errors
    /// Rejects blank patterns, unknown specifiers and specifiers a
    /// zone-less date-time cannot render (`%z`, `%Z`, ...).
    pub fn parse(format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        let invalid = format.trim().is_empty()
            || StrftimeItems::new(&format).any(|item| matches!(item, Item::Error))
            || write!(
                String::new(),
                "{}",
                NaiveDateTime::default().format(&format)
            )
            .is_err();
        if invalid {
            return Err(AdviceError::InvalidTimestampFormat { format });
        }
        Ok(Self(format))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render `at`; falls back to [`DEFAULT_TIMESTAMP_FORMAT`] if the pattern
    /// cannot be rendered
    pub fn render(&self, at: NaiveDateTime) -> String {
        let mut out = String::new();
        if write!(out, "{}", at.format(&self.0)).is_err() {
            out.clear();
            // the default pattern only uses zone-less specifiers
            let _ = write!(out, "{}", at.format(DEFAULT_TIMESTAMP_FORMAT));
        }
        out
    }
}

/// Which wall clock the failure time is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClockZone {
    Local,
    Utc,
}

/// Source of the request failure time
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the current wall time
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    zone: ClockZone,
}

impl SystemClock {
    pub fn new(zone: ClockZone) -> Self {
        Self { zone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(ClockZone::Local)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        match self.zone {
            ClockZone::Local => Local::now().naive_local(),
            ClockZone::Utc => Utc::now().naive_utc(),
        }
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 3, 7)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_default_format_is_unpadded() {
        let format = TimestampFormat::default();
        assert_eq!(format.render(at(14, 5, 9)), "Mar 7, 2015 2:5:9 PM");
        assert_eq!(format.render(at(0, 30, 45)), "Mar 7, 2015 12:30:45 AM");
    }

    #[test]
    fn test_parse_rejects_offset_specifiers() {
        for pattern in ["%b %-d, %Y %z", "%:z", "%Z"] {
            assert!(
                matches!(
                    TimestampFormat::parse(pattern),
                    Err(AdviceError::InvalidTimestampFormat { .. })
                ),
                "{} should be rejected",
                pattern
            );
        }
    }

    #[test]
    fn test_render_falls_back_to_default_pattern() {
        let format = TimestampFormat("%b %-d, %Y %z".to_string());
        assert_eq!(format.render(at(14, 5, 9)), "Mar 7, 2015 2:5:9 PM");
    }

    #[test]
    fn test_parse_rejects_empty_pattern() {
        assert!(TimestampFormat::parse("  ").is_err());
        assert!(TimestampFormat::parse("%Y-%m-%d").is_ok());
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(at(9, 0, 0));
        assert_eq!(clock.now(), at(9, 0, 0));
    }

    #[test]
    fn test_clock_zone_parsing() {
        assert_eq!("Local".parse::<ClockZone>().unwrap(), ClockZone::Local);
        assert_eq!("utc".parse::<ClockZone>().unwrap(), ClockZone::Utc);
        assert!("gmt".parse::<ClockZone>().is_err());
        assert_eq!(ClockZone::Utc.to_string(), "utc");
    }
}
