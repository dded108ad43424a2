//! Error classification
//!
//! Decides, for a raised error, the HTTP status, the log severity and the
//! message rendered to the client.

use crate::common::timestamp::{Clock, SystemClock, TimestampFormat};
use crate::common::ErrorResponse;
use crate::exception::{ErrorKind, RaisedError, present};
use axum::http::StatusCode;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display};

pub const VALIDATION_PREFIX: &str = "The save failed validation as follows: ";
pub const FALLBACK_PREFIX: &str = "An error occured during processing: ";
pub const INVALID_VALUE_MESSAGE: &str = "An invalid value was sent or requested.";
pub const DUPLICATE_VALUE_MESSAGE: &str = "The saved value already exists.";

/// Substring of a data-integrity message that marks a uniqueness conflict
pub const UNIQUE_PROPERTY_MARKER: &str = "Unique property";

const VIOLATION_SEPARATOR: &str = ",";

/// Log severity of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Warn,
    Error,
}

/// What went wrong, as far as the client is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorCategory {
    MissingValue,
    ValidationViolation,
    DuplicateConflict,
    IntegrityConflict,
    Unclassified,
}

/// How a raised error is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disposition {
    pub category: ErrorCategory,
    pub status: StatusCode,
    pub severity: Severity,
    /// Replaces the derived message when set
    pub message_override: Option<&'static str>,
}

/// Maps raised errors to error replies
///
/// Stateless apart from its clock and timestamp pattern, so one instance is
/// shared by all requests.
#[derive(Clone)]
pub struct ErrorClassifier {
    clock: Arc<dyn Clock>,
    timestamp_format: TimestampFormat,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock::default()), TimestampFormat::default())
    }
}

impl ErrorClassifier {
    pub fn new(clock: Arc<dyn Clock>, timestamp_format: TimestampFormat) -> Self {
        Self {
            clock,
            timestamp_format,
        }
    }

    /// Pick status, severity and message override for an error.
    ///
    /// Arms run most-specific first; `Unclassified` is the catch-all.
    pub fn dispatch(error: &RaisedError) -> Disposition {
        let (category, status, severity, message_override) = match error.kind() {
            ErrorKind::MissingValue => (
                ErrorCategory::MissingValue,
                StatusCode::BAD_REQUEST,
                Severity::Error,
                Some(INVALID_VALUE_MESSAGE),
            ),
            ErrorKind::ConstraintViolation => (
                ErrorCategory::ValidationViolation,
                StatusCode::BAD_REQUEST,
                Severity::Warn,
                None,
            ),
            // A missing message never matches the marker
            ErrorKind::DataIntegrity
                if error
                    .message()
                    .unwrap_or_default()
                    .contains(UNIQUE_PROPERTY_MARKER) =>
            {
                (
                    ErrorCategory::DuplicateConflict,
                    StatusCode::CONFLICT,
                    Severity::Error,
                    Some(DUPLICATE_VALUE_MESSAGE),
                )
            }
            ErrorKind::DataIntegrity => (
                ErrorCategory::IntegrityConflict,
                StatusCode::CONFLICT,
                Severity::Error,
                None,
            ),
            ErrorKind::Unclassified => (
                ErrorCategory::Unclassified,
                StatusCode::BAD_REQUEST,
                Severity::Error,
                None,
            ),
        };

        Disposition {
            category,
            status,
            severity,
            message_override,
        }
    }

    /// Build the reply body for `error` with an explicit status
    pub fn classify(&self, path: &str, status: StatusCode, error: &RaisedError) -> ErrorResponse {
        ErrorResponse::new(self.timestamp(), status, derive_message(error), path)
    }

    /// Dispatch `error` and build its reply body, applying message overrides
    pub fn resolve(&self, path: &str, error: &RaisedError) -> (Disposition, ErrorResponse) {
        let disposition = Self::dispatch(error);
        let body = match disposition.message_override {
            Some(message) => {
                ErrorResponse::new(self.timestamp(), disposition.status, message, path)
            }
            None => self.classify(path, disposition.status, error),
        };
        (disposition, body)
    }

    fn timestamp(&self) -> String {
        self.timestamp_format.render(self.clock.now())
    }
}

/// Render the client message of an error
///
/// 1. validation errors with violations list every violation message;
/// 2. else the localized message;
/// 3. else the plain message;
/// 4. else a fallback naming the error.
///
/// Blank messages count as absent.
pub fn derive_message(error: &RaisedError) -> String {
    if error.kind() == ErrorKind::ConstraintViolation && !error.violations().is_empty() {
        let messages: Vec<&str> = error
            .violations()
            .iter()
            .map(|violation| violation.message.as_str())
            .collect();
        return format!("{}{}", VALIDATION_PREFIX, messages.join(VIOLATION_SEPARATOR));
    }

    if let Some(message) = present(error.localized_message()) {
        message.to_string()
    } else if let Some(message) = present(error.message()) {
        message.to_string()
    } else {
        format!("{}{}", FALLBACK_PREFIX, error)
    }
}
