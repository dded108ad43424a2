use crate::exception::{ErrorCategory, RaisedError, Severity};
use axum::http::StatusCode;
use std::sync::Mutex;

/// One failed request, as handed to an [`ErrorLog`]
#[derive(Debug, Clone, Copy)]
pub struct FailureRecord<'a> {
    pub severity: Severity,
    pub category: ErrorCategory,
    pub status: StatusCode,
    pub method: &'a str,
    pub url: &'a str,
    pub error: &'a RaisedError,
}

impl FailureRecord<'_> {
    /// Human-readable headline of the log line
    pub fn summary(&self) -> &'static str {
        match self.category {
            ErrorCategory::ValidationViolation => "A required value is missing",
            ErrorCategory::MissingValue
            | ErrorCategory::DuplicateConflict
            | ErrorCategory::IntegrityConflict => "The data sent for processing had errors",
            ErrorCategory::Unclassified => "An error occurred during the processing of the request",
        }
    }
}

/// Sink for the one log record written per failed request
pub trait ErrorLog: Send + Sync + 'static {
    fn record(&self, record: &FailureRecord<'_>);
}

/// Writes failures as `tracing` events under the `error_advice` target
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorLog;

impl ErrorLog for TracingErrorLog {
    fn record(&self, record: &FailureRecord<'_>) {
        let detail = record.error.trace();
        let status = record.status.as_u16();

        match record.severity {
            Severity::Warn => tracing::warn!(
                target: "error_advice",
                method = %record.method,
                url = %record.url,
                status,
                severity = %record.severity.as_ref(),
                category = %record.category,
                kind = %record.error.kind(),
                detail = %detail,
                "{}: {}",
                record.summary(),
                record.url
            ),
            Severity::Error => tracing::error!(
                target: "error_advice",
                method = %record.method,
                url = %record.url,
                status,
                severity = %record.severity.as_ref(),
                category = %record.category,
                kind = %record.error.kind(),
                detail = %detail,
                "{}: {}",
                record.summary(),
                record.url
            ),
        }
    }
}

/// Owned copy of a [`FailureRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFailure {
    pub severity: Severity,
    pub category: ErrorCategory,
    pub status: StatusCode,
    pub method: String,
    pub url: String,
    pub detail: String,
}

/// Keeps every failure in memory, for assertions in host tests
#[derive(Debug, Default)]
pub struct RecordingErrorLog {
    records: Mutex<Vec<RecordedFailure>>,
}

impl RecordingErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<RecordedFailure> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorLog for RecordingErrorLog {
    fn record(&self, record: &FailureRecord<'_>) {
        let owned = RecordedFailure {
            severity: record.severity,
            category: record.category,
            status: record.status,
            method: record.method.to_string(),
            url: record.url.to_string(),
            detail: record.error.trace(),
        };
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(owned);
    }
}
