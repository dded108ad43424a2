use axum::{
    BoxError,
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
};
use std::error::Error;
use std::fmt;
use strum_macros::{AsRefStr, Display};

pub mod classify;
pub mod http;

pub use classify::{Disposition, ErrorCategory, ErrorClassifier, Severity};
pub use http::{GlobalExceptionFilter, RequestDescriptor};

/// The kind of a raised failure, matched by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A required value was absent
    MissingValue,
    /// Field-level validation rejected the input
    ConstraintViolation,
    /// The store refused the write (duplicates, dangling references, ...)
    DataIntegrity,
    Unclassified,
}

impl ErrorKind {
    fn default_type_name(self) -> &'static str {
        match self {
            ErrorKind::MissingValue => "MissingValueError",
            ErrorKind::ConstraintViolation => "ConstraintViolationError",
            ErrorKind::DataIntegrity => "DataIntegrityError",
            ErrorKind::Unclassified => "UnclassifiedError",
        }
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub property_path: String,
    pub message: String,
}

impl Violation {
    pub fn new(property_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_path: property_path.into(),
            message: message.into(),
        }
    }
}

/// An error that escaped a request handler
///
/// Handlers return it (or anything convertible into it) and the
/// [`ExceptionFilter`] turns it into the JSON error reply.
///
/// # Example
/// ```
/// use error_advice::exception::{ErrorKind, RaisedError, Violation};
///
/// let err = RaisedError::constraint_violation([
///     Violation::new("name", "may not be null"),
///     Violation::new("email", "not a well-formed email address"),
/// ]);
/// assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
/// assert_eq!(err.violations().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaisedError {
    kind: ErrorKind,
    type_name: String,
    message: Option<String>,
    localized_message: Option<String>,
    violations: Vec<Violation>,
    cause: Option<Box<RaisedError>>,
}

impl RaisedError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            type_name: kind.default_type_name().to_string(),
            message: None,
            localized_message: None,
            violations: Vec::new(),
            cause: None,
        }
    }

    pub fn missing_value() -> Self {
        Self::new(ErrorKind::MissingValue)
    }

    pub fn constraint_violation(violations: impl IntoIterator<Item = Violation>) -> Self {
        Self {
            violations: violations.into_iter().collect(),
            ..Self::new(ErrorKind::ConstraintViolation)
        }
    }

    pub fn data_integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataIntegrity).with_message(message)
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unclassified).with_message(message)
    }

    /// Build an unclassified error mirroring a foreign error and its source chain
    pub fn from_error(err: &(dyn Error + 'static)) -> Self {
        if let Some(raised) = err.downcast_ref::<RaisedError>() {
            return raised.clone();
        }
        let mut raised = Self::new(ErrorKind::Unclassified).with_message(err.to_string());
        raised.cause = err.source().map(|source| Box::new(Self::from_error(source)));
        raised
    }

    /// Convert a type-erased error, keeping a `RaisedError` as is
    pub fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<RaisedError>() {
            Ok(raised) => *raised,
            Err(other) => Self::from_error(&*other),
        }
    }

    /// Set the type name shown by the default string form; blank names are ignored
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        if !type_name.trim().is_empty() {
            self.type_name = type_name;
        }
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_localized_message(mut self, message: impl Into<String>) -> Self {
        self.localized_message = Some(message.into());
        self
    }

    pub fn with_violation(mut self, violation: Violation) -> Self {
        self.violations.push(violation);
        self
    }

    pub fn with_cause(mut self, cause: RaisedError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn localized_message(&self) -> Option<&str> {
        self.localized_message.as_deref()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn cause(&self) -> Option<&RaisedError> {
        self.cause.as_deref()
    }

    /// Full detail for the log side-channel; never sent to clients
    pub fn trace(&self) -> String {
        let mut out = String::new();
        let mut current = Some(self);
        let mut depth = 0;
        while let Some(err) = current {
            if depth > 0 {
                out.push_str("\nCaused by: ");
            }
            out.push_str(&err.to_string());
            for violation in &err.violations {
                out.push_str(&format!(
                    "\n    violation {}: {}",
                    violation.property_path, violation.message
                ));
            }
            current = err.cause();
            depth += 1;
        }
        out
    }
}

impl fmt::Display for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let localized = present(self.localized_message.as_deref());
        match localized.or_else(|| present(self.message.as_deref())) {
            Some(message) => write!(f, "{}: {}", self.type_name, message),
            None => f.write_str(&self.type_name),
        }
    }
}

/// A blank message counts as no message
pub(crate) fn present(message: Option<&str>) -> Option<&str> {
    message.filter(|m| !m.trim().is_empty())
}

impl Error for RaisedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn Error + 'static))
    }
}

impl From<anyhow::Error> for RaisedError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<RaisedError>() {
            Ok(raised) => raised,
            Err(other) => {
                let root: &(dyn Error + 'static) = other.as_ref();
                Self::from_error(root)
            }
        }
    }
}

impl From<JsonRejection> for RaisedError {
    fn from(rejection: JsonRejection) -> Self {
        Self::unclassified(rejection.body_text()).with_type_name("JsonRejection")
    }
}

#[cfg(feature = "sea-orm-db")]
impl From<sea_orm::DbErr> for RaisedError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::SqlErr;

        if let sea_orm::DbErr::RecordNotFound(detail) = &err {
            return Self::missing_value().with_message(detail.clone());
        }
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                Self::data_integrity(format!("Unique property violated: {}", detail))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => Self::data_integrity(detail),
            _ => Self::from_error(&err),
        }
    }
}

/// Handlers may return a `RaisedError` directly.
///
/// The response carries the provisional status of the error and the error
/// itself as an extension; the exception layer replaces it with the full
/// reply once the request URL is known.
impl IntoResponse for RaisedError {
    fn into_response(self) -> Response {
        let status = ErrorClassifier::dispatch(&self).status;
        let mut response = status.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// The ExceptionFilter trait
///
/// Filters handle errors thrown during request processing.
/// They must return a valid Response.
pub trait ExceptionFilter: Send + Sync + 'static {
    /// Catch an exception raised while serving `request` and return a response
    fn catch(&self, request: &RequestDescriptor, error: &RaisedError) -> Response;
}

/// Find the first error of type `T` in the source chain of `err`
pub fn find_cause<'a, T: Error + 'static>(err: &'a (dyn Error + 'static)) -> Option<&'a T> {
    let mut source = err.source();

    while let Some(s) = source {
        if let Some(typed) = s.downcast_ref::<T>() {
            return Some(typed);
        }
        source = s.source();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset")]
    struct Io;

    #[derive(Debug, thiserror::Error)]
    #[error("query failed")]
    struct Query(#[source] Io);

    #[test]
    fn test_display_uses_type_name_and_message() {
        let bare = RaisedError::new(ErrorKind::Unclassified).with_type_name("IllegalStateError");
        assert_eq!(bare.to_string(), "IllegalStateError");

        let with_message = bare.clone().with_message("boom");
        assert_eq!(with_message.to_string(), "IllegalStateError: boom");

        let localized = with_message.with_localized_message("bum");
        assert_eq!(localized.to_string(), "IllegalStateError: bum");
    }

    #[test]
    fn test_display_skips_blank_messages() {
        let err = RaisedError::unclassified("   ").with_localized_message("");
        assert_eq!(err.to_string(), "UnclassifiedError");

        let err = RaisedError::unclassified("plain").with_localized_message(" ");
        assert_eq!(err.to_string(), "UnclassifiedError: plain");
    }

    #[test]
    fn test_blank_type_name_ignored() {
        let err = RaisedError::missing_value().with_type_name("  ");
        assert_eq!(err.type_name(), "MissingValueError");
    }

    #[test]
    fn test_from_error_mirrors_source_chain() {
        let raised = RaisedError::from_error(&Query(Io));
        assert_eq!(raised.kind(), ErrorKind::Unclassified);
        assert_eq!(raised.message(), Some("query failed"));
        assert_eq!(raised.cause().unwrap().message(), Some("connection reset"));
        assert!(raised.cause().unwrap().cause().is_none());
    }

    #[test]
    fn test_from_boxed_keeps_raised_error() {
        let original = RaisedError::data_integrity("Unique property `email`");
        let boxed: BoxError = Box::new(original.clone());
        assert_eq!(RaisedError::from_boxed(boxed), original);
    }

    #[test]
    fn test_from_anyhow() {
        let original = RaisedError::missing_value();
        assert_eq!(RaisedError::from(anyhow::Error::new(original.clone())), original);

        let foreign = RaisedError::from(anyhow::Error::new(Query(Io)));
        assert_eq!(foreign.message(), Some("query failed"));
        assert_eq!(foreign.cause().unwrap().message(), Some("connection reset"));
    }

    #[test]
    fn test_trace_includes_violations_and_causes() {
        let err = RaisedError::constraint_violation([Violation::new("name", "may not be null")])
            .with_cause(RaisedError::unclassified("root"));
        let trace = err.trace();

        assert!(trace.starts_with("ConstraintViolationError"));
        assert!(trace.contains("violation name: may not be null"));
        assert!(trace.contains("Caused by: UnclassifiedError: root"));
    }

    #[test]
    fn test_find_cause() {
        let err = Query(Io);
        assert!(find_cause::<Io>(&err).is_some());
        assert!(find_cause::<Query>(&err).is_none());
    }

    #[test]
    fn test_find_cause_borrows_from_chain() {
        let raised = RaisedError::unclassified("outer")
            .with_cause(RaisedError::missing_value().with_message("inner"));
        let inner: &RaisedError = find_cause(&raised).unwrap();
        assert_eq!(inner.kind(), ErrorKind::MissingValue);
        assert_eq!(inner.message(), Some("inner"));
    }

    #[test]
    fn test_into_response_carries_error() {
        let response = RaisedError::data_integrity("fk").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.extensions().get::<RaisedError>().unwrap().message(),
            Some("fk")
        );
    }
}
