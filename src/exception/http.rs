use crate::common::ErrorResponse;
use crate::common::timestamp::{SystemClock, TimestampFormat};
use crate::config::AdviceConfig;
use crate::exception::{ErrorClassifier, ExceptionFilter, RaisedError};
use crate::interceptor::logging::{ErrorLog, FailureRecord, TracingErrorLog};
use axum::{
    http::{HeaderMap, Method, Request, StatusCode, Uri, header, request::Parts},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// What the responder needs to know about the failed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::new(
            request.method().clone(),
            request_url(request.uri(), request.headers()),
        )
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(parts.method.clone(), request_url(&parts.uri, &parts.headers))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full URL of the request, without the query string
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Rebuild `scheme://authority/path` the way the client addressed the server
fn request_url(uri: &Uri, headers: &HeaderMap) -> String {
    let authority = uri
        .authority()
        .map(|a| a.as_str().to_string())
        .or_else(|| header_str(headers, header::HOST.as_str()));

    let path = uri.path();
    match authority {
        Some(authority) => {
            let scheme = uri
                .scheme_str()
                .map(str::to_string)
                .or_else(|| header_str(headers, FORWARDED_PROTO))
                .unwrap_or_else(|| "http".to_string());
            format!("{}://{}{}", scheme, authority, path)
        }
        None => path.to_string(),
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        // proxies may append a list: "https, http"
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Global exception filter
///
/// Answers every error that escapes a handler: classifies it, writes one
/// log record at the error's severity and returns the status plus JSON body.
/// It never fails itself.
///
/// # Example
/// ```
/// use axum::http::{Method, StatusCode};
/// use error_advice::exception::{GlobalExceptionFilter, RaisedError, RequestDescriptor};
/// use error_advice::interceptor::logging::RecordingErrorLog;
/// use std::sync::Arc;
///
/// let log = Arc::new(RecordingErrorLog::new());
/// let filter = GlobalExceptionFilter::new(log.clone());
/// let request = RequestDescriptor::new(Method::GET, "http://localhost/users/7");
///
/// let (status, body) = filter.handle(&request, &RaisedError::missing_value());
/// assert_eq!(status, StatusCode::BAD_REQUEST);
/// assert_eq!(body.message(), "An invalid value was sent or requested.");
/// assert_eq!(log.len(), 1);
/// ```
#[derive(Clone)]
pub struct GlobalExceptionFilter {
    classifier: ErrorClassifier,
    log: Arc<dyn ErrorLog>,
}

impl Default for GlobalExceptionFilter {
    fn default() -> Self {
        Self::new(Arc::new(TracingErrorLog))
    }
}

impl GlobalExceptionFilter {
    /// Responder with the system clock and the default timestamp pattern
    pub fn new(log: Arc<dyn ErrorLog>) -> Self {
        Self::with_classifier(ErrorClassifier::default(), log)
    }

    pub fn with_classifier(classifier: ErrorClassifier, log: Arc<dyn ErrorLog>) -> Self {
        Self { classifier, log }
    }

    pub fn from_config(config: &AdviceConfig, log: Arc<dyn ErrorLog>) -> Self {
        let classifier = ErrorClassifier::new(
            Arc::new(SystemClock::new(config.clock_zone)),
            config.timestamp_format.clone(),
        );
        Self::with_classifier(classifier, log)
    }

    /// Answer a failed request
    pub fn handle(
        &self,
        request: &RequestDescriptor,
        error: &RaisedError,
    ) -> (StatusCode, ErrorResponse) {
        let (disposition, body) = self.classifier.resolve(request.url(), error);

        self.log.record(&FailureRecord {
            severity: disposition.severity,
            category: disposition.category,
            status: disposition.status,
            method: request.method().as_str(),
            url: request.url(),
            error,
        });

        (disposition.status, body)
    }
}

impl ExceptionFilter for GlobalExceptionFilter {
    fn catch(&self, request: &RequestDescriptor, error: &RaisedError) -> Response {
        self.handle(request, error).into_response()
    }
}
