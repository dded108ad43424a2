//! # error-advice
//!
//! Global exception advice for axum applications.
//!
//! Every error that escapes a request handler is turned into a JSON reply
//! with a fitting status code, and logged once at a severity matching the
//! kind of failure.
//!
//! ## Features
//!
//! - **Ordered classification**: missing values, validation violations and
//!   data-integrity conflicts are recognised before the catch-all
//! - **Stable wire format**: `timestamp`, `status`, `error`, `message`, `path`
//! - **Injected logging**: the responder writes through an [`ErrorLog`],
//!   `tracing` by default
//! - **Tower integration**: [`ExceptionLayer`] wraps any router or service
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use axum::{Json, Router, routing::get};
//! use error_advice::prelude::*;
//!
//! async fn find_user() -> Result<Json<User>, RaisedError> {
//!     Err(RaisedError::missing_value())
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = AdviceConfig::from_env().expect("invalid advice configuration");
//!     let filter = GlobalExceptionFilter::from_config(&config, Arc::new(TracingErrorLog));
//!
//!     let app = Router::new()
//!         .route("/users/{id}", get(find_user))
//!         .layer(ExceptionLayer::new(filter));
//!
//!     // Serve your app...
//! }
//! ```

pub mod common;
pub mod config;
pub mod error;
pub mod exception;
pub mod interceptor;

// Re-export core types
pub use common::ErrorResponse;
pub use config::{AdviceConfig, ConfigService};
pub use error::{AdviceError, Result};
pub use exception::{
    ErrorClassifier, ErrorKind, ExceptionFilter, GlobalExceptionFilter, RaisedError,
    RequestDescriptor, Violation,
};
pub use interceptor::{ErrorLog, ExceptionLayer, TracingErrorLog};

/// Prelude module for convenient imports
///
/// ```
/// use error_advice::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::{Clock, ClockZone, ErrorResponse, FixedClock, SystemClock};
    pub use crate::config::{AdviceConfig, ConfigService};
    pub use crate::error::{AdviceError, Result};
    pub use crate::exception::{
        Disposition, ErrorCategory, ErrorClassifier, ErrorKind, ExceptionFilter,
        GlobalExceptionFilter, RaisedError, RequestDescriptor, Severity, Violation,
    };
    pub use crate::interceptor::{
        ErrorLog, ExceptionLayer, RecordingErrorLog, TracingErrorLog,
    };
    pub use axum::http::StatusCode;
    pub use std::sync::Arc;
}
