//! Host integration: the tower layer catching uncaught errors and the log
//! sinks the responder writes to.

pub mod layer;
pub mod logging;

pub use layer::{ExceptionLayer, ExceptionMiddleware};
pub use logging::{ErrorLog, FailureRecord, RecordedFailure, RecordingErrorLog, TracingErrorLog};
