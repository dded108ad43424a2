pub mod response;
pub mod timestamp;

pub use response::{ErrorResponse, reason_phrase};
pub use timestamp::{Clock, ClockZone, FixedClock, SystemClock, TimestampFormat};
