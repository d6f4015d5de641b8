//! Process-wide tracing setup.

pub mod subscriber;

pub use subscriber::{LogFormat, LOG_FORMAT_ENV, init, init_with};
