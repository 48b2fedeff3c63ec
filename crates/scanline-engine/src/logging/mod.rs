//! Logging setup.
//!
//! The engine only speaks the `log` facade. Drivers call [`init_logging`]
//! early to route diagnostics (shader compile/link logs, texture failures)
//! to `env_logger`.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
