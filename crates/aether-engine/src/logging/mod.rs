//! Logging setup.
//!
//! Library code logs through the `log` facade only; binaries call
//! [`init_logging`] to install `env_logger`.

mod init;

pub use init::{LoggingConfig, init_logging};
