//! Configuration module for the Weft runtime.
//!
//! Loads logging settings and per-plugin configuration sections from files,
//! environment variables and code, and validates the result.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SpanEventConfig, WeftConfig,
};
pub use validation::validate_config;
