//! Weft Runtime - orchestration layer for the Weft plugin runtime.
//!
//! This crate provides:
//! - Two-phase plugin orchestration (`Orchestrator`, `run`)
//! - The running `Instance` handle and its teardown
//! - Caller-side slot `Bindings`
//! - figment-based configuration loading
//! - Logging configuration
//!
//! ```ignore
//! use weft_runtime::{ConfigLoader, Orchestrator, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let instance = Orchestrator::new()
//!         .with_config(&config)
//!         .use_plugins(my_preset())
//!         .run()
//!         .await?;
//!
//!     // …use the instance…
//!     instance.dispose().await;
//!     Ok(())
//! }
//! ```

pub mod bindings;
pub mod config;
pub mod error;
pub mod instance;
pub mod logging;
pub mod orchestrator;

pub use bindings::Bindings;
pub use config::{ConfigError, ConfigLoader, ConfigResult, LoggingConfig, WeftConfig};
pub use error::{OrchestrationError, OrchestrationResult};
pub use instance::Instance;
pub use logging::{LoggingBuilder, SpanEvents};
pub use orchestrator::{Orchestrator, OrchestratorState, StateHandle, run};

// Re-export tracing for use by plugin crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for plugin code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
