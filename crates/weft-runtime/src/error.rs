//! Orchestration error types.

use thiserror::Error;
use weft_core::BoxError;

/// Reasons an orchestration ends in the `Failed` state.
///
/// No partial instance is ever returned alongside an error.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// A plugin's injection phase returned an error.  No setup phase ran.
    #[error("plugin '{plugin}' failed during injection: {source}")]
    Injection {
        /// Name of the failing plugin.
        plugin: String,
        /// Error returned by the injection phase.
        source: BoxError,
    },

    /// A configuration callback returned an error.  No setup phase ran.
    #[error("configuration callback #{index} failed: {source}")]
    Config {
        /// Position of the callback in registration order.
        index: usize,
        /// Error returned by the callback.
        source: BoxError,
    },

    /// A plugin's setup phase returned an error.
    ///
    /// Other setup phases that were still running are not cancelled.
    #[error("plugin '{plugin}' failed during setup: {source}")]
    Setup {
        /// Name of the failing plugin.
        plugin: String,
        /// Error returned by the setup phase.
        source: BoxError,
    },
}

impl OrchestrationError {
    /// Name of the plugin that caused the failure, if a plugin did.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            Self::Injection { plugin, .. } | Self::Setup { plugin, .. } => Some(plugin),
            Self::Config { .. } => None,
        }
    }
}

/// Result type for orchestration.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
