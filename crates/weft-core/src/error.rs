//! Error types for the Weft core.

use thiserror::Error;

use crate::slot::SlotId;

/// Boxed error returned by plugin injection and setup phases.
///
/// Any `std::error::Error + Send + Sync` converts into it with `?`, including
/// [`ContextError`] and application-level error types.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by [`Ctx`](crate::Ctx) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The slot was never injected into this context.
    #[error("slot '{label}' ({id}) is not registered in this context")]
    UnregisteredSlot {
        /// Label given to the slot at declaration.
        label: &'static str,
        /// Identity of the slot.
        id: SlotId,
    },

    /// The stored value does not have the slot's declared type.
    ///
    /// Slot identities are bound to exactly one type, so this only surfaces
    /// when a context was corrupted from outside the typed API.
    #[error("slot '{label}' ({id}) does not hold a value of type '{expected}'")]
    TypeMismatch {
        /// Label given to the slot at declaration.
        label: &'static str,
        /// Identity of the slot.
        id: SlotId,
        /// Type name the caller asked for.
        expected: &'static str,
    },

    /// A plugin's configuration section could not be deserialised.
    #[error("invalid configuration for plugin '{plugin}': {reason}")]
    PluginConfig {
        /// Plugin whose section failed.
        plugin: String,
        /// Deserialisation error message.
        reason: String,
    },
}

impl ContextError {
    pub(crate) fn unregistered<T>(slot: &crate::Slot<T>) -> Self {
        Self::UnregisteredSlot {
            label: slot.label(),
            id: slot.id(),
        }
    }

    pub(crate) fn type_mismatch<T>(slot: &crate::Slot<T>) -> Self {
        Self::TypeMismatch {
            label: slot.label(),
            id: slot.id(),
            expected: std::any::type_name::<T>(),
        }
    }
}

/// Result type for context operations.
pub type ContextResult<T> = Result<T, ContextError>;
