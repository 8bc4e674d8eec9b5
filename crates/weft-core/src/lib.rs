//! # Weft Core
//!
//! The building blocks plugins are written against:
//!
//! - [`Slot`]: typed, uniquely identified key with a default value
//! - [`Ctx`]: per-instance store mapping slots to values
//! - [`Signal`] / [`SignalKey`]: one-shot readiness barriers for ordering
//!   plugin setup without a static dependency graph
//! - [`Plugin`]: two-phase extension unit (synchronous injection,
//!   asynchronous setup)
//!
//! Driving a plugin list through both phases is the job of the
//! `weft-runtime` crate.

pub mod builtin;
pub mod context;
pub mod error;
pub mod plugin;
pub mod signal;
pub mod slot;

pub use builtin::{DISPOSERS, Disposer, PLUGIN_CONFIGS};
pub use context::Ctx;
pub use error::{BoxError, ContextError, ContextResult};
pub use plugin::{Plugin, Pre, Setup, SetupFuture, define_plugin};
pub use signal::{Signal, SignalKey};
pub use slot::{Slot, SlotId, SlotValue};
