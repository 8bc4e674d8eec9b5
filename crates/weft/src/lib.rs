//! # Weft
//!
//! A plugin composition runtime: independently written plugins share one
//! typed context store and order their asynchronous setup through readiness
//! signals.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────── injection (sync, list order) ────────────┐
//! ┌──────────┐    │  plugin A ──inject──▶ ┌─────────┐ ◀──inject── plugin B │
//! │ Bindings │────┼─────────────────────▶ │   Ctx   │                      │
//! └──────────┘    └────────────────────── │ (slots, │ ─────────────────────┘
//!                                         │ signals)│
//!                 ┌─────── setup (async, concurrent) ───────┐
//!                 │  A: set, done(READY) ──▶ B: wait(READY)  │
//!                 └──────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//!                               Instance
//! ```
//!
//! - **Slots**: typed keys into the per-instance store, declared once as
//!   statics and injected by the plugin that owns them
//! - **Signals**: one-shot readiness flags; setups wait on them instead of
//!   relying on plugin order
//! - **Plugins**: a name plus an injection function returning the setup phase
//! - **Orchestrator**: runs every injection, then every setup, and hands back
//!   the ready [`Instance`](runtime::Instance)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::LazyLock;
//! use weft::prelude::*;
//!
//! static COUNT: LazyLock<Slot<u32>> = LazyLock::new(|| Slot::new("count", 0));
//! static COUNTED: LazyLock<SignalKey> = LazyLock::new(|| SignalKey::new("counted"));
//!
//! fn counter() -> Plugin {
//!     define_plugin("counter", |pre| {
//!         pre.inject(&COUNT);
//!         Ok(Setup::new(|ctx| async move {
//!             ctx.update(&COUNT, |n| n + 1)?;
//!             ctx.done(&COUNTED);
//!             Ok(())
//!         }))
//!     })
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let instance = Orchestrator::new().use_plugin(counter()).run().await?;
//!     assert_eq!(instance.get(&COUNT)?, 1);
//!     instance.dispose().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `weft.toml` configuration files (default)
//! - `yaml-config`: load `weft.yaml` configuration files
//! - `json-log`: JSON log output

pub use weft_core as core;
pub use weft_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use weft::prelude::*;
/// ```
pub mod prelude {
    // Orchestration - main entry point
    pub use weft_runtime::{Bindings, Instance, OrchestrationError, Orchestrator, run};

    // Plugin contract
    pub use weft_core::{Plugin, Pre, Setup, define_plugin};

    // Store and signals
    pub use weft_core::{BoxError, ContextError, Ctx, Signal, SignalKey, Slot};

    // Configuration and logging
    pub use weft_runtime::logging::{LoggingBuilder, init_from_config};
    pub use weft_runtime::{ConfigLoader, WeftConfig};
}
