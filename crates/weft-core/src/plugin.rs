//! The plugin contract.
//!
//! # Architecture
//!
//! A [`Plugin`] is a named injection function.  Each orchestration calls it
//! exactly once, synchronously, with a [`Pre`] view of the shared context:
//!
//! - the **injection phase** registers slots (and optionally signals) and
//!   must not perform I/O or rely on other plugins having been injected;
//! - it returns a [`Setup`], the **setup phase**, which the orchestrator
//!   later runs concurrently with every other plugin's setup.  Setup owns a
//!   [`Ctx`] handle, may await signals raised by other plugins, and completes
//!   its own signals when its work is done.
//!
//! Plugins never reference each other.  Ordering is expressed only through
//! [`SignalKey`]s.
//!
//! # Example
//!
//! ```rust,ignore
//! pub static COUNT: LazyLock<Slot<u32>> = LazyLock::new(|| Slot::new("count", 0));
//! pub static COUNTED: LazyLock<SignalKey> = LazyLock::new(|| SignalKey::new("counted"));
//!
//! pub fn counter() -> Plugin {
//!     define_plugin("counter", |pre| {
//!         pre.inject(&COUNT).record(&COUNTED);
//!         Ok(Setup::new(|ctx| async move {
//!             ctx.update(&COUNT, |n| n + 1)?;
//!             ctx.done(&COUNTED);
//!             Ok(())
//!         }))
//!     })
//! }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;

use crate::context::Ctx;
use crate::error::{BoxError, ContextResult};
use crate::signal::SignalKey;
use crate::slot::{Slot, SlotValue};

/// Future produced by a plugin's setup phase.
pub type SetupFuture = BoxFuture<'static, Result<(), BoxError>>;

// ─── Setup ────────────────────────────────────────────────────────────────────

/// The asynchronous second phase of a plugin, returned by its injection phase.
pub struct Setup(Box<dyn FnOnce(Ctx) -> SetupFuture + Send>);

impl Setup {
    /// Wraps an async closure as a setup phase.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Ctx) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self(Box::new(move |ctx| Box::pin(f(ctx))))
    }

    /// A setup phase with nothing to do, for plugins that only inject.
    pub fn noop() -> Self {
        Self::new(|_| async { Ok(()) })
    }

    /// Starts the setup phase against `ctx`.
    pub fn run(self, ctx: Ctx) -> SetupFuture {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Setup(..)")
    }
}

// ─── Pre ──────────────────────────────────────────────────────────────────────

/// Injection-phase view of the shared context.
///
/// Calls chain, mirroring how plugins usually register several slots at once:
///
/// ```rust,ignore
/// pre.inject(&ROOT).inject(&VIEW).inject_with(&OPTIONS, options);
/// ```
pub struct Pre<'a> {
    ctx: &'a Ctx,
    plugin: &'a str,
}

impl<'a> Pre<'a> {
    /// Creates the view handed to `plugin`'s injection phase.
    pub fn new(ctx: &'a Ctx, plugin: &'a str) -> Self {
        Self { ctx, plugin }
    }

    /// Name of the plugin being injected.
    pub fn plugin_name(&self) -> &str {
        self.plugin
    }

    /// Registers `slot` with its default value.  See [`Ctx::inject`].
    pub fn inject<T: SlotValue>(&self, slot: &Slot<T>) -> &Self {
        self.ctx.inject(slot);
        self
    }

    /// Registers `slot` with `value` instead of its default.
    pub fn inject_with<T: SlotValue>(&self, slot: &Slot<T>, value: T) -> &Self {
        self.ctx.inject_with(slot, value);
        self
    }

    /// Materialises the signal for `key` so it exists before anyone waits.
    pub fn record(&self, key: &SignalKey) -> &Self {
        self.ctx.signal(key);
        self
    }

    /// Reads a slot.  Only slots this plugin injected itself, or built-in
    /// slots, are guaranteed to be present during injection.
    pub fn get<T: SlotValue>(&self, slot: &Slot<T>) -> ContextResult<T> {
        self.ctx.get(slot)
    }

    /// Deserialises this plugin's configuration section.
    pub fn config<T: DeserializeOwned + Default>(&self) -> ContextResult<T> {
        self.ctx.plugin_config(self.plugin)
    }
}

// ─── Plugin ───────────────────────────────────────────────────────────────────

type InjectFn = dyn Fn(&Pre<'_>) -> Result<Setup, BoxError> + Send + Sync;

/// A reusable, named two-phase extension unit.
///
/// Cloning is cheap; the same plugin may be used by any number of
/// orchestrations, each calling its injection function once.
#[derive(Clone)]
pub struct Plugin {
    name: Cow<'static, str>,
    inject: Arc<InjectFn>,
}

impl Plugin {
    /// Creates a plugin from its name and injection function.
    ///
    /// The name identifies the plugin in errors, logs and configuration
    /// (`[plugins.<name>]`).  `inject` runs once per orchestration.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, inject: F) -> Self
    where
        F: Fn(&Pre<'_>) -> Result<Setup, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inject: Arc::new(inject),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the injection phase and returns the setup phase.
    pub fn inject(&self, pre: &Pre<'_>) -> Result<Setup, BoxError> {
        (self.inject)(pre)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Wraps an injection function as a [`Plugin`].
pub fn define_plugin<F>(name: impl Into<Cow<'static, str>>, inject: F) -> Plugin
where
    F: Fn(&Pre<'_>) -> Result<Setup, BoxError> + Send + Sync + 'static,
{
    Plugin::new(name, inject)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::LazyLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static GREETING: LazyLock<Slot<String>> =
        LazyLock::new(|| Slot::new("greeting", "hello".to_string()));

    #[tokio::test]
    async fn test_inject_then_setup() {
        let plugin = define_plugin("greeter", |pre| {
            pre.inject(&GREETING);
            Ok(Setup::new(|ctx| async move {
                ctx.update(&GREETING, |g| format!("{g}, world"))?;
                Ok(())
            }))
        });

        let ctx = Ctx::new();
        let setup = plugin.inject(&Pre::new(&ctx, plugin.name())).unwrap();
        assert_eq!(ctx.get(&GREETING).unwrap(), "hello");

        setup.run(ctx.clone()).await.unwrap();
        assert_eq!(ctx.get(&GREETING).unwrap(), "hello, world");
    }

    #[test]
    fn test_plugin_is_reusable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let plugin = define_plugin("counting", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Setup::noop())
        });

        for _ in 0..3 {
            let ctx = Ctx::new();
            plugin.clone().inject(&Pre::new(&ctx, "counting")).unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_injection_error_propagates() {
        let plugin = define_plugin("broken", |pre| {
            let missing = Slot::new("missing", 0u8);
            pre.get(&missing)?;
            Ok(Setup::noop())
        });

        let ctx = Ctx::new();
        let err = plugin.inject(&Pre::new(&ctx, "broken")).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_record_materialises_pending_signal() {
        let key = SignalKey::new("loaded");
        let ctx = Ctx::new();
        Pre::new(&ctx, "p").record(&key);
        assert_eq!(ctx.pending_signals(), vec!["loaded".to_string()]);
    }
}
