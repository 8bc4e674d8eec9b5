//! Two-phase plugin orchestration.
//!
//! [`Orchestrator`] drives an ordered plugin list to a running [`Instance`]:
//!
//! ```text
//! Created ──► Injecting ──► SettingUp ──► Ready
//!                 │              │
//!                 └──────────────┴──────► Failed
//! ```
//!
//! 1. **Injecting**: built-in slots are injected, then every plugin's
//!    injection phase runs synchronously in list order against one fresh
//!    [`Ctx`].  [`Bindings`] are applied next, then configuration callbacks.
//!    Any error here fails the run before a single setup phase starts.
//! 2. **SettingUp**: every collected setup phase is started and polled
//!    concurrently by the orchestrator's own future.  Setups interleave
//!    cooperatively and order themselves only through signals.
//! 3. **Ready** once every setup phase returned `Ok`.  The first error moves
//!    the run to **Failed**; setup phases still in flight are not cancelled
//!    but handed to a detached task on the current tokio runtime.
//!
//! There is no deadlock detection: a setup phase waiting on a signal nobody
//! completes keeps the run in `SettingUp` forever.  Callers that need a bound
//! wrap [`Orchestrator::run`] in their own timeout.
//!
//! # Example
//!
//! ```rust,ignore
//! let instance = Orchestrator::new()
//!     .use_plugins(preset())
//!     .use_plugin(history())
//!     .bind(&ROOT, "#editor".into())
//!     .config(|ctx| Ok(ctx.update(&OPTIONS, |o| o.with_spellcheck(true))?))
//!     .run()
//!     .await?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, Stream, StreamExt};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{Instrument, debug, debug_span, error, info, info_span, warn};
use weft_core::{BoxError, Ctx, DISPOSERS, PLUGIN_CONFIGS, Plugin, Pre, Setup, Slot, SlotValue};

use crate::bindings::Bindings;
use crate::config::WeftConfig;
use crate::error::{OrchestrationError, OrchestrationResult};
use crate::instance::Instance;

type Configurer = Box<dyn FnOnce(&Ctx) -> Result<(), BoxError> + Send>;

// =============================================================================
// State
// =============================================================================

/// Lifecycle state of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Plugins are being collected; nothing has run.
    Created,
    /// Injection phases, bindings and configuration callbacks are running.
    Injecting,
    /// Setup phases are running.
    SettingUp,
    /// Every setup phase completed.  Terminal.
    Ready,
    /// Injection, configuration or a setup phase failed.  Terminal.
    Failed,
}

impl OrchestratorState {
    /// `Ready` and `Failed` are never left.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Injecting => "injecting",
            Self::SettingUp => "setting-up",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Read-only view of an orchestrator's state, usable after `run` consumed it.
#[derive(Debug, Clone)]
pub struct StateHandle {
    rx: watch::Receiver<OrchestratorState>,
}

impl StateHandle {
    /// The current state.
    pub fn get(&self) -> OrchestratorState {
        *self.rx.borrow()
    }

    /// Waits until the state satisfies `f`.
    ///
    /// Returns the state that matched, or the last observed state if the
    /// orchestrator was dropped first.
    pub async fn wait_until(
        &mut self,
        mut f: impl FnMut(OrchestratorState) -> bool,
    ) -> OrchestratorState {
        let matched = self.rx.wait_for(|state| f(*state)).await.map(|state| *state);
        matched.unwrap_or_else(|_| self.get())
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Collects plugins, bindings and configuration, then runs them.
pub struct Orchestrator {
    plugins: Vec<Plugin>,
    bindings: Bindings,
    configurers: Vec<Configurer>,
    plugin_configs: HashMap<String, Value>,
    state: watch::Sender<OrchestratorState>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Creates an orchestrator with no plugins, bindings or configuration.
    pub fn new() -> Self {
        let (state, _) = watch::channel(OrchestratorState::Created);
        Self {
            plugins: Vec::new(),
            bindings: Bindings::new(),
            configurers: Vec::new(),
            plugin_configs: HashMap::new(),
            state,
        }
    }

    // ─── Composition ─────────────────────────────────────────────────────────

    /// Appends a plugin.  Injection runs in the order plugins were added.
    pub fn use_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Appends a list of plugins, such as a preset.
    pub fn use_plugins(mut self, plugins: impl IntoIterator<Item = Plugin>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Pre-seeds `slot` with `value`, overriding the injected default.
    pub fn bind<T: SlotValue>(mut self, slot: &Slot<T>, value: T) -> Self {
        self.bindings.insert(slot, value);
        self
    }

    /// Appends a whole set of bindings.
    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings.extend(bindings);
        self
    }

    /// Registers a configuration callback.
    ///
    /// Callbacks run synchronously after injection and bindings, before any
    /// setup phase, in registration order.  They typically adjust options
    /// that plugins injected.
    pub fn config<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Ctx) -> Result<(), BoxError> + Send + 'static,
    {
        self.configurers.push(Box::new(f));
        self
    }

    /// Makes the `plugins` sections of `config` available to plugins through
    /// [`Pre::config`] and [`Ctx::plugin_config`].
    pub fn with_config(mut self, config: &WeftConfig) -> Self {
        self.plugin_configs.clone_from(&config.plugins);
        self
    }

    // ─── Introspection ───────────────────────────────────────────────────────

    /// Names of the added plugins, in injection order.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(Plugin::name).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Current state.  Always `Created` until [`run`](Self::run) is called.
    pub fn state(&self) -> OrchestratorState {
        *self.state.borrow()
    }

    /// Returns a handle that keeps observing the state while `run` executes.
    pub fn state_handle(&self) -> StateHandle {
        StateHandle {
            rx: self.state.subscribe(),
        }
    }

    // ─── Run ─────────────────────────────────────────────────────────────────

    /// Runs both phases and returns the ready instance.
    pub async fn run(self) -> OrchestrationResult<Instance> {
        let span = info_span!("orchestrate", plugins = self.plugins.len());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(self) -> OrchestrationResult<Instance> {
        let Self {
            plugins,
            bindings,
            configurers,
            plugin_configs,
            state,
        } = self;
        let names: Vec<String> = plugins.iter().map(|p| p.name().to_string()).collect();
        let ctx = Ctx::new();

        transition(&state, OrchestratorState::Injecting);
        let setups = match inject_all(&ctx, &plugins, plugin_configs, bindings, configurers) {
            Ok(setups) => setups,
            Err(e) => {
                error!(error = %e, "Injection failed, no setup phase will run");
                transition(&state, OrchestratorState::Failed);
                return Err(e);
            }
        };

        transition(&state, OrchestratorState::SettingUp);
        if let Err(e) = setup_all(&ctx, setups).await {
            transition(&state, OrchestratorState::Failed);
            return Err(e);
        }

        transition(&state, OrchestratorState::Ready);
        info!(plugins = names.len(), "Instance ready");
        Ok(Instance::new(ctx, names))
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("plugins", &self.plugin_names())
            .field("bindings", &self.bindings)
            .field("configurers", &self.configurers.len())
            .field("state", &self.state())
            .finish()
    }
}

/// Runs `plugins` with `bindings` applied.  Shorthand for [`Orchestrator`].
pub async fn run(
    plugins: impl IntoIterator<Item = Plugin>,
    bindings: Bindings,
) -> OrchestrationResult<Instance> {
    Orchestrator::new()
        .use_plugins(plugins)
        .with_bindings(bindings)
        .run()
        .await
}

// =============================================================================
// Phases
// =============================================================================

fn transition(state: &watch::Sender<OrchestratorState>, next: OrchestratorState) {
    let prev = state.send_replace(next);
    debug!(from = %prev, to = %next, "Orchestrator state changed");
}

fn inject_all(
    ctx: &Ctx,
    plugins: &[Plugin],
    plugin_configs: HashMap<String, Value>,
    bindings: Bindings,
    configurers: Vec<Configurer>,
) -> OrchestrationResult<Vec<(String, Setup)>> {
    ctx.inject_with(&PLUGIN_CONFIGS, Arc::new(plugin_configs))
        .inject(&DISPOSERS);

    let mut setups = Vec::with_capacity(plugins.len());
    for plugin in plugins {
        let pre = Pre::new(ctx, plugin.name());
        let setup = plugin
            .inject(&pre)
            .map_err(|source| OrchestrationError::Injection {
                plugin: plugin.name().to_string(),
                source,
            })?;
        debug!(plugin = %plugin.name(), "Plugin injected");
        setups.push((plugin.name().to_string(), setup));
    }

    if !bindings.is_empty() {
        debug!(bindings = ?bindings, "Applying bindings");
        bindings.apply(ctx);
    }

    for (index, configure) in configurers.into_iter().enumerate() {
        configure(ctx).map_err(|source| OrchestrationError::Config { index, source })?;
    }

    Ok(setups)
}

async fn setup_all(ctx: &Ctx, setups: Vec<(String, Setup)>) -> OrchestrationResult<()> {
    let mut pending: FuturesUnordered<_> = setups
        .into_iter()
        .map(|(name, setup)| {
            let span = debug_span!("setup", plugin = %name);
            let fut = setup.run(ctx.clone());
            async move { (name, fut.await) }.instrument(span)
        })
        .collect();

    while let Some((name, result)) = pending.next().await {
        match result {
            Ok(()) => debug!(plugin = %name, "Plugin setup complete"),
            Err(source) => {
                error!(plugin = %name, error = %source, "Plugin setup failed");
                detach(pending);
                return Err(OrchestrationError::Setup { plugin: name, source });
            }
        }
    }
    Ok(())
}

/// Keeps the remaining setup phases running after the orchestration failed.
fn detach<S>(pending: FuturesUnordered<S>)
where
    S: std::future::Future<Output = (String, Result<(), BoxError>)> + Send + 'static,
{
    if pending.is_empty() {
        return;
    }
    let remaining = pending.len();
    match Handle::try_current() {
        Ok(handle) => {
            warn!(remaining, "Remaining setup phases keep running in the background");
            handle.spawn(drain(pending));
        }
        Err(_) => {
            warn!(remaining, "No tokio runtime available, remaining setup phases are dropped");
        }
    }
}

async fn drain<S>(pending: S)
where
    S: Stream<Item = (String, Result<(), BoxError>)>,
{
    pending
        .for_each(|(name, result)| async move {
            match result {
                Ok(()) => debug!(plugin = %name, "Detached setup phase completed"),
                Err(e) => warn!(plugin = %name, error = %e, "Detached setup phase failed"),
            }
        })
        .await;
}
