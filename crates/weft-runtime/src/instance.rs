//! The running result of a successful orchestration.

use tracing::{debug, info};
use weft_core::{ContextResult, Ctx, DISPOSERS, Slot, SlotValue};

/// A fully set-up composition of plugins sharing one [`Ctx`].
///
/// Only produced once every setup phase finished, so holding an `Instance`
/// means the orchestration reached `Ready`.
#[derive(Debug)]
pub struct Instance {
    ctx: Ctx,
    plugins: Vec<String>,
}

impl Instance {
    pub(crate) fn new(ctx: Ctx, plugins: Vec<String>) -> Self {
        Self { ctx, plugins }
    }

    /// The shared context, for operations beyond `get`/`set`/`update`.
    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    /// Names of the composed plugins, in injection order.
    pub fn plugin_names(&self) -> &[String] {
        &self.plugins
    }

    /// See [`Ctx::get`].
    pub fn get<T: SlotValue>(&self, slot: &Slot<T>) -> ContextResult<T> {
        self.ctx.get(slot)
    }

    /// See [`Ctx::set`].
    pub fn set<T: SlotValue>(&self, slot: &Slot<T>, value: T) -> ContextResult<()> {
        self.ctx.set(slot, value)
    }

    /// See [`Ctx::update`].
    pub fn update<T: SlotValue>(&self, slot: &Slot<T>, f: impl FnOnce(T) -> T) -> ContextResult<()> {
        self.ctx.update(slot, f)
    }

    /// Tears the instance down.
    ///
    /// Runs every disposer registered with [`Ctx::on_dispose`], most recent
    /// first.  Releasing resources is up to those disposers.
    pub async fn dispose(self) {
        let disposers = self.ctx.remove(&DISPOSERS).unwrap_or_default();
        debug!(count = disposers.len(), "Running disposers");
        for disposer in disposers.iter().rev() {
            disposer().await;
        }
        info!(plugins = self.plugins.len(), "Instance disposed");
    }
}
