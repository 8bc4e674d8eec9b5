//! The per-instance context store.
//!
//! [`Ctx`] maps [`Slot`] identities to values and owns the [`Signal`]s that
//! plugins rendezvous on.  One `Ctx` is created per orchestration and cloned
//! (cheaply, it is an `Arc`) into every plugin's setup phase.  Nothing in it
//! is process-wide: two instances built from the same plugin list share no
//! state.
//!
//! # Example
//!
//! ```rust,ignore
//! let ctx = Ctx::new();
//! ctx.inject(&COUNT);                       // registers the slot's default
//! ctx.update(&COUNT, |n| n + 1)?;
//! assert_eq!(ctx.get(&COUNT)?, 1);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, join_all};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::builtin::{DISPOSERS, Disposer, PLUGIN_CONFIGS};
use crate::error::{ContextError, ContextResult};
use crate::signal::{Signal, SignalKey};
use crate::slot::{Slot, SlotId, SlotValue};

struct Entry {
    label: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct CtxInner {
    slots: RwLock<HashMap<SlotId, Entry>>,
    signals: Mutex<HashMap<u64, Signal>>,
}

/// Shared, typed key/value store for one instance.
#[derive(Clone, Default)]
pub struct Ctx {
    inner: Arc<CtxInner>,
}

impl Ctx {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Slots ────────────────────────────────────────────────────────────────

    /// Registers `slot` with its default value.
    ///
    /// Injecting a slot that is already registered overwrites it.
    pub fn inject<T: SlotValue>(&self, slot: &Slot<T>) -> &Self {
        self.inject_with(slot, slot.default_value().clone())
    }

    /// Registers `slot` with an explicit value, overwriting any previous one.
    pub fn inject_with<T: SlotValue>(&self, slot: &Slot<T>, value: T) -> &Self {
        let replaced = self.inner.slots.write().insert(
            slot.id(),
            Entry {
                label: slot.label(),
                value: Box::new(value),
            },
        );
        if replaced.is_some() {
            trace!(slot = slot.label(), id = %slot.id(), "Slot re-injected, previous value replaced");
        } else {
            trace!(slot = slot.label(), id = %slot.id(), "Slot injected");
        }
        self
    }

    /// Returns `true` if `slot` has been injected into this context.
    pub fn contains<T>(&self, slot: &Slot<T>) -> bool {
        self.inner.slots.read().contains_key(&slot.id())
    }

    /// Returns a clone of the current value.
    pub fn get<T: SlotValue>(&self, slot: &Slot<T>) -> ContextResult<T> {
        self.with(slot, T::clone)
    }

    /// Runs `f` against the current value without cloning it.
    ///
    /// `f` runs under the store's read lock and must not write to this
    /// context.
    pub fn with<T: SlotValue, R>(&self, slot: &Slot<T>, f: impl FnOnce(&T) -> R) -> ContextResult<R> {
        let slots = self.inner.slots.read();
        let entry = slots
            .get(&slot.id())
            .ok_or_else(|| ContextError::unregistered(slot))?;
        let value = entry
            .value
            .downcast_ref::<T>()
            .ok_or_else(|| ContextError::type_mismatch(slot))?;
        Ok(f(value))
    }

    /// Replaces the current value.
    pub fn set<T: SlotValue>(&self, slot: &Slot<T>, value: T) -> ContextResult<()> {
        let mut slots = self.inner.slots.write();
        let entry = slots
            .get_mut(&slot.id())
            .ok_or_else(|| ContextError::unregistered(slot))?;
        let current = entry
            .value
            .downcast_mut::<T>()
            .ok_or_else(|| ContextError::type_mismatch(slot))?;
        *current = value;
        Ok(())
    }

    /// Read-modify-write of the current value.
    ///
    /// The write lock is held across `f`, so concurrent `update`s on the same
    /// context never lose writes.  `f` must not touch this context.
    pub fn update<T: SlotValue>(&self, slot: &Slot<T>, f: impl FnOnce(T) -> T) -> ContextResult<()> {
        let mut slots = self.inner.slots.write();
        let entry = slots
            .get_mut(&slot.id())
            .ok_or_else(|| ContextError::unregistered(slot))?;
        let current = entry
            .value
            .downcast_mut::<T>()
            .ok_or_else(|| ContextError::type_mismatch(slot))?;
        *current = f(current.clone());
        Ok(())
    }

    /// Unregisters `slot` and returns its last value.
    pub fn remove<T: SlotValue>(&self, slot: &Slot<T>) -> ContextResult<T> {
        let entry = self
            .inner
            .slots
            .write()
            .remove(&slot.id())
            .ok_or_else(|| ContextError::unregistered(slot))?;
        entry
            .value
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| ContextError::type_mismatch(slot))
    }

    /// Labels of every registered slot, sorted.
    pub fn slot_labels(&self) -> Vec<&'static str> {
        let mut labels: Vec<_> = self.inner.slots.read().values().map(|e| e.label).collect();
        labels.sort_unstable();
        labels
    }

    // ─── Signals ──────────────────────────────────────────────────────────────

    /// Returns this context's signal for `key`, creating it on first use.
    ///
    /// Waiters and completers may reach the signal in any order.
    pub fn signal(&self, key: &SignalKey) -> Signal {
        self.inner
            .signals
            .lock()
            .entry(key.id())
            .or_insert_with(|| Signal::new(key.name()))
            .clone()
    }

    /// Waits for the signal behind `key`.
    pub fn wait(&self, key: &SignalKey) -> impl Future<Output = ()> + Send + use<> {
        self.signal(key).wait()
    }

    /// Waits for every signal in `keys`.
    pub fn wait_all(&self, keys: &[&SignalKey]) -> impl Future<Output = ()> + Send + use<> {
        let waits: Vec<_> = keys.iter().map(|key| self.wait(key)).collect();
        async move {
            join_all(waits).await;
        }
    }

    /// Completes the signal behind `key`. See [`Signal::complete`].
    pub fn done(&self, key: &SignalKey) -> bool {
        self.signal(key).complete()
    }

    /// Returns `true` if the signal behind `key` has completed.  Does not
    /// materialise the signal.
    pub fn is_done(&self, key: &SignalKey) -> bool {
        self.inner
            .signals
            .lock()
            .get(&key.id())
            .is_some_and(Signal::is_done)
    }

    /// Names of signals known to this context that are still pending, sorted.
    pub fn pending_signals(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .signals
            .lock()
            .values()
            .filter(|s| !s.is_done())
            .map(|s| s.name().to_string())
            .collect();
        names.sort_unstable();
        names
    }

    // ─── Built-in slots ───────────────────────────────────────────────────────

    /// Deserialises the configuration section of `plugin`.
    ///
    /// Falls back to `T::default()` when no configuration was supplied or the
    /// plugin has no section.
    pub fn plugin_config<T>(&self, plugin: &str) -> ContextResult<T>
    where
        T: DeserializeOwned + Default,
    {
        if !self.contains(&PLUGIN_CONFIGS) {
            return Ok(T::default());
        }
        self.with(&PLUGIN_CONFIGS, |configs| match configs.get(plugin) {
            Some(section) => T::deserialize(section).map_err(|e| ContextError::PluginConfig {
                plugin: plugin.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(T::default()),
        })?
    }

    /// Registers an async disposer, run when the owning instance is disposed.
    ///
    /// Fails with [`ContextError::UnregisteredSlot`] when the context was not
    /// prepared by an orchestrator.
    pub fn on_dispose<F, Fut>(&self, f: F) -> ContextResult<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let disposer: Disposer = Arc::new(move || -> BoxFuture<'static, ()> { Box::pin(f()) });
        self.update(&DISPOSERS, |mut list| {
            list.push(disposer);
            list
        })
    }
}

impl fmt::Debug for Ctx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ctx")
            .field("slots", &self.slot_labels())
            .field("pending_signals", &self.pending_signals())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_test::task;
    use tokio_test::{assert_pending, assert_ready};

    #[test]
    fn test_get_before_inject_fails() {
        let ctx = Ctx::new();
        let slot = Slot::new("count", 0);
        assert_eq!(
            ctx.get(&slot),
            Err(ContextError::UnregisteredSlot {
                label: "count",
                id: slot.id()
            })
        );
        assert!(matches!(
            ctx.set(&slot, 1),
            Err(ContextError::UnregisteredSlot { label: "count", .. })
        ));
        assert!(matches!(
            ctx.update(&slot, |n| n + 1),
            Err(ContextError::UnregisteredSlot { label: "count", .. })
        ));
    }

    #[test]
    fn test_inject_default_and_overwrite() {
        let ctx = Ctx::new();
        let slot = Slot::new("name", String::from("default"));

        ctx.inject(&slot);
        assert_eq!(ctx.get(&slot).unwrap(), "default");

        ctx.inject_with(&slot, "first".to_string());
        assert_eq!(ctx.get(&slot).unwrap(), "first");

        ctx.inject_with(&slot, "second".to_string());
        assert_eq!(ctx.get(&slot).unwrap(), "second");
    }

    #[test]
    fn test_set_replaces_value() {
        let ctx = Ctx::new();
        let slot = Slot::new("flag", false);
        ctx.inject(&slot);
        ctx.set(&slot, true).unwrap();
        assert!(ctx.get(&slot).unwrap());
    }

    #[test]
    fn test_update_matches_set_of_get() {
        let double = |v: Vec<i32>| v.into_iter().map(|n| n * 2).collect::<Vec<_>>();

        let slot = Slot::new("numbers", vec![1, 2, 3]);
        let a = Ctx::new();
        let b = Ctx::new();
        a.inject(&slot);
        b.inject(&slot);

        a.update(&slot, double).unwrap();
        b.set(&slot, double(b.get(&slot).unwrap())).unwrap();

        assert_eq!(a.get(&slot).unwrap(), b.get(&slot).unwrap());
        assert_eq!(a.get(&slot).unwrap(), vec![2, 4, 6]);
    }

    #[test]
    fn test_slots_with_same_label_do_not_collide() {
        let ctx = Ctx::new();
        let a = Slot::new("value", 1);
        let b = Slot::new("value", 1);
        ctx.inject_with(&a, 10);
        assert!(ctx.get(&b).is_err());
        ctx.inject_with(&b, 20);
        assert_eq!(ctx.get(&a).unwrap(), 10);
        assert_eq!(ctx.get(&b).unwrap(), 20);
    }

    #[test]
    fn test_contexts_are_isolated() {
        let slot = Slot::new("count", 0);
        let a = Ctx::new();
        let b = Ctx::new();
        a.inject_with(&slot, 5);
        assert!(b.get(&slot).is_err());
    }

    #[test]
    fn test_clone_shares_store() {
        let slot = Slot::new("count", 0);
        let a = Ctx::new();
        let b = a.clone();
        a.inject(&slot);
        b.update(&slot, |n| n + 1).unwrap();
        assert_eq!(a.get(&slot).unwrap(), 1);
    }

    #[test]
    fn test_with_and_remove() {
        let ctx = Ctx::new();
        let slot = Slot::new("text", String::from("hello"));
        ctx.inject(&slot);
        assert_eq!(ctx.with(&slot, |s| s.len()).unwrap(), 5);
        assert_eq!(ctx.remove(&slot).unwrap(), "hello");
        assert!(!ctx.contains(&slot));
    }

    #[test]
    fn test_signal_is_shared_per_context() {
        let key = SignalKey::new("ready");
        let ctx = Ctx::new();
        let other = Ctx::new();

        assert!(ctx.signal(&key).ptr_eq(&ctx.signal(&key)));
        assert!(!ctx.signal(&key).ptr_eq(&other.signal(&key)));

        ctx.done(&key);
        assert!(ctx.is_done(&key));
        assert!(!other.is_done(&key));
    }

    #[test]
    fn test_wait_all_needs_every_signal() {
        let a = SignalKey::new("a");
        let b = SignalKey::new("b");
        let ctx = Ctx::new();

        let mut waiter = task::spawn(ctx.wait_all(&[&a, &b]));
        assert_pending!(waiter.poll());

        ctx.done(&a);
        assert_pending!(waiter.poll());
        assert_eq!(ctx.pending_signals(), vec!["b".to_string()]);

        ctx.done(&b);
        assert_ready!(waiter.poll());
    }

    #[tokio::test]
    async fn test_wait_future_outlives_borrows() {
        let key = SignalKey::new("spawned");
        let ctx = Ctx::new();

        let waiter = {
            let keys = [&key];
            let handle = ctx.clone();
            let single = handle.wait(&key);
            let all = handle.wait_all(&keys);
            tokio::spawn(async move {
                single.await;
                all.await;
            })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        ctx.done(&key);
        waiter.await.unwrap();
    }

    #[test]
    fn test_plugin_config_defaults_without_configs() {
        #[derive(serde::Deserialize, Default, Debug, PartialEq)]
        struct Options {
            enabled: bool,
        }
        let ctx = Ctx::new();
        assert_eq!(
            ctx.plugin_config::<Options>("anything").unwrap(),
            Options::default()
        );
    }

    #[test]
    fn test_plugin_config_reads_section() {
        #[derive(serde::Deserialize, Default, Debug, PartialEq)]
        #[serde(default)]
        struct Options {
            limit: u32,
            label: String,
        }

        let ctx = Ctx::new();
        let mut sections = HashMap::new();
        sections.insert("menu".to_string(), serde_json::json!({ "limit": 7 }));
        sections.insert("broken".to_string(), serde_json::json!({ "limit": "many" }));
        ctx.inject_with(&PLUGIN_CONFIGS, Arc::new(sections));

        let options: Options = ctx.plugin_config("menu").unwrap();
        assert_eq!(options.limit, 7);
        assert_eq!(options.label, "");
        assert!(matches!(
            ctx.plugin_config::<Options>("broken"),
            Err(ContextError::PluginConfig { .. })
        ));
        assert_eq!(ctx.plugin_config::<Options>("other").unwrap(), Options::default());
    }

    #[test]
    fn test_on_dispose_requires_prepared_context() {
        let ctx = Ctx::new();
        assert!(ctx.on_dispose(|| async {}).is_err());

        ctx.inject(&DISPOSERS);
        ctx.on_dispose(|| async {}).unwrap();
        ctx.on_dispose(|| async {}).unwrap();
        assert_eq!(ctx.with(&DISPOSERS, Vec::len).unwrap(), 2);
    }
}
