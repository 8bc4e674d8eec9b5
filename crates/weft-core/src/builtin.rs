//! Slots that every orchestrated context carries.
//!
//! The orchestrator injects these before any plugin runs, so plugins may read
//! them during their own injection phase.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use futures::future::BoxFuture;
use serde_json::Value;

use crate::slot::Slot;

/// Async teardown hook registered through [`Ctx::on_dispose`](crate::Ctx::on_dispose).
pub type Disposer = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Per-plugin configuration sections, keyed by plugin name.
pub static PLUGIN_CONFIGS: LazyLock<Slot<Arc<HashMap<String, Value>>>> =
    LazyLock::new(|| Slot::new("weft.plugin-configs", Arc::default()));

/// Disposers in registration order.
pub static DISPOSERS: LazyLock<Slot<Vec<Disposer>>> =
    LazyLock::new(|| Slot::new("weft.disposers", Vec::new()));
