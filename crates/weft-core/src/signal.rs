//! One-shot readiness signals.
//!
//! A [`Signal`] starts *pending* and can be completed exactly once.  Any
//! number of tasks may [`wait`](Signal::wait) on it, before or after it is
//! completed; all of them are released when it completes, and waits started
//! afterwards resolve on their first poll.
//!
//! Signals carry no payload.  Data that must cross the barrier goes through
//! the [`Ctx`](crate::Ctx).
//!
//! Plugins do not share `Signal` values directly.  They declare a
//! [`SignalKey`] and each context materialises its own signal for that key
//! via [`Ctx::signal`](crate::Ctx::signal), so two instances built from the
//! same plugins never observe each other's readiness.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::debug;

// ─── SignalKey ────────────────────────────────────────────────────────────────

/// Declared identity of a signal, materialised per context.
///
/// ```rust,ignore
/// pub static STATE_READY: LazyLock<SignalKey> = LazyLock::new(|| SignalKey::new("state-ready"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalKey {
    id: u64,
    name: &'static str,
}

impl SignalKey {
    /// Declares a new key. Identity is per call, the name is only a label.
    pub fn new(name: &'static str) -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT.fetch_add(1, Ordering::Relaxed),
            name,
        }
    }

    /// Key under which contexts store the materialised signal.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

// ─── Signal ───────────────────────────────────────────────────────────────────

struct SignalInner {
    name: Cow<'static, str>,
    done: watch::Sender<bool>,
}

/// A named one-shot completion barrier.
///
/// Cloning a `Signal` yields another handle to the same barrier.
#[derive(Clone)]
pub struct Signal {
    inner: Arc<SignalInner>,
}

impl Signal {
    /// Creates a pending signal.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            inner: Arc::new(SignalInner {
                name: name.into(),
                done,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns `true` once [`complete`](Self::complete) has been called.
    pub fn is_done(&self) -> bool {
        *self.inner.done.borrow()
    }

    /// Marks the signal done and releases every waiter.
    ///
    /// Completing an already-done signal is a no-op.  Returns `true` only for
    /// the call that performed the transition.
    pub fn complete(&self) -> bool {
        let transitioned = self.inner.done.send_if_modified(|done| {
            if *done {
                false
            } else {
                *done = true;
                true
            }
        });
        if transitioned {
            debug!(signal = %self.name(), "Signal completed");
        } else {
            debug!(signal = %self.name(), "Signal already completed, ignoring");
        }
        transitioned
    }

    /// Waits until the signal is done.
    ///
    /// The returned future owns a handle to the signal, so it can outlive
    /// `self` and be moved into another task.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + use<> {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut rx = inner.done.subscribe();
            // The sender lives in `inner`, which this future keeps alive, so
            // the channel cannot close while we wait.
            let _ = rx.wait_for(|done| *done).await;
        }
    }

    /// Returns `true` if both handles point at the same barrier.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name())
            .field("done", &self.is_done())
            .finish()
    }
}
