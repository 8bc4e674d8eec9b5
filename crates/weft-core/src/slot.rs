//! Typed slot declarations.
//!
//! A [`Slot<T>`] is the key under which a value of type `T` lives in a
//! [`Ctx`](crate::Ctx).  Each call to [`Slot::new`] allocates a fresh
//! [`SlotId`], so two slots declared with the same label and default are
//! still distinct keys.
//!
//! Slots are usually declared once per module and shared by every context
//! that uses them:
//!
//! ```rust,ignore
//! use std::sync::LazyLock;
//! use weft_core::Slot;
//!
//! pub static WORD_COUNT: LazyLock<Slot<usize>> = LazyLock::new(|| Slot::new("word-count", 0));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Marker for types that can live in a context slot.
///
/// Values are handed out by clone, and contexts are shared across tasks.
pub trait SlotValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> SlotValue for T {}

/// Process-wide unique identity of a slot declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric identity.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed key plus the default value used when it is injected bare.
#[derive(Clone)]
pub struct Slot<T> {
    id: SlotId,
    label: &'static str,
    default: T,
}

impl<T> Slot<T> {
    /// Declares a new slot. The label is only used in logs and errors.
    pub fn new(label: &'static str, default: T) -> Self {
        Self {
            id: SlotId::next(),
            label,
            default,
        }
    }

    /// Identity of this declaration.  Clones share it; a second `Slot::new`
    /// with the same label does not.
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Human-readable label, used in errors and logs only.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The value injected by [`Ctx::inject`](crate::Ctx::inject).
    pub fn default_value(&self) -> &T {
        &self.default
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Slot<T> {}

impl<T> Hash for Slot<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_label_and_default_are_distinct() {
        let a = Slot::new("count", 0u32);
        let b = Slot::new("count", 0u32);
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_clone_keeps_identity() {
        let a = Slot::new("name", String::from("x"));
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.default_value(), "x");
    }

    #[test]
    fn test_debug_does_not_require_debug_value() {
        struct Opaque;
        let slot = Slot::new("opaque", Opaque);
        let rendered = format!("{slot:?}");
        assert!(rendered.contains("opaque"));
    }
}
