//! Caller-supplied slot values applied during injection.

use std::fmt;

use weft_core::{Ctx, Slot, SlotValue};

type ApplyFn = Box<dyn FnOnce(&Ctx) + Send>;

/// A heterogeneous list of `slot → value` overrides.
///
/// Bindings are applied after every plugin's injection phase, so a bound
/// value replaces whatever default the owning plugin injected.  Binding a
/// slot that no plugin injects registers it.  When the same slot is bound
/// twice, the later binding wins.
///
/// ```rust,ignore
/// let bindings = Bindings::new()
///     .bind(&ROOT, "#app".to_string())
///     .bind(&READ_ONLY, true);
/// ```
#[derive(Default)]
pub struct Bindings {
    entries: Vec<(&'static str, ApplyFn)>,
}

impl Bindings {
    /// Creates an empty set of bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding, builder style.
    pub fn bind<T: SlotValue>(mut self, slot: &Slot<T>, value: T) -> Self {
        self.insert(slot, value);
        self
    }

    /// Adds a binding in place.
    pub fn insert<T: SlotValue>(&mut self, slot: &Slot<T>, value: T) {
        let slot = slot.clone();
        self.entries.push((
            slot.label(),
            Box::new(move |ctx: &Ctx| {
                ctx.inject_with(&slot, value);
            }),
        ));
    }

    /// Appends all of `other`'s bindings after this one's.
    pub fn extend(&mut self, other: Bindings) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn apply(self, ctx: &Ctx) {
        for (_, apply) in self.entries {
            apply(ctx);
        }
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(label, _)| label))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_injects_and_overrides() {
        let limit = Slot::new("limit", 10u32);
        let title = Slot::new("title", String::new());

        let ctx = Ctx::new();
        ctx.inject(&limit);

        Bindings::new()
            .bind(&limit, 20)
            .bind(&title, "notes".to_string())
            .bind(&limit, 30)
            .apply(&ctx);

        assert_eq!(ctx.get(&limit).unwrap(), 30);
        assert_eq!(ctx.get(&title).unwrap(), "notes");
    }

    #[test]
    fn test_extend_keeps_order() {
        let slot = Slot::new("value", 0);
        let mut first = Bindings::new().bind(&slot, 1);
        first.extend(Bindings::new().bind(&slot, 2));
        assert_eq!(first.len(), 2);

        let ctx = Ctx::new();
        first.apply(&ctx);
        assert_eq!(ctx.get(&slot).unwrap(), 2);
    }
}
