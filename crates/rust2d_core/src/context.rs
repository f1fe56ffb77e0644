//! Active context tracking
//!
//! A context is whatever an action needs to be "current" while it runs (the
//! original use is a window's rendering context). Exactly one context is
//! active at a time; [`ContextSlot::acquire`] swaps one in and the returned
//! guard puts the previous one back when dropped, on every exit path.

use std::cell::Cell;
use std::rc::Rc;

use slotmap::new_key_type;

new_key_type! {
    /// Identifies a context created by the engine
    pub struct ContextId;
}

/// Shared holder of the active context
#[derive(Clone, Debug, Default)]
pub struct ContextSlot(Rc<Cell<Option<ContextId>>>);

impl ContextSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active context, if any
    pub fn current(&self) -> Option<ContextId> {
        self.0.get()
    }

    /// Make `id` active until the guard is dropped
    pub fn acquire(&self, id: ContextId) -> ContextGuard {
        let previous = self.0.replace(Some(id));
        ContextGuard {
            slot: self.clone(),
            context: id,
            previous,
        }
    }
}

/// Restores the previously active context on drop
#[must_use = "the context is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ContextGuard {
    slot: ContextSlot,
    context: ContextId,
    previous: Option<ContextId>,
}

impl ContextGuard {
    /// The context held by this guard
    pub fn context(&self) -> ContextId {
        self.context
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.slot.0.set(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn two_contexts() -> (ContextId, ContextId) {
        let mut map: SlotMap<ContextId, ()> = SlotMap::with_key();
        (map.insert(()), map.insert(()))
    }

    #[test]
    fn test_guard_restores_previous() {
        let (main, other) = two_contexts();
        let slot = ContextSlot::new();
        let _main = slot.acquire(main);
        {
            let guard = slot.acquire(other);
            assert_eq!(guard.context(), other);
            assert_eq!(slot.current(), Some(other));
        }
        assert_eq!(slot.current(), Some(main));
    }

    #[test]
    fn test_guard_restores_on_early_return() {
        let (main, other) = two_contexts();
        let slot = ContextSlot::new();
        let _main = slot.acquire(main);

        let run = |fail: bool| -> Result<(), &'static str> {
            let _guard = slot.acquire(other);
            if fail {
                return Err("failed");
            }
            Ok(())
        };
        assert!(run(true).is_err());
        assert_eq!(slot.current(), Some(main));
    }

    #[test]
    fn test_guard_restores_on_panic() {
        let (main, other) = two_contexts();
        let slot = ContextSlot::new();
        let _main = slot.acquire(main);

        let inner = slot.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = inner.acquire(other);
            panic!("action failed");
        }));
        assert!(result.is_err());
        assert_eq!(slot.current(), Some(main));
    }

    #[test]
    fn test_empty_slot() {
        let (main, _) = two_contexts();
        let slot = ContextSlot::new();
        assert_eq!(slot.current(), None);
        drop(slot.acquire(main));
        assert_eq!(slot.current(), None);
    }
}
