//! Deferred actions
//!
//! Actions queued during a cycle run after that cycle's render and before
//! the next cycle's first tick, in the order they were queued, each with its
//! owning context active.

use std::collections::VecDeque;

use crate::context::ContextId;
use crate::engine::Engine;
use crate::state::StateResult;

/// An action run once against the engine
pub type DeferredAction = Box<dyn FnOnce(&mut Engine) -> StateResult>;

/// FIFO of actions, each tagged with the context that queued it
#[derive(Default)]
pub struct DeferredQueue {
    actions: VecDeque<(ContextId, DeferredAction)>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, owner: ContextId, action: DeferredAction) {
        self.actions.push_back((owner, action));
    }

    /// Take the oldest action
    pub fn pop(&mut self) -> Option<(ContextId, DeferredAction)> {
        self.actions.pop_front()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Drop every queued action without running it
    pub fn clear(&mut self) {
        self.actions.clear();
    }
}

impl std::fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("len", &self.actions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_fifo_order() {
        let mut contexts: SlotMap<ContextId, ()> = SlotMap::with_key();
        let (a, b) = (contexts.insert(()), contexts.insert(()));

        let mut queue = DeferredQueue::new();
        queue.push(a, Box::new(|_| Ok(())));
        queue.push(b, Box::new(|_| Ok(())));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop().map(|(owner, _)| owner), Some(a));
        assert_eq!(queue.pop().map(|(owner, _)| owner), Some(b));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_clear() {
        let mut contexts: SlotMap<ContextId, ()> = SlotMap::with_key();
        let mut queue = DeferredQueue::new();
        queue.push(contexts.insert(()), Box::new(|_| Ok(())));
        queue.clear();
        assert!(queue.is_empty());
    }
}
