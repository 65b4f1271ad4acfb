//! Work queues of a render cycle.
//!
//! Invalidated instances are re-rendered lowest id first, which puts parents
//! before the children they created. Activations deferred by the insert hook
//! are kept in insertion order and de-duplicated by instance, so each
//! instance is activated at most once per flush. Instances that rendered
//! while inactive are parked as stale and re-queued when they wake.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::platform::RuntimeScheduler;
use crate::InstanceId;

pub struct Scheduler {
    platform: Arc<dyn RuntimeScheduler>,
    invalid: BTreeSet<InstanceId>,
    activations: IndexSet<InstanceId>,
    stale: BTreeSet<InstanceId>,
}

impl Scheduler {
    pub fn new(platform: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            platform,
            invalid: BTreeSet::new(),
            activations: IndexSet::new(),
            stale: BTreeSet::new(),
        }
    }

    pub fn invalidate(&mut self, id: InstanceId) {
        if self.invalid.insert(id) {
            self.platform.schedule_cycle();
        }
    }

    pub fn is_invalid(&self, id: InstanceId) -> bool {
        self.invalid.contains(&id)
    }

    pub fn pop_invalid(&mut self) -> Option<InstanceId> {
        self.invalid.pop_first()
    }

    /// Called when `id` is rendered outside the queue, e.g. during a
    /// parent's patch.
    pub fn mark_rendered(&mut self, id: InstanceId) {
        self.invalid.remove(&id);
    }

    /// Parks `id` until [`Scheduler::wake`] is called for it.
    pub fn defer(&mut self, id: InstanceId) {
        self.invalid.remove(&id);
        self.stale.insert(id);
    }

    /// Re-queues `id` if it rendered while suspended.
    pub fn wake(&mut self, id: InstanceId) {
        if self.stale.remove(&id) {
            self.invalidate(id);
        }
    }

    pub fn is_stale(&self, id: InstanceId) -> bool {
        self.stale.contains(&id)
    }

    /// Returns `false` if `id` was already queued.
    pub fn queue_activation(&mut self, id: InstanceId) -> bool {
        self.activations.insert(id)
    }

    pub fn take_activations(&mut self) -> Vec<InstanceId> {
        self.activations.drain(..).collect()
    }

    pub fn forget(&mut self, id: InstanceId) {
        self.invalid.remove(&id);
        self.activations.shift_remove(&id);
        self.stale.remove(&id);
    }

    pub fn has_pending_work(&self) -> bool {
        !self.invalid.is_empty() || !self.activations.is_empty()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("invalid", &self.invalid)
            .field("activations", &self.activations)
            .field("stale", &self.stale)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct CountingScheduler {
        requests: AtomicUsize,
    }

    impl RuntimeScheduler for CountingScheduler {
        fn schedule_cycle(&self) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn invalid_instances_pop_lowest_first() {
        let platform = Arc::new(CountingScheduler::default());
        let mut scheduler = Scheduler::new(platform.clone());
        scheduler.invalidate(5);
        scheduler.invalidate(2);
        scheduler.invalidate(5);
        assert_eq!(platform.requests.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.pop_invalid(), Some(2));
        assert_eq!(scheduler.pop_invalid(), Some(5));
        assert_eq!(scheduler.pop_invalid(), None);
    }

    #[test]
    fn activations_are_fifo_and_deduplicated() {
        let mut scheduler = Scheduler::new(Arc::new(CountingScheduler::default()));
        assert!(scheduler.queue_activation(4));
        assert!(scheduler.queue_activation(1));
        assert!(!scheduler.queue_activation(4));
        scheduler.queue_activation(9);
        scheduler.forget(1);
        assert_eq!(scheduler.take_activations(), vec![4, 9]);
        assert!(!scheduler.has_pending_work());
    }

    #[test]
    fn deferred_instances_requeue_on_wake() {
        let platform = Arc::new(CountingScheduler::default());
        let mut scheduler = Scheduler::new(platform.clone());
        scheduler.invalidate(3);
        scheduler.defer(3);
        assert!(!scheduler.is_invalid(3));
        assert!(!scheduler.has_pending_work());

        scheduler.wake(7);
        assert!(!scheduler.is_invalid(7));
        scheduler.wake(3);
        assert!(scheduler.is_invalid(3));
        assert!(!scheduler.is_stale(3));
        assert_eq!(platform.requests.load(Ordering::SeqCst), 2);
    }
}
