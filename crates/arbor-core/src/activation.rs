//! Active/inactive propagation for cache-managed subtrees.
//!
//! The host calls [`on_insert`] and [`on_remove`] for every component node it
//! inserts or removes. Nodes flagged `keep_alive` are activated and
//! deactivated instead of being destroyed; the transition walks the instance
//! tree depth-first, children before their parent, and stops at instances
//! that were deactivated on their own.

use crate::component::LifecycleHook;
use crate::instance::LifecycleState;
use crate::vnode::VNode;
use crate::{HostError, InstanceId};

/// Operations the propagator needs from the host.
pub trait LifecycleTarget {
    fn state(&self, id: InstanceId) -> Option<&LifecycleState>;

    fn state_mut(&mut self, id: InstanceId) -> Option<&mut LifecycleState>;

    fn children(&self, id: InstanceId) -> Vec<InstanceId>;

    fn is_in_inactive_tree(&self, id: InstanceId) -> bool;

    fn call_hook(&mut self, id: InstanceId, hook: LifecycleHook) -> Result<(), HostError>;

    /// Defers a direct activation of `id` until the end of the current cycle.
    fn queue_activation(&mut self, id: InstanceId);

    /// Fully destroys `id` and its rendered subtree.
    fn destroy(&mut self, id: InstanceId) -> Result<(), HostError>;
}

pub fn activate<T>(target: &mut T, id: InstanceId, direct: bool) -> Result<(), HostError>
where
    T: LifecycleTarget + ?Sized,
{
    let Some(state) = target.state_mut(id) else {
        return Ok(());
    };
    if direct {
        state.directly_inactive = false;
        if target.is_in_inactive_tree(id) {
            return Ok(());
        }
    } else if state.directly_inactive {
        return Ok(());
    }
    let proceed = target
        .state_mut(id)
        .is_some_and(LifecycleState::begin_activation);
    if !proceed {
        return Ok(());
    }
    for child in target.children(id) {
        activate(target, child, false)?;
    }
    target.call_hook(id, LifecycleHook::Activated)
}

pub fn deactivate<T>(target: &mut T, id: InstanceId, direct: bool) -> Result<(), HostError>
where
    T: LifecycleTarget + ?Sized,
{
    let Some(state) = target.state_mut(id) else {
        return Ok(());
    };
    if direct {
        state.directly_inactive = true;
        state.pending_activation = false;
        if target.is_in_inactive_tree(id) {
            return Ok(());
        }
    }
    let proceed = target
        .state_mut(id)
        .is_some_and(LifecycleState::begin_deactivation);
    if !proceed {
        return Ok(());
    }
    for child in target.children(id) {
        deactivate(target, child, false)?;
    }
    target.call_hook(id, LifecycleHook::Deactivated)
}

/// Insert hook for a component node.
pub fn on_insert<T>(target: &mut T, vnode: &VNode) -> Result<(), HostError>
where
    T: LifecycleTarget + ?Sized,
{
    let Some(id) = vnode.instance() else {
        return Ok(());
    };
    let first_mount = target
        .state_mut(id)
        .is_some_and(LifecycleState::mark_mounted);
    if first_mount {
        target.call_hook(id, LifecycleHook::Mounted)?;
    }
    if !vnode.is_keep_alive() {
        return Ok(());
    }
    let context_mounted = vnode
        .context
        .and_then(|context| target.state(context))
        .is_some_and(|state| state.mounted);
    if context_mounted {
        // Descendants may still be patched during this cycle.
        if let Some(state) = target.state_mut(id) {
            state.pending_activation = true;
        }
        target.queue_activation(id);
        Ok(())
    } else {
        activate(target, id, true)
    }
}

/// Remove hook for a component node.
pub fn on_remove<T>(target: &mut T, vnode: &VNode) -> Result<(), HostError>
where
    T: LifecycleTarget + ?Sized,
{
    let Some(id) = vnode.instance() else {
        return Ok(());
    };
    let destroyed = target
        .state(id)
        .map_or(true, |state| state.destroyed || state.being_destroyed);
    if destroyed {
        return Ok(());
    }
    if vnode.is_keep_alive() {
        deactivate(target, id, true)
    } else {
        target.destroy(id)
    }
}

#[cfg(test)]
#[path = "tests/activation_tests.rs"]
mod tests;
