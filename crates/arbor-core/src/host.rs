//! Minimal headless host: instance creation, component-level patching and
//! lifecycle dispatch.
//!
//! The host only reconciles component instances. Element nodes are walked to
//! reach the components below them but nothing is materialized for them.
//! Each cycle patches every invalidated instance, runs the insert hooks
//! collected by each patch and finally flushes deferred activations.

use std::fmt;
use std::sync::Arc;

use crate::activation::{self, LifecycleTarget};
use crate::component::{Component, ComponentDef, LifecycleHook};
use crate::identity::same_vnode;
use crate::instance::{Extensions, InstanceRecord, InstanceTree, LifecycleState};
use crate::platform::{DefaultScheduler, RuntimeScheduler};
use crate::scheduler::Scheduler;
use crate::vnode::{Attrs, PropValue, Props, VNode};
use crate::{HostError, InstanceId};

/// Deferred requests made by components while they are borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Destroy(InstanceId),
    Invalidate(InstanceId),
}

/// View of the host handed to a component during render and lifecycle
/// callbacks.
pub struct Context<'a> {
    id: InstanceId,
    tree: &'a mut InstanceTree,
    commands: &'a mut Vec<HostCommand>,
}

impl<'a> Context<'a> {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn tree(&self) -> &InstanceTree {
        self.tree
    }

    fn record(&self) -> Option<&InstanceRecord> {
        self.tree.get(self.id).ok()
    }

    /// Placeholder node the instance was rendered from.
    pub fn vnode(&self) -> Option<&VNode> {
        self.record().map(InstanceRecord::vnode)
    }

    pub fn props(&self) -> Option<&Props> {
        self.vnode().and_then(VNode::props)
    }

    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props().and_then(|props| props.get(name))
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        self.vnode()
            .and_then(|vnode| vnode.data.as_ref())
            .map(|data| &data.attrs)
    }

    /// Slot content passed by the parent.
    pub fn slot(&self) -> &[VNode] {
        self.vnode()
            .and_then(|vnode| vnode.component.as_ref())
            .map(|options| options.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.record().map(InstanceRecord::extensions)
    }

    pub fn extensions_mut(&mut self) -> Option<&mut Extensions> {
        self.tree
            .get_mut(self.id)
            .ok()
            .map(InstanceRecord::extensions_mut)
    }

    /// Finds the nearest instance, starting with this one, carrying an
    /// extension of type `T`.
    pub fn find_extension<T: 'static>(&self) -> Option<(InstanceId, &T)> {
        std::iter::once(self.id)
            .chain(self.tree.ancestors(self.id))
            .find_map(|id| {
                self.tree
                    .get(id)
                    .ok()
                    .and_then(|record| record.extensions().get::<T>())
                    .map(|value| (id, value))
            })
    }

    /// Requests destruction of `id` once the current callback returns.
    pub fn destroy(&mut self, id: InstanceId) {
        self.commands.push(HostCommand::Destroy(id));
    }

    pub fn invalidate(&mut self, id: InstanceId) {
        self.commands.push(HostCommand::Invalidate(id));
    }
}

pub struct Host {
    tree: InstanceTree,
    scheduler: Scheduler,
    /// Component nodes inserted by the running patch, children first.
    inserted: Vec<VNode>,
    root: Option<InstanceId>,
}

impl Host {
    pub fn new() -> Self {
        Self::with_scheduler(Arc::new(DefaultScheduler))
    }

    pub fn with_scheduler(platform: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            tree: InstanceTree::new(),
            scheduler: Scheduler::new(platform),
            inserted: Vec::new(),
            root: None,
        }
    }

    pub fn tree(&self) -> &InstanceTree {
        &self.tree
    }

    pub fn root(&self) -> Option<InstanceId> {
        self.root
    }

    pub fn extensions_mut(&mut self, id: InstanceId) -> Result<&mut Extensions, HostError> {
        self.tree.get_mut(id).map(InstanceRecord::extensions_mut)
    }

    /// Creates the root instance for `root` and runs the first cycle.
    pub fn mount(&mut self, root: VNode) -> Result<InstanceId, HostError> {
        if !root.is_component() {
            return Err(HostError::NotAComponent);
        }
        if let Some(previous) = self.root.take() {
            self.destroy_instance(previous)?;
        }
        self.create_component(None, &root)?;
        let id = root.instance().ok_or(HostError::NotAComponent)?;
        self.root = Some(id);
        self.process_invalid()?;
        Ok(id)
    }

    pub fn unmount(&mut self) -> Result<(), HostError> {
        if let Some(root) = self.root.take() {
            self.destroy_instance(root)?;
        }
        self.process_invalid()
    }

    /// Marks `id` for re-render in the next cycle.
    pub fn invalidate(&mut self, id: InstanceId) {
        if self.tree.is_alive(id) {
            self.scheduler.invalidate(id);
        }
    }

    /// Invalidates `id` and runs a cycle.
    pub fn update(&mut self, id: InstanceId) -> Result<(), HostError> {
        self.invalidate(id);
        self.process_invalid()
    }

    pub fn needs_cycle(&self) -> bool {
        !self.inserted.is_empty() || self.scheduler.has_pending_work()
    }

    /// Runs cycles until no invalidated instance or deferred activation is
    /// left.
    pub fn process_invalid(&mut self) -> Result<(), HostError> {
        loop {
            self.flush_inserted()?;
            if let Some(id) = self.scheduler.pop_invalid() {
                if self.tree.is_alive(id) {
                    self.render_instance(id)?;
                }
                continue;
            }
            let queued = self.scheduler.take_activations();
            if queued.is_empty() {
                return Ok(());
            }
            for id in queued {
                let pending = self
                    .tree
                    .state_mut(id)
                    .map(|state| std::mem::replace(&mut state.pending_activation, false))
                    .unwrap_or(false);
                if pending {
                    activation::activate(self, id, true)?;
                }
            }
        }
    }

    /// Runs `f` against the live component of `id` if it has type `C`.
    pub fn with_component<C, R>(
        &mut self,
        id: InstanceId,
        f: impl FnOnce(&mut C) -> R,
    ) -> Result<Option<R>, HostError>
    where
        C: Component,
    {
        let mut component = self.tree.take_component(id)?;
        let result = component.as_any_mut().downcast_mut::<C>().map(f);
        self.tree.restore_component(id, component);
        Ok(result)
    }

    fn call_component<R>(
        &mut self,
        id: InstanceId,
        f: impl FnOnce(&mut dyn Component, &mut Context<'_>) -> R,
    ) -> Result<R, HostError> {
        let mut component = self.tree.take_component(id)?;
        let mut commands = Vec::new();
        let result = {
            let mut cx = Context {
                id,
                tree: &mut self.tree,
                commands: &mut commands,
            };
            f(component.as_mut(), &mut cx)
        };
        self.tree.restore_component(id, component);
        self.apply_commands(commands)?;
        Ok(result)
    }

    fn apply_commands(&mut self, commands: Vec<HostCommand>) -> Result<(), HostError> {
        for command in commands {
            match command {
                HostCommand::Destroy(id) => self.destroy_instance(id)?,
                HostCommand::Invalidate(id) => self.invalidate(id),
            }
        }
        Ok(())
    }

    fn flush_inserted(&mut self) -> Result<(), HostError> {
        while !self.inserted.is_empty() {
            let inserted = std::mem::take(&mut self.inserted);
            for vnode in &inserted {
                activation::on_insert(self, vnode)?;
            }
        }
        Ok(())
    }

    fn resolve_parent(&self, def: &ComponentDef, parent: Option<InstanceId>) -> Option<InstanceId> {
        if def.is_abstract() {
            return parent;
        }
        let mut cursor = parent;
        while let Some(id) = cursor {
            if !self.tree.is_abstract(id) {
                break;
            }
            match self.tree.parent(id) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        cursor
    }

    fn create_component(&mut self, parent: Option<InstanceId>, vnode: &VNode) -> Result<(), HostError> {
        let Some(options) = vnode.component.as_ref() else {
            return Err(HostError::NotAComponent);
        };
        let hooks = vnode
            .data
            .as_ref()
            .map(|data| data.hooks.clone())
            .unwrap_or_default();

        if let Some(id) = vnode.instance() {
            if vnode.is_keep_alive() && self.tree.is_alive(id) {
                log::debug!("reinserting cached instance {id}");
                self.prepatch(id, vnode)?;
                if let Some(init) = hooks.init {
                    init(vnode, &self.tree);
                }
                self.inserted.push(vnode.clone());
                return Ok(());
            }
        }

        let def = options.def.clone();
        let parent = self.resolve_parent(&def, parent);
        let id = self
            .tree
            .insert(InstanceRecord::new(def.clone(), parent, vnode.clone()));
        if let Some(parent) = parent.filter(|_| !def.is_abstract()) {
            self.tree.attach_child(parent, id);
        }
        vnode.adopt_instance(Some(id));
        log::debug!("created instance {id} ({:?}) under {parent:?}", def.name());
        if let Some(register) = hooks.register_instance.as_ref() {
            register(id, true);
        }
        self.call_hook(id, LifecycleHook::Created)?;
        self.render_instance(id)?;
        if let Some(init) = hooks.init {
            init(vnode, &self.tree);
        }
        self.inserted.push(vnode.clone());
        Ok(())
    }

    fn render_instance(&mut self, id: InstanceId) -> Result<(), HostError> {
        // Inactive instances render frozen content and render again once
        // activated.
        let suspended = self.tree.state(id).is_some_and(LifecycleState::is_inactive)
            || self.tree.is_in_inactive_tree(id);
        if suspended {
            self.scheduler.defer(id);
        } else {
            self.scheduler.mark_rendered(id);
        }
        let mut next = self.call_component(id, |component, cx| component.render(cx))?;
        if let Some(node) = next.as_mut() {
            node.stamp_context(id);
        }
        let previous = {
            let record = self.tree.get_mut(id)?;
            std::mem::replace(&mut record.rendered, next.clone())
        };
        self.patch(id, previous.as_ref(), next.as_ref())
    }

    fn patch(
        &mut self,
        parent: InstanceId,
        old: Option<&VNode>,
        new: Option<&VNode>,
    ) -> Result<(), HostError> {
        match (old, new) {
            (None, None) => Ok(()),
            (None, Some(new)) => self.create_node(parent, new),
            (Some(old), None) => self.remove_node(old),
            (Some(old), Some(new)) if same_vnode(old, new) => self.patch_vnode(parent, old, new),
            (Some(old), Some(new)) => {
                self.create_node(parent, new)?;
                self.remove_node(old)
            }
        }
    }

    fn create_node(&mut self, parent: InstanceId, vnode: &VNode) -> Result<(), HostError> {
        if vnode.is_component() {
            return self.create_component(Some(parent), vnode);
        }
        for child in &vnode.children {
            self.create_node(parent, child)?;
        }
        Ok(())
    }

    /// Runs the destroy hook for every component node in `vnode`.
    fn remove_node(&mut self, vnode: &VNode) -> Result<(), HostError> {
        if vnode.is_component() {
            activation::on_remove(self, vnode)?;
        }
        for child in &vnode.children {
            self.remove_node(child)?;
        }
        Ok(())
    }

    fn patch_vnode(&mut self, parent: InstanceId, old: &VNode, new: &VNode) -> Result<(), HostError> {
        if new.is_component() {
            let reused = old.instance().filter(|id| self.tree.is_alive(*id));
            return match reused {
                Some(id) => {
                    new.adopt_instance(Some(id));
                    self.prepatch(id, new)?;
                    let hook = new
                        .data
                        .as_ref()
                        .and_then(|data| data.hooks.prepatch.clone());
                    if let Some(hook) = hook {
                        hook(old, new);
                    }
                    Ok(())
                }
                None => self.create_component(Some(parent), new),
            };
        }
        self.update_children(parent, &old.children, &new.children)
    }

    /// Updates a reused instance from `new` and re-renders it.
    fn prepatch(&mut self, id: InstanceId, new: &VNode) -> Result<(), HostError> {
        let previous = self.tree.set_vnode(id, new.clone())?;
        let previous_props = previous.props().cloned().unwrap_or_default();
        let changed = new.props().map_or(!previous_props.is_empty(), |props| *props != previous_props);
        if changed {
            self.call_component(id, |component, cx| component.props_changed(cx, &previous_props))?;
        }
        self.render_instance(id)
    }

    fn update_children(
        &mut self,
        parent: InstanceId,
        old: &[VNode],
        new: &[VNode],
    ) -> Result<(), HostError> {
        let mut used = vec![false; old.len()];
        for (index, child) in new.iter().enumerate() {
            let matched = if index < old.len() && !used[index] && same_vnode(&old[index], child) {
                Some(index)
            } else {
                (0..old.len()).find(|&candidate| !used[candidate] && same_vnode(&old[candidate], child))
            };
            match matched {
                Some(position) => {
                    used[position] = true;
                    self.patch_vnode(parent, &old[position], child)?;
                }
                None => self.create_node(parent, child)?,
            }
        }
        for (child, used) in old.iter().zip(used) {
            if !used {
                self.remove_node(child)?;
            }
        }
        Ok(())
    }

    fn destroy_instance(&mut self, id: InstanceId) -> Result<(), HostError> {
        let Some(state) = self.tree.state_mut(id) else {
            return Ok(());
        };
        if state.being_destroyed || state.destroyed {
            return Ok(());
        }
        state.being_destroyed = true;

        let (parent, is_abstract, register) = {
            let record = self.tree.get(id)?;
            let register = record
                .vnode()
                .data
                .as_ref()
                .and_then(|data| data.hooks.register_instance.clone());
            (record.parent(), record.def().is_abstract(), register)
        };
        if let Some(parent) = parent.filter(|_| !is_abstract) {
            self.tree.detach_child(parent, id);
        }
        let rendered = self.tree.get_mut(id)?.rendered.take();
        if let Some(rendered) = rendered {
            self.remove_node(&rendered)?;
        }
        if let Some(state) = self.tree.state_mut(id) {
            state.destroyed = true;
        }
        self.call_hook(id, LifecycleHook::Destroyed)?;
        if let Some(register) = register {
            register(id, false);
        }
        log::debug!("destroyed instance {id}");
        self.scheduler.forget(id);
        self.tree.remove(id);
        if self.root == Some(id) {
            self.root = None;
        }
        Ok(())
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("root", &self.root)
            .field("tree", &self.tree)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl LifecycleTarget for Host {
    fn state(&self, id: InstanceId) -> Option<&LifecycleState> {
        self.tree.state(id)
    }

    fn state_mut(&mut self, id: InstanceId) -> Option<&mut LifecycleState> {
        self.tree.state_mut(id)
    }

    fn children(&self, id: InstanceId) -> Vec<InstanceId> {
        self.tree.children(id)
    }

    fn is_in_inactive_tree(&self, id: InstanceId) -> bool {
        self.tree.is_in_inactive_tree(id)
    }

    fn call_hook(&mut self, id: InstanceId, hook: LifecycleHook) -> Result<(), HostError> {
        log::trace!("{hook} -> instance {id}");
        if hook == LifecycleHook::Activated {
            self.scheduler.wake(id);
        }
        self.call_component(id, |component, cx| match hook {
            LifecycleHook::Created => component.created(cx),
            LifecycleHook::Mounted => component.mounted(cx),
            LifecycleHook::Activated => component.activated(cx),
            LifecycleHook::Deactivated => component.deactivated(cx),
            LifecycleHook::Destroyed => component.destroyed(cx),
        })
    }

    fn queue_activation(&mut self, id: InstanceId) {
        self.scheduler.queue_activation(id);
    }

    fn destroy(&mut self, id: InstanceId) -> Result<(), HostError> {
        self.destroy_instance(id)
    }
}

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod tests;
