//! Instance arena and the per-instance lifecycle record.

use std::any::{Any, TypeId};
use std::fmt;

use crate::collections::map::HashMap;
use crate::component::{Component, ComponentDef};
use crate::vnode::VNode;
use crate::{HostError, InstanceId};

/// Lifecycle flags of a single instance.
///
/// `active` is `None` until the first activation; `Some(false)` means the
/// instance was deactivated, which is distinct from being destroyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleState {
    pub mounted: bool,
    pub active: Option<bool>,
    /// The instance itself was the target of a deactivation, as opposed to
    /// inheriting inactivity from an ancestor.
    pub directly_inactive: bool,
    /// Queued for activation at the end of the current cycle.
    pub pending_activation: bool,
    pub being_destroyed: bool,
    pub destroyed: bool,
}

impl LifecycleState {
    /// Whether the instance currently counts as inactive. An instance queued
    /// for activation already reads as active so renders running before the
    /// queue is flushed resolve normally.
    pub fn is_inactive(&self) -> bool {
        self.active == Some(false) && !self.pending_activation
    }

    pub fn is_active(&self) -> bool {
        self.active == Some(true)
    }

    /// Marks the instance active. Returns `false` when it already was.
    pub fn begin_activation(&mut self) -> bool {
        if self.active == Some(true) {
            return false;
        }
        self.active = Some(true);
        true
    }

    /// Marks the instance inactive. Returns `false` when it already was.
    pub fn begin_deactivation(&mut self) -> bool {
        if self.active == Some(false) {
            return false;
        }
        self.active = Some(false);
        true
    }

    pub fn mark_mounted(&mut self) -> bool {
        !std::mem::replace(&mut self.mounted, true)
    }
}

/// Typed storage attached to an instance.
#[derive(Default)]
pub struct Extensions {
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl Extensions {
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.entries
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    pub fn get_or_insert_with<T: 'static>(&mut self, init: impl FnOnce() -> T) -> &mut T {
        self.entries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(init()))
            .downcast_mut::<T>()
            .expect("extension stored under its own TypeId")
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.entries.len())
            .finish()
    }
}

pub struct InstanceRecord {
    pub(crate) component: Option<Box<dyn Component>>,
    def: ComponentDef,
    parent: Option<InstanceId>,
    children: Vec<InstanceId>,
    vnode: VNode,
    pub(crate) rendered: Option<VNode>,
    state: LifecycleState,
    extensions: Extensions,
}

impl InstanceRecord {
    pub(crate) fn new(def: ComponentDef, parent: Option<InstanceId>, vnode: VNode) -> Self {
        let component = def.instantiate();
        Self {
            component: Some(component),
            def,
            parent,
            children: Vec::new(),
            vnode,
            rendered: None,
            state: LifecycleState::default(),
            extensions: Extensions::default(),
        }
    }

    pub fn def(&self) -> &ComponentDef {
        &self.def
    }

    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    pub fn children(&self) -> &[InstanceId] {
        &self.children
    }

    /// Placeholder node this instance was last patched from.
    pub fn vnode(&self) -> &VNode {
        &self.vnode
    }

    pub fn rendered(&self) -> Option<&VNode> {
        self.rendered.as_ref()
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl fmt::Debug for InstanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRecord")
            .field("def", &self.def)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("state", &self.state)
            .finish()
    }
}

/// Arena of live instances. Ids are never reused; a destroyed instance's
/// slot stays empty.
#[derive(Default)]
pub struct InstanceTree {
    records: Vec<Option<InstanceRecord>>,
}

impl InstanceTree {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, record: InstanceRecord) -> InstanceId {
        let id = self.records.len();
        self.records.push(Some(record));
        id
    }

    pub(crate) fn remove(&mut self, id: InstanceId) -> Option<InstanceRecord> {
        self.records.get_mut(id).and_then(Option::take)
    }

    pub fn get(&self, id: InstanceId) -> Result<&InstanceRecord, HostError> {
        self.records
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(HostError::Missing { id })
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Result<&mut InstanceRecord, HostError> {
        self.records
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(HostError::Missing { id })
    }

    /// Whether `id` refers to an instance that has not been destroyed.
    pub fn is_alive(&self, id: InstanceId) -> bool {
        self.get(id).is_ok_and(|record| !record.state.destroyed)
    }

    pub fn len(&self) -> usize {
        self.records.iter().filter(|record| record.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of live instances, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(id, record)| record.as_ref().map(|_| id))
    }

    pub fn parent(&self, id: InstanceId) -> Option<InstanceId> {
        self.get(id).ok().and_then(InstanceRecord::parent)
    }

    pub fn children(&self, id: InstanceId) -> Vec<InstanceId> {
        self.get(id)
            .map(|record| record.children.clone())
            .unwrap_or_default()
    }

    pub fn state(&self, id: InstanceId) -> Option<&LifecycleState> {
        self.get(id).ok().map(InstanceRecord::state)
    }

    pub fn state_mut(&mut self, id: InstanceId) -> Option<&mut LifecycleState> {
        self.get_mut(id).ok().map(|record| &mut record.state)
    }

    pub fn is_abstract(&self, id: InstanceId) -> bool {
        self.get(id).is_ok_and(|record| record.def.is_abstract())
    }

    pub fn is_mounted(&self, id: InstanceId) -> bool {
        self.state(id).is_some_and(|state| state.mounted)
    }

    /// Iterates `id`'s ancestors, nearest first.
    pub fn ancestors(&self, id: InstanceId) -> impl Iterator<Item = InstanceId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Whether any ancestor of `id` is currently inactive.
    pub fn is_in_inactive_tree(&self, id: InstanceId) -> bool {
        self.ancestors(id)
            .any(|ancestor| self.state(ancestor).is_some_and(LifecycleState::is_inactive))
    }

    pub(crate) fn attach_child(&mut self, parent: InstanceId, child: InstanceId) {
        if let Ok(record) = self.get_mut(parent) {
            record.children.push(child);
        }
    }

    pub(crate) fn detach_child(&mut self, parent: InstanceId, child: InstanceId) {
        if let Ok(record) = self.get_mut(parent) {
            record.children.retain(|candidate| *candidate != child);
        }
    }

    pub(crate) fn set_vnode(&mut self, id: InstanceId, vnode: VNode) -> Result<VNode, HostError> {
        let record = self.get_mut(id)?;
        Ok(std::mem::replace(&mut record.vnode, vnode))
    }

    pub(crate) fn take_component(&mut self, id: InstanceId) -> Result<Box<dyn Component>, HostError> {
        self.get_mut(id)?
            .component
            .take()
            .ok_or(HostError::Busy { id })
    }

    pub(crate) fn restore_component(&mut self, id: InstanceId, component: Box<dyn Component>) {
        if let Ok(record) = self.get_mut(id) {
            record.component = Some(component);
        }
    }

    pub fn dump_tree(&self, root: Option<InstanceId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_instance(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_instance(&self, output: &mut String, id: InstanceId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.get(id) {
            Ok(record) => {
                let name = record.def.name().unwrap_or("<anonymous>");
                let state = match record.state.active {
                    Some(true) => "active",
                    Some(false) => "inactive",
                    None => "idle",
                };
                output.push_str(&format!("{indent}[{id}] {name} ({state})\n"));
                for child in &record.children {
                    self.dump_instance(output, *child, depth + 1);
                }
            }
            Err(_) => output.push_str(&format!("{indent}[{id}] (missing)\n")),
        }
    }
}

impl fmt::Debug for InstanceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceTree")
            .field("live", &self.len())
            .finish()
    }
}
