use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use arbor_core::{
    Component, ComponentDef, ComponentDefBuilder, Context, Host, HostError, InstanceId,
    LifecycleHook, Props, VNode, VNodeData,
};

/// One lifecycle callback observed by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub component: String,
    pub instance: InstanceId,
    pub hook: LifecycleHook,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.component, self.hook)
    }
}

/// Shared recorder of lifecycle callbacks, in dispatch order.
#[derive(Clone, Default)]
pub struct LifecycleLog {
    events: Rc<RefCell<Vec<LifecycleEvent>>>,
}

impl LifecycleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, component: &str, instance: InstanceId, hook: LifecycleHook) {
        self.events.borrow_mut().push(LifecycleEvent {
            component: component.to_owned(),
            instance,
            hook,
        });
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.borrow().clone()
    }

    /// `component:hook` labels recorded since the last call, draining the log.
    pub fn take_labels(&self) -> Vec<String> {
        self.events
            .borrow_mut()
            .drain(..)
            .map(|event| event.to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn hooks_for(&self, component: &str) -> Vec<LifecycleHook> {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.component == component)
            .map(|event| event.hook)
            .collect()
    }

    pub fn hooks_for_instance(&self, instance: InstanceId) -> Vec<LifecycleHook> {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.instance == instance)
            .map(|event| event.hook)
            .collect()
    }

    pub fn count(&self, component: &str, hook: LifecycleHook) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.component == component && event.hook == hook)
            .count()
    }

    /// Whether `activated`/`deactivated` strictly alternate for every
    /// recorded instance.
    pub fn activation_alternates(&self) -> bool {
        let events = self.events.borrow();
        let mut last: Vec<(InstanceId, LifecycleHook)> = Vec::new();
        for event in events.iter() {
            if !matches!(event.hook, LifecycleHook::Activated | LifecycleHook::Deactivated) {
                continue;
            }
            match last.iter_mut().find(|(id, _)| *id == event.instance) {
                Some((_, previous)) if *previous == event.hook => return false,
                Some((_, previous)) => *previous = event.hook,
                None => last.push((event.instance, event.hook)),
            }
        }
        true
    }
}

impl fmt::Debug for LifecycleLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.events.borrow().iter()).finish()
    }
}

pub type ProbeRender = Rc<dyn Fn(&mut Context<'_>) -> Option<VNode>>;

/// Component that records its lifecycle and renders through a closure.
pub struct Probe {
    name: String,
    log: LifecycleLog,
    render: ProbeRender,
    /// Props observed by the most recent render.
    pub last_props: Props,
    pub renders: usize,
}

impl Probe {
    fn record(&self, cx: &Context<'_>, hook: LifecycleHook) {
        self.log.record(&self.name, cx.id(), hook);
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Component for Probe {
    fn render(&mut self, cx: &mut Context<'_>) -> Option<VNode> {
        self.renders += 1;
        self.last_props = cx.props().cloned().unwrap_or_default();
        (self.render)(cx)
    }

    fn created(&mut self, cx: &mut Context<'_>) {
        self.record(cx, LifecycleHook::Created);
    }

    fn mounted(&mut self, cx: &mut Context<'_>) {
        self.record(cx, LifecycleHook::Mounted);
    }

    fn activated(&mut self, cx: &mut Context<'_>) {
        self.record(cx, LifecycleHook::Activated);
    }

    fn deactivated(&mut self, cx: &mut Context<'_>) {
        self.record(cx, LifecycleHook::Deactivated);
    }

    fn destroyed(&mut self, cx: &mut Context<'_>) {
        self.record(cx, LifecycleHook::Destroyed);
    }
}

/// Builder for a probe definition, for callers that declare props or mark
/// the probe abstract.
pub fn probe_builder(
    name: &str,
    log: &LifecycleLog,
    render: impl Fn(&mut Context<'_>) -> Option<VNode> + 'static,
) -> ComponentDefBuilder {
    let log = log.clone();
    let owned = name.to_owned();
    let render: ProbeRender = Rc::new(render);
    ComponentDef::builder(move || Probe {
        name: owned.clone(),
        log: log.clone(),
        render: render.clone(),
        last_props: Props::default(),
        renders: 0,
    })
    .name(name)
}

pub fn probe_with(
    name: &str,
    log: &LifecycleLog,
    render: impl Fn(&mut Context<'_>) -> Option<VNode> + 'static,
) -> ComponentDef {
    probe_builder(name, log, render).register()
}

/// Probe rendering nothing.
pub fn probe(name: &str, log: &LifecycleLog) -> ComponentDef {
    probe_with(name, log, |_| None)
}

/// Component node for `def` with empty data and no slot.
pub fn node(def: &ComponentDef) -> VNode {
    VNode::component(def, VNodeData::default(), Vec::new())
}

/// Mutable value shared between a test and the render closures reading it.
#[derive(Default)]
pub struct Shared<T> {
    value: Rc<RefCell<T>>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
        }
    }
}

impl<T: Clone> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
    }
}

/// Headless harness owning a [`Host`] and the root it mounted.
pub struct HostTestRule {
    host: Host,
    root: Option<InstanceId>,
}

impl HostTestRule {
    pub fn new() -> Self {
        Self {
            host: Host::new(),
            root: None,
        }
    }

    /// Mounts `root` and runs the first cycle.
    pub fn set_content(&mut self, root: VNode) -> Result<InstanceId, HostError> {
        let id = self.host.mount(root)?;
        self.root = Some(id);
        Ok(id)
    }

    pub fn root(&self) -> Option<InstanceId> {
        self.root
    }

    /// Re-renders the root and drives the host until idle.
    pub fn recompose(&mut self) -> Result<(), HostError> {
        match self.root {
            Some(root) => self.host.update(root),
            None => Ok(()),
        }
    }

    pub fn update(&mut self, id: InstanceId) -> Result<(), HostError> {
        self.host.update(id)
    }

    pub fn pump_until_idle(&mut self) -> Result<(), HostError> {
        while self.host.needs_cycle() {
            self.host.process_invalid()?;
        }
        Ok(())
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    /// Live instance ids whose definition is named `name`, in id order.
    pub fn instances_named(&self, name: &str) -> Vec<InstanceId> {
        let tree = self.host.tree();
        tree.ids()
            .filter(|id| {
                tree.get(*id)
                    .is_ok_and(|record| record.def().name() == Some(name))
            })
            .collect()
    }

    pub fn probe<R>(&mut self, id: InstanceId, f: impl FnOnce(&mut Probe) -> R) -> Option<R> {
        self.host.with_component::<Probe, _>(id, f).ok().flatten()
    }

    pub fn dump_tree(&self) -> String {
        self.host.tree().dump_tree(self.root)
    }
}

impl Default for HostTestRule {
    fn default() -> Self {
        Self::new()
    }
}
