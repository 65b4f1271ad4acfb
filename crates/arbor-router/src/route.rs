use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use arbor_core::{ComponentDef, InstanceId, InstanceTree};
use indexmap::IndexMap;

use crate::props::PropsConfig;
use crate::DEFAULT_VIEW;

pub type EnteredCallback = Box<dyn FnOnce(InstanceId)>;

/// One matched segment of a route: the components it renders per view name
/// and the live instance currently displaying each of them.
pub struct RouteRecord {
    path: String,
    components: IndexMap<String, ComponentDef>,
    props: IndexMap<String, PropsConfig>,
    instances: RefCell<IndexMap<String, InstanceId>>,
    entered: RefCell<IndexMap<String, Vec<EnteredCallback>>>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            components: IndexMap::new(),
            props: IndexMap::new(),
            instances: RefCell::new(IndexMap::new()),
            entered: RefCell::new(IndexMap::new()),
        }
    }

    pub fn with_component(self, def: &ComponentDef) -> Self {
        self.with_named_component(DEFAULT_VIEW, def)
    }

    pub fn with_named_component(mut self, name: impl Into<String>, def: &ComponentDef) -> Self {
        self.components.insert(name.into(), def.clone());
        self
    }

    pub fn with_props(self, config: PropsConfig) -> Self {
        self.with_named_props(DEFAULT_VIEW, config)
    }

    pub fn with_named_props(mut self, name: impl Into<String>, config: PropsConfig) -> Self {
        self.props.insert(name.into(), config);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn component(&self, name: &str) -> Option<&ComponentDef> {
        self.components.get(name)
    }

    pub fn props_config(&self, name: &str) -> Option<&PropsConfig> {
        self.props.get(name)
    }

    pub fn instance(&self, name: &str) -> Option<InstanceId> {
        self.instances.borrow().get(name).copied()
    }

    pub fn set_instance(&self, name: &str, id: Option<InstanceId>) {
        let mut instances = self.instances.borrow_mut();
        match id {
            Some(id) => {
                instances.insert(name.to_owned(), id);
            }
            None => {
                instances.shift_remove(name);
            }
        }
    }

    /// Registers `id` as the live instance for `name`, or unregisters it.
    /// Unregistering only clears the slot if `id` still holds it.
    pub fn register_instance(&self, name: &str, id: InstanceId, registered: bool) {
        let current = self.instance(name);
        if registered && current != Some(id) {
            self.set_instance(name, Some(id));
        } else if !registered && current == Some(id) {
            self.set_instance(name, None);
        }
    }

    /// Queues `callback` to run once an instance for `name` has entered.
    pub fn on_entered(&self, name: &str, callback: impl FnOnce(InstanceId) + 'static) {
        self.entered
            .borrow_mut()
            .entry(name.to_owned())
            .or_default()
            .push(Box::new(callback));
    }

    fn take_entered(&self, name: &str) -> Vec<EnteredCallback> {
        self.entered
            .borrow_mut()
            .shift_remove(name)
            .unwrap_or_default()
    }

    fn has_entered(&self, name: &str) -> bool {
        self.entered.borrow().contains_key(name)
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("path", &self.path)
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .field("instances", &self.instances.borrow())
            .finish()
    }
}

/// Resolved location: path, params and the records matched from the
/// outermost segment inwards.
#[derive(Clone, Debug, Default)]
pub struct Route {
    path: String,
    params: IndexMap<String, String>,
    matched: Vec<Rc<RouteRecord>>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_matched(mut self, record: &Rc<RouteRecord>) -> Self {
        self.matched.push(Rc::clone(record));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    pub fn matched(&self) -> &[Rc<RouteRecord>] {
        &self.matched
    }

    /// Runs the pending "entered" callbacks of every matched record whose
    /// view now has a live instance.
    pub fn handle_entered(&self, tree: &InstanceTree) {
        for record in &self.matched {
            let names: Vec<String> = record.instances.borrow().keys().cloned().collect();
            for name in names {
                let Some(instance) = record.instance(&name) else {
                    continue;
                };
                if !record.has_entered(&name) {
                    continue;
                }
                for callback in record.take_entered(&name) {
                    let leaving = tree
                        .state(instance)
                        .map_or(true, |state| state.being_destroyed);
                    if !leaving {
                        callback(instance);
                    }
                }
            }
        }
    }
}
