//! Component definitions and the trait implemented by live components.
//!
//! A [`ComponentDef`] is registered once and receives a monotonically
//! increasing [`ComponentId`]. The id takes the place of constructor identity:
//! two definitions built from the same factory type are still distinct
//! components, and vnode tags and synthesized cache keys are derived from it.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::host::Context;
use crate::vnode::{Props, VNode};

pub type ComponentId = usize;

static NEXT_COMPONENT_ID: AtomicUsize = AtomicUsize::new(1);

fn next_component_id() -> ComponentId {
    NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Lifecycle callbacks dispatched by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    Created,
    Mounted,
    Activated,
    Deactivated,
    Destroyed,
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleHook::Created => "created",
            LifecycleHook::Mounted => "mounted",
            LifecycleHook::Activated => "activated",
            LifecycleHook::Deactivated => "deactivated",
            LifecycleHook::Destroyed => "destroyed",
        };
        f.write_str(label)
    }
}

/// A live component. Instances are created by the host from a
/// [`ComponentDef`] and stored in the instance arena.
pub trait Component: Any {
    fn render(&mut self, cx: &mut Context<'_>) -> Option<VNode>;

    fn created(&mut self, _cx: &mut Context<'_>) {}

    fn mounted(&mut self, _cx: &mut Context<'_>) {}

    fn activated(&mut self, _cx: &mut Context<'_>) {}

    fn deactivated(&mut self, _cx: &mut Context<'_>) {}

    fn destroyed(&mut self, _cx: &mut Context<'_>) {}

    /// Called during prepatch when the placeholder's props differ from the
    /// previous pass. `cx.props()` already reflects the new values.
    fn props_changed(&mut self, _cx: &mut Context<'_>, _previous: &Props) {}
}

impl dyn Component {
    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

type Factory = dyn Fn() -> Box<dyn Component>;

struct DefinitionInner {
    id: ComponentId,
    name: Option<String>,
    props: Vec<String>,
    is_abstract: bool,
    vnode_tag: String,
    factory: Box<Factory>,
}

/// Registered component type.
#[derive(Clone)]
pub struct ComponentDef {
    inner: Rc<DefinitionInner>,
}

impl ComponentDef {
    pub fn builder<C, F>(factory: F) -> ComponentDefBuilder
    where
        C: Component,
        F: Fn() -> C + 'static,
    {
        ComponentDefBuilder {
            name: None,
            props: Vec::new(),
            is_abstract: false,
            factory: Box::new(move || Box::new(factory()) as Box<dyn Component>),
        }
    }

    /// Registers a named component with no declared props.
    pub fn named<C, F>(name: &str, factory: F) -> Self
    where
        C: Component,
        F: Fn() -> C + 'static,
    {
        Self::builder(factory).name(name).register()
    }

    /// Registers a component without a declared name.
    pub fn anonymous<C, F>(factory: F) -> Self
    where
        C: Component,
        F: Fn() -> C + 'static,
    {
        Self::builder(factory).register()
    }

    pub fn id(&self) -> ComponentId {
        self.inner.id
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn is_abstract(&self) -> bool {
        self.inner.is_abstract
    }

    pub fn declares_prop(&self, prop: &str) -> bool {
        self.inner.props.iter().any(|declared| declared == prop)
    }

    /// Tag placed on every vnode rendering this component.
    pub fn vnode_tag(&self) -> &str {
        &self.inner.vnode_tag
    }

    pub(crate) fn instantiate(&self) -> Box<dyn Component> {
        (self.inner.factory)()
    }
}

impl PartialEq for ComponentDef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ComponentDef {}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("abstract", &self.inner.is_abstract)
            .finish()
    }
}

pub struct ComponentDefBuilder {
    name: Option<String>,
    props: Vec<String>,
    is_abstract: bool,
    factory: Box<Factory>,
}

impl ComponentDefBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn prop(mut self, prop: impl Into<String>) -> Self {
        self.props.push(prop.into());
        self
    }

    pub fn props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.props.extend(props.into_iter().map(Into::into));
        self
    }

    /// Abstract components are skipped when children pick their parent
    /// instance and are never listed among their parent's children.
    pub fn abstract_component(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn register(self) -> ComponentDef {
        let id = next_component_id();
        let vnode_tag = match &self.name {
            Some(name) => format!("arbor-component-{id}-{name}"),
            None => format!("arbor-component-{id}"),
        };
        ComponentDef {
            inner: Rc::new(DefinitionInner {
                id,
                name: self.name,
                props: self.props,
                is_abstract: self.is_abstract,
                vnode_tag,
                factory: self.factory,
            }),
        }
    }
}
