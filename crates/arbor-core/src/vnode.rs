//! Subtree descriptions produced by every render pass.
//!
//! A [`VNode`] describes what should be mounted at a tree position. It is
//! rebuilt on each pass; the only state that survives cloning is the
//! [`InstanceSlot`], which is shared between clones so that whoever kept a
//! copy of a node (for example an instance cache) observes the instance the
//! host realized for it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use regex::Regex;

use crate::component::ComponentDef;
use crate::instance::InstanceTree;
use crate::InstanceId;

pub type Key = String;
pub type Props = IndexMap<String, PropValue>;
pub type Attrs = IndexMap<String, PropValue>;

/// Loosely typed value carried by props and attrs.
#[derive(Clone, Debug)]
pub enum PropValue {
    Text(String),
    Number(i64),
    Bool(bool),
    List(Vec<String>),
    Pattern(Regex),
}

impl PropValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Text(a), PropValue::Text(b)) => a == b,
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::List(a), PropValue::List(b)) => a == b,
            (PropValue::Pattern(a), PropValue::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Number(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<Vec<String>> for PropValue {
    fn from(value: Vec<String>) -> Self {
        PropValue::List(value)
    }
}

impl From<Regex> for PropValue {
    fn from(value: Regex) -> Self {
        PropValue::Pattern(value)
    }
}

/// Shared cell recording which instance realizes a node.
#[derive(Clone, Default)]
pub struct InstanceSlot(Rc<Cell<Option<InstanceId>>>);

impl InstanceSlot {
    pub fn get(&self) -> Option<InstanceId> {
        self.0.get()
    }

    pub fn set(&self, id: Option<InstanceId>) {
        self.0.set(id);
    }
}

impl fmt::Debug for InstanceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceSlot({:?})", self.0.get())
    }
}

pub type InitHook = Rc<dyn Fn(&VNode, &InstanceTree)>;
pub type PrepatchHook = Rc<dyn Fn(&VNode, &VNode)>;
pub type RegisterInstanceHook = Rc<dyn Fn(InstanceId, bool)>;

/// Callbacks the host invokes on a component node.
///
/// `init` runs after the instance for the node was created or reinserted
/// from a cache, `prepatch` after an existing instance was reused in place,
/// and `register_instance` with `true` on creation and `false` once the
/// instance is destroyed.
#[derive(Clone, Default)]
pub struct VNodeHooks {
    pub init: Option<InitHook>,
    pub prepatch: Option<PrepatchHook>,
    pub register_instance: Option<RegisterInstanceHook>,
}

impl fmt::Debug for VNodeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VNodeHooks")
            .field("init", &self.init.is_some())
            .field("prepatch", &self.prepatch.is_some())
            .field("register_instance", &self.register_instance.is_some())
            .finish()
    }
}

/// Metadata bag attached to a node.
#[derive(Clone, Debug, Default)]
pub struct VNodeData {
    pub attrs: Attrs,
    pub props: Props,
    /// Route insert/remove through activation instead of creation/destruction.
    pub keep_alive: bool,
    /// Node was produced by a router view.
    pub router_view: bool,
    pub router_view_depth: Option<usize>,
    pub hooks: VNodeHooks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VNodeKind {
    Element,
    Text,
    Comment,
    Component,
    AsyncPlaceholder,
}

#[derive(Clone, Debug)]
pub struct ComponentOptions {
    pub def: ComponentDef,
    /// Local registration tag the component was rendered under, if any.
    pub tag: Option<String>,
    /// Slot content handed to the component.
    pub children: Vec<VNode>,
}

struct AsyncFactoryState {
    resolved: RefCell<Option<ComponentDef>>,
    failed: Cell<bool>,
}

/// Pending component resolution shared by every placeholder rendered for it.
#[derive(Clone)]
pub struct AsyncFactory {
    state: Rc<AsyncFactoryState>,
}

impl AsyncFactory {
    pub fn new() -> Self {
        Self {
            state: Rc::new(AsyncFactoryState {
                resolved: RefCell::new(None),
                failed: Cell::new(false),
            }),
        }
    }

    pub fn resolve(&self, def: ComponentDef) {
        *self.state.resolved.borrow_mut() = Some(def);
    }

    pub fn fail(&self) {
        self.state.failed.set(true);
    }

    pub fn resolved(&self) -> Option<ComponentDef> {
        self.state.resolved.borrow().clone()
    }

    pub fn has_error(&self) -> bool {
        self.state.failed.get()
    }

    pub fn same(&self, other: &AsyncFactory) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl Default for AsyncFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AsyncFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFactory")
            .field("resolved", &self.state.resolved.borrow().is_some())
            .field("failed", &self.state.failed.get())
            .finish()
    }
}

#[derive(Clone)]
pub struct VNode {
    pub kind: VNodeKind,
    pub tag: Option<String>,
    pub key: Option<Key>,
    pub text: Option<String>,
    pub data: Option<VNodeData>,
    pub children: Vec<VNode>,
    pub component: Option<ComponentOptions>,
    pub async_factory: Option<AsyncFactory>,
    /// Instance whose render produced this node.
    pub context: Option<InstanceId>,
    instance: InstanceSlot,
}

impl VNode {
    fn bare(kind: VNodeKind) -> Self {
        Self {
            kind,
            tag: None,
            key: None,
            text: None,
            data: None,
            children: Vec::new(),
            component: None,
            async_factory: None,
            context: None,
            instance: InstanceSlot::default(),
        }
    }

    pub fn element(tag: impl Into<String>, children: Vec<VNode>) -> Self {
        let mut node = Self::bare(VNodeKind::Element);
        node.tag = Some(tag.into());
        node.children = children;
        node
    }

    pub fn text(text: impl Into<String>) -> Self {
        let mut node = Self::bare(VNodeKind::Text);
        node.text = Some(text.into());
        node
    }

    pub fn comment(text: impl Into<String>) -> Self {
        let mut node = Self::bare(VNodeKind::Comment);
        node.text = Some(text.into());
        node
    }

    /// Empty placeholder rendered where nothing matched.
    pub fn empty() -> Self {
        Self::comment("")
    }

    pub fn component(def: &ComponentDef, data: VNodeData, children: Vec<VNode>) -> Self {
        let mut node = Self::bare(VNodeKind::Component);
        node.tag = Some(def.vnode_tag().to_owned());
        node.data = Some(data);
        node.component = Some(ComponentOptions {
            def: def.clone(),
            tag: None,
            children,
        });
        node
    }

    pub fn async_placeholder(factory: AsyncFactory) -> Self {
        let mut node = Self::bare(VNodeKind::AsyncPlaceholder);
        node.text = Some(String::new());
        node.async_factory = Some(factory);
        node
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_data(mut self, data: VNodeData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.data
            .get_or_insert_with(VNodeData::default)
            .attrs
            .insert(name.into(), value.into());
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.data
            .get_or_insert_with(VNodeData::default)
            .props
            .insert(name.into(), value.into());
        self
    }

    /// Records the local tag a component was registered under. Ignored for
    /// non-component nodes.
    pub fn with_local_tag(mut self, tag: impl Into<String>) -> Self {
        if let Some(options) = self.component.as_mut() {
            options.tag = Some(tag.into());
        }
        self
    }

    pub fn instance(&self) -> Option<InstanceId> {
        self.instance.get()
    }

    /// Points this node at an existing instance so the host patches it in
    /// place instead of creating a new one.
    pub fn adopt_instance(&self, id: Option<InstanceId>) {
        self.instance.set(id);
    }

    pub fn instance_slot(&self) -> &InstanceSlot {
        &self.instance
    }

    pub fn is_component(&self) -> bool {
        self.component.is_some()
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, VNodeKind::Comment | VNodeKind::AsyncPlaceholder)
    }

    pub fn is_async_placeholder(&self) -> bool {
        self.kind == VNodeKind::AsyncPlaceholder
    }

    pub fn is_keep_alive(&self) -> bool {
        self.data.as_ref().is_some_and(|data| data.keep_alive)
    }

    pub fn is_router_view(&self) -> bool {
        self.data.as_ref().is_some_and(|data| data.router_view)
    }

    /// Declared component name, falling back to the local registration tag.
    pub fn component_name(&self) -> Option<&str> {
        let options = self.component.as_ref()?;
        options.def.name().or(options.tag.as_deref())
    }

    pub fn props(&self) -> Option<&Props> {
        self.data.as_ref().map(|data| &data.props)
    }

    pub fn attr(&self, name: &str) -> Option<&PropValue> {
        self.data.as_ref().and_then(|data| data.attrs.get(name))
    }

    pub(crate) fn stamp_context(&mut self, id: InstanceId) {
        if self.context.is_some() {
            return;
        }
        self.context = Some(id);
        for child in &mut self.children {
            child.stamp_context(id);
        }
        if let Some(options) = self.component.as_mut() {
            for child in &mut options.children {
                child.stamp_context(id);
            }
        }
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VNode")
            .field("kind", &self.kind)
            .field("tag", &self.tag)
            .field("key", &self.key)
            .field("instance", &self.instance.get())
            .field("keep_alive", &self.is_keep_alive())
            .field("children", &self.children)
            .finish()
    }
}

/// First child that is component-backed or waiting on an async component.
pub fn first_component_child(children: &[VNode]) -> Option<&VNode> {
    children
        .iter()
        .find(|child| child.is_component() || child.is_async_placeholder())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_instance_slot() {
        let node = VNode::element("div", Vec::new());
        let copy = node.clone();
        node.adopt_instance(Some(7));
        assert_eq!(copy.instance(), Some(7));
    }

    #[test]
    fn stamping_keeps_existing_context() {
        let mut inner = VNode::text("inner");
        inner.context = Some(1);
        let mut outer = VNode::element("div", vec![inner, VNode::text("fresh")]);
        outer.stamp_context(2);
        assert_eq!(outer.context, Some(2));
        assert_eq!(outer.children[0].context, Some(1));
        assert_eq!(outer.children[1].context, Some(2));
    }

    #[test]
    fn first_component_child_skips_plain_nodes() {
        let factory = AsyncFactory::new();
        let children = vec![
            VNode::text("label"),
            VNode::async_placeholder(factory),
            VNode::element("div", Vec::new()),
        ];
        let found = first_component_child(&children).expect("placeholder counts");
        assert!(found.is_async_placeholder());
        assert!(first_component_child(&children[..1]).is_none());
    }

    #[test]
    fn pattern_values_compare_by_source() {
        let a = PropValue::from(Regex::new("^page").unwrap());
        let b = PropValue::from(Regex::new("^page").unwrap());
        let c = PropValue::from(Regex::new("^home").unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(PropValue::from("1"), PropValue::from(1));
    }
}
