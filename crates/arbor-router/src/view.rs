//! Route-driven view slot.
//!
//! A [`RouterView`] is rendered inline by the instance that owns it, the way
//! a functional component would be. Each pass it works out how deep it sits
//! among enclosing views and whether an ancestor kept alive by a cache is
//! currently inactive. While such an ancestor is inactive the view is
//! frozen and keeps showing the component it resolved last.

use std::rc::Rc;

use arbor_core::{
    ComponentDef, Context, InstanceId, InstanceTree, PropValue, VNode, VNodeData,
};
use indexmap::IndexMap;

use crate::props::{fill_props, PropsConfig};
use crate::route::{Route, RouteRecord};
use crate::router::Router;
use crate::DEFAULT_VIEW;

/// Last component a view resolved, with the route and props configuration
/// needed to render it again while frozen.
#[derive(Clone, Debug)]
pub struct CachedView {
    pub component: ComponentDef,
    pub route: Option<Rc<Route>>,
    pub config: Option<PropsConfig>,
}

/// Per-instance cache of [`CachedView`]s keyed by view name, stored in the
/// extensions of the instance rendering the views.
#[derive(Debug, Default)]
pub struct ViewCache {
    entries: IndexMap<String, CachedView>,
}

impl ViewCache {
    pub fn get(&self, name: &str) -> Option<&CachedView> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: &str, view: CachedView) {
        self.entries.insert(name.to_owned(), view);
    }

    fn remove(&mut self, name: &str) {
        self.entries.shift_remove(name);
    }
}

/// Where a view sits relative to the router root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewPosition {
    pub depth: usize,
    pub frozen: bool,
}

impl ViewPosition {
    /// Walks from `owner` up to, but excluding, `router_root`.
    pub fn locate(tree: &InstanceTree, owner: InstanceId, router_root: InstanceId) -> Self {
        let mut position = ViewPosition {
            depth: 0,
            frozen: false,
        };
        let mut cursor = Some(owner);
        while let Some(id) = cursor {
            if id == router_root {
                break;
            }
            let Ok(record) = tree.get(id) else {
                break;
            };
            let placeholder = record.vnode();
            if placeholder.is_router_view() {
                position.depth += 1;
            }
            let state = record.state();
            if placeholder.is_keep_alive() && state.directly_inactive && state.is_inactive() {
                position.frozen = true;
            }
            cursor = record.parent();
        }
        position
    }
}

/// Builder for a view slot node.
#[derive(Debug, Clone)]
pub struct RouterView {
    name: String,
    data: VNodeData,
    children: Vec<VNode>,
}

impl Default for RouterView {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterView {
    pub fn new() -> Self {
        Self::named(DEFAULT_VIEW)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: VNodeData::default(),
            children: Vec::new(),
        }
    }

    /// Attribute passed through to the rendered component.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.data.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<VNode>) -> Self {
        self.children = children;
        self
    }

    /// Resolves the node to display for the instance rendering `cx`.
    pub fn render(self, cx: &mut Context<'_>) -> VNode {
        let RouterView {
            name,
            mut data,
            children,
        } = self;
        data.router_view = true;

        let Some((router_root, router)) = cx
            .find_extension::<Router>()
            .map(|(id, router)| (id, router.clone()))
        else {
            log::warn!("router view rendered by instance {} outside a router", cx.id());
            return VNode::empty();
        };
        router.subscribe(cx.id());
        let route = router.current();

        let position = ViewPosition::locate(cx.tree(), cx.id(), router_root);
        data.router_view_depth = Some(position.depth);

        let Some(extensions) = cx.extensions_mut() else {
            return VNode::empty();
        };
        let cache = extensions.get_or_insert_with(ViewCache::default);

        if position.frozen {
            return match cache.get(&name) {
                Some(view) => {
                    if let (Some(route), Some(config)) = (view.route.as_ref(), view.config.as_ref()) {
                        fill_props(&mut data, &view.component, route, config);
                    }
                    log::trace!("view {name:?} frozen at depth {}", position.depth);
                    VNode::component(&view.component, data, children)
                }
                None => VNode::empty(),
            };
        }

        let matched = route.matched().get(position.depth).cloned();
        let resolved = matched
            .as_ref()
            .and_then(|record| record.component(&name).cloned().map(|def| (Rc::clone(record), def)));
        let Some((record, component)) = resolved else {
            cache.remove(&name);
            return VNode::empty();
        };

        let config = record.props_config(&name).cloned();
        cache.insert(
            &name,
            CachedView {
                component: component.clone(),
                route: config.as_ref().map(|_| Rc::clone(&route)),
                config: config.clone(),
            },
        );
        if let Some(config) = config.as_ref() {
            fill_props(&mut data, &component, &route, config);
        }
        attach_hooks(&mut data, &name, &record, &route);
        VNode::component(&component, data, children)
    }
}

/// Keeps `record`'s instance registry in step with the instance created
/// for the node and runs pending "entered" callbacks once it exists.
fn attach_hooks(data: &mut VNodeData, name: &str, record: &Rc<RouteRecord>, route: &Rc<Route>) {
    let hooks = &mut data.hooks;

    let (registry, view) = (Rc::clone(record), name.to_owned());
    hooks.register_instance = Some(Rc::new(move |id, registered| {
        registry.register_instance(&view, id, registered);
    }));

    let (registry, view) = (Rc::clone(record), name.to_owned());
    hooks.prepatch = Some(Rc::new(move |_old: &VNode, new: &VNode| {
        if let Some(id) = new.instance() {
            registry.set_instance(&view, Some(id));
        }
    }));

    let (registry, view, route) = (Rc::clone(record), name.to_owned(), Rc::clone(route));
    hooks.init = Some(Rc::new(move |vnode: &VNode, tree: &InstanceTree| {
        if vnode.is_keep_alive() {
            if let Some(id) = vnode.instance() {
                if registry.instance(&view) != Some(id) {
                    registry.set_instance(&view, Some(id));
                }
            }
        }
        route.handle_entered(tree);
    }));
}
