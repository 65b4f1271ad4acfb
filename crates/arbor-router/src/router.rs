use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use arbor_core::{
    Component, ComponentDef, Context, Host, HostError, InstanceId, VNode, VNodeData,
};
use indexmap::IndexSet;

use crate::route::Route;

struct RouterInner {
    current: RefCell<Rc<Route>>,
    subscribers: RefCell<IndexSet<InstanceId>>,
}

/// Holds the current route. Views rendered under the instance the router
/// is installed on subscribe to it and re-render on navigation.
#[derive(Clone)]
pub struct Router {
    inner: Rc<RouterInner>,
}

impl Router {
    pub fn new(initial: Route) -> Self {
        Self {
            inner: Rc::new(RouterInner {
                current: RefCell::new(Rc::new(initial)),
                subscribers: RefCell::new(IndexSet::new()),
            }),
        }
    }

    pub fn current(&self) -> Rc<Route> {
        Rc::clone(&self.inner.current.borrow())
    }

    pub fn subscribe(&self, id: InstanceId) {
        self.inner.subscribers.borrow_mut().insert(id);
    }

    pub fn subscribers(&self) -> Vec<InstanceId> {
        self.inner.subscribers.borrow().iter().copied().collect()
    }

    /// Makes the instance behind `cx` the router root.
    pub fn install(&self, cx: &mut Context<'_>) {
        if let Some(extensions) = cx.extensions_mut() {
            extensions.insert(self.clone());
        }
    }

    /// Switches to `route`, re-renders every live subscriber and runs the
    /// cycle to completion.
    pub fn navigate(&self, host: &mut Host, route: Route) -> Result<(), HostError> {
        log::debug!("navigating to {}", route.path());
        *self.inner.current.borrow_mut() = Rc::new(route);
        let subscribers = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            subscribers.retain(|id| host.tree().is_alive(*id));
            subscribers.iter().copied().collect::<Vec<_>>()
        };
        for id in subscribers {
            host.invalidate(id);
        }
        host.process_invalid()
    }

    /// Definition of a root component that installs this router when
    /// created and renders with `render`.
    pub fn root_definition(
        &self,
        render: impl Fn(&mut Context<'_>) -> Option<VNode> + 'static,
    ) -> ComponentDef {
        let router = self.clone();
        let render: Rc<RootRender> = Rc::new(render);
        ComponentDef::named("router-root", move || RouterRoot {
            router: router.clone(),
            render: Rc::clone(&render),
        })
    }

    /// Root node for [`Router::root_definition`].
    pub fn root(&self, render: impl Fn(&mut Context<'_>) -> Option<VNode> + 'static) -> VNode {
        VNode::component(&self.root_definition(render), VNodeData::default(), Vec::new())
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("current", &self.current().path())
            .field("subscribers", &self.inner.subscribers.borrow())
            .finish()
    }
}

type RootRender = dyn Fn(&mut Context<'_>) -> Option<VNode>;

struct RouterRoot {
    router: Router,
    render: Rc<RootRender>,
}

impl Component for RouterRoot {
    fn render(&mut self, cx: &mut Context<'_>) -> Option<VNode> {
        (self.render)(cx)
    }

    fn created(&mut self, cx: &mut Context<'_>) {
        self.router.install(cx);
    }
}
