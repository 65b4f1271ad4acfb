//! Keep-alive container for Arbor.
//!
//! [`KeepAlive`] is an abstract component that displays the first component
//! of its slot and keeps instances it has shown alive in an
//! [`InstanceCache`]. Switching away deactivates the displayed instance
//! instead of destroying it; switching back reinserts it without a new
//! `created` callback.

mod cache;
mod config;
mod matcher;

pub use cache::{CacheRender, CachedNode, InstanceCache};
pub use config::KeepAliveConfig;
pub use matcher::Matcher;

use arbor_core::{Component, ComponentDef, Context, InstanceId, Props, VNode, VNodeData};

thread_local! {
    static DEFINITION: ComponentDef = ComponentDef::builder(KeepAlive::default)
        .name("keep-alive")
        .props(["include", "exclude", "max"])
        .abstract_component()
        .register();
}

#[derive(Debug, Default)]
pub struct KeepAlive {
    cache: InstanceCache,
    /// Filter changes are only acted on once the container has mounted.
    watching: bool,
}

impl KeepAlive {
    pub fn definition() -> ComponentDef {
        DEFINITION.with(Clone::clone)
    }

    /// Container node wrapping `children` with `config`.
    pub fn vnode(config: &KeepAliveConfig, children: Vec<VNode>) -> VNode {
        let data = VNodeData {
            props: config.to_props(),
            ..VNodeData::default()
        };
        VNode::component(&Self::definition(), data, children)
    }

    pub fn cache(&self) -> &InstanceCache {
        &self.cache
    }

    fn displayed_tag(cx: &Context<'_>) -> Option<String> {
        cx.tree()
            .get(cx.id())
            .ok()
            .and_then(|record| record.rendered())
            .and_then(|vnode| vnode.tag.clone())
    }

    fn destroy_all(cx: &mut Context<'_>, instances: Vec<InstanceId>) {
        for id in instances {
            cx.destroy(id);
        }
    }
}

impl Component for KeepAlive {
    fn render(&mut self, cx: &mut Context<'_>) -> Option<VNode> {
        let config = KeepAliveConfig::from_props(cx.props());
        let rendered = self.cache.render(cx.slot(), &config);
        Self::destroy_all(cx, rendered.evicted);
        rendered.vnode
    }

    fn mounted(&mut self, _cx: &mut Context<'_>) {
        self.watching = true;
    }

    fn props_changed(&mut self, cx: &mut Context<'_>, previous: &Props) {
        if !self.watching {
            return;
        }
        let before = KeepAliveConfig::from_props(Some(previous));
        let after = KeepAliveConfig::from_props(cx.props());
        let current = Self::displayed_tag(cx);
        let mut evicted = Vec::new();
        if before.include != after.include && after.include.is_set() {
            evicted.extend(
                self.cache
                    .prune(|name| after.include.matches(name), current.as_deref()),
            );
        }
        if before.exclude != after.exclude {
            evicted.extend(
                self.cache
                    .prune(|name| !after.exclude.matches(name), current.as_deref()),
            );
        }
        Self::destroy_all(cx, evicted);
    }

    fn destroyed(&mut self, cx: &mut Context<'_>) {
        let instances = self.cache.clear();
        Self::destroy_all(cx, instances);
    }
}
