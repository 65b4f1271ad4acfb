//! Keyed cache of component instances with least-recently-used eviction.
//!
//! Entry order is recency order: the last entry was hit or inserted most
//! recently and eviction takes from the front. An entry holds the
//! [`InstanceSlot`] of the node it was created from, so it learns the
//! instance id once the host realizes the node.

use arbor_core::{first_component_child, InstanceId, InstanceSlot, Key, VNode, VNodeData};
use indexmap::IndexMap;

use crate::config::KeepAliveConfig;

#[derive(Clone, Debug)]
pub struct CachedNode {
    pub name: Option<String>,
    pub tag: Option<String>,
    instance: InstanceSlot,
}

impl CachedNode {
    pub fn instance(&self) -> Option<InstanceId> {
        self.instance.get()
    }
}

/// Outcome of one render pass.
#[derive(Debug, Default)]
pub struct CacheRender {
    pub vnode: Option<VNode>,
    /// Instances the host must destroy.
    pub evicted: Vec<InstanceId>,
}

#[derive(Debug, Default)]
pub struct InstanceCache {
    entries: IndexMap<Key, CachedNode>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&CachedNode> {
        self.entries.get(key)
    }

    /// Explicit key, or the registration id followed by `::tag` when the
    /// component was rendered under a local tag.
    pub fn cache_key(vnode: &VNode) -> Option<Key> {
        if let Some(key) = &vnode.key {
            return Some(key.clone());
        }
        let options = vnode.component.as_ref()?;
        Some(match &options.tag {
            Some(tag) => format!("{}::{tag}", options.def.id()),
            None => options.def.id().to_string(),
        })
    }

    /// Picks the node to display from `slot` and records it.
    pub fn render(&mut self, slot: &[VNode], config: &KeepAliveConfig) -> CacheRender {
        let Some(child) = first_component_child(slot) else {
            return CacheRender {
                vnode: slot.first().cloned(),
                evicted: Vec::new(),
            };
        };
        let mut vnode = child.clone();
        let Some(key) = Self::cache_key(&vnode).filter(|_| vnode.is_component()) else {
            return CacheRender {
                vnode: Some(vnode),
                evicted: Vec::new(),
            };
        };
        let name = vnode.component_name().map(str::to_owned);
        if !config.admits(name.as_deref()) {
            log::trace!("keep-alive skips {name:?}");
            return CacheRender {
                vnode: Some(vnode),
                evicted: Vec::new(),
            };
        }

        let mut evicted = Vec::new();
        if let Some(mut entry) = self.entries.shift_remove(&key) {
            log::debug!("keep-alive hit {key} -> {:?}", entry.instance());
            vnode.adopt_instance(entry.instance());
            entry.instance = vnode.instance_slot().clone();
            self.entries.insert(key, entry);
        } else {
            log::debug!("keep-alive miss {key}");
            self.entries.insert(
                key.clone(),
                CachedNode {
                    name,
                    tag: vnode.tag.clone(),
                    instance: vnode.instance_slot().clone(),
                },
            );
            if let Some(max) = config.max {
                while self.entries.len() > max {
                    let Some(victim) = self.eviction_victim(&key, vnode.tag.as_deref()) else {
                        break;
                    };
                    evicted.extend(self.prune_entry(&victim, None));
                }
            }
        }
        vnode.data.get_or_insert_with(VNodeData::default).keep_alive = true;
        CacheRender {
            vnode: Some(vnode),
            evicted,
        }
    }

    /// Oldest entry, or the next-oldest when the oldest shares `rendering`'s
    /// tag. The entry just stored under `inserted` is only taken when nothing
    /// else is left.
    fn eviction_victim(&self, inserted: &str, rendering: Option<&str>) -> Option<Key> {
        let mut keys = self.entries.iter().map(|(key, entry)| (key, entry.tag.as_deref()));
        let (oldest, tag) = keys.next()?;
        let guarded = rendering.is_some() && tag == rendering;
        match keys.next() {
            Some((next, _)) if guarded && next.as_str() != inserted => Some(next.clone()),
            _ => Some(oldest.clone()),
        }
    }

    /// Removes `key` and returns its instance for destruction unless its tag
    /// equals `current`.
    pub fn prune_entry(&mut self, key: &str, current: Option<&str>) -> Option<InstanceId> {
        let entry = self.entries.shift_remove(key)?;
        log::debug!("keep-alive evicts {key}");
        let instance = entry.instance()?;
        let displayed = current.is_some_and(|tag| entry.tag.as_deref() == Some(tag));
        (!displayed).then_some(instance)
    }

    /// Evicts every named entry for which `keep` returns `false`.
    pub fn prune(&mut self, keep: impl Fn(&str) -> bool, current: Option<&str>) -> Vec<InstanceId> {
        let doomed: Vec<Key> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.name.as_deref().is_some_and(|name| !keep(name)))
            .map(|(key, _)| key.clone())
            .collect();
        doomed
            .iter()
            .filter_map(|key| self.prune_entry(key, current))
            .collect()
    }

    /// Empties the cache, returning every realized instance.
    pub fn clear(&mut self) -> Vec<InstanceId> {
        let keys: Vec<Key> = self.entries.keys().cloned().collect();
        keys.iter()
            .filter_map(|key| self.prune_entry(key, None))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
