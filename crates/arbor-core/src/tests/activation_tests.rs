use super::*;
use crate::vnode::VNodeData;

#[derive(Default)]
struct MockTree {
    states: Vec<LifecycleState>,
    parents: Vec<Option<InstanceId>>,
    children: Vec<Vec<InstanceId>>,
    log: Vec<(InstanceId, LifecycleHook)>,
    queued: Vec<InstanceId>,
    destroyed: Vec<InstanceId>,
}

impl MockTree {
    fn add(&mut self, parent: Option<InstanceId>) -> InstanceId {
        let id = self.states.len();
        self.states.push(LifecycleState::default());
        self.parents.push(parent);
        self.children.push(Vec::new());
        if let Some(parent) = parent {
            self.children[parent].push(id);
        }
        id
    }

    fn events_for(&self, id: InstanceId) -> Vec<LifecycleHook> {
        self.log
            .iter()
            .filter(|(target, _)| *target == id)
            .map(|(_, hook)| *hook)
            .collect()
    }
}

impl LifecycleTarget for MockTree {
    fn state(&self, id: InstanceId) -> Option<&LifecycleState> {
        self.states.get(id)
    }

    fn state_mut(&mut self, id: InstanceId) -> Option<&mut LifecycleState> {
        self.states.get_mut(id)
    }

    fn children(&self, id: InstanceId) -> Vec<InstanceId> {
        self.children.get(id).cloned().unwrap_or_default()
    }

    fn is_in_inactive_tree(&self, id: InstanceId) -> bool {
        let mut cursor = self.parents[id];
        while let Some(parent) = cursor {
            if self.states[parent].is_inactive() {
                return true;
            }
            cursor = self.parents[parent];
        }
        false
    }

    fn call_hook(&mut self, id: InstanceId, hook: LifecycleHook) -> Result<(), HostError> {
        self.log.push((id, hook));
        Ok(())
    }

    fn queue_activation(&mut self, id: InstanceId) {
        if !self.queued.contains(&id) {
            self.queued.push(id);
        }
    }

    fn destroy(&mut self, id: InstanceId) -> Result<(), HostError> {
        self.states[id].destroyed = true;
        self.destroyed.push(id);
        Ok(())
    }
}

fn cached_node(id: InstanceId, context: Option<InstanceId>) -> VNode {
    let mut node = VNode::element("cached", Vec::new()).with_data(VNodeData {
        keep_alive: true,
        ..VNodeData::default()
    });
    node.context = context;
    node.adopt_instance(Some(id));
    node
}

#[test]
fn children_activate_before_parent() {
    let mut tree = MockTree::default();
    let parent = tree.add(None);
    let first = tree.add(Some(parent));
    let second = tree.add(Some(parent));

    activate(&mut tree, parent, true).unwrap();
    assert_eq!(
        tree.log,
        vec![
            (first, LifecycleHook::Activated),
            (second, LifecycleHook::Activated),
            (parent, LifecycleHook::Activated),
        ]
    );

    tree.log.clear();
    deactivate(&mut tree, parent, true).unwrap();
    assert_eq!(
        tree.log,
        vec![
            (first, LifecycleHook::Deactivated),
            (second, LifecycleHook::Deactivated),
            (parent, LifecycleHook::Deactivated),
        ]
    );
}

#[test]
fn repeated_activation_is_absorbed() {
    let mut tree = MockTree::default();
    let id = tree.add(None);
    activate(&mut tree, id, true).unwrap();
    activate(&mut tree, id, true).unwrap();
    activate(&mut tree, id, false).unwrap();
    assert_eq!(tree.events_for(id), vec![LifecycleHook::Activated]);
}

#[test]
fn directly_deactivated_instance_ignores_ancestor_passes() {
    let mut tree = MockTree::default();
    let root = tree.add(None);
    let ancestor = tree.add(Some(root));
    let target = tree.add(Some(ancestor));
    activate(&mut tree, root, true).unwrap();
    tree.log.clear();

    deactivate(&mut tree, target, true).unwrap();
    deactivate(&mut tree, ancestor, true).unwrap();
    assert_eq!(tree.events_for(target), vec![LifecycleHook::Deactivated]);
    assert_eq!(tree.events_for(ancestor), vec![LifecycleHook::Deactivated]);

    activate(&mut tree, ancestor, true).unwrap();
    assert_eq!(tree.events_for(target), vec![LifecycleHook::Deactivated]);
    assert!(tree.states[target].is_inactive());
    assert!(tree.states[ancestor].is_active());
}

#[test]
fn direct_activation_waits_for_inactive_ancestor() {
    let mut tree = MockTree::default();
    let parent = tree.add(None);
    let child = tree.add(Some(parent));
    activate(&mut tree, parent, true).unwrap();
    deactivate(&mut tree, child, true).unwrap();
    deactivate(&mut tree, parent, true).unwrap();
    tree.log.clear();

    activate(&mut tree, child, true).unwrap();
    assert!(tree.log.is_empty());
    assert!(!tree.states[child].directly_inactive);

    activate(&mut tree, parent, true).unwrap();
    assert_eq!(
        tree.log,
        vec![
            (child, LifecycleHook::Activated),
            (parent, LifecycleHook::Activated),
        ]
    );
}

#[test]
fn activation_and_deactivation_alternate() {
    let mut tree = MockTree::default();
    let parent = tree.add(None);
    let child = tree.add(Some(parent));
    for _ in 0..3 {
        activate(&mut tree, parent, true).unwrap();
        deactivate(&mut tree, child, true).unwrap();
        deactivate(&mut tree, parent, true).unwrap();
        activate(&mut tree, child, true).unwrap();
    }
    for id in [parent, child] {
        let events = tree.events_for(id);
        assert!(events.windows(2).all(|pair| pair[0] != pair[1]), "{events:?}");
        assert_eq!(events.first(), Some(&LifecycleHook::Activated));
    }
}

#[test]
fn insert_mounts_once_and_activates_when_context_is_new() {
    let mut tree = MockTree::default();
    let context = tree.add(None);
    let cached = tree.add(Some(context));
    let node = cached_node(cached, Some(context));

    on_insert(&mut tree, &node).unwrap();
    assert_eq!(
        tree.events_for(cached),
        vec![LifecycleHook::Mounted, LifecycleHook::Activated]
    );
    assert!(tree.queued.is_empty());
}

#[test]
fn insert_into_mounted_context_defers_activation() {
    let mut tree = MockTree::default();
    let context = tree.add(None);
    tree.states[context].mounted = true;
    let cached = tree.add(Some(context));
    tree.states[cached].mounted = true;
    tree.states[cached].active = Some(false);
    let node = cached_node(cached, Some(context));

    on_insert(&mut tree, &node).unwrap();
    on_insert(&mut tree, &node).unwrap();
    assert!(tree.events_for(cached).is_empty());
    assert_eq!(tree.queued, vec![cached]);
    assert!(tree.states[cached].pending_activation);
    assert!(!tree.states[cached].is_inactive());
}

#[test]
fn remove_deactivates_cached_and_destroys_plain_nodes() {
    let mut tree = MockTree::default();
    let context = tree.add(None);
    let cached = tree.add(Some(context));
    let plain = tree.add(Some(context));
    activate(&mut tree, context, true).unwrap();
    tree.log.clear();

    on_remove(&mut tree, &cached_node(cached, Some(context))).unwrap();
    let plain_node = VNode::element("plain", Vec::new());
    plain_node.adopt_instance(Some(plain));
    on_remove(&mut tree, &plain_node).unwrap();
    on_remove(&mut tree, &plain_node).unwrap();

    assert_eq!(tree.log, vec![(cached, LifecycleHook::Deactivated)]);
    assert!(tree.states[cached].directly_inactive);
    assert_eq!(tree.destroyed, vec![plain]);
}

#[test]
fn deactivation_cancels_a_pending_activation() {
    let mut tree = MockTree::default();
    let context = tree.add(None);
    let cached = tree.add(Some(context));
    tree.states[context].mounted = true;
    tree.states[cached].mounted = true;
    tree.states[cached].active = Some(false);
    tree.states[cached].directly_inactive = true;

    on_insert(&mut tree, &cached_node(cached, Some(context))).unwrap();
    deactivate(&mut tree, cached, true).unwrap();
    assert!(!tree.states[cached].pending_activation);
    assert!(tree.log.is_empty());
}
