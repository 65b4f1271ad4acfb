use arbor_core::{Context, LifecycleHook, VNode};
use arbor_testing::prelude::*;

#[test]
fn unkeyed_siblings_of_one_component_share_an_instance() {
    let log = LifecycleLog::new();
    let user = probe_builder("user", &log, |_| None).prop("id").register();
    let current = Shared::new("1".to_owned());
    let root = {
        let current = current.clone();
        probe_with("root", &log, move |_| {
            Some(node(&user).with_prop("id", current.get()))
        })
    };
    let mut rule = HostTestRule::new();
    rule.set_content(node(&root)).unwrap();
    let first = rule.instances_named("user");

    current.set("2".to_owned());
    rule.recompose().unwrap();
    assert_eq!(rule.instances_named("user"), first);
    assert_eq!(log.count("user", LifecycleHook::Created), 1);
    assert_eq!(log.count("user", LifecycleHook::Destroyed), 0);
    let props = rule.probe(first[0], |probe| probe.last_props.clone()).unwrap();
    assert_eq!(props.get("id").and_then(|value| value.as_text()), Some("2"));
}

#[test]
fn keyed_siblings_get_a_fresh_instance_per_key() {
    let log = LifecycleLog::new();
    let user = probe("user", &log);
    let current = Shared::new("/users/1".to_owned());
    let root = {
        let current = current.clone();
        probe_with("root", &log, move |_| Some(node(&user).with_key(current.get())))
    };
    let mut rule = HostTestRule::new();
    rule.set_content(node(&root)).unwrap();

    current.set("/users/2".to_owned());
    rule.recompose().unwrap();
    assert_eq!(
        log.hooks_for("user"),
        vec![
            LifecycleHook::Created,
            LifecycleHook::Mounted,
            LifecycleHook::Created,
            LifecycleHook::Destroyed,
            LifecycleHook::Mounted,
        ]
    );
}

#[derive(Debug, PartialEq)]
struct Theme(&'static str);

#[test]
fn extensions_are_found_on_the_nearest_ancestor() {
    let log = LifecycleLog::new();
    let seen = Shared::new(None);
    let leaf = {
        let seen = seen.clone();
        probe_with("leaf", &log, move |cx: &mut Context<'_>| {
            seen.set(cx.find_extension::<Theme>().map(|(id, theme)| (id, theme.0)));
            None
        })
    };
    let middle = probe_with("middle", &log, move |_| {
        Some(VNode::element("div", vec![node(&leaf)]))
    });
    let mut rule = HostTestRule::new();
    let root = rule.set_content(node(&middle)).unwrap();
    assert_eq!(seen.get(), None);

    rule.host_mut().extensions_mut(root).unwrap().insert(Theme("dark"));
    let leaf_id = rule.instances_named("leaf")[0];
    rule.update(leaf_id).unwrap();
    assert_eq!(seen.get(), Some((root, "dark")));
}
