use arbor_core::{ComponentDef, InstanceId, LifecycleHook, VNode};
use arbor_keep_alive::{KeepAlive, KeepAliveConfig, Matcher};
use arbor_testing::{node, probe, probe_with, HostTestRule, LifecycleLog, Shared};
use regex::Regex;

struct App {
    rule: HostTestRule,
    log: LifecycleLog,
    shown: Shared<String>,
    config: Shared<KeepAliveConfig>,
}

impl App {
    /// Mounts a root that wraps the page named by `shown` in a keep-alive.
    fn mount(log: &LifecycleLog, pages: Vec<ComponentDef>, config: KeepAliveConfig, keyed: bool) -> Self {
        let first = pages[0].name().unwrap_or_default().to_owned();
        let shown = Shared::new(first);
        let config = Shared::new(config);
        let root = {
            let shown = shown.clone();
            let config = config.clone();
            probe_with("root", log, move |_| {
                let name = shown.get();
                let page = pages
                    .iter()
                    .find(|def| def.name() == Some(name.as_str()))
                    .map(|def| {
                        let child = node(def);
                        if keyed {
                            child.with_key(name.clone())
                        } else {
                            child
                        }
                    });
                Some(KeepAlive::vnode(&config.get(), page.into_iter().collect()))
            })
        };
        let mut rule = HostTestRule::new();
        rule.set_content(node(&root)).unwrap();
        Self {
            rule,
            log: log.clone(),
            shown,
            config,
        }
    }

    fn show(&mut self, name: &str) {
        self.shown.set(name.to_owned());
        self.rule.recompose().unwrap();
    }

    fn configure(&mut self, config: KeepAliveConfig) {
        self.config.set(config);
        self.rule.recompose().unwrap();
    }

    fn keep_alive(&self) -> InstanceId {
        self.rule.instances_named("keep-alive")[0]
    }

    fn cached_keys(&mut self) -> Vec<String> {
        let id = self.keep_alive();
        self.rule
            .host_mut()
            .with_component::<KeepAlive, _>(id, |keep_alive| {
                keep_alive.cache().keys().map(str::to_owned).collect()
            })
            .unwrap()
            .unwrap_or_default()
    }
}

#[test]
fn max_one_destroys_the_evicted_page() {
    let log = LifecycleLog::new();
    let pages = vec![probe("home", &log), probe("pageA", &log)];
    let mut app = App::mount(&log, pages, KeepAliveConfig::default().with_max(1), true);
    assert_eq!(app.cached_keys(), vec!["home"]);

    app.show("pageA");
    let destroyed: Vec<_> = app
        .log
        .events()
        .into_iter()
        .filter(|event| event.hook == LifecycleHook::Destroyed)
        .map(|event| event.component)
        .collect();
    assert_eq!(destroyed, vec!["home"]);
    assert_eq!(app.cached_keys(), vec!["pageA"]);
    assert_eq!(app.log.hooks_for("pageA").last(), Some(&LifecycleHook::Activated));
}

#[test]
fn include_filter_bypasses_the_cache() {
    let log = LifecycleLog::new();
    let pages = vec![probe("pageA", &log), probe("home", &log)];
    let config = KeepAliveConfig::default().with_include(Matcher::list(["home"]));
    let mut app = App::mount(&log, pages, config, false);

    assert!(app.cached_keys().is_empty());
    assert_eq!(
        log.hooks_for("pageA"),
        vec![LifecycleHook::Created, LifecycleHook::Mounted]
    );

    app.show("home");
    assert_eq!(log.count("pageA", LifecycleHook::Destroyed), 1);
    assert_eq!(app.cached_keys().len(), 1);
}

#[test]
fn unkeyed_rerender_reuses_the_instance() {
    let log = LifecycleLog::new();
    let mut app = App::mount(&log, vec![probe("home", &log)], KeepAliveConfig::default(), false);
    let home = app.rule.instances_named("home");
    log.clear();

    app.rule.recompose().unwrap();
    assert_eq!(app.rule.instances_named("home"), home);
    assert!(log.hooks_for("home").is_empty());
    let renders = app.rule.probe(home[0], |probe| probe.renders);
    assert_eq!(renders, Some(2));
}

#[test]
fn switching_pages_alternates_activation() {
    let log = LifecycleLog::new();
    let pages = vec![probe("home", &log), probe("pageA", &log)];
    let mut app = App::mount(&log, pages, KeepAliveConfig::default(), false);

    app.show("pageA");
    app.show("home");
    app.show("pageA");

    use LifecycleHook::*;
    assert_eq!(
        log.hooks_for("home"),
        vec![Created, Mounted, Activated, Deactivated, Activated, Deactivated]
    );
    assert_eq!(
        log.hooks_for("pageA"),
        vec![Created, Mounted, Activated, Deactivated, Activated]
    );
    assert!(log.activation_alternates());
    assert_eq!(log.count("home", Created), 1);
}

#[test]
fn include_change_evicts_only_non_matching_entries() {
    let log = LifecycleLog::new();
    let pages = vec![probe("home", &log), probe("pageA", &log)];
    let mut app = App::mount(&log, pages, KeepAliveConfig::default(), true);
    app.show("pageA");
    app.show("home");
    assert_eq!(app.cached_keys(), vec!["pageA", "home"]);
    log.clear();

    app.configure(KeepAliveConfig::default().with_include("home"));
    assert_eq!(log.take_labels(), vec!["pageA:destroyed"]);
    assert_eq!(app.cached_keys(), vec!["home"]);
}

#[test]
fn unchanged_filter_evicts_nothing() {
    let log = LifecycleLog::new();
    let pages = vec![probe("home", &log), probe("pageA", &log)];
    let config = KeepAliveConfig::default().with_include("home,pageA");
    let mut app = App::mount(&log, pages, config.clone(), false);
    app.show("pageA");
    app.show("home");
    log.clear();

    app.configure(config.clone());
    app.configure(config);
    assert_eq!(log.count("pageA", LifecycleHook::Destroyed), 0);
    assert_eq!(app.cached_keys().len(), 2);
}

#[test]
fn exclude_pattern_change_evicts_matching_entries() {
    let log = LifecycleLog::new();
    let pages = vec![probe("home", &log), probe("pageA", &log), probe("pageB", &log)];
    let mut app = App::mount(&log, pages, KeepAliveConfig::default(), true);
    app.show("pageA");
    app.show("pageB");
    app.show("home");
    log.clear();

    app.configure(KeepAliveConfig::default().with_exclude(Regex::new("^page").unwrap()));
    let mut destroyed = log.take_labels();
    destroyed.sort();
    assert_eq!(destroyed, vec!["pageA:destroyed", "pageB:destroyed"]);
    assert_eq!(app.cached_keys(), vec!["home"]);
}

#[test]
fn container_teardown_destroys_every_cached_instance() {
    let log = LifecycleLog::new();
    let pages = vec![probe("home", &log), probe("pageA", &log)];
    let mut app = App::mount(&log, pages, KeepAliveConfig::default(), false);
    app.show("pageA");
    log.clear();

    app.rule.host_mut().unmount().unwrap();
    assert_eq!(log.count("home", LifecycleHook::Destroyed), 1);
    assert_eq!(log.count("pageA", LifecycleHook::Destroyed), 1);
    assert!(app.rule.host().tree().is_empty());
}

#[test]
fn propagation_reaches_children_before_the_page() {
    let log = LifecycleLog::new();
    let first = probe("first", &log);
    let second = probe("second", &log);
    let home = probe_with("home", &log, move |_| {
        Some(VNode::element("div", vec![node(&first), node(&second)]))
    });
    let pages = vec![home, probe("pageA", &log)];
    let mut app = App::mount(&log, pages, KeepAliveConfig::default(), false);

    app.show("pageA");
    let deactivations: Vec<String> = log
        .take_labels()
        .into_iter()
        .filter(|label| label.ends_with(":deactivated"))
        .collect();
    assert_eq!(
        deactivations,
        vec!["first:deactivated", "second:deactivated", "home:deactivated"]
    );

    app.show("home");
    let activations: Vec<String> = log
        .take_labels()
        .into_iter()
        .filter(|label| label.ends_with(":activated"))
        .collect();
    assert_eq!(
        activations,
        vec!["first:activated", "second:activated", "home:activated"]
    );
}

#[test]
fn keyed_entries_of_one_component_keep_the_oldest_and_all_die_on_teardown() {
    let log = LifecycleLog::new();
    let page = probe("page", &log);
    let key = Shared::new("a".to_owned());
    let root = {
        let key = key.clone();
        probe_with("root", &log, move |_| {
            let config = KeepAliveConfig::default().with_max(2);
            Some(KeepAlive::vnode(&config, vec![node(&page).with_key(key.get())]))
        })
    };
    let mut rule = HostTestRule::new();
    rule.set_content(node(&root)).unwrap();
    for next in ["b", "c"] {
        key.set(next.to_owned());
        rule.recompose().unwrap();
    }

    let keep_alive = rule.instances_named("keep-alive")[0];
    let cached: Vec<String> = rule
        .host_mut()
        .with_component::<KeepAlive, _>(keep_alive, |keep_alive| {
            keep_alive.cache().keys().map(str::to_owned).collect()
        })
        .unwrap()
        .unwrap_or_default();
    assert_eq!(cached, vec!["a", "c"]);
    assert_eq!(rule.instances_named("page").len(), 2);
    assert_eq!(log.count("page", LifecycleHook::Destroyed), 1);

    rule.host_mut().unmount().unwrap();
    assert_eq!(log.count("page", LifecycleHook::Created), 3);
    assert_eq!(log.count("page", LifecycleHook::Destroyed), 3);
    assert!(rule.instances_named("page").is_empty());
}
