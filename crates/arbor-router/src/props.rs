use std::fmt;
use std::rc::Rc;

use arbor_core::{ComponentDef, PropValue, Props, VNodeData};

use crate::route::Route;

/// How a matched record turns the route into props for its component.
#[derive(Clone)]
pub enum PropsConfig {
    Static(Props),
    Derive(Rc<dyn Fn(&Route) -> Props>),
    /// `true` passes the route params, `false` passes nothing.
    Params(bool),
    /// Configuration of a kind the router does not understand, carried by
    /// name so it can be reported.
    Unrecognized(String),
}

impl PropsConfig {
    pub fn derive(f: impl Fn(&Route) -> Props + 'static) -> Self {
        PropsConfig::Derive(Rc::new(f))
    }

    pub fn resolve(&self, route: &Route) -> Option<Props> {
        match self {
            PropsConfig::Static(props) => Some(props.clone()),
            PropsConfig::Derive(derive) => Some(derive(route)),
            PropsConfig::Params(true) => Some(
                route
                    .params()
                    .iter()
                    .map(|(name, value)| (name.clone(), PropValue::Text(value.clone())))
                    .collect(),
            ),
            PropsConfig::Params(false) => None,
            PropsConfig::Unrecognized(kind) => {
                log::warn!(
                    "props in \"{}\" is a {kind}, expecting an object, function or boolean",
                    route.path()
                );
                None
            }
        }
    }
}

impl fmt::Debug for PropsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropsConfig::Static(props) => f.debug_tuple("Static").field(props).finish(),
            PropsConfig::Derive(_) => f.write_str("Derive(..)"),
            PropsConfig::Params(enabled) => f.debug_tuple("Params").field(enabled).finish(),
            PropsConfig::Unrecognized(kind) => f.debug_tuple("Unrecognized").field(kind).finish(),
        }
    }
}

/// Resolves `config` against `route` into `data`: props declared by `def`
/// stay props, everything else moves to attrs.
pub fn fill_props(data: &mut VNodeData, def: &ComponentDef, route: &Route, config: &PropsConfig) {
    data.props = Props::new();
    let Some(resolved) = config.resolve(route) else {
        return;
    };
    for (name, value) in resolved {
        if def.declares_prop(&name) {
            data.props.insert(name, value);
        } else {
            data.attrs.insert(name, value);
        }
    }
}
