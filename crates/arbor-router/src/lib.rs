//! Router views for Arbor.
//!
//! A [`Router`] holds the current [`Route`]; a [`RouterView`] rendered below
//! the instance the router is installed on shows the component matched for
//! its nesting depth. Views below an inactive cache-managed ancestor stay
//! frozen on their last resolved component until that ancestor is active
//! again.

mod props;
mod route;
mod router;
mod view;

pub use props::{fill_props, PropsConfig};
pub use route::{EnteredCallback, Route, RouteRecord};
pub use router::Router;
pub use view::{CachedView, RouterView, ViewCache, ViewPosition};

/// Name of the unnamed view.
pub const DEFAULT_VIEW: &str = "default";
