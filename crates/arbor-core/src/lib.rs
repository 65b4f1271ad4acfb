//! Headless component host with keep-alive aware lifecycle dispatch.
//!
//! The crate provides the pieces a cache container and a router view build
//! on: subtree nodes, component definitions, the instance arena, the
//! same-node predicate used when patching, and the propagation of
//! active/inactive state through cache-managed subtrees.

use std::fmt;

pub mod activation;
pub mod collections;
pub mod component;
pub mod host;
pub mod identity;
pub mod instance;
pub mod platform;
pub mod scheduler;
pub mod vnode;

pub type InstanceId = usize;

pub use activation::{activate, deactivate, LifecycleTarget};
pub use component::{Component, ComponentDef, ComponentDefBuilder, ComponentId, LifecycleHook};
pub use host::{Context, Host};
pub use identity::same_vnode;
pub use instance::{Extensions, InstanceRecord, InstanceTree, LifecycleState};
pub use platform::{DefaultScheduler, RuntimeScheduler};
pub use vnode::{
    first_component_child, AsyncFactory, Attrs, ComponentOptions, InstanceSlot, Key, PropValue,
    Props, VNode, VNodeData, VNodeHooks, VNodeKind,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Missing { id: InstanceId },
    /// The instance's component is already borrowed by an outer call.
    Busy { id: InstanceId },
    NotAComponent,
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Missing { id } => write!(f, "instance {id} missing"),
            HostError::Busy { id } => write!(f, "instance {id} is already in use"),
            HostError::NotAComponent => write!(f, "node is not backed by a component"),
        }
    }
}

impl std::error::Error for HostError {}
