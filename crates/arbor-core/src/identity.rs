//! Reuse predicate consulted by the patcher.
//!
//! Two nodes at the same position are "the same node" when the host may patch
//! the existing instance in place. Nodes without keys compare equal on the
//! key check, so two route entries that render the same component without a
//! key share one instance and no create/destroy callbacks fire between them.
//! Callers that need a fresh instance per entry must supply distinct keys.

use crate::vnode::{PropValue, VNode};

const TEXT_INPUT_TYPES: &[&str] = &["text", "number", "password", "search", "email", "tel", "url"];

pub fn same_vnode(a: &VNode, b: &VNode) -> bool {
    if a.key != b.key {
        return false;
    }
    let same_factory = match (&a.async_factory, &b.async_factory) {
        (None, None) => true,
        (Some(left), Some(right)) => left.same(right),
        _ => false,
    };
    if !same_factory {
        return false;
    }
    let structural = a.tag == b.tag
        && a.is_comment() == b.is_comment()
        && a.data.is_some() == b.data.is_some()
        && same_input_type(a, b);
    structural
        || (a.is_async_placeholder()
            && b.async_factory
                .as_ref()
                .is_some_and(|factory| !factory.has_error()))
}

fn same_input_type(a: &VNode, b: &VNode) -> bool {
    if a.tag.as_deref() != Some("input") {
        return true;
    }
    let type_a = input_type(a);
    let type_b = input_type(b);
    type_a == type_b || (is_text_input_type(type_a) && is_text_input_type(type_b))
}

fn input_type(node: &VNode) -> Option<&str> {
    node.attr("type").and_then(PropValue::as_text)
}

fn is_text_input_type(kind: Option<&str>) -> bool {
    kind.is_some_and(|kind| TEXT_INPUT_TYPES.contains(&kind))
}

#[cfg(test)]
#[path = "tests/identity_tests.rs"]
mod tests;
