//! The structural-hash engine.
//!
//! Every node gets one canonical hash computed from its kind and its
//! children's hashes: order-insensitive for unordered shapes (lists, sets,
//! any-size tuples, mapping key sets), order-sensitive for fixed-arity
//! tuples. Plain mappings hash by key *type*, records by field *name*.
//! Hidden documentation keys were stripped before children existed, so they
//! can never participate. Hashes are stored on the node at finalization;
//! every later read is a field load.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::value::{Param, ReturnHint};

use super::{Children, Node, NodeId, NodeKind};

/// Compute the structural hash of the node at `id`. Children must already
/// be finalized.
pub(crate) fn node_hash(nodes: &[Node], id: NodeId) -> u64 {
    let node = &nodes[id.index()];
    let mut hasher = FxHasher::default();
    node.kind.tag().hash(&mut hasher);
    hash_kind_payload(&node.kind, &mut hasher);
    hash_children(nodes, node, &mut hasher);
    hasher.finish()
}

fn hash_kind_payload(kind: &NodeKind, hasher: &mut FxHasher) {
    match kind {
        NodeKind::Instance { class_name } => class_name.hash(hasher),
        NodeKind::TypeObject {
            class_name,
            is_builtin,
        } => {
            class_name.hash(hasher);
            is_builtin.hash(hasher);
        }
        // Two callables with equivalent signatures compare equal regardless
        // of identity.
        NodeKind::Lambda { arity } => arity.hash(hasher),
        NodeKind::Signature { params, returns } => {
            canonical_signature(params, returns).hash(hasher)
        }
        NodeKind::Frame { columns } => columns.hash(hasher),
        _ => {}
    }
}

fn hash_children(nodes: &[Node], node: &Node, hasher: &mut FxHasher) {
    match (&node.kind, &node.children) {
        (_, Children::Leaf) => {}
        // Fixed-arity tuples: position matters.
        (NodeKind::TupleFixed, Children::Ordered(ids)) => {
            for id in ids {
                nodes[id.index()].hash.hash(hasher);
            }
        }
        // Every other element container hashes as the *set* of child
        // hashes: type hints do not capture element order or repetition.
        (_, Children::Ordered(ids)) | (_, Children::Unique(ids)) => {
            let distinct: BTreeSet<u64> = ids.iter().map(|id| nodes[id.index()].hash).collect();
            for child_hash in distinct {
                child_hash.hash(hasher);
            }
        }
        (kind, Children::Keyed(entries)) => {
            // Record fields are structurally nominal per field name; plain
            // mappings are keyed by key type. Both are unordered.
            let marker = if kind.is_record() { "field" } else { "entry" };
            let distinct: BTreeSet<(&str, u64)> = entries
                .iter()
                .map(|(key, id)| (key.as_str(), nodes[id.index()].hash))
                .collect();
            for (key, child_hash) in distinct {
                marker.hash(hasher);
                key.hash(hasher);
                child_hash.hash(hasher);
            }
        }
    }
}

/// Canonical signature text used for hashing introspected callables.
pub(crate) fn canonical_signature(params: &[Param], returns: &ReturnHint) -> String {
    let mut out = String::from("(");
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&param.name);
        if let Some(annotation) = &param.annotation {
            out.push_str(": ");
            out.push_str(annotation);
        }
    }
    out.push_str(") -> ");
    out.push_str(return_text(returns));
    out
}

/// The rendered return type for a callable: `None` when no return statement
/// was found, `Any` when a return exists but is unannotated, otherwise the
/// introspected annotation.
pub(crate) fn return_text(returns: &ReturnHint) -> &str {
    match returns {
        ReturnHint::Absent => "None",
        ReturnHint::Unannotated => "Any",
        ReturnHint::Annotated(text) => text,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_render_canonically() {
        let params = vec![Param::annotated("a", "int"), Param::new("b")];
        assert_eq!(
            canonical_signature(&params, &ReturnHint::Absent),
            "(a: int, b) -> None"
        );
        assert_eq!(
            canonical_signature(&[], &ReturnHint::Annotated("str".to_string())),
            "() -> str"
        );
    }
}
