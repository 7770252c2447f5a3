//! Recursive classification and construction of tree nodes.
//!
//! Classification is an exhaustive `match` over the closed [`Value`] enum;
//! the [`Value::Instance`] variant is the universal fallback for shapes with
//! no dedicated kind. Child names are generated as `parent.name` plus a
//! capitalized type suffix, disambiguated with numeric suffixes against the
//! sibling names already taken in the same container *before* the child is
//! built, so a child's own descendants are named from its final name.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::{LiftError, LiftResult};
use crate::python::{class_fragment, doc_target, validate_identifier, DocTarget};
use crate::strategies::{MappingStyle, Strategies, TupleStyle};
use crate::value::{FrameInfo, FunctionKind, MapKey, Value};

use super::hash::node_hash;
use super::merge::{DictMetadata, FieldMeta};
use super::{Children, Node, NodeId, NodeKind};

/// Container child-structure shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Keep every element in position order.
    Ordered,
    /// Deduplicate structurally equal elements, first-seen order.
    Unique,
}

/// Arena-building context for one tree construction pass.
pub(crate) struct TreeBuilder<'a> {
    pub(crate) nodes: Vec<Node>,
    pub(crate) strategies: &'a Strategies,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(strategies: &'a Strategies) -> Self {
        TreeBuilder {
            nodes: Vec::new(),
            strategies,
        }
    }

    pub(crate) fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Classify `value` and build its node (and, recursively, its subtree).
    pub(crate) fn build_node(
        &mut self,
        value: &Value,
        name: String,
        depth: u32,
        parent: Option<NodeId>,
    ) -> LiftResult<NodeId> {
        validate_identifier(&name)?;
        match value {
            Value::List(_) => self.build_list(value, name, depth, parent),
            Value::Tuple(_) => self.build_tuple(value, name, depth, parent),
            Value::Set(_) => self.build_set(value, name, depth, parent),
            Value::FrozenSet(_) => self.build_frozen_set(value, name, depth, parent),
            Value::Iterator(_) => self.build_iterator(value, name, depth, parent),
            Value::Dict(_) => self.build_dict(value, name, depth, parent),
            _ => self.build_leaf(value, name, depth, parent),
        }
    }

    // ------------------------------------------------------------------
    // Leaves
    // ------------------------------------------------------------------

    fn build_leaf(
        &mut self,
        value: &Value,
        name: String,
        depth: u32,
        parent: Option<NodeId>,
    ) -> LiftResult<NodeId> {
        let kind = match value {
            Value::None => NodeKind::NoneLeaf,
            Value::Bool(_) => NodeKind::Bool,
            Value::Int(_) => NodeKind::Int,
            Value::Float(_) => NodeKind::Float,
            Value::Str(_) => NodeKind::Str,
            Value::Range => NodeKind::Range,
            Value::Slice => NodeKind::Slice,
            Value::Function(info) => match info.kind {
                FunctionKind::Lambda => NodeKind::Lambda {
                    arity: info.params.len(),
                },
                FunctionKind::Inspectable => NodeKind::Signature {
                    params: info.params.clone(),
                    returns: info.returns.clone(),
                },
                FunctionKind::Opaque => NodeKind::OpaqueCallable,
            },
            Value::Type(obj) => NodeKind::TypeObject {
                class_name: obj.name.clone(),
                is_builtin: obj.is_builtin,
            },
            Value::Instance(info) => NodeKind::Instance {
                class_name: info.class_name.clone(),
            },
            Value::Frame(frame) => NodeKind::Frame {
                columns: frame_columns(frame),
            },
            other => return Err(mismatch("leaf", other)),
        };
        let id = self.reserve(name, depth, parent);
        self.finalize(id, kind, Children::Leaf, None);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Element containers
    // ------------------------------------------------------------------

    fn build_list(
        &mut self,
        value: &Value,
        name: String,
        depth: u32,
        parent: Option<NodeId>,
    ) -> LiftResult<NodeId> {
        let Value::List(items) = value else {
            return Err(mismatch("list", value));
        };
        self.build_container(items, NodeKind::List, Shape::Ordered, name, depth, parent, true)
    }

    fn build_tuple(
        &mut self,
        value: &Value,
        name: String,
        depth: u32,
        parent: Option<NodeId>,
    ) -> LiftResult<NodeId> {
        let Value::Tuple(items) = value else {
            return Err(mismatch("tuple", value));
        };
        match self.strategies.tuple_style {
            // Fixed arity: every position is part of the declared type, so
            // the sampling cap does not apply.
            TupleStyle::Fixed => self.build_container(
                items,
                NodeKind::TupleFixed,
                Shape::Ordered,
                name,
                depth,
                parent,
                false,
            ),
            TupleStyle::AnySize => self.build_container(
                items,
                NodeKind::TupleAny,
                Shape::Ordered,
                name,
                depth,
                parent,
                true,
            ),
        }
    }

    fn build_set(
        &mut self,
        value: &Value,
        name: String,
        depth: u32,
        parent: Option<NodeId>,
    ) -> LiftResult<NodeId> {
        let Value::Set(items) = value else {
            return Err(mismatch("set", value));
        };
        self.build_container(items, NodeKind::Set, Shape::Unique, name, depth, parent, true)
    }

    fn build_frozen_set(
        &mut self,
        value: &Value,
        name: String,
        depth: u32,
        parent: Option<NodeId>,
    ) -> LiftResult<NodeId> {
        let Value::FrozenSet(items) = value else {
            return Err(mismatch("frozenset", value));
        };
        self.build_container(
            items,
            NodeKind::FrozenSet,
            Shape::Unique,
            name,
            depth,
            parent,
            true,
        )
    }

    fn build_iterator(
        &mut self,
        value: &Value,
        name: String,
        depth: u32,
        parent: Option<NodeId>,
    ) -> LiftResult<NodeId> {
        let Value::Iterator(items) = value else {
            return Err(mismatch("iterator", value));
        };
        self.build_container(
            items,
            NodeKind::IteratorSeq,
            Shape::Ordered,
            name,
            depth,
            parent,
            true,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build_container(
        &mut self,
        items: &[Value],
        kind: NodeKind,
        shape: Shape,
        name: String,
        depth: u32,
        parent: Option<NodeId>,
        sampled: bool,
    ) -> LiftResult<NodeId> {
        let id = self.reserve(name.clone(), depth, parent);
        let limit = if sampled {
            self.strategies.max_sampled_elements.unwrap_or(usize::MAX)
        } else {
            usize::MAX
        };

        let mut used = FxHashSet::default();
        let mut child_ids = Vec::with_capacity(items.len().min(limit));
        for (index, item) in items.iter().enumerate() {
            if index >= limit {
                debug!(
                    container = %self.nodes[id.index()].name,
                    sampled = limit,
                    total = items.len(),
                    "element sampling cap reached; remaining elements ignored"
                );
                break;
            }
            let base = child_base_name(&self.nodes[id.index()].name, item);
            let child_name = disambiguate(base, &mut used);
            let child = self.build_node(item, child_name, depth + 1, Some(id))?;
            child_ids.push(child);
        }

        self.merge_record_children(&mut child_ids)?;

        let children = match shape {
            Shape::Ordered => Children::Ordered(child_ids),
            Shape::Unique => Children::Unique(self.dedupe_by_hash(child_ids)),
        };
        self.finalize(id, kind, children, None);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Mappings
    // ------------------------------------------------------------------

    fn build_dict(
        &mut self,
        value: &Value,
        name: String,
        depth: u32,
        parent: Option<NodeId>,
    ) -> LiftResult<NodeId> {
        let Value::Dict(mapping) = value else {
            return Err(mismatch("dict", value));
        };
        let id = self.reserve(name, depth, parent);

        // Pre-child pass: peel hidden documentation keys off before any
        // child exists, since field metadata decides what gets built.
        let mut record_doc: Option<String> = None;
        let mut field_docs: IndexMap<String, String> = IndexMap::new();
        let mut visible: Vec<(&MapKey, &Value)> = Vec::new();
        for (key, val) in &mapping.entries {
            let target = key.as_str().and_then(doc_target);
            match (target, val) {
                (Some(DocTarget::Record), Value::Str(text)) => {
                    if record_doc.is_none() {
                        record_doc = Some(text.clone());
                    }
                }
                (Some(DocTarget::Field(field)), Value::Str(text)) => {
                    field_docs
                        .entry(field.to_string())
                        .or_insert_with(|| text.clone());
                }
                // A hidden key with a non-string payload carries no usable
                // documentation; it is still stripped.
                (Some(_), _) => {}
                (None, _) => visible.push((key, val)),
            }
        }

        let record = self.strategies.mapping_style == MappingStyle::TypedDict
            && !visible.is_empty()
            && visible.iter().all(|(k, _)| matches!(k, MapKey::Str(_)));

        let mut used = FxHashSet::default();
        let mut keyed: Vec<(String, NodeId)> = Vec::with_capacity(visible.len());

        if record {
            let mut metadata = DictMetadata {
                class_doc: record_doc,
                ..DictMetadata::default()
            };
            for (key, val) in &visible {
                let Some(field) = key.as_str() else {
                    continue;
                };
                let parent_name = self.nodes[id.index()].name.clone();
                let base = format!("{}{}", parent_name, class_fragment(field));
                let child_name = disambiguate(base, &mut used);
                let child = self.build_node(val, child_name, depth + 1, Some(id))?;
                metadata.fields.insert(
                    field.to_string(),
                    FieldMeta {
                        required: true,
                        doc: field_docs.get(field).cloned(),
                    },
                );
                keyed.push((field.to_string(), child));
            }
            self.finalize(
                id,
                NodeKind::Dict {
                    flavor: mapping.flavor,
                    record: true,
                    key_types: Vec::new(),
                },
                Children::Keyed(keyed),
                Some(metadata),
            );
        } else {
            let mut key_types: Vec<&'static str> = Vec::new();
            for (key, val) in &visible {
                if !key_types.contains(&key.type_expr()) {
                    key_types.push(key.type_expr());
                }
                let base = child_base_name(&self.nodes[id.index()].name, val);
                let child_name = disambiguate(base, &mut used);
                let child = self.build_node(val, child_name, depth + 1, Some(id))?;
                keyed.push((key.type_expr().to_string(), child));
            }
            key_types.sort_unstable();
            self.finalize(
                id,
                NodeKind::Dict {
                    flavor: mapping.flavor,
                    record: false,
                    key_types,
                },
                Children::Keyed(keyed),
                None,
            );
        }
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Arena plumbing
    // ------------------------------------------------------------------

    /// Reserve an arena slot so children can hold their parent's id before
    /// the parent is finalized.
    fn reserve(&mut self, name: String, depth: u32, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name,
            depth,
            height: 0,
            parent,
            kind: NodeKind::NoneLeaf,
            children: Children::Leaf,
            metadata: None,
            hash: 0,
        });
        id
    }

    /// Fill a reserved slot: compute height from the (finished) children,
    /// then the structural hash.
    pub(crate) fn finalize(
        &mut self,
        id: NodeId,
        kind: NodeKind,
        children: Children,
        metadata: Option<DictMetadata>,
    ) {
        let height = children
            .ids()
            .iter()
            .map(|c| self.nodes[c.index()].height + 1)
            .max()
            .unwrap_or(0);
        {
            let node = &mut self.nodes[id.index()];
            node.kind = kind;
            node.children = children;
            node.metadata = metadata;
            node.height = height;
        }
        let hash = node_hash(&self.nodes, id);
        self.nodes[id.index()].hash = hash;
    }

    /// Drop structurally duplicate children, keeping first occurrences.
    fn dedupe_by_hash(&self, ids: Vec<NodeId>) -> Vec<NodeId> {
        let mut seen = FxHashSet::default();
        ids.into_iter()
            .filter(|id| seen.insert(self.nodes[id.index()].hash))
            .collect()
    }
}

/// Derive a child's base declaration name from its parent's name and the
/// child value's type name.
fn child_base_name(parent_name: &str, value: &Value) -> String {
    format!("{}{}", parent_name, class_fragment(value.type_name()))
}

/// Resolve sibling name collisions with numeric suffixes (`Name`, `Name2`,
/// `Name3`, ...), claiming the chosen name in `used`.
fn disambiguate(base: String, used: &mut FxHashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{}{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Literal/dtype pairs for a frame's columns, or `None` when any column key
/// cannot appear in a `Literal[...]` overload.
fn frame_columns(frame: &FrameInfo) -> Option<Vec<(String, String)>> {
    if frame.columns.is_empty() {
        return None;
    }
    let mut columns = Vec::with_capacity(frame.columns.len());
    for column in &frame.columns {
        let literal = match &column.key {
            MapKey::Str(s) => format!("\"{}\"", s),
            MapKey::Int(i) => i.to_string(),
            MapKey::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            _ => return None,
        };
        columns.push((literal, column.dtype.clone()));
    }
    Some(columns)
}

fn mismatch(kind: &'static str, value: &Value) -> LiftError {
    LiftError::KindMismatch {
        kind,
        value_type: value.type_name().to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_names_get_numeric_suffixes() {
        let mut used = FxHashSet::default();
        assert_eq!(disambiguate("ExampleInt".to_string(), &mut used), "ExampleInt");
        assert_eq!(disambiguate("ExampleInt".to_string(), &mut used), "ExampleInt2");
        assert_eq!(disambiguate("ExampleInt".to_string(), &mut used), "ExampleInt3");
        assert_eq!(disambiguate("ExampleStr".to_string(), &mut used), "ExampleStr");
    }

    #[test]
    fn frame_columns_reject_non_literal_keys() {
        use crate::value::FrameColumn;
        let frame = FrameInfo {
            columns: vec![FrameColumn::new(
                MapKey::Tuple(vec![MapKey::from("a"), MapKey::from("b")]),
                "int",
            )],
        };
        assert_eq!(frame_columns(&frame), None);
    }

    #[test]
    fn frame_columns_accept_scalar_literals() {
        use crate::value::FrameColumn;
        let frame = FrameInfo {
            columns: vec![
                FrameColumn::new("age", "int"),
                FrameColumn::new(3i64, "float"),
            ],
        };
        assert_eq!(
            frame_columns(&frame),
            Some(vec![
                ("\"age\"".to_string(), "int".to_string()),
                ("3".to_string(), "float".to_string()),
            ])
        );
    }
}
