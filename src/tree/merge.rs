//! The record merge/similarity engine.
//!
//! When a container instantiates several record-style mapping children, the
//! engine measures how much their field-key sets overlap. At or above the
//! configured similarity threshold, and with no per-key type conflicts, all
//! compared records fuse into one node whose fields are the union of
//! theirs; fields missing from any compared record become optional. Every
//! position the separate records held is replaced in place, preserving
//! order and repetition for ordered containers (set containers collapse the
//! duplicates afterwards).

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::error::LiftResult;

use super::build::TreeBuilder;
use super::hash::node_hash;
use super::{Children, Node, NodeId, NodeKind};

/// Per-field metadata owned by a record-style node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictMetadata {
    /// Field name → required flag and attached documentation, in field
    /// insertion order.
    pub fields: IndexMap<String, FieldMeta>,
    /// Documentation for the record itself (the class docstring).
    pub class_doc: Option<String>,
}

/// Metadata for one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Present in every compared record instance. Without a merge, every
    /// field of a record is required.
    pub required: bool,
    /// Documentation text supplied through a hidden key.
    pub doc: Option<String>,
}

impl DictMetadata {
    /// Fold another record's metadata into this one.
    ///
    /// A field stays required only if it is required on both sides and
    /// present on both sides; fields seen on only one side become optional.
    /// First-seen documentation wins.
    pub fn merge(&mut self, other: &DictMetadata) {
        for (field, meta) in &mut self.fields {
            match other.fields.get(field) {
                Some(theirs) => {
                    meta.required = meta.required && theirs.required;
                    if meta.doc.is_none() {
                        meta.doc = theirs.doc.clone();
                    }
                }
                None => meta.required = false,
            }
        }
        for (field, theirs) in &other.fields {
            if !self.fields.contains_key(field) {
                self.fields.insert(
                    field.clone(),
                    FieldMeta {
                        required: false,
                        doc: theirs.doc.clone(),
                    },
                );
            }
        }
        if self.class_doc.is_none() {
            self.class_doc = other.class_doc.clone();
        }
    }
}

impl TreeBuilder<'_> {
    /// Fuse record-style children of one container when they are similar
    /// enough and free of field-type conflicts. `children` is updated in
    /// place; non-record children keep their positions untouched.
    pub(crate) fn merge_record_children(&mut self, children: &mut [NodeId]) -> LiftResult<()> {
        let record_ids: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|id| self.nodes[id.index()].kind.is_record())
            .collect();
        // Fewer than two comparable records: similarity is defined as 0.
        if record_ids.len() < 2 {
            return Ok(());
        }

        let key_sets: Vec<IndexSet<&str>> = record_ids
            .iter()
            .map(|id| field_names(&self.nodes[id.index()]))
            .collect();

        let mut all_keys: IndexSet<&str> = IndexSet::new();
        for keys in &key_sets {
            all_keys.extend(keys.iter().copied());
        }
        let common: Vec<&str> = all_keys
            .iter()
            .copied()
            .filter(|key| key_sets.iter().all(|keys| keys.contains(key)))
            .collect();
        let similarity = if all_keys.is_empty() {
            100
        } else {
            (100 * common.len()) / all_keys.len()
        };
        let threshold = self.strategies.merge_similarity_percent as usize;
        if similarity < threshold {
            debug!(
                similarity,
                threshold, "record similarity below threshold; keeping records separate"
            );
            return Ok(());
        }

        // A key whose observed value types differ across the compared
        // records disables the merge entirely; this is not an error.
        for key in &all_keys {
            let mut observed: Option<u64> = None;
            for id in &record_ids {
                if let Some(child) = field_child(&self.nodes[id.index()], key) {
                    let child_hash = self.nodes[child.index()].hash;
                    match observed {
                        None => observed = Some(child_hash),
                        Some(seen) if seen != child_hash => {
                            debug!(field = %key, "field type conflict; records not merged");
                            return Ok(());
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        let fused = self.fuse_records(&record_ids);
        debug!(
            records = record_ids.len(),
            similarity,
            fused_name = %self.nodes[fused.index()].name,
            "merged record children"
        );
        for slot in children.iter_mut() {
            if record_ids.contains(slot) {
                *slot = fused;
            }
        }
        Ok(())
    }

    /// Build the fused record node: union of fields (first-seen wins),
    /// merged metadata, lexicographically smallest name.
    fn fuse_records(&mut self, record_ids: &[NodeId]) -> NodeId {
        let first = &self.nodes[record_ids[0].index()];
        let depth = first.depth;
        let parent = first.parent;
        let flavor = match &first.kind {
            NodeKind::Dict { flavor, .. } => *flavor,
            _ => crate::value::MappingFlavor::Plain,
        };

        let mut keyed: Vec<(String, NodeId)> = Vec::new();
        let mut metadata: Option<DictMetadata> = None;
        let mut name: Option<String> = None;
        for id in record_ids {
            let node = &self.nodes[id.index()];
            if let Children::Keyed(entries) = &node.children {
                for (field, child) in entries {
                    if !keyed.iter().any(|(existing, _)| existing == field) {
                        keyed.push((field.clone(), *child));
                    }
                }
            }
            if let Some(meta) = &node.metadata {
                match &mut metadata {
                    None => metadata = Some(meta.clone()),
                    Some(accumulated) => accumulated.merge(meta),
                }
            }
            match &mut name {
                None => name = Some(node.name.clone()),
                Some(current) => {
                    if node.name < *current {
                        *current = node.name.clone();
                    }
                }
            }
        }

        let height = keyed
            .iter()
            .map(|(_, child)| self.nodes[child.index()].height + 1)
            .max()
            .unwrap_or(0);
        let fused = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name: name.unwrap_or_default(),
            depth,
            height,
            parent,
            kind: NodeKind::Dict {
                flavor,
                record: true,
                key_types: Vec::new(),
            },
            children: Children::Keyed(keyed.clone()),
            metadata,
            hash: 0,
        });
        for (_, child) in &keyed {
            self.nodes[child.index()].parent = Some(fused);
        }
        let hash = node_hash(&self.nodes, fused);
        self.nodes[fused.index()].hash = hash;
        fused
    }
}

fn field_names(node: &Node) -> IndexSet<&str> {
    match &node.children {
        Children::Keyed(entries) => entries.iter().map(|(key, _)| key.as_str()).collect(),
        _ => IndexSet::new(),
    }
}

fn field_child(node: &Node, field: &str) -> Option<NodeId> {
    match &node.children {
        Children::Keyed(entries) => entries
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, id)| *id),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(fields: &[(&str, bool)]) -> DictMetadata {
        DictMetadata {
            fields: fields
                .iter()
                .map(|(name, required)| {
                    (
                        name.to_string(),
                        FieldMeta {
                            required: *required,
                            doc: None,
                        },
                    )
                })
                .collect(),
            class_doc: None,
        }
    }

    #[test]
    fn shared_fields_stay_required() {
        let mut a = meta(&[("name", true), ("age", true)]);
        a.merge(&meta(&[("name", true), ("age", true)]));
        assert!(a.fields["name"].required);
        assert!(a.fields["age"].required);
    }

    #[test]
    fn one_sided_fields_become_optional() {
        let mut a = meta(&[("name", true), ("email", true)]);
        a.merge(&meta(&[("name", true), ("phone", true)]));
        assert!(a.fields["name"].required);
        assert!(!a.fields["email"].required);
        assert!(!a.fields["phone"].required);
        // Union preserves first-seen order.
        let order: Vec<&str> = a.fields.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["name", "email", "phone"]);
    }

    #[test]
    fn first_seen_docs_win() {
        let mut a = DictMetadata {
            fields: IndexMap::from([(
                "k".to_string(),
                FieldMeta {
                    required: true,
                    doc: Some("first".to_string()),
                },
            )]),
            class_doc: None,
        };
        let b = DictMetadata {
            fields: IndexMap::from([(
                "k".to_string(),
                FieldMeta {
                    required: true,
                    doc: Some("second".to_string()),
                },
            )]),
            class_doc: Some("record doc".to_string()),
        };
        a.merge(&b);
        assert_eq!(a.fields["k"].doc.as_deref(), Some("first"));
        assert_eq!(a.class_doc.as_deref(), Some("record doc"));
    }
}
