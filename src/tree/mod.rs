//! The type tree: a declarative mirror of one runtime value's shape.
//!
//! Nodes live in a flat arena ([`TypeTree::nodes`]); parent and child links
//! are indices, so the parent back-reference needed for rename and
//! alias-permission logic never creates an ownership cycle. Construction is
//! a single recursive pass over the input value; the tree is immutable
//! afterwards except for [`TypeTree::rename`].
//!
//! Structural hashes are computed bottom-up while each node is finalized
//! (children always finish first), so equality checks and render-time
//! deduplication are field loads, never re-traversals.

mod build;
mod hash;
mod merge;
mod rename;
mod render;

pub use merge::{DictMetadata, FieldMeta};

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::LiftResult;
use crate::strategies::Strategies;
use crate::value::{MappingFlavor, Param, ReturnHint, Value};

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The concrete kind of a tree node, one variant per runtime shape.
///
/// A closed sum: classification is an exhaustive `match` over [`Value`],
/// so an unregistered-kind collision is impossible by construction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeKind {
    /// Python `None`; rendered as `Optional[object]`.
    NoneLeaf,
    Bool,
    Int,
    Float,
    Str,
    Range,
    Slice,
    /// Instance of an unregistered class; rendered as a quoted forward
    /// reference.
    Instance { class_name: String },
    /// A class used as a value.
    TypeObject {
        class_name: String,
        is_builtin: bool,
    },
    /// Anonymous callable: `Callable[[Any, ...], Any]` with one `Any` per
    /// positional argument.
    Lambda { arity: usize },
    /// Callable with an introspected signature; rendered as a `Protocol`
    /// with a single `__call__`.
    Signature {
        params: Vec<Param>,
        returns: ReturnHint,
    },
    /// Builtin/native callable with no recoverable signature.
    OpaqueCallable,
    List,
    /// Fixed-arity tuple: one type per position.
    TupleFixed,
    /// Arbitrary-length tuple: one union plus `...`.
    TupleAny,
    Set,
    FrozenSet,
    IteratorSeq,
    /// A mapping. `record` selects the named-field TypedDict form;
    /// `key_types` carries the key type expressions for the plain form.
    Dict {
        flavor: MappingFlavor,
        record: bool,
        key_types: Vec<&'static str>,
    },
    /// A tabular frame. `columns` holds `(literal, dtype)` pairs when every
    /// column key is literal-compatible; `None` renders a bare alias.
    Frame {
        columns: Option<Vec<(String, String)>>,
    },
}

impl NodeKind {
    /// Stable tag mixed into the structural hash so distinct kinds never
    /// compare equal.
    pub(crate) fn tag(&self) -> &'static str {
        match self {
            NodeKind::NoneLeaf => "none",
            NodeKind::Bool => "bool",
            NodeKind::Int => "int",
            NodeKind::Float => "float",
            NodeKind::Str => "str",
            NodeKind::Range => "range",
            NodeKind::Slice => "slice",
            NodeKind::Instance { .. } => "instance",
            NodeKind::TypeObject { .. } => "type",
            NodeKind::Lambda { .. } => "lambda",
            NodeKind::Signature { .. } => "signature",
            NodeKind::OpaqueCallable => "callable",
            NodeKind::List => "list",
            NodeKind::TupleFixed => "tuple-fixed",
            NodeKind::TupleAny => "tuple-any",
            NodeKind::Set => "set",
            NodeKind::FrozenSet => "frozenset",
            NodeKind::IteratorSeq => "iterator",
            NodeKind::Dict { record: true, .. } => "record",
            NodeKind::Dict { record: false, .. } => "dict",
            NodeKind::Frame { .. } => "frame",
        }
    }

    /// Whether this node is a record-style mapping.
    pub(crate) fn is_record(&self) -> bool {
        matches!(self, NodeKind::Dict { record: true, .. })
    }
}

/// Child structure of one node: none, ordered, unique, or keyed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Children {
    Leaf,
    /// Position-preserving sequence of children.
    Ordered(Vec<NodeId>),
    /// Deduplicated (by structural hash) children in first-seen order.
    Unique(Vec<NodeId>),
    /// Keyed children. For record nodes the key is the field name; for
    /// plain mappings it is the key's type expression.
    Keyed(Vec<(String, NodeId)>),
}

impl Children {
    /// Child ids in storage order.
    pub(crate) fn ids(&self) -> Vec<NodeId> {
        match self {
            Children::Leaf => Vec::new(),
            Children::Ordered(ids) | Children::Unique(ids) => ids.clone(),
            Children::Keyed(entries) => entries.iter().map(|(_, id)| *id).collect(),
        }
    }
}

/// One node of the type tree.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// Declaration name, derived from the parent name plus a capitalized
    /// type suffix; unique among siblings by numeric suffixing.
    pub(crate) name: String,
    /// Distance from the root (root = 0).
    pub(crate) depth: u32,
    /// Longest path to a leaf; 0 for leaves.
    pub(crate) height: u32,
    /// Back-reference to the owning node; `None` at the root.
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) children: Children,
    /// Field metadata; present only on record nodes.
    pub(crate) metadata: Option<DictMetadata>,
    /// Structural hash, computed once at finalization.
    pub(crate) hash: u64,
}

/// A finished type tree, ready to be rendered or renamed.
#[derive(Debug, Clone)]
pub struct TypeTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) strategies: Strategies,
}

impl TypeTree {
    /// Classify `value` and build its type tree under the given root name.
    ///
    /// The value is inspected, never mutated. Fails on an invalid root name
    /// or invalid strategies; classification gaps never fail (unknown
    /// shapes degrade to forward-referenced leaves).
    pub fn from_value(
        value: &Value,
        name: impl Into<String>,
        strategies: &Strategies,
    ) -> LiftResult<TypeTree> {
        strategies.validate()?;
        let name = name.into();
        let mut builder = build::TreeBuilder::new(strategies);
        let root = builder.build_node(value, name, 0, None)?;
        let tree = TypeTree {
            nodes: builder.into_nodes(),
            root,
            strategies: strategies.clone(),
        };
        debug!(
            name = tree.name(),
            nodes = tree.node_count(),
            height = tree.height(),
            "built type tree"
        );
        Ok(tree)
    }

    /// The root declaration name.
    pub fn name(&self) -> &str {
        &self.node(self.root).name
    }

    /// Height of the root node.
    pub fn height(&self) -> u32 {
        self.node(self.root).height
    }

    /// Number of distinct nodes reachable from the root.
    ///
    /// Merged-away record nodes stay in the arena but are unreachable and
    /// not counted; a fused node referenced from several positions counts
    /// once.
    pub fn node_count(&self) -> usize {
        let mut seen = FxHashSet::default();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.node(id).children.ids());
            }
        }
        seen.len()
    }

    /// The canonical structural hash of the whole tree.
    ///
    /// Two trees with equivalent shape hash equal regardless of naming or
    /// literal content. Repeated calls are field loads.
    pub fn structural_hash(&self) -> u64 {
        self.node(self.root).hash
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl PartialEq for TypeTree {
    /// Structural equality: same root kind and same structural hash.
    fn eq(&self, other: &Self) -> bool {
        self.node(self.root).kind.tag() == other.node(other.root).kind.tag()
            && self.structural_hash() == other.structural_hash()
    }
}

impl Eq for TypeTree {}
