//! Rendering a finished tree into declaration text.
//!
//! The renderer walks the tree depth-first, children before parents, and
//! emits one top-level declaration per alias-granted node, deduplicating by
//! structural hash: two differently-positioned but structurally identical
//! subtrees emit once, and later references resolve to the first-emitted
//! (canonical) name. Nodes without alias permission are inlined into their
//! parent's declaration instead.
//!
//! Formatting contract: a blank separator line follows the import block,
//! and exactly two blank lines precede every class-style declaration.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{LiftError, LiftResult};
use crate::imports::{ImportSet, Symbol, DEFAULT_LINE_WIDTH};
use crate::python::is_identifier;
use crate::strategies::{MappingStyle, SequenceStyle};
use crate::value::{MappingFlavor, Param, ReturnHint};

use super::hash::return_text;
use super::{NodeId, NodeKind, TypeTree};

/// One emitted top-level declaration.
struct Declaration {
    text: String,
    is_class: bool,
}

struct Renderer<'t> {
    tree: &'t TypeTree,
    imports: ImportSet,
    /// Structural hash → canonical emitted name, in emission order.
    declared: IndexMap<u64, String>,
    declarations: Vec<Declaration>,
}

impl TypeTree {
    /// Render the tree as a complete declaration module, import block
    /// included.
    pub fn render(&self) -> LiftResult<String> {
        self.render_text(true)
    }

    /// Render only the declarations, without the import block.
    pub fn render_declarations(&self) -> LiftResult<String> {
        self.render_text(false)
    }

    fn render_text(&self, include_imports: bool) -> LiftResult<String> {
        let mut renderer = Renderer {
            tree: self,
            imports: ImportSet::new(),
            declared: IndexMap::new(),
            declarations: Vec::new(),
        };
        renderer.visit(self.root);
        if renderer.declarations.is_empty() {
            return Err(LiftError::NothingToRender);
        }
        debug!(
            declarations = renderer.declarations.len(),
            imports = renderer.imports.len(),
            "rendered type tree"
        );

        let mut text = String::new();
        if include_imports && !renderer.imports.is_empty() {
            text.push_str(&renderer.imports.render(DEFAULT_LINE_WIDTH));
        }
        let mut previous_was_class = false;
        for (index, declaration) in renderer.declarations.iter().enumerate() {
            if !text.is_empty() {
                if declaration.is_class || previous_was_class {
                    text.push_str("\n\n");
                } else if index == 0 {
                    text.push('\n');
                }
            }
            text.push_str(&declaration.text);
            text.push('\n');
            previous_was_class = declaration.is_class;
        }
        Ok(text)
    }
}

impl Renderer<'_> {
    /// Depth-first emission: children first, then this node if it is
    /// granted an alias and its shape has not been emitted already.
    fn visit(&mut self, id: NodeId) {
        for child in self.tree.node(id).children.ids() {
            self.visit(child);
        }
        if !self.has_permission(id) {
            return;
        }
        let hash = self.tree.node(id).hash;
        if self.declared.contains_key(&hash) {
            return;
        }
        let declaration = self.declaration(id);
        let name = self.tree.node(id).name.clone();
        self.declared.insert(hash, name);
        self.declarations.push(declaration);
    }

    /// Whether this node is rendered as its own named top-level
    /// declaration rather than inlined into its parent.
    ///
    /// The root always qualifies. Record, protocol, and column-typed frame
    /// nodes always qualify because their declarations cannot be inlined.
    /// Other leaves never qualify; other interior nodes qualify when any
    /// child does, or when their height strictly exceeds the configured
    /// minimum.
    fn has_permission(&self, id: NodeId) -> bool {
        if id == self.tree.root {
            return true;
        }
        let node = self.tree.node(id);
        match &node.kind {
            NodeKind::Dict { record: true, .. } => return true,
            NodeKind::Signature { .. } => return true,
            NodeKind::Frame { columns: Some(_) } => return true,
            _ => {}
        }
        if node.height == 0 {
            return false;
        }
        if node
            .children
            .ids()
            .into_iter()
            .any(|child| self.has_permission(child))
        {
            return true;
        }
        node.height > self.tree.strategies.min_height_for_alias
    }

    /// The text a parent uses to refer to this node: its canonical declared
    /// name when alias-granted, otherwise its inlined type expression.
    fn reference(&mut self, id: NodeId) -> String {
        if self.has_permission(id) {
            let node = self.tree.node(id);
            self.declared
                .get(&node.hash)
                .cloned()
                .unwrap_or_else(|| node.name.clone())
        } else {
            self.expr(id)
        }
    }

    // ------------------------------------------------------------------
    // Union formatting (shared)
    // ------------------------------------------------------------------

    /// Collapse a collection of type expressions into one: deduplicated,
    /// lexically sorted, `int` dropped when `float` is present, wrapped in
    /// `Union[...]` only when more than one member survives. An empty
    /// collection renders `Any`.
    fn union_of(&mut self, mut parts: Vec<String>) -> String {
        parts.sort_unstable();
        parts.dedup();
        if parts.iter().any(|part| part == "float") {
            parts.retain(|part| part != "int");
        }
        match parts.as_slice() {
            [] => {
                self.imports.add(Symbol::Any);
                "Any".to_string()
            }
            [single] => single.clone(),
            _ => {
                self.imports.add(Symbol::Union);
                format!("Union[{}]", parts.join(", "))
            }
        }
    }

    /// The union of this node's children, each rendered as a reference.
    fn child_union(&mut self, id: NodeId) -> String {
        let children = self.tree.node(id).children.ids();
        let parts = children
            .into_iter()
            .map(|child| self.reference(child))
            .collect();
        self.union_of(parts)
    }

    // ------------------------------------------------------------------
    // Type expressions (right-hand sides)
    // ------------------------------------------------------------------

    fn expr(&mut self, id: NodeId) -> String {
        let kind = self.tree.node(id).kind.clone();
        match kind {
            NodeKind::NoneLeaf => {
                self.imports.add(Symbol::Optional);
                "Optional[object]".to_string()
            }
            NodeKind::Bool => "bool".to_string(),
            NodeKind::Int => "int".to_string(),
            NodeKind::Float => "float".to_string(),
            NodeKind::Str => "str".to_string(),
            NodeKind::Range => "range".to_string(),
            NodeKind::Slice => "slice".to_string(),
            NodeKind::Instance { class_name } => format!("\"{}\"", class_name),
            NodeKind::TypeObject {
                class_name,
                is_builtin,
            } => {
                self.imports.add(Symbol::Type);
                if is_builtin {
                    format!("Type[{}]", class_name)
                } else {
                    format!("Type[\"{}\"]", class_name)
                }
            }
            NodeKind::Lambda { arity } => {
                self.imports.add(Symbol::Callable);
                self.imports.add(Symbol::Any);
                format!("Callable[[{}], Any]", vec!["Any"; arity].join(", "))
            }
            NodeKind::OpaqueCallable => {
                self.imports.add(Symbol::Callable);
                "Callable".to_string()
            }
            // Always alias-granted; a parent reaches them through
            // `reference`, never through inlining.
            NodeKind::Signature { .. }
            | NodeKind::Dict { record: true, .. }
            | NodeKind::Frame { columns: Some(_) } => self.reference(id),
            NodeKind::List => {
                let element = self.child_union(id);
                match self.tree.strategies.sequence_style {
                    SequenceStyle::List => {
                        self.imports.add(Symbol::List);
                        format!("List[{}]", element)
                    }
                    SequenceStyle::Sequence => {
                        self.imports.add(Symbol::Sequence);
                        format!("Sequence[{}]", element)
                    }
                }
            }
            NodeKind::TupleFixed => {
                self.imports.add(Symbol::Tuple);
                let children = self.tree.node(id).children.ids();
                if children.is_empty() {
                    self.imports.add(Symbol::Any);
                    "Tuple[Any, ...]".to_string()
                } else {
                    // One type per position; no deduplication across
                    // positions.
                    let parts: Vec<String> = children
                        .into_iter()
                        .map(|child| self.reference(child))
                        .collect();
                    format!("Tuple[{}]", parts.join(", "))
                }
            }
            NodeKind::TupleAny => {
                self.imports.add(Symbol::Tuple);
                let element = self.child_union(id);
                format!("Tuple[{}, ...]", element)
            }
            NodeKind::Set => {
                self.imports.add(Symbol::Set);
                let element = self.child_union(id);
                format!("Set[{}]", element)
            }
            NodeKind::FrozenSet => {
                self.imports.add(Symbol::FrozenSet);
                let element = self.child_union(id);
                format!("FrozenSet[{}]", element)
            }
            NodeKind::IteratorSeq => {
                self.imports.add(Symbol::Iterator);
                let element = self.child_union(id);
                format!("Iterator[{}]", element)
            }
            NodeKind::Dict {
                flavor,
                record: false,
                key_types,
            } => {
                if key_types.contains(&"Tuple[Any, ...]") {
                    self.imports.add(Symbol::Tuple);
                    self.imports.add(Symbol::Any);
                }
                let key_union =
                    self.union_of(key_types.iter().map(|t| t.to_string()).collect());
                let value_union = self.child_union(id);
                let container = match (flavor, self.tree.strategies.mapping_style) {
                    (MappingFlavor::Proxy, _) => {
                        self.imports.add(Symbol::MappingProxyType);
                        "MappingProxyType"
                    }
                    (MappingFlavor::Abstract, _) | (_, MappingStyle::Mapping) => {
                        self.imports.add(Symbol::Mapping);
                        "Mapping"
                    }
                    _ => {
                        self.imports.add(Symbol::Dict);
                        "Dict"
                    }
                };
                format!("{}[{}, {}]", container, key_union, value_union)
            }
            NodeKind::Frame { columns: None } => {
                self.imports.add(Symbol::Pandas);
                "pd.DataFrame".to_string()
            }
        }
    }

    // ------------------------------------------------------------------
    // Top-level declarations
    // ------------------------------------------------------------------

    fn declaration(&mut self, id: NodeId) -> Declaration {
        let kind = self.tree.node(id).kind.clone();
        match kind {
            NodeKind::Dict { record: true, .. } => self.record_declaration(id),
            NodeKind::Signature { params, returns } => {
                self.protocol_declaration(id, &params, &returns)
            }
            NodeKind::Frame {
                columns: Some(columns),
            } => self.frame_declaration(id, &columns),
            _ => {
                let body = self.expr(id);
                let name = &self.tree.node(id).name;
                Declaration {
                    text: format!("{} = {}", name, body),
                    is_class: false,
                }
            }
        }
    }

    /// A record declaration: class form when every field key is an
    /// identifier, otherwise the functional form with quoted keys.
    fn record_declaration(&mut self, id: NodeId) -> Declaration {
        self.imports.add(Symbol::TypedDict);
        let node = self.tree.node(id);
        let name = node.name.clone();
        let entries = match &node.children {
            super::Children::Keyed(entries) => entries.clone(),
            _ => Vec::new(),
        };
        let metadata = node.metadata.clone().unwrap_or_default();
        let read_only = self.tree.strategies.read_only_fields;

        let mut fields: Vec<(String, String, Option<String>)> = Vec::new();
        for (field, child) in &entries {
            let mut type_text = self.reference(*child);
            if read_only {
                self.imports.add(Symbol::ReadOnly);
                type_text = format!("ReadOnly[{}]", type_text);
            }
            let meta = metadata.fields.get(field);
            if meta.is_some_and(|m| !m.required) {
                self.imports.add(Symbol::NotRequired);
                type_text = format!("NotRequired[{}]", type_text);
            }
            fields.push((
                field.clone(),
                type_text,
                meta.and_then(|m| m.doc.clone()),
            ));
        }

        let class_form = entries.iter().all(|(field, _)| is_identifier(field));
        if class_form {
            let mut text = format!("class {}(TypedDict):", name);
            if let Some(doc) = &metadata.class_doc {
                text.push_str(&format!("\n    \"\"\"{}\"\"\"", doc));
                if !fields.is_empty() {
                    text.push('\n');
                }
            }
            for (field, type_text, doc) in &fields {
                text.push_str(&format!("\n    {}: {}", field, type_text));
                if let Some(doc) = doc {
                    text.push_str(&format!("\n    \"\"\"{}\"\"\"", doc));
                }
            }
            if fields.is_empty() && metadata.class_doc.is_none() {
                text.push_str("\n    pass");
            }
            Declaration {
                text,
                is_class: true,
            }
        } else {
            // Documentation cannot attach to functional-form fields.
            let items: Vec<String> = fields
                .iter()
                .map(|(field, type_text, _)| format!("\"{}\": {}", field, type_text))
                .collect();
            Declaration {
                text: format!("{} = TypedDict(\"{}\", {{{}}})", name, name, items.join(", ")),
                is_class: false,
            }
        }
    }

    /// A structural callable declaration: a `Protocol` whose single
    /// `__call__` copies the introspected parameter list verbatim.
    fn protocol_declaration(
        &mut self,
        id: NodeId,
        params: &[Param],
        returns: &ReturnHint,
    ) -> Declaration {
        self.imports.add(Symbol::Protocol);
        if matches!(returns, ReturnHint::Unannotated) {
            self.imports.add(Symbol::Any);
        }
        let name = &self.tree.node(id).name;
        let mut signature = String::from("self");
        for param in params {
            signature.push_str(", ");
            signature.push_str(&param.name);
            if let Some(annotation) = &param.annotation {
                signature.push_str(": ");
                signature.push_str(annotation);
            }
        }
        Declaration {
            text: format!(
                "class {}(Protocol):\n    def __call__({}) -> {}: ...",
                name,
                signature,
                return_text(returns)
            ),
            is_class: true,
        }
    }

    /// A generated frame subclass exposing one overloaded `__getitem__`
    /// signature per column literal.
    fn frame_declaration(&mut self, id: NodeId, columns: &[(String, String)]) -> Declaration {
        self.imports.add(Symbol::Pandas);
        self.imports.add(Symbol::Literal);
        self.imports.add(Symbol::Overload);
        let name = &self.tree.node(id).name;
        let mut text = format!("class {}(pd.DataFrame):", name);
        for (literal, dtype) in columns {
            text.push_str(&format!(
                "\n    @overload\n    def __getitem__(self, key: Literal[{}]) -> \"pd.Series[{}]\": ...",
                literal, dtype
            ));
        }
        text.push_str("\n    def __getitem__(self, key): ...");
        Declaration {
            text,
            is_class: true,
        }
    }
}
