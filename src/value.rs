//! The runtime value model the classifier inspects.
//!
//! [`Value`] is a snapshot of one in-memory Python value: nested combinations
//! of mappings, sequences, sets, tuples, scalars, callables, type objects,
//! tabular frames, and opaque instances of unregistered classes. Tree
//! construction never mutates the value it was given.
//!
//! JSON ingestion is provided via `From<serde_json::Value>`, matching the
//! hand-off contract of file-reading front ends: they parse text, optionally
//! inject hidden documentation keys, and deliver a plain value.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// A snapshot of one runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Python `None`.
    None,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    Str(String),
    /// A `range` object. Its endpoints do not affect the declared type.
    Range,
    /// A `slice` object.
    Slice,
    /// A list.
    List(Vec<Value>),
    /// A fixed-arity tuple.
    Tuple(Vec<Value>),
    /// A set.
    Set(Vec<Value>),
    /// A frozenset.
    FrozenSet(Vec<Value>),
    /// An iterator, pre-drained into the elements that were observed.
    Iterator(Vec<Value>),
    /// A mapping, with its runtime flavor and insertion-ordered entries.
    Dict(Mapping),
    /// A callable, described by whatever signature introspection recovered.
    Function(FunctionInfo),
    /// A type object (a class used as a value).
    Type(TypeObject),
    /// A tabular data frame described by its columns.
    Frame(FrameInfo),
    /// An instance of an unregistered class. The universal classification
    /// fallback; rendered as a quoted forward reference.
    Instance(InstanceInfo),
}

/// The runtime flavor of a mapping value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFlavor {
    /// A plain `dict`.
    Plain,
    /// A read-only `mappingproxy`.
    Proxy,
    /// Some other `Mapping` implementation.
    Abstract,
}

/// A mapping value: flavor plus insertion-ordered entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub flavor: MappingFlavor,
    pub entries: IndexMap<MapKey, Value>,
}

impl Mapping {
    /// Create a plain-dict mapping from an ordered list of entries.
    pub fn plain<K: Into<MapKey>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Mapping {
            flavor: MappingFlavor::Plain,
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Replace the mapping flavor.
    pub fn with_flavor(mut self, flavor: MappingFlavor) -> Self {
        self.flavor = flavor;
        self
    }
}

/// A hashable mapping key.
///
/// Float keys are kept bit-exact so they stay hashable; only the key's
/// *type* ever reaches the rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    None,
    Bool(bool),
    Int(i64),
    Float(FloatKey),
    Str(String),
    Tuple(Vec<MapKey>),
}

impl MapKey {
    /// The Python type expression for this key, as it appears in a
    /// `Dict[K, V]` alias.
    pub fn type_expr(&self) -> &'static str {
        match self {
            MapKey::None => "None",
            MapKey::Bool(_) => "bool",
            MapKey::Int(_) => "int",
            MapKey::Float(_) => "float",
            MapKey::Str(_) => "str",
            MapKey::Tuple(_) => "Tuple[Any, ...]",
        }
    }

    /// The string payload, when this is a string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MapKey::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::Str(s.to_string())
    }
}

impl From<String> for MapKey {
    fn from(s: String) -> Self {
        MapKey::Str(s)
    }
}

impl From<i64> for MapKey {
    fn from(i: i64) -> Self {
        MapKey::Int(i)
    }
}

/// A float usable as a hash key, stored by its bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatKey(u64);

impl From<f64> for FloatKey {
    fn from(f: f64) -> Self {
        FloatKey(f.to_bits())
    }
}

impl FloatKey {
    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// What signature introspection recovered for a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionKind {
    /// An anonymous/lambda-like callable; only its arity is known.
    Lambda,
    /// A callable with a fully introspected signature.
    Inspectable,
    /// A builtin or native callable whose signature cannot be introspected.
    Opaque,
}

/// Introspected description of a callable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub kind: FunctionKind,
    pub params: Vec<Param>,
    pub returns: ReturnHint,
}

impl FunctionInfo {
    /// A lambda-like callable taking `arity` positional arguments.
    pub fn lambda(arity: usize) -> Self {
        FunctionInfo {
            kind: FunctionKind::Lambda,
            params: (0..arity)
                .map(|i| Param {
                    name: format!("_{}", i),
                    annotation: None,
                })
                .collect(),
            returns: ReturnHint::Unannotated,
        }
    }

    /// A builtin/native callable with no recoverable signature.
    pub fn opaque() -> Self {
        FunctionInfo {
            kind: FunctionKind::Opaque,
            params: Vec::new(),
            returns: ReturnHint::Unannotated,
        }
    }

    /// A callable with an introspected parameter list and return hint.
    pub fn inspected(params: Vec<Param>, returns: ReturnHint) -> Self {
        FunctionInfo {
            kind: FunctionKind::Inspectable,
            params,
            returns,
        }
    }
}

/// One introspected parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    /// The annotation source text, when the parameter carried one.
    pub annotation: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            annotation: None,
        }
    }

    pub fn annotated(name: impl Into<String>, annotation: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            annotation: Some(annotation.into()),
        }
    }
}

/// What introspection found about a callable's return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnHint {
    /// No return statement in the source: the callable returns `None`.
    Absent,
    /// A return exists but carries no annotation: rendered as `Any`.
    Unannotated,
    /// The annotation source text.
    Annotated(String),
}

/// A type object: a class appearing as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeObject {
    /// The class name, e.g. `"str"` or `"MyModel"`.
    pub name: String,
    /// Builtin classes render unquoted; everything else becomes a quoted
    /// forward reference.
    pub is_builtin: bool,
}

impl TypeObject {
    pub fn builtin(name: impl Into<String>) -> Self {
        TypeObject {
            name: name.into(),
            is_builtin: true,
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        TypeObject {
            name: name.into(),
            is_builtin: false,
        }
    }
}

/// A tabular frame described by its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    pub columns: Vec<FrameColumn>,
}

/// One frame column: its key and the element type of its series.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameColumn {
    pub key: MapKey,
    /// Element type expression for the column's series, e.g. `"int"`.
    pub dtype: String,
}

impl FrameColumn {
    pub fn new(key: impl Into<MapKey>, dtype: impl Into<String>) -> Self {
        FrameColumn {
            key: key.into(),
            dtype: dtype.into(),
        }
    }
}

/// An instance of a class with no dedicated node kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub class_name: String,
}

impl InstanceInfo {
    pub fn new(class_name: impl Into<String>) -> Self {
        InstanceInfo {
            class_name: class_name.into(),
        }
    }
}

impl Value {
    /// Convenience constructor for string values.
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Convenience constructor for a plain dict with string keys.
    pub fn dict<K: Into<MapKey>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Dict(Mapping::plain(entries))
    }

    /// The Python type name of this value, used to derive child declaration
    /// names (`parent.name` + capitalized type name).
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Range => "range",
            Value::Slice => "slice",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::FrozenSet(_) => "frozenset",
            Value::Iterator(_) => "iterator",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::Type(_) => "type",
            Value::Frame(_) => "DataFrame",
            Value::Instance(info) => &info.class_name,
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::None,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::Str(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => Value::Dict(Mapping {
                flavor: MappingFlavor::Plain,
                entries: map
                    .into_iter()
                    .map(|(k, v)| (MapKey::Str(k), Value::from(v)))
                    .collect(),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod json_ingestion {
        use super::*;

        #[test]
        fn scalars_map_to_leaf_values() {
            assert_eq!(Value::from(serde_json::json!(null)), Value::None);
            assert_eq!(Value::from(serde_json::json!(true)), Value::Bool(true));
            assert_eq!(Value::from(serde_json::json!(7)), Value::Int(7));
            assert_eq!(Value::from(serde_json::json!(1.5)), Value::Float(1.5));
            assert_eq!(Value::from(serde_json::json!("x")), Value::str("x"));
        }

        #[test]
        fn objects_preserve_key_order() {
            let v = Value::from(serde_json::json!({"b": 1, "a": 2}));
            let Value::Dict(mapping) = v else {
                panic!("expected dict");
            };
            let keys: Vec<_> = mapping.entries.keys().cloned().collect();
            assert_eq!(keys, vec![MapKey::from("b"), MapKey::from("a")]);
        }

        #[test]
        fn arrays_become_lists() {
            let v = Value::from(serde_json::json!([1, "a"]));
            assert_eq!(v, Value::List(vec![Value::Int(1), Value::str("a")]));
        }
    }

    mod map_keys {
        use super::*;

        #[test]
        fn key_type_expressions() {
            assert_eq!(MapKey::from("k").type_expr(), "str");
            assert_eq!(MapKey::Int(1).type_expr(), "int");
            assert_eq!(MapKey::None.type_expr(), "None");
            assert_eq!(
                MapKey::Tuple(vec![MapKey::Int(1), MapKey::Int(2)]).type_expr(),
                "Tuple[Any, ...]"
            );
        }

        #[test]
        fn float_keys_are_hashable_and_exact() {
            let k = MapKey::Float(FloatKey::from(0.5));
            assert_eq!(k, MapKey::Float(FloatKey::from(0.5)));
            if let MapKey::Float(f) = k {
                assert_eq!(f.value(), 0.5);
            }
        }
    }

    #[test]
    fn type_names_drive_child_naming() {
        assert_eq!(Value::List(vec![]).type_name(), "list");
        assert_eq!(Value::Instance(InstanceInfo::new("MyClass")).type_name(), "MyClass");
        assert_eq!(Value::Frame(FrameInfo { columns: vec![] }).type_name(), "DataFrame");
    }
}
