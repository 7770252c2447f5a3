//! typelift: Python type declarations from runtime data shapes.
//!
//! Give it a snapshot of one in-memory value — nested mappings, sequences,
//! sets, tuples, scalars, callables, tabular frames — and it builds a tree
//! of declarative type descriptions mirroring the value's shape, then
//! renders that tree as a type-declaration module a static checker can
//! consume: `TypedDict` records, type aliases, structural `Protocol`s, and
//! the imports they need.
//!
//! ```
//! use typelift::{Strategies, TypeTree, Value};
//!
//! let value = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
//! let tree = TypeTree::from_value(&value, "Example", &Strategies::default()).unwrap();
//! let text = tree.render().unwrap();
//! assert_eq!(text, "from typing import List\n\nExample = List[int]\n");
//! ```
//!
//! Construction is a pure, single-threaded, in-memory computation: no I/O,
//! no retries, no partial success. File reading, comment extraction, and
//! persistence of the rendered text are caller concerns; the library only
//! honors their contracts (a plain [`Value`], hidden documentation keys,
//! a rendered string out).

pub mod error;
pub mod imports;
pub mod python;
pub mod strategies;
pub mod tree;
pub mod value;

pub use error::{LiftError, LiftResult};
pub use imports::{ImportSet, Symbol, DEFAULT_LINE_WIDTH};
pub use strategies::{MappingStyle, SequenceStyle, Strategies, TupleStyle};
pub use tree::{DictMetadata, FieldMeta, TypeTree};
pub use value::{
    FloatKey, FrameColumn, FrameInfo, FunctionInfo, FunctionKind, InstanceInfo, MapKey, Mapping,
    MappingFlavor, Param, ReturnHint, TypeObject, Value,
};
