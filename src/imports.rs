//! Accumulating set of typing symbols referenced while rendering a tree.
//!
//! Every node that needs a typing construct (`Union`, `Any`, `TypedDict`,
//! ...) registers it here; the set is rendered once at the end into grouped
//! import statements, one `from <module> import ...` line per originating
//! module, modules ordered alphabetically by path. Import lists that exceed
//! the line-length threshold wrap into a parenthesized multi-line form.

use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Default maximum line width before an import list wraps.
pub const DEFAULT_LINE_WIDTH: usize = 88;

/// A typing symbol a rendered declaration can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    // typing
    Any,
    Callable,
    Dict,
    FrozenSet,
    Iterator,
    List,
    Literal,
    Mapping,
    Optional,
    Overload,
    Protocol,
    Sequence,
    Set,
    Tuple,
    Type,
    TypedDict,
    Union,
    // typing_extensions
    NotRequired,
    ReadOnly,
    // types
    MappingProxyType,
    // pandas (module import, aliased)
    Pandas,
}

impl Symbol {
    /// The module this symbol is imported from.
    pub fn module(&self) -> &'static str {
        match self {
            Symbol::NotRequired | Symbol::ReadOnly => "typing_extensions",
            Symbol::MappingProxyType => "types",
            Symbol::Pandas => "pandas",
            _ => "typing",
        }
    }

    /// The imported name as it appears in source.
    pub fn name(&self) -> &'static str {
        match self {
            Symbol::Any => "Any",
            Symbol::Callable => "Callable",
            Symbol::Dict => "Dict",
            Symbol::FrozenSet => "FrozenSet",
            Symbol::Iterator => "Iterator",
            Symbol::List => "List",
            Symbol::Literal => "Literal",
            Symbol::Mapping => "Mapping",
            Symbol::Optional => "Optional",
            Symbol::Overload => "overload",
            Symbol::Protocol => "Protocol",
            Symbol::Sequence => "Sequence",
            Symbol::Set => "Set",
            Symbol::Tuple => "Tuple",
            Symbol::Type => "Type",
            Symbol::TypedDict => "TypedDict",
            Symbol::Union => "Union",
            Symbol::NotRequired => "NotRequired",
            Symbol::ReadOnly => "ReadOnly",
            Symbol::MappingProxyType => "MappingProxyType",
            Symbol::Pandas => "pandas",
        }
    }
}

/// The order-independent set of symbols one render pass accumulated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    symbols: BTreeSet<Symbol>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one referenced symbol. Repeated registration is a no-op.
    pub fn add(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol);
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Render the grouped import statements, one group per module,
    /// alphabetical by module path, names sorted within each group.
    ///
    /// The returned text ends with a trailing newline when non-empty.
    pub fn render(&self, line_width: usize) -> String {
        let mut by_module: Vec<(&'static str, Vec<&'static str>)> = Vec::new();
        let mut module_import = false;
        for symbol in &self.symbols {
            if *symbol == Symbol::Pandas {
                module_import = true;
                continue;
            }
            let module = symbol.module();
            match by_module.iter_mut().find(|(m, _)| *m == module) {
                Some((_, names)) => names.push(symbol.name()),
                None => by_module.push((module, vec![symbol.name()])),
            }
        }
        by_module.sort_by_key(|(m, _)| *m);

        let mut out = String::new();
        if module_import {
            out.push_str("import pandas as pd\n");
        }
        for (module, mut names) in by_module {
            names.sort_unstable();
            let flat = format!("from {} import {}", module, names.join(", "));
            if flat.len() <= line_width {
                out.push_str(&flat);
                out.push('\n');
            } else {
                let _ = writeln!(out, "from {} import (", module);
                for name in names {
                    let _ = writeln!(out, "    {},", name);
                }
                out.push_str(")\n");
            }
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_renders_nothing() {
        assert_eq!(ImportSet::new().render(DEFAULT_LINE_WIDTH), "");
    }

    #[test]
    fn single_symbol_renders_one_line() {
        let mut imports = ImportSet::new();
        imports.add(Symbol::List);
        assert_eq!(
            imports.render(DEFAULT_LINE_WIDTH),
            "from typing import List\n"
        );
    }

    #[test]
    fn registration_is_order_independent_and_deduplicated() {
        let mut a = ImportSet::new();
        a.add(Symbol::Union);
        a.add(Symbol::Any);
        a.add(Symbol::Union);
        let mut b = ImportSet::new();
        b.add(Symbol::Any);
        b.add(Symbol::Union);
        assert_eq!(a, b);
        assert_eq!(
            a.render(DEFAULT_LINE_WIDTH),
            "from typing import Any, Union\n"
        );
    }

    #[test]
    fn modules_are_grouped_and_alphabetical() {
        let mut imports = ImportSet::new();
        imports.add(Symbol::TypedDict);
        imports.add(Symbol::NotRequired);
        imports.add(Symbol::MappingProxyType);
        assert_eq!(
            imports.render(DEFAULT_LINE_WIDTH),
            "from types import MappingProxyType\n\
             from typing import TypedDict\n\
             from typing_extensions import NotRequired\n"
        );
    }

    #[test]
    fn pandas_uses_a_module_import() {
        let mut imports = ImportSet::new();
        imports.add(Symbol::Pandas);
        imports.add(Symbol::Literal);
        assert_eq!(
            imports.render(DEFAULT_LINE_WIDTH),
            "import pandas as pd\nfrom typing import Literal\n"
        );
    }

    #[test]
    fn long_import_lists_wrap() {
        let mut imports = ImportSet::new();
        for symbol in [
            Symbol::Any,
            Symbol::Callable,
            Symbol::Dict,
            Symbol::FrozenSet,
            Symbol::List,
            Symbol::Optional,
            Symbol::Sequence,
            Symbol::Set,
            Symbol::Tuple,
            Symbol::TypedDict,
            Symbol::Union,
        ] {
            imports.add(symbol);
        }
        let text = imports.render(40);
        assert!(text.starts_with("from typing import (\n"));
        assert!(text.contains("    Any,\n"));
        assert!(text.trim_end().ends_with(")"));
    }
}
