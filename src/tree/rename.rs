//! Renaming a finished tree.
//!
//! Descendant names embed the root name as a prefix; renaming the root
//! splices the new name onto that prefix everywhere, leaving the
//! type-derived suffixes intact.

use crate::error::LiftResult;
use crate::python::validate_identifier;

use super::TypeTree;

impl TypeTree {
    /// Rename the root and propagate the change to every descendant whose
    /// name starts with the old root name.
    ///
    /// Only the prefix is spliced; no other substring of any name changes.
    /// Fails if `new_name` is not a valid identifier.
    pub fn rename(&mut self, new_name: impl Into<String>) -> LiftResult<()> {
        let new_name = new_name.into();
        validate_identifier(&new_name)?;
        let old_name = self.node(self.root).name.clone();
        if old_name == new_name {
            return Ok(());
        }
        let root_index = self.root.index();
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if index == root_index {
                node.name = new_name.clone();
            } else if let Some(suffix) = node.name.strip_prefix(old_name.as_str()) {
                node.name = format!("{}{}", new_name, suffix);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
