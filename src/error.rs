//! Error types for typelift.
//!
//! This module provides a unified error type ([`LiftError`]) covering every
//! failure the tree builder and renderer can surface. All errors are raised
//! synchronously at the point of detection; there is no retry or
//! partial-success mode — either a whole tree (and its rendered text) is
//! produced, or construction fails outright.

use thiserror::Error;

/// Unified error type for tree construction and rendering.
///
/// Classification gaps are deliberately *not* errors: a value with no
/// dedicated node kind degrades to a forward-referenced unknown-class leaf,
/// and an uninspectable callable degrades to an untyped `Callable` alias.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiftError {
    /// A declaration name is not a valid Python identifier.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A node kind was asked to wrap a value it does not accept.
    ///
    /// The classifier dispatches on the concrete value shape, so hitting
    /// this during construction indicates a programming error, not bad
    /// runtime input.
    #[error("value of type '{value_type}' cannot be represented as a {kind} node")]
    KindMismatch {
        kind: &'static str,
        value_type: String,
    },

    /// A strategy field was given a value outside its allowed set.
    ///
    /// Invalid values are rejected at construction, never silently clamped.
    #[error("invalid strategy value for '{field}': {message}")]
    InvalidStrategy {
        field: &'static str,
        message: String,
    },

    /// Rendering produced no top-level declarations.
    ///
    /// A type-hint module with nothing in it is meaningless, so an empty
    /// render result is fatal rather than an empty string.
    #[error("nothing to render: the tree produced no top-level declarations")]
    NothingToRender,
}

/// Result type for typelift operations.
pub type LiftResult<T> = Result<T, LiftError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = LiftError::InvalidName {
            name: "2fast".to_string(),
            reason: "must start with letter or underscore".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid name '2fast': must start with letter or underscore"
        );
    }

    #[test]
    fn nothing_to_render_is_stable_text() {
        assert!(LiftError::NothingToRender.to_string().contains("nothing to render"));
    }
}
