//! Python language utilities: identifier validation and the hidden
//! documentation-key contract.
//!
//! Generated declaration names must be legal Python identifiers; this module
//! owns that check plus the keyword table it depends on. It also defines the
//! marker strings used by comment-extraction front ends to smuggle
//! documentation alongside real mapping keys (see [`doc_target`]).

use crate::error::{LiftError, LiftResult};

/// Python keywords that cannot be used as identifiers.
pub const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
];

/// Prefix marking a hidden documentation key injected by a comment-extraction
/// front end. `__doc_<key>` carries the documentation for sibling key `<key>`.
pub const DOC_KEY_PREFIX: &str = "__doc_";

/// Hidden key whose value documents the enclosing record itself rather than
/// any one field.
pub const SELF_DOC_KEY: &str = "__doc__";

/// What a hidden documentation key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocTarget<'a> {
    /// Documents the enclosing record (rendered as the class docstring).
    Record,
    /// Documents the named sibling field.
    Field(&'a str),
}

/// Classify a mapping key as a hidden documentation key, if it is one.
///
/// Returns `None` for ordinary keys. Hidden keys never appear in rendered
/// fields or structural hashes.
pub fn doc_target(key: &str) -> Option<DocTarget<'_>> {
    if key == SELF_DOC_KEY {
        return Some(DocTarget::Record);
    }
    key.strip_prefix(DOC_KEY_PREFIX).map(DocTarget::Field)
}

/// Check if a name is a Python keyword.
pub fn is_python_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}

/// Check whether a string is a valid Python identifier.
pub fn is_identifier(name: &str) -> bool {
    validate_identifier(name).is_ok()
}

/// Validate that a string can serve as a Python declaration name.
///
/// Checks:
/// - Non-empty
/// - Starts with letter or underscore
/// - Contains only alphanumeric characters and underscores
/// - Not a Python keyword
pub fn validate_identifier(name: &str) -> LiftResult<()> {
    if name.is_empty() {
        return Err(LiftError::InvalidName {
            name: name.to_string(),
            reason: "name cannot be empty".to_string(),
        });
    }

    let first = name.chars().next().unwrap_or('\0');
    if !first.is_alphabetic() && first != '_' {
        return Err(LiftError::InvalidName {
            name: name.to_string(),
            reason: "must start with letter or underscore".to_string(),
        });
    }

    for ch in name.chars().skip(1) {
        if !ch.is_alphanumeric() && ch != '_' {
            return Err(LiftError::InvalidName {
                name: name.to_string(),
                reason: format!("invalid character: '{}'", ch),
            });
        }
    }

    if is_python_keyword(name) {
        return Err(LiftError::InvalidName {
            name: name.to_string(),
            reason: "cannot use Python keyword as identifier".to_string(),
        });
    }

    Ok(())
}

/// Capitalize the first character of a string, leaving the rest intact.
///
/// Used to derive child declaration names (`parent.name` + capitalized
/// type suffix).
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reduce an arbitrary mapping key to an identifier-safe class-name fragment.
///
/// Strips every character that cannot appear in an identifier and leading
/// digits, then capitalizes. Falls back to `"Key"` when nothing survives, so
/// derived names stay valid even for fully non-identifier keys.
pub(crate) fn class_fragment(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .skip_while(|c| c.is_ascii_digit())
        .collect();
    if cleaned.is_empty() {
        "Key".to_string()
    } else {
        capitalize(&cleaned)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod identifiers {
        use super::*;

        #[test]
        fn simple_names_are_valid() {
            assert!(validate_identifier("foo").is_ok());
            assert!(validate_identifier("_private").is_ok());
            assert!(validate_identifier("CamelCase").is_ok());
            assert!(validate_identifier("snake_case").is_ok());
        }

        #[test]
        fn empty_name_is_invalid() {
            assert!(validate_identifier("").is_err());
        }

        #[test]
        fn leading_digit_is_invalid() {
            assert!(validate_identifier("123foo").is_err());
        }

        #[test]
        fn punctuation_is_invalid() {
            assert!(validate_identifier("my-name").is_err());
            assert!(validate_identifier("a b").is_err());
        }

        #[test]
        fn keywords_are_invalid() {
            assert!(validate_identifier("class").is_err());
            assert!(validate_identifier("lambda").is_err());
            assert!(is_python_keyword("yield"));
            assert!(!is_python_keyword("yielded"));
        }

        #[test]
        fn unicode_letters_are_valid() {
            assert!(validate_identifier("números").is_ok());
        }
    }

    mod doc_keys {
        use super::*;

        #[test]
        fn self_doc_key_targets_record() {
            assert_eq!(doc_target("__doc__"), Some(DocTarget::Record));
        }

        #[test]
        fn prefixed_key_targets_field() {
            assert_eq!(doc_target("__doc_age"), Some(DocTarget::Field("age")));
        }

        #[test]
        fn plain_keys_are_not_hidden() {
            assert_eq!(doc_target("age"), None);
            assert_eq!(doc_target("doc"), None);
        }
    }

    mod name_fragments {
        use super::*;

        #[test]
        fn capitalizes_first_character() {
            assert_eq!(capitalize("int"), "Int");
            assert_eq!(capitalize("frozenset"), "Frozenset");
            assert_eq!(capitalize(""), "");
        }

        #[test]
        fn fragment_strips_invalid_characters() {
            assert_eq!(class_fragment("my-field"), "Myfield");
            assert_eq!(class_fragment("first name"), "Firstname");
        }

        #[test]
        fn fragment_strips_leading_digits() {
            assert_eq!(class_fragment("2nd"), "Nd");
        }

        #[test]
        fn fragment_falls_back_for_empty_result() {
            assert_eq!(class_fragment("---"), "Key");
            assert_eq!(class_fragment("123"), "Key");
        }
    }
}
