//! Rendering strategies: the immutable configuration record shared by every
//! node in one tree.
//!
//! A [`Strategies`] value is validated at construction; numeric fields
//! outside their allowed range are rejected with a descriptive error, never
//! silently clamped. The record is `Serialize`/`Deserialize` so callers can
//! load it from configuration files, but configuration *loading* itself is
//! out of scope here.

use serde::{Deserialize, Serialize};

use crate::error::{LiftError, LiftResult};

/// How list-like containers render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStyle {
    /// `List[...]`
    #[default]
    List,
    /// Read-only `Sequence[...]`
    Sequence,
}

/// How tuples render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TupleStyle {
    /// One type per position: `Tuple[t0, t1]`.
    #[default]
    Fixed,
    /// Arbitrary length of a single union: `Tuple[t, ...]`.
    AnySize,
}

/// How mapping-like containers render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStyle {
    /// A record with one named field per string key (`TypedDict`). Mappings
    /// with non-string keys fall back to a plain keyed alias.
    #[default]
    TypedDict,
    /// A plain `Dict[K, V]` alias.
    Dict,
    /// A read-only `Mapping[K, V]` alias.
    Mapping,
}

/// Default minimum subtree height a child needs before it is granted its
/// own named alias rather than being inlined.
pub const DEFAULT_MIN_HEIGHT_FOR_ALIAS: u32 = 3;

/// Default similarity percentage above which same-shape record children in
/// one container fuse into a single declaration.
pub const DEFAULT_MERGE_SIMILARITY_PERCENT: u8 = 80;

/// Default cap on how many elements of one container are sampled during
/// classification.
pub const DEFAULT_MAX_SAMPLED_ELEMENTS: usize = 400;

/// The frozen set of rendering choices shared by every node in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategies {
    /// How list-like containers render.
    pub sequence_style: SequenceStyle,
    /// How tuples render.
    pub tuple_style: TupleStyle,
    /// How mapping-like containers render.
    pub mapping_style: MappingStyle,
    /// Minimum subtree height below which a child is inlined rather than
    /// given its own named alias. A child qualifies for an alias only when
    /// its height *strictly* exceeds this value.
    pub min_height_for_alias: u32,
    /// Similarity percentage (1–100) at or above which record-style
    /// children inside one container are fused into a single declaration.
    pub merge_similarity_percent: u8,
    /// Render record fields as `ReadOnly[...]`.
    pub read_only_fields: bool,
    /// Cap on how many elements of a huge container are inspected before
    /// classification stops sampling. Beyond the cap the produced type is
    /// best-effort, not exhaustive. `None` disables the cap.
    pub max_sampled_elements: Option<usize>,
}

impl Default for Strategies {
    fn default() -> Self {
        Strategies {
            sequence_style: SequenceStyle::default(),
            tuple_style: TupleStyle::default(),
            mapping_style: MappingStyle::default(),
            min_height_for_alias: DEFAULT_MIN_HEIGHT_FOR_ALIAS,
            merge_similarity_percent: DEFAULT_MERGE_SIMILARITY_PERCENT,
            read_only_fields: false,
            max_sampled_elements: Some(DEFAULT_MAX_SAMPLED_ELEMENTS),
        }
    }
}

impl Strategies {
    /// Set the sequence rendering style.
    pub fn with_sequence_style(mut self, style: SequenceStyle) -> Self {
        self.sequence_style = style;
        self
    }

    /// Set the tuple rendering style.
    pub fn with_tuple_style(mut self, style: TupleStyle) -> Self {
        self.tuple_style = style;
        self
    }

    /// Set the mapping rendering style.
    pub fn with_mapping_style(mut self, style: MappingStyle) -> Self {
        self.mapping_style = style;
        self
    }

    /// Set the minimum height a child needs to earn its own alias.
    pub fn with_min_height_for_alias(mut self, height: u32) -> Self {
        self.min_height_for_alias = height;
        self
    }

    /// Set the record-merge similarity threshold. Must be in `1..=100`.
    pub fn with_merge_similarity_percent(mut self, percent: u8) -> LiftResult<Self> {
        if !(1..=100).contains(&percent) {
            return Err(LiftError::InvalidStrategy {
                field: "merge_similarity_percent",
                message: format!("must be between 1 and 100, got {}", percent),
            });
        }
        self.merge_similarity_percent = percent;
        Ok(self)
    }

    /// Render record fields as `ReadOnly[...]`.
    pub fn with_read_only_fields(mut self, read_only: bool) -> Self {
        self.read_only_fields = read_only;
        self
    }

    /// Set (or disable, with `None`) the container sampling cap. A cap of
    /// zero would sample nothing and is rejected.
    pub fn with_max_sampled_elements(mut self, cap: Option<usize>) -> LiftResult<Self> {
        if cap == Some(0) {
            return Err(LiftError::InvalidStrategy {
                field: "max_sampled_elements",
                message: "cap must be at least 1 (use None to disable)".to_string(),
            });
        }
        self.max_sampled_elements = cap;
        Ok(self)
    }

    /// Validate every field against its allowed set.
    ///
    /// `with_*` setters already validate on the way in; this entry point is
    /// for records that arrived through deserialization.
    pub fn validate(&self) -> LiftResult<()> {
        if !(1..=100).contains(&self.merge_similarity_percent) {
            return Err(LiftError::InvalidStrategy {
                field: "merge_similarity_percent",
                message: format!(
                    "must be between 1 and 100, got {}",
                    self.merge_similarity_percent
                ),
            });
        }
        if self.max_sampled_elements == Some(0) {
            return Err(LiftError::InvalidStrategy {
                field: "max_sampled_elements",
                message: "cap must be at least 1 (use None to disable)".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Strategies::default().validate().is_ok());
    }

    #[test]
    fn similarity_threshold_bounds() {
        assert!(Strategies::default().with_merge_similarity_percent(1).is_ok());
        assert!(Strategies::default().with_merge_similarity_percent(100).is_ok());
        assert!(Strategies::default().with_merge_similarity_percent(0).is_err());
        assert!(Strategies::default().with_merge_similarity_percent(101).is_err());
    }

    #[test]
    fn zero_sampling_cap_is_rejected_not_clamped() {
        let err = Strategies::default()
            .with_max_sampled_elements(Some(0))
            .unwrap_err();
        assert!(matches!(
            err,
            LiftError::InvalidStrategy {
                field: "max_sampled_elements",
                ..
            }
        ));
    }

    #[test]
    fn disabled_cap_is_allowed() {
        let s = Strategies::default().with_max_sampled_elements(None).unwrap();
        assert_eq!(s.max_sampled_elements, None);
    }

    #[test]
    fn deserialized_records_can_be_revalidated() {
        let json = r#"{
            "sequence_style": "sequence",
            "tuple_style": "any_size",
            "mapping_style": "typed_dict",
            "min_height_for_alias": 2,
            "merge_similarity_percent": 120,
            "read_only_fields": false,
            "max_sampled_elements": 10
        }"#;
        let s: Strategies = serde_json::from_str(json).unwrap();
        assert!(s.validate().is_err());
    }
}
