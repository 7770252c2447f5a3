//! Rendering contract details: declaration forms, alias granting,
//! canonical-name deduplication, documentation keys, and formatting.

use typelift::{
    MapKey, Mapping, MappingFlavor, MappingStyle, Strategies, TypeTree, Value,
};

fn build(value: &Value) -> TypeTree {
    TypeTree::from_value(value, "Example", &Strategies::default()).unwrap()
}

// ============================================================================
// Declaration forms
// ============================================================================

#[test]
fn hidden_doc_keys_become_docstrings() {
    let value = Value::dict([
        ("__doc__", Value::str("Top level.")),
        ("name", Value::str("Joan")),
        ("__doc_name", Value::str("Display name.")),
    ]);
    assert_eq!(
        build(&value).render().unwrap(),
        "from typing import TypedDict\n\
         \n\
         \n\
         class Example(TypedDict):\n\
         \x20   \"\"\"Top level.\"\"\"\n\
         \n\
         \x20   name: str\n\
         \x20   \"\"\"Display name.\"\"\"\n"
    );
}

#[test]
fn doc_only_mappings_degrade_to_plain_dicts() {
    let value = Value::dict([("__doc__", Value::str("Nothing visible."))]);
    assert_eq!(
        build(&value).render().unwrap(),
        "from typing import Any, Dict\n\nExample = Dict[Any, Any]\n"
    );
}

#[test]
fn non_identifier_keys_use_the_functional_form() {
    let value = Value::dict([("my-key", Value::str("v"))]);
    assert_eq!(
        build(&value).render().unwrap(),
        "from typing import TypedDict\n\nExample = TypedDict(\"Example\", {\"my-key\": str})\n"
    );
}

#[test]
fn read_only_fields_wrap_field_types() {
    let strategies = Strategies::default().with_read_only_fields(true);
    let value = Value::dict([("name", Value::str("Joan"))]);
    let text = TypeTree::from_value(&value, "Example", &strategies)
        .unwrap()
        .render()
        .unwrap();
    assert!(text.contains("    name: ReadOnly[str]\n"));
    assert!(text.contains("from typing_extensions import ReadOnly"));
}

#[test]
fn abstract_mappings_render_mapping_regardless_of_style() {
    let mapping =
        Mapping::plain([("k", Value::Int(1))]).with_flavor(MappingFlavor::Abstract);
    let strategies = Strategies::default().with_mapping_style(MappingStyle::Dict);
    assert_eq!(
        TypeTree::from_value(&Value::Dict(mapping), "Example", &strategies)
            .unwrap()
            .render()
            .unwrap(),
        "from typing import Mapping\n\nExample = Mapping[str, int]\n"
    );
}

#[test]
fn mapping_style_renders_read_only_mappings() {
    let strategies = Strategies::default().with_mapping_style(MappingStyle::Mapping);
    let value = Value::dict([("k", Value::Int(1))]);
    assert_eq!(
        TypeTree::from_value(&value, "Example", &strategies)
            .unwrap()
            .render()
            .unwrap(),
        "from typing import Mapping\n\nExample = Mapping[str, int]\n"
    );
}

#[test]
fn frozen_sets_and_ranges_render_their_aliases() {
    assert_eq!(
        build(&Value::FrozenSet(vec![Value::Int(1)])).render().unwrap(),
        "from typing import FrozenSet\n\nExample = FrozenSet[int]\n"
    );
    assert_eq!(build(&Value::Range).render().unwrap(), "Example = range\n");
    assert_eq!(build(&Value::Slice).render().unwrap(), "Example = slice\n");
}

// ============================================================================
// Alias granting and deduplication
// ============================================================================

#[test]
fn tall_children_earn_their_own_aliases_in_dependency_order() {
    let strategies = Strategies::default().with_min_height_for_alias(1);
    let value = Value::List(vec![Value::List(vec![Value::List(vec![Value::Int(1)])])]);
    assert_eq!(
        TypeTree::from_value(&value, "Example", &strategies)
            .unwrap()
            .render()
            .unwrap(),
        "from typing import List\n\
         \n\
         ExampleList = List[List[int]]\n\
         Example = List[ExampleList]\n"
    );
}

#[test]
fn short_children_are_inlined() {
    let value = Value::List(vec![Value::List(vec![Value::Int(1)])]);
    assert_eq!(
        build(&value).render().unwrap(),
        "from typing import List\n\nExample = List[List[int]]\n"
    );
}

#[test]
fn identical_records_emit_once_under_the_canonical_name() {
    let value = Value::dict([
        ("a", Value::dict([("x", Value::Int(1))])),
        ("b", Value::dict([("x", Value::Int(2))])),
    ]);
    assert_eq!(
        build(&value).render().unwrap(),
        "from typing import TypedDict\n\
         \n\
         \n\
         class ExampleA(TypedDict):\n\
         \x20   x: int\n\
         \n\
         \n\
         class Example(TypedDict):\n\
         \x20   a: ExampleA\n\
         \x20   b: ExampleA\n"
    );
}

#[test]
fn record_elements_always_get_declarations() {
    let value = Value::List(vec![
        Value::Int(1),
        Value::str("x"),
        Value::dict([("k", Value::Bool(true))]),
    ]);
    let text = build(&value).render().unwrap();
    assert!(text.contains("class ExampleDict(TypedDict):\n    k: bool"));
    assert!(text.contains("Example = List[Union[ExampleDict, int, str]]"));
}

#[test]
fn declarations_can_render_without_imports() {
    let value = Value::List(vec![Value::Int(1)]);
    assert_eq!(
        build(&value).render_declarations().unwrap(),
        "Example = List[int]\n"
    );
}

// ============================================================================
// Tree accessors and input validation
// ============================================================================

#[test]
fn node_count_and_height_reflect_the_reachable_tree() {
    let tree = build(&Value::List(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.node_count(), 3);

    let leaf = build(&Value::Bool(true));
    assert_eq!(leaf.height(), 0);
    assert_eq!(leaf.node_count(), 1);
}

#[test]
fn merged_records_drop_out_of_the_reachable_count() {
    let value = Value::List(vec![
        Value::dict([("a", Value::Int(1))]),
        Value::dict([("a", Value::Int(2))]),
    ]);
    let tree = build(&value);
    // Root, the fused record, and its single field child.
    assert_eq!(tree.node_count(), 3);
}

#[test]
fn root_names_must_be_identifiers() {
    let strategies = Strategies::default();
    assert!(TypeTree::from_value(&Value::Int(1), "2bad", &strategies).is_err());
    assert!(TypeTree::from_value(&Value::Int(1), "has space", &strategies).is_err());
    assert!(TypeTree::from_value(&Value::Int(1), "class", &strategies).is_err());
    assert!(TypeTree::from_value(&Value::Int(1), "", &strategies).is_err());
}

#[test]
fn invalid_strategies_are_rejected_at_construction() {
    let mut strategies = Strategies::default();
    strategies.merge_similarity_percent = 0;
    assert!(TypeTree::from_value(&Value::Int(1), "Example", &strategies).is_err());
}

#[test]
fn non_string_key_records_fall_back_even_under_typed_dict_style() {
    let value = Value::Dict(Mapping::plain([
        (MapKey::Int(1), Value::str("a")),
        (MapKey::Int(2), Value::str("b")),
    ]));
    assert_eq!(
        build(&value).render().unwrap(),
        "from typing import Dict\n\nExample = Dict[int, str]\n"
    );
}
