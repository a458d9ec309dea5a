use pretty_assertions::assert_eq;
use proptest::prelude::*;
use schemaform_editor::{ChangeSet, CompoundField, EditorError, FieldState, reconcile};
use schemaform_runtime::{Runtime, SchemaformConfig, core_plugin};
use schemaform_types::{Node, NodeMap, ObjectNode};
use serde_json::{Map, Value, json};

fn runtime_with(nodes: NodeMap) -> Runtime {
    let core = core_plugin(&nodes);
    Runtime::new(nodes, SchemaformConfig::default())
        .with_plugin(core)
        .unwrap()
}

fn runtime() -> Runtime {
    runtime_with(NodeMap::new())
}

fn server() -> ObjectNode {
    ObjectNode::new()
        .with_property("name", Node::string())
        .with_property("port", Node::nullable(Node::integer()))
        .with_merged(
            ObjectNode::new()
                .with_property("host", Node::string())
                .with_property("zone", Node::string())
                .into(),
        )
        .with_additional_properties(Node::string())
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

// ── Key slices ───────────────────────────────────────────────────

#[test]
fn keys_split_into_three_slices() {
    let runtime = runtime();
    let field = CompoundField::new(
        server(),
        &runtime,
        Some(&json!({"name": "a", "host": "x", "extra": "y"})),
    );

    assert_eq!(field.direct_keys(), ["name", "port"]);
    assert_eq!(field.merged_keys(), ["host", "zone"]);
    assert_eq!(field.additional_keys(), vec!["extra".to_string()]);
    assert_eq!(field.direct_values(), object(json!({"name": "a"})));
    assert_eq!(field.merged_values(), object(json!({"host": "x"})));
    assert_eq!(field.additional_values(), object(json!({"extra": "y"})));
}

#[test]
fn merged_keys_follow_recursive_refs() {
    let mut nodes = NodeMap::new();
    nodes.insert(
        "Location".into(),
        ObjectNode::new().with_property("region", Node::string()).into(),
    );
    let runtime = runtime_with(nodes);
    let node = ObjectNode::new()
        .with_property("name", Node::string())
        .with_merged(Node::recursive_ref("Location"));

    let field = CompoundField::new(node, &runtime, Some(&json!({"name": "a", "region": "eu"})));
    assert_eq!(field.merged_keys(), ["region"]);
    assert!(field.additional_keys().is_empty());

    let merged = field.merged_fields(&runtime);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].value, object(json!({"region": "eu"})));
}

#[test]
fn direct_properties_shadow_merged_keys() {
    let runtime = runtime();
    let node = ObjectNode::new()
        .with_property("name", Node::string())
        .with_merged(
            ObjectNode::new()
                .with_property("name", Node::string())
                .with_property("host", Node::string())
                .into(),
        );
    let mut field = CompoundField::new(node, &runtime, Some(&json!({"name": "a"})));
    assert_eq!(field.merged_keys(), ["host"]);

    field.set_merged_fields(object(json!({"name": "b", "host": "h"})));
    assert_eq!(field.buffer().get("name"), Some(&json!("a")));
    assert_eq!(field.buffer().get("host"), Some(&json!("h")));
}

// ── Transitions ──────────────────────────────────────────────────

#[test]
fn merged_group_replacement_leaves_other_slices_alone() {
    let runtime = runtime();
    let node = ObjectNode::new()
        .with_property("name", Node::string())
        .with_merged(ObjectNode::new().with_property("host", Node::string()).into())
        .with_additional_properties(Node::string());
    let mut field = CompoundField::new(
        node,
        &runtime,
        Some(&json!({"name": "a", "host": "x", "extra": "y"})),
    );

    field.set_merged_fields(object(json!({"host": "z"})));
    assert_eq!(field.state(), FieldState::Dirty);

    let committed = field.commit(&runtime).unwrap();
    assert_eq!(
        serde_json::to_string(&committed).unwrap(),
        r#"{"name":"a","host":"z","extra":"y"}"#
    );
    assert_eq!(field.state(), FieldState::Clean);
    assert!(field.changes().is_empty());
}

#[test]
fn slice_replacement_keeps_surviving_keys_in_place() {
    let runtime = runtime();
    let mut field = CompoundField::new(
        server(),
        &runtime,
        Some(&json!({"host": "x", "name": "a", "zone": "z1", "old": "1", "keep": "2"})),
    );

    field.set_merged_fields(object(json!({"zone": "z2", "host": "y"})));
    field.set_additional_fields(object(json!({"new": "3", "keep": "4"})));

    let keys: Vec<&str> = field.buffer().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["host", "name", "zone", "keep", "new"]);
}

#[test]
fn merged_replacement_drops_keys_missing_from_the_group() {
    let runtime = runtime();
    let mut field = CompoundField::new(
        server(),
        &runtime,
        Some(&json!({"name": "a", "host": "x", "zone": "z1"})),
    );

    field.set_merged_fields(object(json!({"host": "y"})));
    assert_eq!(field.merged_values(), object(json!({"host": "y"})));
    assert_eq!(field.changes().get("zone"), Some(None));
}

#[test]
fn additional_replacement_ignores_declared_keys() {
    let runtime = runtime();
    let mut field = CompoundField::new(
        server(),
        &runtime,
        Some(&json!({"name": "a", "host": "x", "old": "1"})),
    );

    field.set_additional_fields(object(json!({"name": "b", "host": "y", "new": "2"})));
    assert_eq!(
        field.value(),
        json!({"name": "a", "host": "x", "new": "2"})
    );
}

#[test]
fn nullable_direct_field_is_removed_on_null() {
    let runtime = runtime();
    let mut field = CompoundField::new(server(), &runtime, Some(&json!({"name": "a", "port": 80})));

    field.set_direct_field("port", Some(Value::Null), true).unwrap();
    assert!(!field.buffer().contains_key("port"));

    field.set_direct_field("name", Some(Value::Null), false).unwrap();
    assert_eq!(field.buffer().get("name"), Some(&Value::Null));

    field.set_direct_field("name", None, false).unwrap();
    assert!(!field.buffer().contains_key("name"));
}

#[test]
fn unknown_direct_field_is_an_error() {
    let runtime = runtime();
    let mut field = CompoundField::new(server(), &runtime, None);
    assert_eq!(
        field.set_direct_field("host", Some(json!("x")), false),
        Err(EditorError::UnknownField("host".into()))
    );
    assert_eq!(field.state(), FieldState::Clean);
}

#[test]
fn invalid_buffer_cannot_commit() {
    let runtime = runtime();
    let node = ObjectNode::new()
        .with_property("name", Node::string())
        .with_required("name");
    let mut field = CompoundField::new(node, &runtime, Some(&json!({"name": "a"})));

    field.set_direct_field("name", Some(json!("")), false).unwrap();
    assert!(!field.can_commit(&runtime));
    assert_eq!(field.commit(&runtime), None);
    assert_eq!(field.state(), FieldState::Dirty);
    assert_eq!(field.committed(), Some(&json!({"name": "a"})));
}

#[test]
fn rollback_restores_and_counts_resets() {
    let runtime = runtime();
    let initial = json!({"name": "a", "host": "x", "extra": "y"});
    let mut field = CompoundField::new(server(), &runtime, Some(&initial));

    field.set_direct_field("name", Some(json!("b")), false).unwrap();
    field.set_additional_fields(Map::new());
    field.rollback();

    assert_eq!(field.value(), initial);
    assert_eq!(field.state(), FieldState::Clean);
    assert_eq!(field.reset_count(), 1);

    field.rollback();
    assert_eq!(field.reset_count(), 2);
}

#[test]
fn rollback_after_commit_restores_the_commit() {
    let runtime = runtime();
    let mut field = CompoundField::new(server(), &runtime, Some(&json!({"name": "a"})));

    field.set_direct_field("name", Some(json!("b")), false).unwrap();
    field.commit(&runtime).unwrap();
    field.set_direct_field("name", Some(json!("c")), false).unwrap();
    field.rollback();

    assert_eq!(field.value(), json!({"name": "b"}));
}

#[test]
fn external_values_only_apply_while_clean() {
    let runtime = runtime();
    let mut field = CompoundField::new(server(), &runtime, None);

    assert!(field.receive_value(Some(&json!({"name": "loaded"}))));
    assert_eq!(field.value(), json!({"name": "loaded"}));

    field.set_direct_field("name", Some(json!("typing")), false).unwrap();
    assert!(!field.receive_value(Some(&json!({"name": "refetched"}))));
    assert_eq!(field.value(), json!({"name": "typing"}));
}

#[test]
fn absent_external_value_does_not_wipe_the_buffer() {
    let runtime = runtime();
    let mut field = CompoundField::new(server(), &runtime, Some(&json!({"name": "a"})));

    assert!(!field.receive_value(None));
    assert!(!field.receive_value(Some(&Value::Null)));
    assert_eq!(field.value(), json!({"name": "a"}));
    assert_eq!(field.committed(), Some(&json!({"name": "a"})));
}

#[test]
fn fields_are_sorted_and_skip_id() {
    let runtime = runtime();
    let node = ObjectNode::new()
        .with_property("id", Node::string())
        .with_property("notes", Node::string())
        .with_property("name", Node::string())
        .with_required("name");
    let field = CompoundField::new(node, &runtime, Some(&json!({"id": "1"})));

    let names: Vec<&str> = field.fields(&runtime).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["name", "notes"]);
}

// ── Dirtiness ────────────────────────────────────────────────────

#[test]
fn empty_values_are_one_class() {
    let none = ChangeSet::new();
    let empties = [None, Some(Value::Null), Some(json!({}))];
    for old in &empties {
        for new in &empties {
            assert!(!reconcile(old.as_ref(), new.as_ref(), &none), "{old:?} vs {new:?}");
        }
    }
    assert!(reconcile(Some(&json!({"a": 1})), Some(&json!({})), &none));
    assert!(reconcile(None, Some(&json!({"a": 1})), &none));
}

#[test]
fn editing_back_to_the_original_is_not_dirty() {
    let runtime = runtime();
    let mut field = CompoundField::new(server(), &runtime, Some(&json!({"name": "a"})));

    field.set_direct_field("name", Some(json!("b")), false).unwrap();
    assert!(field.is_dirty());

    field.set_direct_field("name", Some(json!("a")), false).unwrap();
    assert_eq!(field.state(), FieldState::Dirty);
    assert!(!field.is_dirty());
}

#[test]
fn clearing_every_key_of_an_absent_value_is_not_dirty() {
    let runtime = runtime();
    let mut field = CompoundField::new(server(), &runtime, None);

    field.set_direct_field("name", Some(json!("a")), false).unwrap();
    assert!(field.is_dirty());
    field.set_direct_field("name", None, false).unwrap();
    assert!(!field.is_dirty());
}

// ── Invariants ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Edit {
    Direct(&'static str, Option<Value>, bool),
    Merged(Map<String, Value>),
    Additional(Map<String, Value>),
}

fn leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i32>().prop_map(Value::from),
        "[a-z]{0,3}".prop_map(Value::from),
    ]
}

fn entries() -> impl Strategy<Value = Map<String, Value>> {
    let key = prop::sample::select(vec!["name", "port", "host", "zone", "extra", "misc"]);
    prop::collection::btree_map(key, leaf_value(), 0..4)
        .prop_map(|entries| entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (
            prop::sample::select(vec!["name", "port"]),
            prop::option::of(leaf_value()),
            any::<bool>()
        )
            .prop_map(|(name, value, nullable)| Edit::Direct(name, value, nullable)),
        entries().prop_map(Edit::Merged),
        entries().prop_map(Edit::Additional),
    ]
}

fn apply(field: &mut CompoundField, edit: Edit) {
    match edit {
        Edit::Direct(name, value, nullable) => field.set_direct_field(name, value, nullable).unwrap(),
        Edit::Merged(values) => field.set_merged_fields(values),
        Edit::Additional(values) => field.set_additional_fields(values),
    }
}

proptest! {
    #[test]
    fn key_slices_stay_disjoint(initial in entries(), edits in prop::collection::vec(edit(), 0..8)) {
        let runtime = runtime();
        let mut field = CompoundField::new(server(), &runtime, Some(&Value::Object(initial)));
        for edit in edits {
            apply(&mut field, edit);

            let direct = field.direct_values();
            let merged = field.merged_values();
            let additional = field.additional_values();
            prop_assert!(direct.keys().all(|k| !merged.contains_key(k) && !additional.contains_key(k)));
            prop_assert!(merged.keys().all(|k| !additional.contains_key(k)));
            prop_assert_eq!(direct.len() + merged.len() + additional.len(), field.buffer().len());
        }
    }

    #[test]
    fn rollback_restores_the_initial_value(initial in entries(), edits in prop::collection::vec(edit(), 0..8)) {
        let runtime = runtime();
        let initial = Value::Object(initial);
        let mut field = CompoundField::new(server(), &runtime, Some(&initial));
        for edit in edits {
            apply(&mut field, edit);
        }
        field.rollback();

        prop_assert_eq!(serde_json::to_string(&field.value()).unwrap(), serde_json::to_string(&initial).unwrap());
        prop_assert_eq!(field.state(), FieldState::Clean);
        prop_assert!(!field.is_dirty());
    }
}
