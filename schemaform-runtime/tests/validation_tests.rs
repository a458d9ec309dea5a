use pretty_assertions::assert_eq;
use schemaform_runtime::{
    PluginAugment, Runtime, SchemaformConfig, ValidateArgs, ValidationOptions, ValidationResult,
    core_plugin, validate_field,
};
use schemaform_types::{Node, NodeMap, ObjectNode, PrimitiveNode, PrimitiveType, Variant};
use serde_json::{Value, json};

fn runtime_with(nodes: NodeMap) -> Runtime {
    let core = core_plugin(&nodes);
    Runtime::new(nodes, SchemaformConfig::default())
        .with_plugin(core)
        .unwrap()
}

fn runtime() -> Runtime {
    runtime_with(NodeMap::new())
}

fn messages(result: &ValidationResult) -> Vec<(&str, &str)> {
    result
        .errors
        .iter()
        .map(|e| (e.path.as_str(), e.message.as_str()))
        .collect()
}

fn server() -> Node {
    ObjectNode::new()
        .with_property("name", Node::string())
        .with_property("port", Node::integer())
        .with_property("tags", Node::array(Node::string()))
        .with_property("options", Node::map(Node::boolean()))
        .with_required("name")
        .with_required("tags")
        .into()
}

// ── Bypass and defaults ──────────────────────────────────────────

#[test]
fn unknown_kind_always_validates() {
    let runtime = runtime();
    for data in [json!(null), json!(1), json!({"anything": [1, 2]})] {
        assert_eq!(
            runtime.validate_value(&Node::unknown(), "x", Some(&data)),
            ValidationResult::valid()
        );
    }
    assert!(runtime.validate_value(&Node::unknown(), "x", None).valid);
}

#[test]
fn plugin_kinds_are_left_to_their_plugin() {
    let runtime = runtime();
    assert!(runtime.validate_value(&Node::custom("relativePath"), "", Some(&json!(3))).valid);

    let strict = runtime
        .with_plugin(PluginAugment::new("files").with_validate(|_, args: &ValidateArgs<'_>| {
            (args.schema.kind() == "relativePath" && !args.data.is_some_and(Value::is_string))
                .then(|| ValidationResult::error(args.path, "Expected a path", args.data))
        }))
        .unwrap();

    let schema: Node = ObjectNode::new()
        .with_property("file", Node::custom("relativePath"))
        .into();
    let result = strict.validate_value(&schema, "", Some(&json!({"file": 3})));
    assert_eq!(messages(&result), vec![("file", "Expected a path")]);
}

// ── Objects ──────────────────────────────────────────────────────

#[test]
fn required_primitive_rejects_empty_string() {
    let result = runtime().validate_value(&server(), "server", Some(&json!({"name": "", "tags": []})));
    assert_eq!(messages(&result), vec![("server.name", "Field 'name' is required")]);
}

#[test]
fn empty_array_satisfies_required_array() {
    let result = runtime().validate_value(&server(), "", Some(&json!({"name": "a", "tags": []})));
    assert!(result.valid, "{result:?}");
}

#[test]
fn missing_required_fields_are_reported_in_declaration_order() {
    let result = runtime().validate_value(&server(), "", Some(&json!({})));
    assert_eq!(
        messages(&result),
        vec![
            ("name", "Field 'name' is required"),
            ("tags", "Field 'tags' is required"),
        ]
    );
}

#[test]
fn required_object_rejects_empty_object() {
    let schema: Node = ObjectNode::new()
        .with_property("inner", ObjectNode::new().into())
        .with_required("inner")
        .into();
    let result = runtime().validate_value(&schema, "", Some(&json!({"inner": {}})));
    assert_eq!(messages(&result), vec![("inner", "Field 'inner' is required")]);
}

#[test]
fn nested_errors_carry_full_paths() {
    let result = runtime().validate_value(
        &server(),
        "server",
        Some(&json!({"name": "a", "tags": ["x", 2], "options": {"tls": "yes"}, "port": 1.5})),
    );
    assert_eq!(
        messages(&result),
        vec![
            ("server.port", "Expected a integer value"),
            ("server.tags[1]", "Expected a string value"),
            ("server.options.tls", "Expected a boolean value"),
        ]
    );
}

#[test]
fn non_object_value_for_object_schema() {
    let result = runtime().validate_value(&server(), "s", Some(&json!("nope")));
    assert_eq!(messages(&result), vec![("s", "Expected an object")]);
}

#[test]
fn merged_and_additional_keys_are_validated() {
    let schema: Node = ObjectNode::new()
        .with_property("name", Node::string())
        .with_merged(
            ObjectNode::new()
                .with_property("host", Node::string())
                .with_required("host")
                .into(),
        )
        .with_additional_properties(Node::integer())
        .into();
    let runtime = runtime();

    let ok = runtime.validate_value(&schema, "", Some(&json!({"name": "a", "host": "h", "extra": 1})));
    assert!(ok.valid, "{ok:?}");

    let bad = runtime.validate_value(&schema, "", Some(&json!({"name": "a", "extra": "y"})));
    assert_eq!(
        messages(&bad),
        vec![
            ("host", "Field 'host' is required"),
            ("extra", "Expected a integer value"),
        ]
    );
}

#[test]
fn validate_field_treats_absent_optional_as_valid() {
    let runtime = runtime();
    let options = runtime.validation_options();
    assert!(validate_field(&runtime, "", "port", None, &Node::integer(), false, options).valid);
    assert!(!validate_field(&runtime, "", "port", None, &Node::integer(), true, options).valid);
}

// ── Scalars ──────────────────────────────────────────────────────

#[test]
fn primitive_bounds_are_enforced() {
    let port = Node::Primitive(
        PrimitiveNode::new(PrimitiveType::Integer).with_bounds(Some(1.0), Some(65535.0)),
    );
    let runtime = runtime();

    assert!(runtime.validate_value(&port, "port", Some(&json!(8080))).valid);
    assert_eq!(
        messages(&runtime.validate_value(&port, "port", Some(&json!(0)))),
        vec![("port", "Value must be at least 1")]
    );
    assert_eq!(
        messages(&runtime.validate_value(&port, "port", Some(&json!(70000)))),
        vec![("port", "Value must be at most 65535")]
    );
}

#[test]
fn enum_rejects_undeclared_values() {
    let level = Node::enumeration(["debug", "info"]);
    let runtime = runtime();
    assert!(runtime.validate_value(&level, "", Some(&json!("info"))).valid);
    assert!(!runtime.validate_value(&level, "", Some(&json!("trace"))).valid);
}

#[test]
fn tuple_length_must_match() {
    let pair = Node::tuple(vec![Node::string(), Node::integer()]);
    let runtime = runtime();
    assert!(runtime.validate_value(&pair, "", Some(&json!(["a", 1]))).valid);
    assert!(!runtime.validate_value(&pair, "", Some(&json!(["a"]))).valid);
    assert!(!runtime.validate_value(&pair, "", Some(&json!(["a", "b"]))).valid);
}

#[test]
fn nullable_accepts_null_and_checks_inner() {
    let maybe = Node::nullable(Node::integer());
    let runtime = runtime();
    assert!(runtime.validate_value(&maybe, "", Some(&Value::Null)).valid);
    assert!(runtime.validate_value(&maybe, "", None).valid);
    assert!(!runtime.validate_value(&maybe, "", Some(&json!("x"))).valid);
}

// ── Unions ───────────────────────────────────────────────────────

fn source() -> Node {
    Node::tagged_union(
        "type",
        vec![
            Variant::new(
                "file",
                ObjectNode::new()
                    .with_property("path", Node::string())
                    .with_required("path")
                    .into(),
            ),
            Variant::new("stdin", ObjectNode::new().into()),
        ],
    )
}

#[test]
fn tagged_union_requires_a_known_discriminator() {
    let runtime = runtime();
    assert!(runtime.validate_value(&source(), "src", Some(&json!({"type": "file", "path": "a"}))).valid);

    let missing = runtime.validate_value(&source(), "src", Some(&json!({"path": "a"})));
    assert_eq!(messages(&missing), vec![("src.type", "Missing discriminator field 'type'")]);

    let unknown = runtime.validate_value(&source(), "src", Some(&json!({"type": "tcp"})));
    assert_eq!(
        messages(&unknown),
        vec![("src.type", "Unknown variant 'tcp' for discriminator 'type'")]
    );

    let invalid = runtime.validate_value(&source(), "src", Some(&json!({"type": "file"})));
    assert_eq!(messages(&invalid), vec![("src.path", "Field 'path' is required")]);
}

#[test]
fn untagged_enum_uses_the_single_present_key() {
    let schedule = Node::untagged_enum(vec![
        Variant::new("every", Node::integer()),
        Variant::new("never", Node::nullable(Node::string())),
    ]);
    let runtime = runtime();

    assert!(runtime.validate_value(&schedule, "s", Some(&json!({"every": 5}))).valid);
    assert!(runtime.validate_value(&schedule, "s", Some(&json!("never"))).valid);
    assert_eq!(
        messages(&runtime.validate_value(&schedule, "s", Some(&json!({"every": "x"})))),
        vec![("s.every", "Expected a integer value")]
    );
    assert_eq!(
        messages(&runtime.validate_value(&schedule, "s", Some(&json!({"often": 1})))),
        vec![("s", "Unknown variant 'often' in untagged enum")]
    );
    assert!(!runtime.validate_value(&schedule, "s", Some(&json!({"every": 1, "never": null}))).valid);
}

#[test]
fn union_accepts_any_matching_variant() {
    let either = Node::Union(schemaform_types::UnionNode {
        discriminator: None,
        variants: vec![Variant::new("n", Node::integer()), Variant::new("s", Node::string())],
        description: None,
    });
    let runtime = runtime();
    assert!(runtime.validate_value(&either, "", Some(&json!(1))).valid);
    assert!(runtime.validate_value(&either, "", Some(&json!("a"))).valid);
    assert!(!runtime.validate_value(&either, "", Some(&json!(true))).valid);
}

// ── References ───────────────────────────────────────────────────

fn tree_nodes() -> NodeMap {
    let mut nodes = NodeMap::new();
    nodes.insert(
        "Tree".into(),
        ObjectNode::new()
            .with_property("label", Node::string())
            .with_property("children", Node::array(Node::recursive_ref("Tree")))
            .with_required("label")
            .into(),
    );
    nodes
}

#[test]
fn recursive_refs_resolve_late() {
    let runtime = runtime_with(tree_nodes());
    let tree = json!({
        "label": "root",
        "children": [{"label": "a", "children": [{"label": ""}]}]
    });

    let result = runtime.validate_value(&Node::recursive_ref("Tree"), "tree", Some(&tree));
    assert_eq!(
        messages(&result),
        vec![("tree.children[0].children[0].label", "Field 'label' is required")]
    );
}

#[test]
fn unresolved_ref_is_treated_as_valid() {
    let result = runtime().validate_value(&Node::recursive_ref("Missing"), "", Some(&json!(1)));
    assert!(result.valid);
}

#[test]
fn max_depth_stops_descent() {
    let runtime = runtime_with(tree_nodes());
    let mut deep = json!({"label": ""});
    for _ in 0..30 {
        deep = json!({"label": "n", "children": [deep]});
    }

    // The invalid leaf sits below max_depth, so it is never reached.
    assert!(runtime.validate_value(&Node::recursive_ref("Tree"), "", Some(&deep)).valid);

    let shallow = ValidationOptions {
        max_depth: 200,
        warn_depth: 200,
        ..runtime.validation_options()
    };
    let schema = Node::recursive_ref("Tree");
    let args = ValidateArgs::new(&schema, "", Some(&deep)).with_options(shallow);
    assert!(!runtime.validate(&args).valid);
}

// ── Links ────────────────────────────────────────────────────────

#[test]
fn links_validate_inline_entities_only() {
    let link = Node::link(
        "source",
        ObjectNode::new().with_property("name", Node::string()).with_required("name"),
    );
    let runtime = runtime();

    assert!(runtime.validate_value(&link, "", Some(&json!("abc"))).valid);
    assert!(runtime.validate_value(&link, "", Some(&json!({"entity_type": "source", "ref": "1"}))).valid);
    assert!(runtime.validate_value(&link, "", Some(&json!({"entity_type": "source", "inline": {"name": "s"}}))).valid);

    let bad = runtime.validate_value(&link, "src", Some(&json!({"entity_type": "source", "inline": {}})));
    assert_eq!(messages(&bad), vec![("src.name", "Field 'name' is required")]);

    assert!(!runtime.validate_value(&link, "", Some(&json!(5))).valid);
}
