//! Schema helper functions installed by the core plugin.

use schemaform_types::{Node, ObjectNode, PrimitiveType};
use serde_json::{Map, Value, json};
use std::cmp::Reverse;
use uuid::Uuid;

/// Id shared by every singleton entity.
pub const SINGLETON_ID: Uuid = Uuid::nil();

/// Pure helpers over schema nodes.
///
/// Every method has a default. A plugin that wants different labels or
/// ordering implements the trait, overrides what it needs and installs it
/// with [`PluginAugment::with_schema_utils`](crate::PluginAugment::with_schema_utils).
pub trait SchemaUtils: Send + Sync {
    /// `"max_retries"` becomes `"Max Retries"`.
    fn generate_field_label(&self, name: &str) -> String {
        to_title_case(name)
    }

    /// The value a new field of this shape starts with.
    fn default_value(&self, node: &Node) -> Value {
        default_value(node)
    }

    /// Orders fields for display: required first, then fields with a value,
    /// with nullable fields sinking within their group. Stable.
    fn sort_entity_properties<'a>(
        &self,
        fields: Vec<(&'a str, &'a Node)>,
        value: Option<&Value>,
        required: &[String],
    ) -> Vec<(&'a str, &'a Node)> {
        sort_entity_properties(fields, value, required)
    }

    /// The kind to use for iconography, looking through nullable and array
    /// wrappers.
    fn extract_node_type<'a>(&self, node: &'a Node) -> &'a str {
        extract_node_type(node)
    }

    fn is_primitive(&self, node: &Node) -> bool {
        is_primitive(node)
    }

    fn is_entity_valid(&self, entity: Option<&Value>, schema: Option<&ObjectNode>) -> bool {
        is_entity_valid(entity, schema)
    }
}

/// The core implementation of [`SchemaUtils`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreUtils;

impl SchemaUtils for CoreUtils {}

pub fn default_value(node: &Node) -> Value {
    match node {
        Node::Primitive(primitive) => match primitive.primitive_type {
            PrimitiveType::String | PrimitiveType::Path => json!(""),
            PrimitiveType::Number | PrimitiveType::Integer => json!(0),
            PrimitiveType::Boolean => json!(false),
        },
        Node::Enum(e) => json!(e.values.first().cloned().unwrap_or_default()),
        Node::Array(_) => json!([]),
        Node::Map(_) => json!({}),
        Node::Tuple(tuple) => Value::Array(tuple.items.iter().map(default_value).collect()),
        Node::Object(object) => {
            let fields: Map<String, Value> = object
                .properties
                .iter()
                .filter(|(name, _)| object.is_required(*name))
                .map(|(name, node)| (name.to_string(), default_value(node)))
                .collect();
            Value::Object(fields)
        }
        Node::Link(link) => json!({"entity_type": link.target_type, "ref": ""}),
        _ => Value::Null,
    }
}

pub fn sort_entity_properties<'a>(
    mut fields: Vec<(&'a str, &'a Node)>,
    value: Option<&Value>,
    required: &[String],
) -> Vec<(&'a str, &'a Node)> {
    // Doubled so the nullable half-point stays integral.
    let priority = |name: &str, node: &Node| -> i32 {
        let is_required = required.iter().any(|r| r == name);
        let has_value = value
            .and_then(|v| v.get(name))
            .is_some_and(|v| !v.is_null());
        (if is_required { 4 } else { 0 }) + (if has_value { 2 } else { 0 })
            - (if node.is_nullable() { 1 } else { 0 })
    };
    fields.sort_by_key(|(name, node)| Reverse(priority(*name, *node)));
    fields
}

pub fn extract_node_type(node: &Node) -> &str {
    match node {
        Node::Nullable(nullable) => extract_node_type(&nullable.inner_schema),
        Node::Array(array) => extract_node_type(&array.items),
        other => other.kind(),
    }
}

/// Primitives, enums, and nullable versions of either.
pub fn is_primitive(node: &Node) -> bool {
    match node {
        Node::Primitive(_) | Node::Enum(_) => true,
        Node::Nullable(nullable) => is_primitive(&nullable.inner_schema),
        _ => false,
    }
}

/// An entity is valid when it is an object, has a truthy `name` if the
/// schema declares one, and every required field is non-null.
pub fn is_entity_valid(entity: Option<&Value>, schema: Option<&ObjectNode>) -> bool {
    let (Some(Value::Object(entity)), Some(schema)) = (entity, schema) else {
        return false;
    };

    if schema.properties.contains("name") && !is_truthy(entity.get("name")) {
        return false;
    }

    schema
        .required
        .iter()
        .all(|field| entity.get(field).is_some_and(|v| !v.is_null()))
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(_) => true,
    }
}

pub fn to_title_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn to_kebab_case(s: &str) -> String {
    s.replace('_', "-")
}

pub fn to_space_case(s: &str) -> String {
    s.replace(['-', '_'], " ")
}

pub fn is_singleton_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok_and(|uuid| uuid == SINGLETON_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_splits_on_underscores() {
        assert_eq!(to_title_case("max_retries"), "Max Retries");
        assert_eq!(to_title_case("name"), "Name");
        assert_eq!(to_title_case("a__b"), "A  B");
    }

    #[test]
    fn kebab_and_space_case() {
        assert_eq!(to_kebab_case("source_config"), "source-config");
        assert_eq!(to_space_case("source-config_v2"), "source config v2");
    }

    #[test]
    fn singleton_id_is_the_nil_uuid() {
        assert!(is_singleton_id("00000000-0000-0000-0000-000000000000"));
        assert!(!is_singleton_id("00000000-0000-0000-0000-000000000001"));
        assert!(!is_singleton_id("not-a-uuid"));
    }

    #[test]
    fn enum_default_is_first_value() {
        assert_eq!(default_value(&Node::enumeration(["b", "a"])), json!("b"));
        assert_eq!(default_value(&Node::enumeration(Vec::<String>::new())), json!(""));
    }
}
