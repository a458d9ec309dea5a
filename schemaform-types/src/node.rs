//! Schema nodes: the polymorphic vocabulary describing the shape of data.
//!
//! A node is a JSON object tagged by `nodeType`. Core kinds map onto the
//! typed variants of [`Node`]; any other tag becomes [`Node::Custom`], which
//! keeps its attributes verbatim for the plugin that owns the kind.

use crate::{Error, NodeKind, PrimitiveType, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Named nodes. Recursive references and links index into this map.
pub type NodeMap = BTreeMap<String, Node>;

/// A schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Primitive(PrimitiveNode),
    Enum(EnumNode),
    Object(ObjectNode),
    Array(ArrayNode),
    Map(MapNode),
    Tuple(TupleNode),
    TaggedUnion(UnionNode),
    Union(UnionNode),
    UntaggedEnum(UntaggedEnumNode),
    Link(LinkNode),
    Nullable(NullableNode),
    RecursiveRef(RecursiveRefNode),
    Unknown(UnknownNode),
    /// A plugin-defined kind.
    Custom(CustomNode),
}

impl Node {
    /// Returns the `nodeType` tag of this node.
    pub fn kind(&self) -> &str {
        match self {
            Self::Custom(custom) => &custom.node_type,
            other => other.core_kind().map(|k| k.as_str()).unwrap_or_default(),
        }
    }

    /// Returns the built-in kind, or `None` for plugin kinds.
    pub fn core_kind(&self) -> Option<NodeKind> {
        let kind = match self {
            Self::Primitive(_) => NodeKind::Primitive,
            Self::Enum(_) => NodeKind::Enum,
            Self::Object(_) => NodeKind::Object,
            Self::Array(_) => NodeKind::Array,
            Self::Map(_) => NodeKind::Map,
            Self::Tuple(_) => NodeKind::Tuple,
            Self::TaggedUnion(_) => NodeKind::TaggedUnion,
            Self::Union(_) => NodeKind::Union,
            Self::UntaggedEnum(_) => NodeKind::UntaggedEnum,
            Self::Link(_) => NodeKind::Link,
            Self::Nullable(_) => NodeKind::Nullable,
            Self::RecursiveRef(_) => NodeKind::RecursiveRef,
            Self::Unknown(_) => NodeKind::Unknown,
            Self::Custom(_) => return None,
        };
        Some(kind)
    }

    pub fn description(&self) -> Option<&str> {
        let description = match self {
            Self::Primitive(n) => &n.description,
            Self::Enum(n) => &n.description,
            Self::Object(n) => &n.description,
            Self::Array(n) => &n.description,
            Self::Map(n) => &n.description,
            Self::Tuple(n) => &n.description,
            Self::TaggedUnion(n) | Self::Union(n) => &n.description,
            Self::UntaggedEnum(n) => &n.description,
            Self::Link(n) => &n.description,
            Self::Nullable(n) => &n.description,
            Self::RecursiveRef(n) => &n.description,
            Self::Unknown(n) => &n.description,
            Self::Custom(n) => return n.attributes.get("description").and_then(Value::as_str),
        };
        description.as_deref()
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    // ================================================================
    // Wire format
    // ================================================================

    /// Reads a node from its JSON form.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(Error::NotAnObject);
        };
        let tag = match fields.shift_remove("nodeType") {
            Some(Value::String(tag)) => tag,
            _ => return Err(Error::MissingNodeType),
        };
        let Some(kind) = NodeKind::parse(&tag) else {
            return Ok(Self::Custom(CustomNode {
                node_type: tag,
                attributes: fields,
            }));
        };

        let body = Value::Object(fields);
        let node = match kind {
            NodeKind::Array => Self::Array(serde_json::from_value(body)?),
            NodeKind::Enum => Self::Enum(serde_json::from_value(body)?),
            NodeKind::Link => Self::Link(serde_json::from_value(body)?),
            NodeKind::Map => Self::Map(serde_json::from_value(body)?),
            NodeKind::Nullable => Self::Nullable(serde_json::from_value(body)?),
            NodeKind::Object => Self::Object(serde_json::from_value(body)?),
            NodeKind::Primitive => Self::Primitive(serde_json::from_value(body)?),
            NodeKind::RecursiveRef => Self::RecursiveRef(serde_json::from_value(body)?),
            NodeKind::TaggedUnion => Self::TaggedUnion(serde_json::from_value(body)?),
            NodeKind::Tuple => Self::Tuple(serde_json::from_value(body)?),
            NodeKind::Union => Self::Union(serde_json::from_value(body)?),
            NodeKind::UntaggedEnum => Self::UntaggedEnum(serde_json::from_value(body)?),
            NodeKind::Unknown => Self::Unknown(serde_json::from_value(body)?),
        };
        Ok(node)
    }

    /// Writes the node in its JSON form, `nodeType` first.
    pub fn to_value(&self) -> Result<Value> {
        let body = match self {
            Self::Primitive(n) => serde_json::to_value(n)?,
            Self::Enum(n) => serde_json::to_value(n)?,
            Self::Object(n) => serde_json::to_value(n)?,
            Self::Array(n) => serde_json::to_value(n)?,
            Self::Map(n) => serde_json::to_value(n)?,
            Self::Tuple(n) => serde_json::to_value(n)?,
            Self::TaggedUnion(n) | Self::Union(n) => serde_json::to_value(n)?,
            Self::UntaggedEnum(n) => serde_json::to_value(n)?,
            Self::Link(n) => serde_json::to_value(n)?,
            Self::Nullable(n) => serde_json::to_value(n)?,
            Self::RecursiveRef(n) => serde_json::to_value(n)?,
            Self::Unknown(n) => serde_json::to_value(n)?,
            Self::Custom(n) => Value::Object(n.attributes.clone()),
        };

        let mut fields = Map::new();
        fields.insert("nodeType".into(), Value::String(self.kind().to_string()));
        if let Value::Object(body) = body {
            fields.extend(body);
        }
        Ok(Value::Object(fields))
    }

    // ================================================================
    // Constructors
    // ================================================================

    pub fn primitive(primitive_type: PrimitiveType) -> Self {
        Self::Primitive(PrimitiveNode::new(primitive_type))
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveType::String)
    }

    pub fn integer() -> Self {
        Self::primitive(PrimitiveType::Integer)
    }

    pub fn number() -> Self {
        Self::primitive(PrimitiveType::Number)
    }

    pub fn boolean() -> Self {
        Self::primitive(PrimitiveType::Boolean)
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(EnumNode {
            values: values.into_iter().map(Into::into).collect(),
            description: None,
        })
    }

    pub fn array(items: Node) -> Self {
        Self::Array(ArrayNode {
            items: Box::new(items),
            description: None,
        })
    }

    pub fn map(value_schema: Node) -> Self {
        Self::Map(MapNode {
            value_schema: Box::new(value_schema),
            key_pattern: None,
            description: None,
        })
    }

    pub fn tuple(items: Vec<Node>) -> Self {
        Self::Tuple(TupleNode {
            items,
            description: None,
        })
    }

    pub fn nullable(inner: Node) -> Self {
        Self::Nullable(NullableNode {
            inner_schema: Box::new(inner),
            description: None,
        })
    }

    pub fn recursive_ref(ref_name: impl Into<String>) -> Self {
        Self::RecursiveRef(RecursiveRefNode {
            ref_name: ref_name.into(),
            description: None,
        })
    }

    pub fn link(target_type: impl Into<String>, inline_schema: ObjectNode) -> Self {
        Self::Link(LinkNode {
            target_type: target_type.into(),
            inline_schema,
            description: None,
        })
    }

    pub fn tagged_union(discriminator: impl Into<String>, variants: Vec<Variant>) -> Self {
        Self::TaggedUnion(UnionNode {
            discriminator: Some(discriminator.into()),
            variants,
            description: None,
        })
    }

    pub fn untagged_enum(variants: Vec<Variant>) -> Self {
        Self::UntaggedEnum(UntaggedEnumNode {
            variants,
            description: None,
        })
    }

    /// A plugin-defined node with no attributes.
    pub fn custom(node_type: impl Into<String>) -> Self {
        Self::Custom(CustomNode {
            node_type: node_type.into(),
            attributes: Map::new(),
        })
    }

    pub fn unknown() -> Self {
        Self::Unknown(UnknownNode::default())
    }
}

impl From<ObjectNode> for Node {
    fn from(object: ObjectNode) -> Self {
        Self::Object(object)
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Node::from_value(value).map_err(de::Error::custom)
    }
}

// ====================================================================
// Node shapes
// ====================================================================

/// Scalar value: string, number, integer, boolean or path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveNode {
    pub primitive_type: PrimitiveType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PrimitiveNode {
    pub fn new(primitive_type: PrimitiveType) -> Self {
        Self {
            primitive_type,
            format: None,
            minimum: None,
            maximum: None,
            description: None,
        }
    }

    pub fn with_bounds(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }
}

/// String restricted to a fixed, ordered set of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumNode {
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Struct with named properties, optional merged sub-schemas and an
/// optional schema for dynamic keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectNode {
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub merged: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ObjectNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, node: Node) -> Self {
        self.properties.insert(name, node);
        self
    }

    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    pub fn with_merged(mut self, node: Node) -> Self {
        self.merged.push(node);
        self
    }

    pub fn with_additional_properties(mut self, node: Node) -> Self {
        self.additional_properties = Some(Box::new(node));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&Node> {
        self.properties.get(name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// Homogeneous sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayNode {
    pub items: Box<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// String-keyed dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapNode {
    pub value_schema: Box<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fixed-length heterogeneous sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleNode {
    pub items: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One alternative of a union or enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub tag: String,
    pub schema: Node,
}

impl Variant {
    pub fn new(tag: impl Into<String>, schema: Node) -> Self {
        Self {
            tag: tag.into(),
            schema,
        }
    }
}

/// Shared shape of `union` and `taggedUnion` nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UnionNode {
    pub fn variant(&self, tag: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.tag == tag)
    }
}

/// Enum whose variant is inferred from the single key present in the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UntaggedEnumNode {
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UntaggedEnumNode {
    pub fn variant(&self, tag: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.tag == tag)
    }
}

/// Either a reference to another entity by id or the entity inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkNode {
    pub target_type: String,
    pub inline_schema: ObjectNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Optional value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NullableNode {
    pub inner_schema: Box<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Indirection that breaks a cycle. Resolved against the node map on use,
/// never inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecursiveRefNode {
    pub ref_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Placeholder emitted when a generated schema could not be parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A node of a kind owned by a plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomNode {
    pub node_type: String,
    pub attributes: Map<String, Value>,
}

impl CustomNode {
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

// ====================================================================
// Properties
// ====================================================================

/// Object properties in declaration order, which is also display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, Node)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property. Replacing an existing name keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, node: Node) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = node,
            None => self.0.push((name, node)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, node)| node)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.0.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Node)> for Properties {
    fn from_iter<T: IntoIterator<Item = (String, Node)>>(iter: T) -> Self {
        let mut properties = Self::new();
        for (name, node) in iter {
            properties.insert(name, node);
        }
        properties
    }
}

impl Serialize for Properties {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, node) in &self.0 {
            map.serialize_entry(name, node)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = Properties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of property name to schema node")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Properties, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut properties = Properties::new();
                while let Some((name, node)) = access.next_entry::<String, Node>()? {
                    properties.insert(name, node);
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}

/// Generated maps emit `merged` either as a single node or a list.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<Node>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Node>),
        One(Node),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::Many(nodes)) => nodes,
        Some(OneOrMany::One(node)) => vec![node],
        None => Vec::new(),
    })
}
