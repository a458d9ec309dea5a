//! Built-in node kinds and primitive data types.
//!
//! Plugin kinds are plain strings and never appear here; the composed node
//! map is what decides whether a kind resolves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node kind understood by the base layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Array,
    Enum,
    Link,
    Map,
    Nullable,
    Object,
    Primitive,
    RecursiveRef,
    TaggedUnion,
    Tuple,
    Union,
    UntaggedEnum,
    /// Sentinel emitted by code generation when a schema could not be parsed.
    Unknown,
}

impl NodeKind {
    /// Every kind with a core renderer and validator. Excludes the sentinel.
    pub const CORE: [NodeKind; 12] = [
        NodeKind::Array,
        NodeKind::Enum,
        NodeKind::Link,
        NodeKind::Map,
        NodeKind::Nullable,
        NodeKind::Object,
        NodeKind::Primitive,
        NodeKind::RecursiveRef,
        NodeKind::TaggedUnion,
        NodeKind::Tuple,
        NodeKind::Union,
        NodeKind::UntaggedEnum,
    ];

    /// Returns the `nodeType` tag used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Enum => "enum",
            Self::Link => "link",
            Self::Map => "map",
            Self::Nullable => "nullable",
            Self::Object => "object",
            Self::Primitive => "primitive",
            Self::RecursiveRef => "recursiveRef",
            Self::TaggedUnion => "taggedUnion",
            Self::Tuple => "tuple",
            Self::Union => "union",
            Self::UntaggedEnum => "untaggedEnum",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a wire tag. Returns `None` for plugin kinds.
    pub fn parse(tag: &str) -> Option<Self> {
        let kind = match tag {
            "array" => Self::Array,
            "enum" => Self::Enum,
            "link" => Self::Link,
            "map" => Self::Map,
            "nullable" => Self::Nullable,
            "object" => Self::Object,
            "primitive" => Self::Primitive,
            "recursiveRef" => Self::RecursiveRef,
            "taggedUnion" => Self::TaggedUnion,
            "tuple" => Self::Tuple,
            "union" => Self::Union,
            "untaggedEnum" => Self::UntaggedEnum,
            "unknown" => Self::Unknown,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The data type of a primitive node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Boolean,
    /// A string holding a filesystem-style path.
    Path,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Path => "path",
        }
    }

    /// Whether a JSON value has the shape this primitive type expects.
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::String | Self::Path => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
        }
    }
}
