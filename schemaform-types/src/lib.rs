//! Core type definitions for schemaform.
//!
//! This crate defines the plugin-agnostic vocabulary every other crate
//! depends on:
//! - [`Node`]: the tagged schema node (core kinds plus plugin kinds)
//! - [`NodeMap`]: named nodes, the arena that recursive references index into
//! - [`LinkValue`]: the value carried by a link field (by reference or inline)
//!
//! Nodes travel as JSON objects tagged by `nodeType`. Kinds this crate does
//! not know deserialize to [`Node::Custom`] so plugin vocabulary survives a
//! round trip untouched.

mod kind;
mod link;
mod node;

pub use kind::{NodeKind, PrimitiveType};
pub use link::LinkValue;
pub use node::{
    ArrayNode, CustomNode, EnumNode, LinkNode, MapNode, Node, NodeMap, NullableNode, ObjectNode,
    PrimitiveNode, Properties, RecursiveRefNode, TupleNode, UnionNode, UnknownNode,
    UntaggedEnumNode, Variant,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing nodes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("node is not a JSON object")]
    NotAnObject,

    #[error("node is missing its 'nodeType' tag")]
    MissingNodeType,

    #[error("invalid link value: {0}")]
    InvalidLink(String),
}
