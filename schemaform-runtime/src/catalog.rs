//! Entity catalog: entity type names mapped to schemas, display names and
//! URL segments.
//!
//! Derived from the `Entity` tagged union of a node map. Each variant's tag
//! is an entity type; its `data` property refers to the entity's schema.

use crate::runtime::Runtime;
use crate::utils::{to_kebab_case, to_title_case};
use schemaform_types::{Node, NodeMap, ObjectNode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Node map entry holding the entity union.
pub const ENTITY_NODE: &str = "Entity";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityCatalog {
    pub state_entry_to_schema: BTreeMap<String, String>,
    pub entity_display_names: BTreeMap<String, String>,
    pub state_entry_to_url: BTreeMap<String, String>,
    pub url_to_state_entry: BTreeMap<String, String>,
}

impl EntityCatalog {
    pub fn from_nodes(nodes: &NodeMap) -> Self {
        let mut catalog = Self::default();
        let Some(Node::TaggedUnion(entity)) = nodes.get(ENTITY_NODE) else {
            return catalog;
        };

        for variant in &entity.variants {
            let Some(schema_name) = data_schema_name(&variant.schema) else {
                continue;
            };
            let entity_type = variant.tag.clone();
            let url = to_kebab_case(&entity_type);
            catalog
                .state_entry_to_schema
                .insert(entity_type.clone(), schema_name.to_string());
            catalog
                .entity_display_names
                .insert(entity_type.clone(), to_title_case(&entity_type));
            catalog.url_to_state_entry.insert(url.clone(), entity_type.clone());
            catalog.state_entry_to_url.insert(entity_type, url);
        }
        catalog
    }

    /// Reads the catalog back out of runtime data. Missing keys are empty;
    /// a malformed entry empties the catalog with a warning.
    pub fn from_data(data: &Map<String, Value>) -> Self {
        match serde_json::from_value(Value::Object(data.clone())) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Malformed entity catalog in runtime data: {}. Using an empty catalog.", e);
                Self::default()
            }
        }
    }

    /// The catalog as top-level runtime data entries.
    pub fn to_data(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.state_entry_to_schema.keys().map(String::as_str)
    }

    pub fn schema_name(&self, entity_type: &str) -> Option<&str> {
        self.state_entry_to_schema.get(entity_type).map(String::as_str)
    }

    pub fn display_name(&self, entity_type: &str) -> Option<&str> {
        self.entity_display_names.get(entity_type).map(String::as_str)
    }

    pub fn url(&self, entity_type: &str) -> Option<&str> {
        self.state_entry_to_url.get(entity_type).map(String::as_str)
    }

    pub fn entity_type_for_url(&self, url: &str) -> Option<&str> {
        self.url_to_state_entry.get(url).map(String::as_str)
    }

    /// The object schema for `entity_type` in `runtime`'s node map.
    pub fn schema_for<'r>(&self, runtime: &'r Runtime, entity_type: &str) -> Option<&'r ObjectNode> {
        runtime.resolve_ref(self.schema_name(entity_type)?)?.as_object()
    }
}

fn data_schema_name(variant: &Node) -> Option<&str> {
    match variant.as_object()?.property("data")? {
        Node::RecursiveRef(reference) => Some(&reference.ref_name),
        Node::Nullable(nullable) => match nullable.inner_schema.as_ref() {
            Node::RecursiveRef(reference) => Some(&reference.ref_name),
            _ => None,
        },
        _ => None,
    }
}
