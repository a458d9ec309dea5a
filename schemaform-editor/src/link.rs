//! Link resolution and the link explorer.

use crate::error::LinkError;
use crate::object::CompoundField;
use schemaform_runtime::Runtime;
use schemaform_types::{LinkNode, LinkValue, Node, ObjectNode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// What a link value needs in order to be shown.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The entity travels with the value; draw it with the inline schema.
    Inline {
        entity_type: String,
        data: Map<String, Value>,
    },
    /// Only an identifier; the caller fetches `(entity_type, id)`.
    Fetch { entity_type: String, id: String },
    /// No identifier yet, so there is nothing to fetch.
    Disabled { entity_type: String },
}

/// Decides how to show `value` for a link node. Never fetches.
pub fn resolve_link(node: &Node, value: Option<&Value>) -> Result<Resolution, LinkError> {
    let Node::Link(link) = node else {
        return Err(LinkError::NotALink(node.kind().to_string()));
    };
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(Resolution::Disabled {
            entity_type: link.target_type.clone(),
        });
    };

    Ok(match LinkValue::parse(value, &link.target_type)? {
        LinkValue::Inline {
            entity_type,
            inline,
        } => Resolution::Inline {
            entity_type,
            data: inline,
        },
        LinkValue::Ref { entity_type, id } if id.is_empty() => Resolution::Disabled { entity_type },
        LinkValue::Ref { entity_type, id } => Resolution::Fetch { entity_type, id },
    })
}

/// A reconciler over an inline link's entity, built from the link's
/// inline schema.
pub fn inline_field(
    link: &LinkNode,
    runtime: &Runtime,
    value: &Value,
) -> Result<CompoundField, LinkError> {
    match LinkValue::parse(value, &link.target_type)? {
        LinkValue::Inline { inline, .. } => Ok(CompoundField::new(
            link.inline_schema.clone(),
            runtime,
            Some(&Value::Object(inline)),
        )),
        LinkValue::Ref { .. } => Err(LinkError::NotInline),
    }
}

/// One level of the link explorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    pub entity_type: String,
    pub entity_name: String,
    pub schema: ObjectNode,
}

impl Breadcrumb {
    pub fn new(
        entity_type: impl Into<String>,
        entity_name: impl Into<String>,
        schema: ObjectNode,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_name: entity_name.into(),
            schema,
        }
    }

    fn same_entity(&self, other: &Breadcrumb) -> bool {
        self.entity_type == other.entity_type && self.entity_name == other.entity_name
    }
}

/// Stack of entities the user has drilled into through links. The explorer
/// never follows links on its own.
#[derive(Debug, Clone, Default)]
pub struct LinkExplorer {
    breadcrumbs: Vec<Breadcrumb>,
}

impl LinkExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `entry` unless it is already on top. Returns whether it was
    /// pushed.
    pub fn open(&mut self, entry: Breadcrumb) -> bool {
        if self.current().is_some_and(|top| top.same_entity(&entry)) {
            debug!(
                entity_type = %entry.entity_type,
                entity_name = %entry.entity_name,
                "Entity already open"
            );
            return false;
        }
        self.breadcrumbs.push(entry);
        true
    }

    pub fn close(&mut self) {
        self.breadcrumbs.pop();
    }

    /// Keeps entries `0..=index`.
    pub fn navigate_to(&mut self, index: usize) {
        self.breadcrumbs.truncate(index.saturating_add(1));
    }

    pub fn clear(&mut self) {
        self.breadcrumbs.clear();
    }

    pub fn current(&self) -> Option<&Breadcrumb> {
        self.breadcrumbs.last()
    }

    pub fn breadcrumbs(&self) -> &[Breadcrumb] {
        &self.breadcrumbs
    }

    pub fn is_open(&self) -> bool {
        !self.breadcrumbs.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.breadcrumbs.len()
    }
}
