//! The value carried by a `link` node.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A link either names another entity or embeds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkValue {
    Ref {
        #[serde(alias = "entityType")]
        entity_type: String,
        #[serde(rename = "ref")]
        id: String,
    },
    Inline {
        #[serde(alias = "entityType")]
        entity_type: String,
        inline: Map<String, Value>,
    },
}

impl LinkValue {
    pub fn reference(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Ref {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn inline(entity_type: impl Into<String>, data: Map<String, Value>) -> Self {
        Self::Inline {
            entity_type: entity_type.into(),
            inline: data,
        }
    }

    /// Reads a link value. A bare string is shorthand for a reference to
    /// `target_type`.
    pub fn parse(value: &Value, target_type: &str) -> Result<Self> {
        match value {
            Value::String(id) => Ok(Self::reference(target_type, id.clone())),
            Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|e| Error::InvalidLink(e.to_string())),
            other => Err(Error::InvalidLink(format!(
                "expected a string or object, got {other}"
            ))),
        }
    }

    pub fn entity_type(&self) -> &str {
        match self {
            Self::Ref { entity_type, .. } | Self::Inline { entity_type, .. } => entity_type,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline { .. })
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
