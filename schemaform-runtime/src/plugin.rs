//! Plugin augments: named bundles of node kinds, utilities, data and a
//! validation hook.

use crate::runtime::Runtime;
use crate::utils::SchemaUtils;
use crate::validation::{FnHook, ValidateArgs, ValidateHook, ValidationResult};
use schemaform_types::{Node, NodeMap};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased per-plugin utilities, retrieved with [`Runtime::plugin_utils`].
pub type PluginUtils = Arc<dyn Any + Send + Sync>;

/// One plugin's contribution to a [`Runtime`].
#[derive(Clone)]
pub struct PluginAugment {
    name: String,
    nodes: NodeMap,
    data: Map<String, Value>,
    utils: Option<PluginUtils>,
    schema_utils: Option<Arc<dyn SchemaUtils>>,
    validate: Option<Arc<dyn ValidateHook>>,
}

impl PluginAugment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: NodeMap::new(),
            data: Map::new(),
            utils: None,
            schema_utils: None,
            validate: None,
        }
    }

    /// Contributes a node under `kind`.
    pub fn with_node(mut self, kind: impl Into<String>, node: Node) -> Self {
        self.nodes.insert(kind.into(), node);
        self
    }

    pub fn with_nodes(mut self, nodes: NodeMap) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Adds one top-level data entry. Data is shallow-merged across plugins.
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn with_utils<T: Any + Send + Sync>(mut self, utils: T) -> Self {
        self.utils = Some(Arc::new(utils));
        self
    }

    /// Replaces the runtime-wide utility surface from this plugin onward.
    pub fn with_schema_utils(mut self, utils: Arc<dyn SchemaUtils>) -> Self {
        self.schema_utils = Some(utils);
        self
    }

    pub fn with_validate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Runtime, &ValidateArgs<'_>) -> Option<ValidationResult> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(FnHook(hook)));
        self
    }

    pub fn with_validate_hook(mut self, hook: Arc<dyn ValidateHook>) -> Self {
        self.validate = Some(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub(crate) fn into_parts(self) -> AugmentParts {
        AugmentParts {
            name: self.name,
            nodes: self.nodes,
            data: self.data,
            utils: self.utils,
            schema_utils: self.schema_utils,
            validate: self.validate,
        }
    }
}

impl fmt::Debug for PluginAugment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginAugment")
            .field("name", &self.name)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("data", &self.data.keys().collect::<Vec<_>>())
            .field("utils", &self.utils.is_some())
            .field("schema_utils", &self.schema_utils.is_some())
            .field("validate", &self.validate.is_some())
            .finish()
    }
}

pub(crate) struct AugmentParts {
    pub name: String,
    pub nodes: NodeMap,
    pub data: Map<String, Value>,
    pub utils: Option<PluginUtils>,
    pub schema_utils: Option<Arc<dyn SchemaUtils>>,
    pub validate: Option<Arc<dyn ValidateHook>>,
}
