//! The composed runtime.
//!
//! A [`Runtime`] is a value: composing a plugin returns a new runtime and
//! leaves the old one untouched. Plugin order is part of the configuration,
//! since it decides hook order and which plugin owns a contested kind.

use crate::catalog::EntityCatalog;
use crate::config::{CollisionPolicy, SchemaformConfig};
use crate::error::ComposeError;
use crate::plugin::{PluginAugment, PluginUtils};
use crate::utils::{CoreUtils, SchemaUtils};
use crate::validation::{ValidateArgs, ValidateHook, ValidationOptions, ValidationResult};
use schemaform_types::{Node, NodeKind, NodeMap, ObjectNode};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owner recorded for nodes from the base node map.
pub const BASE_OWNER: &str = "base";

/// Composes `augments` over `base`, left to right, with default configuration.
pub fn compose<I>(base: NodeMap, augments: I) -> Result<Runtime, ComposeError>
where
    I: IntoIterator<Item = PluginAugment>,
{
    Runtime::new(base, SchemaformConfig::default()).with_plugins(augments)
}

#[derive(Clone)]
pub struct Runtime {
    nodes: NodeMap,
    owners: BTreeMap<String, String>,
    plugins: Vec<String>,
    plugin_utils: BTreeMap<String, PluginUtils>,
    schema_utils: Arc<dyn SchemaUtils>,
    data: Map<String, Value>,
    hooks: Vec<(String, Arc<dyn ValidateHook>)>,
    config: SchemaformConfig,
}

impl Runtime {
    /// A runtime holding only the base node map.
    pub fn new(base: NodeMap, config: SchemaformConfig) -> Self {
        let owners = base
            .keys()
            .map(|kind| (kind.clone(), BASE_OWNER.to_string()))
            .collect();
        Self {
            nodes: base,
            owners,
            plugins: Vec::new(),
            plugin_utils: BTreeMap::new(),
            schema_utils: Arc::new(CoreUtils),
            data: Map::new(),
            hooks: Vec::new(),
            config,
        }
    }

    // ================================================================
    // Composition
    // ================================================================

    /// Returns a new runtime with `augment` folded in.
    pub fn with_plugin(&self, augment: PluginAugment) -> Result<Self, ComposeError> {
        let parts = augment.into_parts();
        if self.plugins.iter().any(|p| *p == parts.name) {
            return Err(ComposeError::DuplicatePlugin(parts.name));
        }

        let mut next = self.clone();
        let node_count = parts.nodes.len();
        for (kind, node) in parts.nodes {
            if let Some(existing) = next.owners.get(&kind) {
                match self.config.compose.on_collision {
                    CollisionPolicy::Reject => {
                        return Err(ComposeError::NodeKindCollision {
                            kind,
                            plugin: parts.name,
                            existing: existing.clone(),
                        });
                    }
                    CollisionPolicy::LastWins => {
                        warn!(
                            kind = %kind,
                            plugin = %parts.name,
                            existing = %existing,
                            "Node kind replaced by later plugin"
                        );
                    }
                }
            }
            next.owners.insert(kind.clone(), parts.name.clone());
            next.nodes.insert(kind, node);
        }

        if let Some(utils) = parts.utils {
            next.plugin_utils.insert(parts.name.clone(), utils);
        }
        if let Some(schema_utils) = parts.schema_utils {
            next.schema_utils = schema_utils;
        }
        next.data.extend(parts.data);
        if let Some(hook) = parts.validate {
            next.hooks.push((parts.name.clone(), hook));
        }

        info!(plugin = %parts.name, nodes = node_count, "Plugin composed");
        next.plugins.push(parts.name);
        Ok(next)
    }

    pub fn with_plugins<I>(self, augments: I) -> Result<Self, ComposeError>
    where
        I: IntoIterator<Item = PluginAugment>,
    {
        augments
            .into_iter()
            .try_fold(self, |runtime, augment| runtime.with_plugin(augment))
    }

    // ================================================================
    // Lookups
    // ================================================================

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    /// Looks a name up in the composed node map.
    pub fn resolve_ref(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// The plugin that contributed `kind`, or [`BASE_OWNER`].
    pub fn owner(&self, kind: &str) -> Option<&str> {
        self.owners.get(kind).map(String::as_str)
    }

    /// Composed plugin names in composition order.
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p == name)
    }

    /// Utilities registered by `plugin`, if they are a `T`.
    pub fn plugin_utils<T: Any + Send + Sync>(&self, plugin: &str) -> Option<&T> {
        self.plugin_utils.get(plugin)?.downcast_ref::<T>()
    }

    /// The active utility surface: the last plugin to install one wins.
    pub fn utils(&self) -> &dyn SchemaUtils {
        self.schema_utils.as_ref()
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn config(&self) -> &SchemaformConfig {
        &self.config
    }

    pub fn catalog(&self) -> EntityCatalog {
        EntityCatalog::from_data(&self.data)
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Keys owned by the merged sub-schemas of `object`, in declaration
    /// order, excluding its direct properties.
    pub fn merged_keys(&self, object: &ObjectNode) -> Vec<String> {
        let mut keys = Vec::new();
        let mut visited = BTreeSet::new();
        for node in &object.merged {
            self.collect_keys(node, &mut keys, &mut visited);
        }
        keys.retain(|k| !object.properties.contains(k));
        keys
    }

    /// Keys an object-like node declares, following merged sub-schemas,
    /// nullable wrappers and recursive references.
    pub fn object_keys(&self, node: &Node) -> Vec<String> {
        let mut keys = Vec::new();
        self.collect_keys(node, &mut keys, &mut BTreeSet::new());
        keys
    }

    fn collect_keys<'a>(
        &'a self,
        node: &'a Node,
        keys: &mut Vec<String>,
        visited: &mut BTreeSet<&'a str>,
    ) {
        match node {
            Node::Object(object) => {
                for name in object.properties.names() {
                    if !keys.iter().any(|k| k == name) {
                        keys.push(name.to_string());
                    }
                }
                for merged in &object.merged {
                    self.collect_keys(merged, keys, visited);
                }
            }
            Node::Nullable(nullable) => self.collect_keys(&nullable.inner_schema, keys, visited),
            Node::RecursiveRef(reference) => {
                if !visited.insert(reference.ref_name.as_str()) {
                    return;
                }
                match self.resolve_ref(&reference.ref_name) {
                    Some(resolved) => self.collect_keys(resolved, keys, visited),
                    None => debug!(ref_name = %reference.ref_name, "Unresolved merged reference"),
                }
            }
            _ => {}
        }
    }

    // ================================================================
    // Validation
    // ================================================================

    /// Options from this runtime's configuration, at depth 0.
    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions::from(&self.config.validation)
    }

    /// Runs the validation pipeline.
    pub fn validate(&self, args: &ValidateArgs<'_>) -> ValidationResult {
        let options = args
            .options
            .unwrap_or_else(|| self.validation_options());

        if args.schema.core_kind() == Some(NodeKind::Unknown) {
            debug!(path = %args.path, "Unknown node kind, skipping validation");
            return ValidationResult::valid();
        }

        if options.debug {
            debug!(
                path = %args.path,
                depth = options.depth,
                kind = %args.schema.kind(),
                "Validating"
            );
        }

        if options.depth >= options.max_depth {
            warn!(
                path = %args.path,
                max_depth = options.max_depth,
                "Maximum validation depth reached, skipping deeper validation"
            );
            return ValidationResult::valid();
        }
        if options.depth >= options.warn_depth {
            warn!(path = %args.path, depth = options.depth, "Deep validation");
        }

        let args = ValidateArgs {
            options: Some(options),
            ..*args
        };
        self.hooks
            .iter()
            .find_map(|(_, hook)| hook.validate(self, &args))
            .unwrap_or_else(ValidationResult::valid)
    }

    /// Validates `data` against `schema` from the top.
    pub fn validate_value(&self, schema: &Node, path: &str, data: Option<&Value>) -> ValidationResult {
        self.validate(&ValidateArgs::new(schema, path, data))
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("plugins", &self.plugins)
            .field(
                "hooks",
                &self.hooks.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("data", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}
