//! File-level commands behind the `schemaform` binary.

use anyhow::{Context, Result, anyhow};
use schemaform_dispatch::{Capability, RenderOutput, UiRuntime};
use schemaform_runtime::{SchemaformConfig, ValidationResult};
use schemaform_types::{Node, NodeMap};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Reads a node map: a JSON object from schema name to node.
pub fn load_nodes(path: &Path) -> Result<NodeMap> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let nodes: NodeMap = serde_json::from_str(&contents)
        .with_context(|| format!("invalid node map in {}", path.display()))?;
    debug!(nodes = nodes.len(), "Node map loaded");
    Ok(nodes)
}

pub fn load_data(path: &Path) -> Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// A UI runtime over `nodes` with the core plugin composed.
pub fn build_runtime(nodes: NodeMap, config: SchemaformConfig) -> Result<UiRuntime> {
    let ui = UiRuntime::with_core(nodes, config).context("failed to compose runtime")?;
    info!(plugins = ?ui.runtime().plugins(), "Runtime ready");
    Ok(ui)
}

fn schema<'a>(ui: &'a UiRuntime, name: &str) -> Result<&'a Node> {
    ui.runtime()
        .resolve_ref(name)
        .ok_or_else(|| anyhow!("no schema named '{name}' in the node map"))
}

pub fn validate(ui: &UiRuntime, schema_name: &str, data: &Value) -> Result<ValidationResult> {
    let node = schema(ui, schema_name)?;
    Ok(ui.runtime().validate_value(node, "", Some(data)))
}

pub fn render(
    ui: &UiRuntime,
    schema_name: &str,
    data: &Value,
    capability: Capability,
) -> Result<RenderOutput> {
    let node = schema(ui, schema_name)?;
    Ok(ui.render(node, Some(data), capability))
}

/// One entry of the composed node map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindEntry {
    pub name: String,
    pub kind: String,
    pub owner: String,
}

pub fn kinds(ui: &UiRuntime) -> Vec<KindEntry> {
    let runtime = ui.runtime();
    runtime
        .nodes()
        .iter()
        .map(|(name, node)| KindEntry {
            name: name.clone(),
            kind: node.kind().to_string(),
            owner: runtime.owner(name).unwrap_or_default().to_string(),
        })
        .collect()
}
