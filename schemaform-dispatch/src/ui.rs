//! UI plugins and the UI runtime.
//!
//! A UI plugin pairs a schema [`PluginAugment`] with renderer registrations.
//! Composing one into a [`UiRuntime`] extends both halves and returns a new
//! value.

use crate::registry::{Capability, DispatchRegistry, Renderer, renderer_fn};
use crate::render::{RenderContext, RenderStats, RenderSummary, Rendered};
use crate::renderers::core_renderer;
use schemaform_runtime::{ComposeError, PluginAugment, Runtime, SchemaformConfig, core_plugin};
use schemaform_types::{Node, NodeKind, NodeMap};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct UiPlugin {
    augment: PluginAugment,
    renderers: Vec<(String, Capability, Arc<dyn Renderer>)>,
}

impl UiPlugin {
    pub fn new(augment: PluginAugment) -> Self {
        Self {
            augment,
            renderers: Vec::new(),
        }
    }

    pub fn with_renderer(
        mut self,
        kind: impl Into<String>,
        capability: Capability,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        self.renderers.push((kind.into(), capability, renderer));
        self
    }

    /// Registers one renderer for both edit and view.
    pub fn with_renderers(mut self, kind: impl Into<String>, renderer: Arc<dyn Renderer>) -> Self {
        let kind = kind.into();
        for capability in Capability::ALL {
            self.renderers
                .push((kind.clone(), capability, Arc::clone(&renderer)));
        }
        self
    }

    pub fn with_renderer_fn<F>(self, kind: impl Into<String>, capability: Capability, f: F) -> Self
    where
        F: Fn(&RenderContext<'_>, &Node, Option<&Value>) -> Rendered + Send + Sync + 'static,
    {
        self.with_renderer(kind, capability, renderer_fn(f))
    }

    pub fn name(&self) -> &str {
        self.augment.name()
    }
}

/// The core schema plugin plus edit and view renderers for every core kind.
pub fn core_ui_plugin(base: &NodeMap) -> UiPlugin {
    NodeKind::CORE
        .into_iter()
        .chain([NodeKind::Unknown])
        .fold(UiPlugin::new(core_plugin(base)), |plugin, kind| {
            plugin.with_renderers(kind.as_str(), core_renderer(kind))
        })
}

/// Output of one render pass.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutput {
    pub tree: Rendered,
    pub stats: RenderSummary,
}

#[derive(Debug, Clone)]
pub struct UiRuntime {
    runtime: Runtime,
    registry: DispatchRegistry,
}

impl UiRuntime {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            runtime,
            registry: DispatchRegistry::new(),
        }
    }

    /// A runtime over `base` with the core UI plugin composed.
    pub fn with_core(base: NodeMap, config: SchemaformConfig) -> Result<Self, ComposeError> {
        let core = core_ui_plugin(&base);
        Self::new(Runtime::new(base, config)).with_plugin(core)
    }

    pub fn with_plugin(&self, plugin: UiPlugin) -> Result<Self, ComposeError> {
        let name = plugin.name().to_string();
        let runtime = self.runtime.with_plugin(plugin.augment)?;
        let mut registry = self.registry.clone();
        let count = plugin.renderers.len();
        for (kind, capability, renderer) in plugin.renderers {
            registry.register(kind, capability, renderer);
        }
        debug!(plugin = %name, renderers = count, "Renderers registered");
        Ok(Self { runtime, registry })
    }

    pub fn with_plugins<I>(self, plugins: I) -> Result<Self, ComposeError>
    where
        I: IntoIterator<Item = UiPlugin>,
    {
        plugins
            .into_iter()
            .try_fold(self, |ui, plugin| ui.with_plugin(plugin))
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn registry(&self) -> &DispatchRegistry {
        &self.registry
    }

    pub fn resolve(&self, kind: &str, capability: Capability) -> Option<Arc<dyn Renderer>> {
        self.registry.resolve(kind, capability)
    }

    /// Renders `value` against `node` from the root.
    pub fn render(&self, node: &Node, value: Option<&Value>, capability: Capability) -> RenderOutput {
        let stats = RenderStats::new();
        let ctx = RenderContext::new(&self.runtime, &self.registry, capability, &stats);
        let tree = ctx.dispatch(node, value);
        RenderOutput {
            tree,
            stats: stats.summary(),
        }
    }
}
