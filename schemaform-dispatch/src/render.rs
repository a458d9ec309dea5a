//! Render context and the render tree.
//!
//! A render pass turns a (node, value) pair into a [`Rendered`] tree any
//! front end can draw. Renderers never fail: a missing renderer or an
//! unresolved reference becomes a placeholder in the tree.

use crate::registry::{Capability, DispatchRegistry};
use schemaform_runtime::Runtime;
use schemaform_types::Node;
use serde::Serialize;
use serde_json::Value;
use std::cell::Cell;
use tracing::warn;

/// One drawn node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rendered {
    pub kind: String,
    pub path: String,
    pub editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub content: Content,
}

impl Rendered {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn children(&self) -> &[Rendered] {
        match &self.content {
            Content::Children { children } => children,
            _ => &[],
        }
    }

    /// Depth-first search for a placeholder anywhere in the tree.
    pub fn has_placeholder(&self) -> bool {
        self.content.is_placeholder() || self.children().iter().any(Rendered::has_placeholder)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Content {
    Value {
        value: Value,
    },
    Empty,
    Children {
        children: Vec<Rendered>,
    },
    /// No renderer is registered for this kind and capability.
    MissingRenderer {
        kind: String,
        capability: Capability,
    },
    /// A recursive reference named a schema the node map does not hold.
    #[serde(rename_all = "camelCase")]
    UnknownReference {
        ref_name: String,
    },
    /// The pass reached `[render] max_depth` here and stopped descending.
    #[serde(rename_all = "camelCase")]
    DepthLimit {
        max_depth: usize,
    },
}

impl Content {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value {
            value: value.into(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            Self::MissingRenderer { .. } | Self::UnknownReference { .. } | Self::DepthLimit { .. }
        )
    }
}

/// Counters for one render pass.
#[derive(Debug, Default)]
pub struct RenderStats {
    dispatches: Cell<usize>,
    ref_resolutions: Cell<usize>,
    max_depth: Cell<usize>,
}

impl RenderStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_dispatch(&self, depth: usize) {
        self.dispatches.set(self.dispatches.get() + 1);
        if depth > self.max_depth.get() {
            self.max_depth.set(depth);
        }
    }

    fn record_ref_resolution(&self) {
        self.ref_resolutions.set(self.ref_resolutions.get() + 1);
    }

    pub fn summary(&self) -> RenderSummary {
        RenderSummary {
            dispatches: self.dispatches.get(),
            ref_resolutions: self.ref_resolutions.get(),
            max_depth: self.max_depth.get(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSummary {
    pub dispatches: usize,
    pub ref_resolutions: usize,
    pub max_depth: usize,
}

/// Everything a renderer needs: the runtime, the registry to recurse
/// through, where it is in the value, and the pass counters.
#[derive(Clone)]
pub struct RenderContext<'a> {
    runtime: &'a Runtime,
    registry: &'a DispatchRegistry,
    capability: Capability,
    path: String,
    depth: usize,
    max_depth: usize,
    stats: &'a RenderStats,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        runtime: &'a Runtime,
        registry: &'a DispatchRegistry,
        capability: Capability,
        stats: &'a RenderStats,
    ) -> Self {
        Self {
            runtime,
            registry,
            capability,
            path: String::new(),
            depth: 0,
            max_depth: runtime.config().render.max_depth,
            stats,
        }
    }

    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for the field `key` one level down.
    pub fn child(&self, key: &str) -> Self {
        let path = if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        };
        self.descend(path)
    }

    /// Context for the item at `index` one level down.
    pub fn item(&self, index: usize) -> Self {
        self.descend(format!("{}[{index}]", self.path))
    }

    /// Context one level down at the same path, for wrappers and merged
    /// sub-schemas.
    pub fn nested(&self) -> Self {
        self.descend(self.path.clone())
    }

    fn descend(&self, path: String) -> Self {
        Self {
            path,
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    /// Renders `node` with whatever renderer is registered for its kind.
    /// At the configured depth bound a placeholder is returned instead.
    pub fn dispatch(&self, node: &Node, value: Option<&Value>) -> Rendered {
        self.stats.record_dispatch(self.depth);
        if self.depth >= self.max_depth {
            warn!(
                path = %self.path,
                kind = %node.kind(),
                max_depth = self.max_depth,
                "Render depth limit reached"
            );
            return self.leaf(
                node,
                Content::DepthLimit {
                    max_depth: self.max_depth,
                },
            );
        }
        match self.registry.resolve(node.kind(), self.capability) {
            Some(renderer) => renderer.render(self, node, value),
            None => self.leaf(
                node,
                Content::MissingRenderer {
                    kind: node.kind().to_string(),
                    capability: self.capability,
                },
            ),
        }
    }

    /// Resolves a recursive reference against the runtime's node map.
    pub fn resolve_ref(&self, name: &str) -> Option<&'a Node> {
        self.stats.record_ref_resolution();
        self.runtime.resolve_ref(name)
    }

    /// A rendered node at this context's path.
    pub fn leaf(&self, node: &Node, content: Content) -> Rendered {
        Rendered {
            kind: node.kind().to_string(),
            path: self.path.clone(),
            editable: self.capability == Capability::Edit,
            label: None,
            content,
        }
    }
}
