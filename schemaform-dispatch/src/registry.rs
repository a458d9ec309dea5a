//! Lookup table from (node kind, capability) to renderer.

use crate::render::{RenderContext, Rendered};
use schemaform_types::Node;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Whether a value is being edited or only shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Edit,
    View,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::Edit, Capability::View];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::View => "view",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Draws one node. Compound renderers recurse through
/// [`RenderContext::dispatch`].
pub trait Renderer: Send + Sync {
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered;
}

/// Adapts a closure into a [`Renderer`].
pub struct FnRenderer<F>(pub F);

impl<F> Renderer for FnRenderer<F>
where
    F: Fn(&RenderContext<'_>, &Node, Option<&Value>) -> Rendered + Send + Sync,
{
    fn render(&self, ctx: &RenderContext<'_>, node: &Node, value: Option<&Value>) -> Rendered {
        (self.0)(ctx, node, value)
    }
}

/// Wraps a closure as a shareable renderer.
pub fn renderer_fn<F>(f: F) -> Arc<dyn Renderer>
where
    F: Fn(&RenderContext<'_>, &Node, Option<&Value>) -> Rendered + Send + Sync + 'static,
{
    Arc::new(FnRenderer(f))
}

/// A flat two-key table. There is no fallback between kinds or capabilities.
#[derive(Clone, Default)]
pub struct DispatchRegistry {
    renderers: HashMap<(String, Capability), Arc<dyn Renderer>>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `renderer`, replacing any earlier one for the same pair.
    pub fn register(&mut self, kind: impl Into<String>, capability: Capability, renderer: Arc<dyn Renderer>) {
        let kind = kind.into();
        if self
            .renderers
            .insert((kind.clone(), capability), renderer)
            .is_some()
        {
            debug!(kind = %kind, capability = %capability, "Renderer overridden");
        }
    }

    pub fn resolve(&self, kind: &str, capability: Capability) -> Option<Arc<dyn Renderer>> {
        self.renderers.get(&(kind.to_string(), capability)).cloned()
    }

    pub fn contains(&self, kind: &str, capability: Capability) -> bool {
        self.renderers.contains_key(&(kind.to_string(), capability))
    }

    /// Every kind with at least one renderer, sorted.
    pub fn kinds(&self) -> BTreeSet<&str> {
        self.renderers.keys().map(|(kind, _)| kind.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

impl fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<String> = self
            .renderers
            .keys()
            .map(|(kind, capability)| format!("{kind}/{capability}"))
            .collect();
        entries.sort();
        f.debug_struct("DispatchRegistry")
            .field("renderers", &entries)
            .finish()
    }
}
