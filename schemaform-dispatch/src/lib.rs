//! Node dispatch for schemaform.
//!
//! Renderers are looked up by `(node kind, capability)` in a flat
//! [`DispatchRegistry`]. Nesting is handled by the renderers themselves:
//! a compound renderer calls [`RenderContext::dispatch`] for each child.
//!
//! Recursive references are resolved against the runtime's node map while
//! rendering, one frame at a time, so a cyclic schema only recurses as deep
//! as the value being drawn.

mod registry;
mod render;
mod renderers;
mod ui;

pub use registry::{Capability, DispatchRegistry, FnRenderer, Renderer, renderer_fn};
pub use render::{Content, RenderContext, RenderStats, RenderSummary, Rendered};
pub use renderers::core_renderer;
pub use ui::{RenderOutput, UiPlugin, UiRuntime, core_ui_plugin};
