//! Plugin composition and validation for schemaform.
//!
//! A [`Runtime`] is built by folding an ordered list of [`PluginAugment`]s
//! over a base node map. Each augment may add node kinds, utilities, data
//! and a [`ValidateHook`]; the runtime keeps them in composition order.
//!
//! ```text
//! base nodes ─► core ─► plugin A ─► plugin B ─► Runtime
//! ```
//!
//! Validation walks the hooks in that order and stops at the first one that
//! returns a result. Nodes of the sentinel kind `unknown` always validate.

mod builtin;
mod catalog;
mod config;
mod error;
mod plugin;
mod runtime;
pub mod utils;
mod validation;

pub use builtin::{CORE_PLUGIN_NAME, CoreValidator, core_plugin, validate_field, validate_object};
pub use catalog::{ENTITY_NODE, EntityCatalog};
pub use config::{
    CollisionPolicy, ComposeConfig, FetchConfig, RenderConfig, SchemaformConfig, ValidationConfig,
};
pub use error::{ComposeError, ConfigError};
pub use plugin::{PluginAugment, PluginUtils};
pub use runtime::{BASE_OWNER, Runtime, compose};
pub use utils::{CoreUtils, SchemaUtils};
pub use validation::{
    ValidateArgs, ValidateHook, ValidationError, ValidationOptions, ValidationResult,
};
