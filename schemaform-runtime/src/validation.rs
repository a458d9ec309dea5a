//! Validation pipeline types.
//!
//! Plugins contribute [`ValidateHook`]s; the runtime runs them in composition
//! order and the first hook with an opinion decides the result.

use crate::config::ValidationConfig;
use crate::runtime::Runtime;
use schemaform_types::Node;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>, value: Option<&Value>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            value: value.cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// Valid exactly when `errors` is empty.
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn error(path: impl Into<String>, message: impl Into<String>, value: Option<&Value>) -> Self {
        Self::from_errors(vec![ValidationError::new(path, message, value)])
    }
}

/// Depth control for one validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    pub depth: usize,
    pub warn_depth: usize,
    pub max_depth: usize,
    pub debug: bool,
}

impl ValidationOptions {
    /// Options for a child one level down.
    pub fn descend(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self::from(&ValidationConfig::default())
    }
}

impl From<&ValidationConfig> for ValidationOptions {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            depth: 0,
            warn_depth: config.warn_depth,
            max_depth: config.max_depth,
            debug: config.debug,
        }
    }
}

/// Arguments to one validation call.
///
/// `data` is `None` when the value is absent, which is distinct from JSON
/// `null` for optional fields. `path` only labels errors.
#[derive(Debug, Clone, Copy)]
pub struct ValidateArgs<'a> {
    pub schema: &'a Node,
    pub path: &'a str,
    pub data: Option<&'a Value>,
    /// `None` uses the runtime's configured options at depth 0.
    pub options: Option<ValidationOptions>,
}

impl<'a> ValidateArgs<'a> {
    pub fn new(schema: &'a Node, path: &'a str, data: Option<&'a Value>) -> Self {
        Self {
            schema,
            path,
            data,
            options: None,
        }
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// A plugin's contribution to the validation pipeline.
///
/// Return `None` to defer to later hooks. Returning a result stops the chain.
pub trait ValidateHook: Send + Sync {
    fn validate(&self, runtime: &Runtime, args: &ValidateArgs<'_>) -> Option<ValidationResult>;
}

/// Adapts a closure into a [`ValidateHook`].
pub(crate) struct FnHook<F>(pub(crate) F);

impl<F> ValidateHook for FnHook<F>
where
    F: Fn(&Runtime, &ValidateArgs<'_>) -> Option<ValidationResult> + Send + Sync,
{
    fn validate(&self, runtime: &Runtime, args: &ValidateArgs<'_>) -> Option<ValidationResult> {
        (self.0)(runtime, args)
    }
}
