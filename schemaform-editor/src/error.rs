//! Error types for field editing and link resolution.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("'{0}' is not a direct property of this object")]
    UnknownField(String),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("expected a link node, got '{0}'")]
    NotALink(String),

    #[error("link value is a reference, not an inline entity")]
    NotInline,

    #[error(transparent)]
    Invalid(#[from] schemaform_types::Error),
}
