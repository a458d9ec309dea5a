//! Error types for runtime composition and configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("plugin already composed: {0}")]
    DuplicatePlugin(String),

    #[error("node kind '{kind}' from plugin '{plugin}' collides with plugin '{existing}'")]
    NodeKindCollision {
        kind: String,
        plugin: String,
        existing: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}
