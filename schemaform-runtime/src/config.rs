//! Runtime configuration, read from `schemaform.toml`.
//!
//! Every field has a default, so an empty or absent file is a valid
//! configuration. [`SchemaformConfig::load_from`] is lenient and falls back to
//! defaults; [`SchemaformConfig::from_toml_str`] reports what was wrong.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// What composition does when two plugins contribute the same node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Fail composition with [`ComposeError::NodeKindCollision`](crate::ComposeError).
    Reject,
    /// The later plugin replaces the earlier node, with a warning.
    LastWins,
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Reject
        } else {
            Self::LastWins
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_warn_depth")]
    pub warn_depth: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub debug: bool,
}

fn default_warn_depth() -> usize {
    15
}

fn default_max_depth() -> usize {
    20
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            warn_depth: default_warn_depth(),
            max_depth: default_max_depth(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeConfig {
    #[serde(default)]
    pub on_collision: CollisionPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_non_retryable_statuses")]
    pub non_retryable_statuses: Vec<u16>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_non_retryable_statuses() -> Vec<u16> {
    vec![400, 401, 403, 404]
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            non_retryable_statuses: default_non_retryable_statuses(),
        }
    }
}

/// Depth bound for a render pass. A cyclic schema that hands the same value
/// back to itself stops here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_render_max_depth")]
    pub max_depth: usize,
}

fn default_render_max_depth() -> usize {
    64
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: default_render_max_depth(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaformConfig {
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub compose: ComposeConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl SchemaformConfig {
    /// Loads configuration from `path`, falling back to defaults with a
    /// warning when the file is missing, unreadable or invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Reads a config file strictly.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.validation.warn_depth > self.validation.max_depth {
            return Err(ConfigError::Invalid(format!(
                "validation.warn_depth ({}) exceeds validation.max_depth ({})",
                self.validation.warn_depth, self.validation.max_depth
            )));
        }
        if self.render.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "render.max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = SchemaformConfig::from_toml_str("").unwrap();
        assert_eq!(config, SchemaformConfig::default());
        assert_eq!(config.validation.warn_depth, 15);
        assert_eq!(config.validation.max_depth, 20);
        assert_eq!(config.fetch.non_retryable_statuses, vec![400, 401, 403, 404]);
        assert_eq!(config.render.max_depth, 64);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[validation]
warn_depth = 4
max_depth = 8
debug = true

[compose]
on_collision = "last-wins"

[fetch]
max_retries = 5
non_retryable_statuses = [404]

[render]
max_depth = 32
"#;
        let config = SchemaformConfig::from_toml_str(toml_str).unwrap();

        assert_eq!(config.validation.max_depth, 8);
        assert!(config.validation.debug);
        assert_eq!(config.compose.on_collision, CollisionPolicy::LastWins);
        assert_eq!(config.fetch.max_retries, 5);
        assert_eq!(config.fetch.non_retryable_statuses, vec![404]);
        assert_eq!(config.render.max_depth, 32);
    }

    #[test]
    fn zero_render_depth_is_rejected() {
        let err = SchemaformConfig::from_toml_str("[render]\nmax_depth = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn warn_depth_beyond_max_depth_is_rejected() {
        let err = SchemaformConfig::from_toml_str("[validation]\nwarn_depth = 30\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_collision_policy_is_a_parse_error() {
        let err = SchemaformConfig::from_toml_str("[compose]\non_collision = \"merge\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    #[cfg(debug_assertions)]
    fn debug_builds_reject_collisions_by_default() {
        assert_eq!(CollisionPolicy::default(), CollisionPolicy::Reject);
    }
}
