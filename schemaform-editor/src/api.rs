//! Entity collaborators.
//!
//! The editor never performs I/O. Fetching and persisting entities is the
//! job of an [`EntityApi`] supplied by the host; this module holds that
//! contract, its error value and the retry policy applied to fetches.

use schemaform_runtime::FetchConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// A failed collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// An error whose message is read from a response body.
    pub fn from_body(status: Option<u16>, body: Option<&Value>) -> Self {
        Self::new(status, api_error_message(body, DEFAULT_ERROR_MESSAGE))
    }
}

/// Extracts a human readable message from an error body: the body itself
/// when it is a string, its `message` field, or the serialised body.
pub fn api_error_message(body: Option<&Value>, fallback: &str) -> String {
    let Some(body) = body else {
        return fallback.to_string();
    };

    match body {
        Value::Null | Value::Bool(false) => fallback.to_string(),
        Value::String(message) if message.is_empty() => fallback.to_string(),
        Value::String(message) => message.clone(),
        Value::Object(fields) => match fields.get("message").and_then(Value::as_str) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ if fields.is_empty() => fallback.to_string(),
            _ => body.to_string(),
        },
        other => other.to_string(),
    }
}

/// An entity as returned by the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResponse {
    pub id: String,
    pub entity_type: String,
    pub data: Map<String, Value>,
}

/// Host-provided persistence for entities.
pub trait EntityApi {
    fn fetch_entity(&self, entity_type: &str, id: &str) -> Result<EntityResponse, ApiError>;

    fn create_entity(
        &self,
        entity_type: &str,
        data: &Map<String, Value>,
    ) -> Result<EntityResponse, ApiError>;

    fn update_entity(
        &self,
        entity_type: &str,
        id: &str,
        data: &Map<String, Value>,
    ) -> Result<EntityResponse, ApiError>;

    fn remove_entity(&self, entity_type: &str, id: &str) -> Result<(), ApiError>;
}

/// Bounded retry for fetches. Failures with a status in the non-retryable
/// set are final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub non_retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            non_retryable_statuses: config.non_retryable_statuses.clone(),
        }
    }
}

impl RetryPolicy {
    /// `failures` is the number of failures before this one.
    pub fn should_retry(&self, failures: u32, error: &ApiError) -> bool {
        let final_status = error
            .status
            .is_some_and(|status| self.non_retryable_statuses.contains(&status));
        !final_status && failures < self.max_retries
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    /// No identifier, so no request was made.
    Disabled,
    Loaded(EntityResponse),
    Failed { error: ApiError, attempts: u32 },
}

impl FetchState {
    pub fn entity(&self) -> Option<&EntityResponse> {
        match self {
            Self::Loaded(entity) => Some(entity),
            _ => None,
        }
    }
}

/// Fetches `(entity_type, id)` under `policy`. An absent or empty id never
/// reaches the collaborator.
pub fn fetch_entity_with_retry(
    api: &dyn EntityApi,
    entity_type: &str,
    id: Option<&str>,
    policy: &RetryPolicy,
) -> FetchState {
    let Some(id) = id.filter(|id| !id.is_empty()) else {
        return FetchState::Disabled;
    };

    let mut failures = 0;
    loop {
        match api.fetch_entity(entity_type, id) {
            Ok(entity) => return FetchState::Loaded(entity),
            Err(error) if policy.should_retry(failures, &error) => {
                failures += 1;
                debug!(entity_type = %entity_type, id = %id, failures, "Retrying fetch");
            }
            Err(error) => {
                warn!(entity_type = %entity_type, id = %id, error = %error, "Fetch failed");
                return FetchState::Failed {
                    error,
                    attempts: failures + 1,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_sources() {
        assert_eq!(api_error_message(None, "fallback"), "fallback");
        assert_eq!(api_error_message(Some(&json!("boom")), "fallback"), "boom");
        assert_eq!(
            api_error_message(Some(&json!({"message": "not found"})), "fallback"),
            "not found"
        );
        assert_eq!(
            api_error_message(Some(&json!({"code": 7})), "fallback"),
            r#"{"code":7}"#
        );
        assert_eq!(api_error_message(Some(&json!({})), "fallback"), "fallback");
        assert_eq!(api_error_message(Some(&json!({"message": ""})), "fallback"), r#"{"message":""}"#);
    }

    #[test]
    fn non_retryable_statuses_are_final() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(0, &ApiError::new(Some(404), "gone")));
        assert!(policy.should_retry(0, &ApiError::new(Some(500), "down")));
        assert!(policy.should_retry(2, &ApiError::new(None, "network")));
        assert!(!policy.should_retry(3, &ApiError::new(None, "network")));
    }
}
