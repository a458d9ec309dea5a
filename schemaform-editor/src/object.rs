//! The compound field reconciler.
//!
//! An object node's value is edited through one buffer whose keys fall into
//! three disjoint slices:
//!
//! - **direct**: the node's own `properties`
//! - **merged**: keys declared by its merged sub-schemas, minus direct keys
//! - **additional**: everything else, governed by `additionalProperties`
//!
//! Direct keys win over merged keys, and both win over additional keys.

use crate::dirty::{ChangeSet, reconcile};
use crate::error::EditorError;
use schemaform_runtime::{Runtime, ValidationResult, validate_object};
use schemaform_types::{Node, ObjectNode};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// The buffer holds the last committed value.
    Clean,
    /// The buffer has been edited since the last commit or rollback.
    Dirty,
}

/// One merged sub-schema with the buffer entries it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedField<'a> {
    pub schema: &'a Node,
    pub value: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct CompoundField {
    node: ObjectNode,
    direct_keys: Vec<String>,
    merged_keys: Vec<String>,
    committed: Option<Value>,
    buffer: Map<String, Value>,
    changes: ChangeSet,
    state: FieldState,
    reset_count: u64,
}

impl CompoundField {
    /// A reconciler over `node`, initialised with `value`. Merged keys are
    /// resolved once against `runtime`.
    pub fn new(node: ObjectNode, runtime: &Runtime, value: Option<&Value>) -> Self {
        let direct_keys = node.properties.names().map(str::to_string).collect();
        let merged_keys = runtime.merged_keys(&node);
        let mut field = Self {
            node,
            direct_keys,
            merged_keys,
            committed: None,
            buffer: Map::new(),
            changes: ChangeSet::new(),
            state: FieldState::Clean,
            reset_count: 0,
        };
        field.initialize(value);
        field
    }

    // ================================================================
    // Transitions
    // ================================================================

    /// Replaces the buffer with `value` (empty when absent or not an object).
    pub fn initialize(&mut self, value: Option<&Value>) {
        self.committed = value.cloned();
        self.buffer = entries_of(value);
        self.changes.clear();
        self.state = FieldState::Clean;
    }

    /// Applies an externally updated value, unless the user is mid-edit or
    /// the value is still absent. Returns whether the value was taken.
    pub fn receive_value(&mut self, value: Option<&Value>) -> bool {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return false;
        };
        if self.state == FieldState::Dirty {
            debug!("Ignoring external value while field is dirty");
            return false;
        }
        self.initialize(Some(value));
        true
    }

    /// Sets one direct property. `None` removes the key, as does `null` on
    /// a nullable field.
    pub fn set_direct_field(
        &mut self,
        name: &str,
        value: Option<Value>,
        nullable: bool,
    ) -> Result<(), EditorError> {
        if !self.is_direct(name) {
            return Err(EditorError::UnknownField(name.to_string()));
        }

        match value {
            None => {
                self.buffer.shift_remove(name);
                self.changes.record(name, None);
            }
            Some(Value::Null) if nullable => {
                self.buffer.shift_remove(name);
                self.changes.record(name, None);
            }
            Some(value) => {
                self.changes.record(name, Some(value.clone()));
                self.buffer.insert(name.to_string(), value);
            }
        }
        self.state = FieldState::Dirty;
        Ok(())
    }

    /// Replaces the whole merged slice. Keys of direct properties are not
    /// taken from `values`. Surviving keys keep their buffer position.
    pub fn set_merged_fields(&mut self, values: Map<String, Value>) {
        let dropped: Vec<String> = self
            .merged_keys
            .iter()
            .filter(|k| self.buffer.contains_key(k.as_str()) && !values.contains_key(k.as_str()))
            .cloned()
            .collect();
        self.remove_all(dropped);
        for (key, value) in values {
            if self.is_direct(&key) {
                debug!(key = %key, "Dropping merged value shadowed by a direct property");
                continue;
            }
            self.changes.record(key.clone(), Some(value.clone()));
            self.buffer.insert(key, value);
        }
        self.state = FieldState::Dirty;
    }

    /// Replaces the whole additional slice. Keys of direct or merged
    /// properties are not taken from `values`. Surviving keys keep their
    /// buffer position.
    pub fn set_additional_fields(&mut self, values: Map<String, Value>) {
        let dropped: Vec<String> = self
            .additional_keys()
            .into_iter()
            .filter(|k| !values.contains_key(k.as_str()))
            .collect();
        self.remove_all(dropped);
        for (key, value) in values {
            if self.is_direct(&key) || self.is_merged(&key) {
                debug!(key = %key, "Dropping additional value shadowed by a declared property");
                continue;
            }
            self.changes.record(key.clone(), Some(value.clone()));
            self.buffer.insert(key, value);
        }
        self.state = FieldState::Dirty;
    }

    fn remove_all(&mut self, keys: Vec<String>) {
        for key in keys {
            self.buffer.shift_remove(&key);
            self.changes.record(key, None);
        }
    }

    /// Object-level validation of the current buffer.
    pub fn validation(&self, runtime: &Runtime) -> ValidationResult {
        validate_object(
            runtime,
            "",
            &self.value(),
            &self.node,
            runtime.validation_options(),
        )
    }

    pub fn can_commit(&self, runtime: &Runtime) -> bool {
        self.validation(runtime).valid
    }

    /// Hands the buffer to the caller and returns to Clean. `None` when the
    /// buffer does not validate; nothing changes in that case.
    pub fn commit(&mut self, runtime: &Runtime) -> Option<Map<String, Value>> {
        let result = self.validation(runtime);
        if !result.valid {
            debug!(errors = result.errors.len(), "Commit rejected");
            return None;
        }
        self.committed = Some(self.value());
        self.changes.clear();
        self.state = FieldState::Clean;
        Some(self.buffer.clone())
    }

    /// Restores the last committed value and bumps the reset counter.
    pub fn rollback(&mut self) {
        self.buffer = entries_of(self.committed.as_ref());
        self.changes.clear();
        self.state = FieldState::Clean;
        self.reset_count += 1;
    }

    // ================================================================
    // Queries
    // ================================================================

    pub fn state(&self) -> FieldState {
        self.state
    }

    /// Whether the buffer really differs from the committed value.
    pub fn is_dirty(&self) -> bool {
        self.state == FieldState::Dirty
            && reconcile(self.committed.as_ref(), Some(&self.value()), &self.changes)
    }

    pub fn reset_count(&self) -> u64 {
        self.reset_count
    }

    pub fn node(&self) -> &ObjectNode {
        &self.node
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn committed(&self) -> Option<&Value> {
        self.committed.as_ref()
    }

    pub fn buffer(&self) -> &Map<String, Value> {
        &self.buffer
    }

    pub fn value(&self) -> Value {
        Value::Object(self.buffer.clone())
    }

    /// Direct properties to draw, without `id`, in display order. Ordering
    /// uses the committed value so fields don't jump while typing.
    pub fn fields<'a>(&'a self, runtime: &Runtime) -> Vec<(&'a str, &'a Node)> {
        let fields = self
            .node
            .properties
            .iter()
            .filter(|(name, _)| *name != "id")
            .collect();
        runtime
            .utils()
            .sort_entity_properties(fields, self.committed.as_ref(), &self.node.required)
    }

    /// Each merged sub-schema with the buffer entries it declares.
    pub fn merged_fields<'a>(&'a self, runtime: &Runtime) -> Vec<MergedField<'a>> {
        self.node
            .merged
            .iter()
            .map(|schema| {
                let keys = runtime.object_keys(schema);
                let value = self
                    .buffer
                    .iter()
                    .filter(|(k, _)| keys.contains(k) && !self.is_direct(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                MergedField { schema, value }
            })
            .collect()
    }

    pub fn direct_keys(&self) -> &[String] {
        &self.direct_keys
    }

    pub fn merged_keys(&self) -> &[String] {
        &self.merged_keys
    }

    /// Buffer keys outside the direct and merged slices.
    pub fn additional_keys(&self) -> Vec<String> {
        self.buffer
            .keys()
            .filter(|k| !self.is_direct(k) && !self.is_merged(k))
            .cloned()
            .collect()
    }

    pub fn direct_values(&self) -> Map<String, Value> {
        self.slice(|k| self.is_direct(k))
    }

    pub fn merged_values(&self) -> Map<String, Value> {
        self.slice(|k| self.is_merged(k))
    }

    /// Values of the additional slice. Empty when the node declares no
    /// `additionalProperties`.
    pub fn additional_values(&self) -> Map<String, Value> {
        if self.node.additional_properties.is_none() {
            return Map::new();
        }
        self.slice(|k| !self.is_direct(k) && !self.is_merged(k))
    }

    fn slice(&self, keep: impl Fn(&str) -> bool) -> Map<String, Value> {
        self.buffer
            .iter()
            .filter(|(k, _)| keep(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn is_direct(&self, key: &str) -> bool {
        self.direct_keys.iter().any(|k| k == key)
    }

    fn is_merged(&self, key: &str) -> bool {
        self.merged_keys.iter().any(|k| k == key)
    }
}

fn entries_of(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}
