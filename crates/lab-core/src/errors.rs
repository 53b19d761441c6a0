//! Error types shared by every crate that works with the exam catalog.
//!
//! All failures are local and synchronous. Nothing here retries; each variant
//! carries enough detail for the caller to re-prompt or abort.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::enums::{DataType, EntityType, InstanceState};
use crate::ids::{DefinitionId, InstanceId};

/// A single field-level validation message.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FieldViolation {
    /// Path of the offending input, e.g. `code` or `fields[2].name`.
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_ids<T: fmt::Display>(ids: &[T]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn definition_label(id: &Option<DefinitionId>) -> String {
    id.map_or_else(|| "<new>".to_string(), |id| id.to_string())
}

fn offending_label(id: &Option<DefinitionId>) -> String {
    id.map_or_else(String::new, |id| format!(" (offending id {id})"))
}

/// Errors raised by catalog authoring, result capture, and state transitions.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: EntityType, id: String },

    /// Authoring input failed field-level validation.
    #[error("Validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// A definition violates the type/child composition rules.
    ///
    /// `offending_id` names the child or parent at fault. It is `None` when the
    /// definition's own shape is wrong, e.g. a composite with fields.
    #[error(
        "Invalid composition for definition {}: {reason}{}",
        definition_label(.definition_id),
        offending_label(.offending_id)
    )]
    InvalidComposition {
        definition_id: Option<DefinitionId>,
        offending_id: Option<DefinitionId>,
        reason: String,
    },

    /// A captured value does not conform to the field's declared type.
    #[error("Value '{value}' does not match type {data_type} of field '{field}'")]
    TypeMismatch {
        field: String,
        data_type: DataType,
        value: String,
    },

    /// A mutation was attempted against a state that forbids it.
    #[error("Invalid state: {entity_type} {id} is {state}: {reason}")]
    InvalidState {
        entity_type: EntityType,
        id: String,
        state: InstanceState,
        reason: String,
    },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: EntityType,
        id: String,
        from: InstanceState,
        to: InstanceState,
    },

    /// Completion was requested before required data was present.
    #[error(
        "Instance {instance_id} is incomplete: missing fields [{}], incomplete children [{}]",
        .missing_fields.join(", "),
        join_ids(.incomplete_children)
    )]
    IncompleteData {
        instance_id: InstanceId,
        missing_fields: Vec<String>,
        incomplete_children: Vec<InstanceId>,
    },

    /// The definition is deactivated and cannot be used for new requests.
    #[error("Exam definition {id} is inactive")]
    InactiveDefinition { id: DefinitionId },
}

impl CoreError {
    /// Shorthand for a `NotFound` error.
    #[must_use]
    pub fn not_found(entity_type: EntityType, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Whether the caller can reasonably retry after re-reading state.
    ///
    /// Only incomplete parents qualify: their children may complete concurrently.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::IncompleteData { .. })
    }
}
