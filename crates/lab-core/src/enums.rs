//! Data types, exam types, instance states, and audit vocabulary.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! [`InstanceState`] provides `allowed_next_states()` to enforce valid
//! transitions at the service layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// DataType
// ---------------------------------------------------------------------------

/// Declared type of a reportable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Text,
    Number,
    Select,
    Boolean,
    Longtext,
}

impl DataType {
    /// Whether captured values of this type take part in numeric range checks.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Number)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Select => "select",
            Self::Boolean => "boolean",
            Self::Longtext => "longtext",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ExamType
// ---------------------------------------------------------------------------

/// Shape of an exam definition.
///
/// ```text
/// simple    → own fields only
/// composite → child exams only
/// hybrid    → own fields + child exams
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExamType {
    Simple,
    Composite,
    Hybrid,
}

impl ExamType {
    /// Whether instances of this type hold result captures of their own.
    #[must_use]
    pub const fn has_fields(self) -> bool {
        matches!(self, Self::Simple | Self::Hybrid)
    }

    /// Whether instances of this type own child instances.
    #[must_use]
    pub const fn has_children(self) -> bool {
        matches!(self, Self::Composite | Self::Hybrid)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Composite => "composite",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// InstanceState
// ---------------------------------------------------------------------------

/// Processing state of an exam instance attached to a request.
///
/// ```text
/// pending → in_process → completed
///         → completed (all data already satisfied)
/// ```
///
/// `completed` is terminal under normal flow; only an explicit reopen moves
/// an instance back to `in_process`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Pending,
    InProcess,
    Completed,
}

impl InstanceState {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::InProcess, Self::Completed],
            Self::InProcess => &[Self::Completed],
            Self::Completed => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProcess => "in_process",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Entity kinds referenced by errors and audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    ExamDefinition,
    FieldSchema,
    ExamInstance,
    ResultCapture,
    Request,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExamDefinition => "exam_definition",
            Self::FieldSchema => "field_schema",
            Self::ExamInstance => "exam_instance",
            Self::ResultCapture => "result_capture",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Mutation recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Activated,
    Deactivated,
    Instantiated,
    Captured,
    StatusChanged,
    Reopened,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
            Self::Instantiated => "instantiated",
            Self::Captured => "captured",
            Self::StatusChanged => "status_changed",
            Self::Reopened => "reopened",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
