//! Typed audit detail payloads.
//!
//! Audit entries carry a free-form `detail` JSON blob. These types give the
//! common shapes a schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::InstanceState;
use crate::ids::DefinitionId;

/// Detail for `AuditAction::StatusChanged` and `AuditAction::Reopened`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StatusChangedDetail {
    pub from: InstanceState,
    pub to: InstanceState,
    pub reason: Option<String>,
}

/// Detail for `AuditAction::Captured`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CapturedDetail {
    pub field_id: i64,
    pub field_name: String,
    pub value: String,
    pub out_of_range: bool,
    /// `true` when an earlier capture of the same field was overwritten.
    pub replaced: bool,
}

/// Detail for `AuditAction::Instantiated`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct InstantiatedDetail {
    pub definition_id: DefinitionId,
    pub request_id: i64,
    /// Number of instances created, the root included.
    pub instances: u32,
}

/// Detail for `AuditAction::Updated` on a definition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DefinitionChangedDetail {
    pub code: String,
    pub exam_type: String,
    pub fields: u32,
    pub children: u32,
}
