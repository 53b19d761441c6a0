//! Service layer owning the catalog, the instance stores and the audit log.
//!
//! `LabService` is `Send + Sync`; share it behind an `Arc` to drive it from
//! several threads. All operations are implemented as `impl LabService`
//! blocks in [`crate::repos`].

use chrono::Utc;
use lab_core::entities::{AuditEntry, ExamInstance};
use lab_core::enums::{AuditAction, EntityType};
use lab_core::errors::CoreError;
use lab_core::ids::InstanceId;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::store::{Catalog, InstanceCell, Instances, Sequence};

/// Engine knobs sourced from the application's configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Maximum length of a definition code, in characters.
    pub max_code_len: usize,
    /// Whether composites may reference deactivated children.
    pub allow_inactive_children: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_code_len: 20,
            allow_inactive_children: false,
        }
    }
}

/// Orchestrates catalog and instance mutations with an audit trail.
///
/// Every mutation follows the same protocol:
/// 1. Take the lock that guards the mutated state
/// 2. Validate against the current state
/// 3. Apply the change
/// 4. Append an audit entry
#[derive(Debug)]
pub struct LabService {
    settings: EngineSettings,
    pub(crate) catalog: RwLock<Catalog>,
    pub(crate) instances: RwLock<Instances>,
    pub(crate) audit: Mutex<Vec<AuditEntry>>,
    pub(crate) definition_ids: Sequence,
    pub(crate) field_ids: Sequence,
    pub(crate) instance_ids: Sequence,
    audit_ids: Sequence,
}

impl Default for LabService {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl LabService {
    #[must_use]
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            catalog: RwLock::new(Catalog::default()),
            instances: RwLock::new(Instances::default()),
            audit: Mutex::new(Vec::new()),
            definition_ids: Sequence::new(),
            field_ids: Sequence::new(),
            instance_ids: Sequence::new(),
            audit_ids: Sequence::new(),
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Look up the cell of an instance without locking it.
    pub(crate) fn instance_cell(&self, id: InstanceId) -> Result<InstanceCell, CoreError> {
        self.instances
            .read()
            .cell(id)
            .ok_or_else(|| CoreError::not_found(EntityType::ExamInstance, id))
    }

    /// Clone the current state of an instance.
    pub(crate) fn snapshot(&self, id: InstanceId) -> Result<ExamInstance, CoreError> {
        Ok(self.instance_cell(id)?.lock().clone())
    }

    /// Append an audit entry. Called by every mutation.
    pub(crate) fn record(
        &self,
        entity_type: EntityType,
        entity_id: impl ToString,
        action: AuditAction,
        detail: Option<serde_json::Value>,
    ) {
        let entry = AuditEntry {
            id: self.audit_ids.next().unsigned_abs(),
            entity_type,
            entity_id: entity_id.to_string(),
            action,
            detail,
            created_at: Utc::now(),
        };
        self.audit.lock().push(entry);
    }
}

/// Serialize an audit detail payload. A payload that fails to serialize is
/// logged and dropped; it never fails the mutation it describes.
pub(crate) fn detail<T: Serialize>(payload: &T) -> Option<serde_json::Value> {
    match serde_json::to_value(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "audit detail could not be serialized");
            None
        }
    }
}
