//! Audit trail queries.

use lab_core::entities::AuditEntry;
use lab_core::enums::{AuditAction, EntityType};

use crate::service::LabService;

const DEFAULT_LIMIT: usize = 100;

/// Filter criteria for audit queries.
#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub action: Option<AuditAction>,
    pub limit: Option<usize>,
}

impl AuditFilter {
    #[must_use]
    pub fn for_entity(entity_type: EntityType, entity_id: impl ToString) -> Self {
        Self {
            entity_type: Some(entity_type),
            entity_id: Some(entity_id.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    fn matches(&self, entry: &AuditEntry) -> bool {
        self.entity_type.is_none_or(|t| t == entry.entity_type)
            && self
                .entity_id
                .as_deref()
                .is_none_or(|id| id == entry.entity_id)
            && self.action.is_none_or(|a| a == entry.action)
    }
}

impl LabService {
    /// Audit entries matching `filter`, newest first.
    #[must_use]
    pub fn query_audit(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT);
        self.audit
            .lock()
            .iter()
            .rev()
            .filter(|entry| filter.matches(entry))
            .take(limit)
            .cloned()
            .collect()
    }
}
