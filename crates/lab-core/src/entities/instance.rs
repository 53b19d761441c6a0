use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::capture::ResultCapture;
use super::field::FieldSchema;
use crate::enums::{ExamType, InstanceState};
use crate::ids::{DefinitionId, FieldId, InstanceId, RequestId};

/// The live, per-request instantiation of an exam definition.
///
/// `exam_type`, `fields` and `child_ids` are fixed when the instance is
/// created. Later edits to the definition never reshape existing instances.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ExamInstance {
    pub id: InstanceId,
    pub request_id: RequestId,
    pub definition_id: DefinitionId,
    pub exam_type: ExamType,
    /// The definition's fields as they were at instantiation. Captures and
    /// completion checks resolve against this list. Empty for composites.
    pub fields: Vec<FieldSchema>,
    /// Owning composite/hybrid instance. `None` for instances attached directly to the request.
    pub parent_id: Option<InstanceId>,
    pub state: InstanceState,
    pub completed_at: Option<DateTime<Utc>>,
    pub captures: Vec<ResultCapture>,
    pub child_ids: Vec<InstanceId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExamInstance {
    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.state.is_terminal()
    }

    #[must_use]
    pub fn field(&self, id: FieldId) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Names of required fields not yet captured, in field order.
    #[must_use]
    pub fn missing_required(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required && self.capture_for(f.id).is_none())
            .map(|f| f.name.clone())
            .collect()
    }

    #[must_use]
    pub fn capture_for(&self, field_id: FieldId) -> Option<&ResultCapture> {
        self.captures.iter().find(|c| c.field_id == field_id)
    }

    /// Insert a capture, replacing any earlier capture of the same field.
    pub fn upsert_capture(&mut self, capture: ResultCapture) {
        if let Some(existing) = self
            .captures
            .iter_mut()
            .find(|c| c.field_id == capture.field_id)
        {
            *existing = capture;
        } else {
            self.captures.push(capture);
        }
    }

    /// Number of captures flagged out of range.
    #[must_use]
    pub fn out_of_range_count(&self) -> usize {
        self.captures.iter().filter(|c| c.out_of_range).count()
    }
}
