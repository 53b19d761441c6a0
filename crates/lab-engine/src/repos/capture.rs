//! Result capture.

use chrono::Utc;
use lab_core::audit_detail::CapturedDetail;
use lab_core::entities::ResultCapture;
use lab_core::enums::{AuditAction, EntityType, InstanceState};
use lab_core::errors::CoreError;
use lab_core::ids::{FieldId, InstanceId};

use crate::service::{LabService, detail};

impl LabService {
    /// Record a value for one field of an instance.
    ///
    /// The field is resolved against the instance's field snapshot, so later
    /// edits to the definition do not change what an open instance accepts.
    /// A second capture of
    /// the same field replaces the first. The first capture moves a pending
    /// instance, and any pending ancestors, to in process.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the instance is completed or is a composite
    /// - `NotFound` for an unknown instance or a field the instance does not own
    /// - `TypeMismatch` if `raw` does not parse as the field's data type
    pub fn capture(
        &self,
        instance_id: InstanceId,
        field_id: FieldId,
        raw: &str,
        observations: Option<&str>,
    ) -> Result<ResultCapture, CoreError> {
        let cell = self.instance_cell(instance_id)?;
        let mut inst = cell.lock();

        let refuse = |state: InstanceState, reason: &str| {
            tracing::warn!(%instance_id, %field_id, %state, reason, "capture rejected");
            CoreError::InvalidState {
                entity_type: EntityType::ExamInstance,
                id: instance_id.to_string(),
                state,
                reason: reason.to_string(),
            }
        };
        if inst.is_completed() {
            return Err(refuse(inst.state, "completed instances are immutable"));
        }
        if !inst.exam_type.has_fields() {
            return Err(refuse(inst.state, "composite instances do not hold results"));
        }

        let field = inst
            .field(field_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(EntityType::FieldSchema, field_id))?;

        let now = Utc::now();
        let capture = ResultCapture::record(instance_id, &field, raw, observations, now)
            .inspect_err(|e| tracing::warn!(%instance_id, %field_id, error = %e, "capture rejected"))?;

        let replaced = inst.capture_for(field_id).is_some();
        inst.upsert_capture(capture.clone());
        inst.updated_at = now;
        let started = inst.state == InstanceState::Pending;
        if started {
            inst.state = InstanceState::InProcess;
        }
        let parent = inst.parent_id;
        drop(inst);

        self.record(
            EntityType::ExamInstance,
            instance_id,
            AuditAction::Captured,
            detail(&CapturedDetail {
                field_id: field_id.get(),
                field_name: capture.field_name.clone(),
                value: capture.value.to_string(),
                out_of_range: capture.out_of_range,
                replaced,
            }),
        );
        tracing::debug!(
            %instance_id,
            field = %capture.field_name,
            out_of_range = capture.out_of_range,
            replaced,
            "captured result"
        );

        if started {
            self.status_changed(
                instance_id,
                InstanceState::Pending,
                InstanceState::InProcess,
                Some("first result captured".into()),
            );
            self.propagate_started(parent);
        }
        Ok(capture)
    }
}
