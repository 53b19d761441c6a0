//! Instance repository: instantiation, state transitions and request queries.

use chrono::{DateTime, Utc};
use lab_core::aggregate::{RequestAggregate, aggregate};
use lab_core::audit_detail::{InstantiatedDetail, StatusChangedDetail};
use lab_core::entities::ExamInstance;
use lab_core::enums::{AuditAction, EntityType, InstanceState};
use lab_core::errors::CoreError;
use lab_core::ids::{DefinitionId, InstanceId, RequestId};

use crate::service::{LabService, detail};
use crate::store::Catalog;

/// Move `inst` to `to`, stamping timestamps. Does not check the state machine.
fn apply_state(inst: &mut ExamInstance, to: InstanceState, now: DateTime<Utc>) {
    inst.state = to;
    inst.completed_at = (to == InstanceState::Completed).then_some(now);
    inst.updated_at = now;
}

impl LabService {
    /// Create the instance tree for one definition on a request.
    ///
    /// Composite and hybrid definitions get one child instance per child
    /// definition, recursively. Everything starts `pending`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown definition, `InactiveDefinition` if the root
    /// or any descendant is deactivated.
    pub fn instantiate(
        &self,
        request_id: RequestId,
        definition_id: DefinitionId,
    ) -> Result<ExamInstance, CoreError> {
        let now = Utc::now();
        let mut created = Vec::new();
        {
            let catalog = self.catalog.read();
            self.build_tree(&catalog, request_id, definition_id, None, now, &mut created)
                .inspect_err(|e| tracing::warn!(%request_id, %definition_id, error = %e, "instantiation rejected"))?;
        }

        // Children are pushed before their parent, so the root is last.
        let root = created
            .last()
            .cloned()
            .ok_or_else(|| CoreError::not_found(EntityType::ExamDefinition, definition_id))?;
        let count = u32::try_from(created.len()).unwrap_or(u32::MAX);

        {
            let mut instances = self.instances.write();
            for inst in &created {
                instances.insert(inst.clone());
            }
        }

        for inst in &created {
            let payload = (inst.id == root.id).then(|| InstantiatedDetail {
                definition_id,
                request_id: request_id.get(),
                instances: count,
            });
            self.record(
                EntityType::ExamInstance,
                inst.id,
                AuditAction::Instantiated,
                payload.as_ref().and_then(detail),
            );
        }
        tracing::info!(instance_id = %root.id, %request_id, %definition_id, instances = count, "instantiated exam");
        Ok(root)
    }

    fn build_tree(
        &self,
        catalog: &Catalog,
        request_id: RequestId,
        definition_id: DefinitionId,
        parent_id: Option<InstanceId>,
        now: DateTime<Utc>,
        out: &mut Vec<ExamInstance>,
    ) -> Result<InstanceId, CoreError> {
        let def = catalog.require(definition_id)?;
        if !def.active {
            return Err(CoreError::InactiveDefinition { id: definition_id });
        }

        let id = InstanceId(self.instance_ids.next());
        let child_ids = def
            .children()
            .iter()
            .map(|child| self.build_tree(catalog, request_id, *child, Some(id), now, out))
            .collect::<Result<Vec<_>, _>>()?;

        out.push(ExamInstance {
            id,
            request_id,
            definition_id,
            exam_type: def.exam_type(),
            fields: def.fields().to_vec(),
            parent_id,
            state: InstanceState::Pending,
            completed_at: None,
            captures: Vec::new(),
            child_ids,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    /// Mark an instance as being worked on. Idempotent when already in process.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `InvalidTransition` once completed.
    pub fn begin_processing(&self, id: InstanceId) -> Result<ExamInstance, CoreError> {
        let cell = self.instance_cell(id)?;
        let mut inst = cell.lock();
        match inst.state {
            InstanceState::InProcess => return Ok(inst.clone()),
            InstanceState::Completed => {
                tracing::warn!(instance_id = %id, "begin_processing on completed instance");
                return Err(CoreError::InvalidTransition {
                    entity_type: EntityType::ExamInstance,
                    id: id.to_string(),
                    from: InstanceState::Completed,
                    to: InstanceState::InProcess,
                });
            }
            InstanceState::Pending => {}
        }

        apply_state(&mut inst, InstanceState::InProcess, Utc::now());
        let snapshot = inst.clone();
        drop(inst);

        self.status_changed(id, InstanceState::Pending, InstanceState::InProcess, None);
        self.propagate_started(snapshot.parent_id);
        Ok(snapshot)
    }

    /// Complete an instance.
    ///
    /// Requires every required field of the instance's field snapshot to be
    /// captured and every child instance to be completed. Children are read, not waited on;
    /// callers retry after finishing them.
    ///
    /// # Errors
    ///
    /// `IncompleteData` listing what is missing, `InvalidTransition` if the
    /// instance is already completed, `NotFound` for an unknown id.
    pub fn complete(&self, id: InstanceId) -> Result<ExamInstance, CoreError> {
        let cell = self.instance_cell(id)?;
        let mut inst = cell.lock();
        let from = inst.state;
        if !from.can_transition_to(InstanceState::Completed) {
            tracing::warn!(instance_id = %id, state = %from, "complete rejected");
            return Err(CoreError::InvalidTransition {
                entity_type: EntityType::ExamInstance,
                id: id.to_string(),
                from,
                to: InstanceState::Completed,
            });
        }

        let missing_fields = inst.missing_required();
        let incomplete_children: Vec<InstanceId> = inst
            .child_ids
            .iter()
            .copied()
            .filter(|child| {
                !self
                    .instance_cell(*child)
                    .is_ok_and(|cell| cell.lock().is_completed())
            })
            .collect();

        if !missing_fields.is_empty() || !incomplete_children.is_empty() {
            tracing::warn!(
                instance_id = %id,
                missing = missing_fields.len(),
                incomplete_children = incomplete_children.len(),
                "instance is incomplete"
            );
            return Err(CoreError::IncompleteData {
                instance_id: id,
                missing_fields,
                incomplete_children,
            });
        }

        apply_state(&mut inst, InstanceState::Completed, Utc::now());
        let snapshot = inst.clone();
        drop(inst);

        self.status_changed(id, from, InstanceState::Completed, None);
        Ok(snapshot)
    }

    /// Administratively reopen a completed instance for correction.
    ///
    /// Completed ancestors are reopened as well, since a completed parent may
    /// not contain an unfinished child.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the instance is completed, `NotFound` for an
    /// unknown id.
    pub fn reopen(&self, id: InstanceId, reason: &str) -> Result<ExamInstance, CoreError> {
        let snapshot = self
            .reopen_one(id, reason)?
            .ok_or_else(|| {
                let state = self.snapshot(id).map_or(InstanceState::Pending, |i| i.state);
                CoreError::InvalidState {
                    entity_type: EntityType::ExamInstance,
                    id: id.to_string(),
                    state,
                    reason: "only completed instances can be reopened".into(),
                }
            })
            .inspect_err(|e| tracing::warn!(instance_id = %id, error = %e, "reopen rejected"))?;

        let mut child = id;
        let mut parent = snapshot.parent_id;
        while let Some(parent_id) = parent {
            let cascade = format!("child instance {child} reopened");
            let Some(reopened) = self.reopen_one(parent_id, &cascade)? else {
                break;
            };
            child = parent_id;
            parent = reopened.parent_id;
        }
        Ok(snapshot)
    }

    /// Reopen a single instance. `Ok(None)` if it is not completed.
    fn reopen_one(&self, id: InstanceId, reason: &str) -> Result<Option<ExamInstance>, CoreError> {
        let cell = self.instance_cell(id)?;
        let mut inst = cell.lock();
        if !inst.is_completed() {
            return Ok(None);
        }
        apply_state(&mut inst, InstanceState::InProcess, Utc::now());
        let snapshot = inst.clone();
        drop(inst);

        self.record(
            EntityType::ExamInstance,
            id,
            AuditAction::Reopened,
            detail(&StatusChangedDetail {
                from: InstanceState::Completed,
                to: InstanceState::InProcess,
                reason: Some(reason.to_string()),
            }),
        );
        tracing::info!(instance_id = %id, reason, "reopened instance");
        Ok(Some(snapshot))
    }

    /// Walk up from `parent`, moving pending ancestors to in process.
    pub(crate) fn propagate_started(&self, mut parent: Option<InstanceId>) {
        while let Some(id) = parent {
            let Ok(cell) = self.instance_cell(id) else {
                return;
            };
            let mut inst = cell.lock();
            if inst.state != InstanceState::Pending {
                return;
            }
            apply_state(&mut inst, InstanceState::InProcess, Utc::now());
            parent = inst.parent_id;
            drop(inst);
            self.status_changed(
                id,
                InstanceState::Pending,
                InstanceState::InProcess,
                Some("child instance started".into()),
            );
        }
    }

    pub(crate) fn status_changed(
        &self,
        id: InstanceId,
        from: InstanceState,
        to: InstanceState,
        reason: Option<String>,
    ) {
        self.record(
            EntityType::ExamInstance,
            id,
            AuditAction::StatusChanged,
            detail(&StatusChangedDetail { from, to, reason }),
        );
        tracing::info!(instance_id = %id, %from, %to, "instance status changed");
    }

    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn get_instance(&self, id: InstanceId) -> Result<ExamInstance, CoreError> {
        self.snapshot(id)
    }

    /// Child instances of `id`, in the order of the definition's child list.
    ///
    /// # Errors
    ///
    /// `NotFound` if the instance or one of its children is unknown.
    pub fn children_of(&self, id: InstanceId) -> Result<Vec<ExamInstance>, CoreError> {
        self.snapshot(id)?
            .child_ids
            .iter()
            .map(|child| self.snapshot(*child))
            .collect()
    }

    /// Top-level instances of a request, in instantiation order.
    ///
    /// Requests are owned by the caller; an unknown request simply has none.
    #[must_use]
    pub fn instances_for_request(&self, request_id: RequestId) -> Vec<ExamInstance> {
        let cells = self.instances.read().top_level(request_id);
        cells.iter().map(|cell| cell.lock().clone()).collect()
    }

    /// Derived status of a request, recomputed on every call.
    #[must_use]
    pub fn request_aggregate(&self, request_id: RequestId) -> RequestAggregate {
        aggregate(&self.instances_for_request(request_id))
    }
}
