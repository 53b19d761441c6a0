//! In-memory state behind `LabService`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use lab_core::entities::{ExamDefinition, ExamInstance};
use lab_core::enums::EntityType;
use lab_core::errors::CoreError;
use lab_core::ids::{DefinitionId, InstanceId, RequestId};
use parking_lot::Mutex;

/// Monotonic id source starting at 1.
#[derive(Debug)]
pub(crate) struct Sequence(AtomicI64);

impl Sequence {
    pub(crate) const fn new() -> Self {
        Self(AtomicI64::new(1))
    }

    pub(crate) fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// The definition catalog. Guarded by a single `RwLock` in the service.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    definitions: BTreeMap<DefinitionId, ExamDefinition>,
    /// Normalized code to id, for uniqueness checks and lookup.
    codes: HashMap<String, DefinitionId>,
}

/// Codes are unique regardless of letter case.
pub(crate) fn code_key(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Catalog {
    pub(crate) fn get(&self, id: DefinitionId) -> Option<&ExamDefinition> {
        self.definitions.get(&id)
    }

    pub(crate) fn require(&self, id: DefinitionId) -> Result<&ExamDefinition, CoreError> {
        self.get(id)
            .ok_or_else(|| CoreError::not_found(EntityType::ExamDefinition, id))
    }

    pub(crate) fn get_mut(&mut self, id: DefinitionId) -> Result<&mut ExamDefinition, CoreError> {
        self.definitions
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found(EntityType::ExamDefinition, id))
    }

    pub(crate) fn id_for_code(&self, code: &str) -> Option<DefinitionId> {
        self.codes.get(&code_key(code)).copied()
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &ExamDefinition> {
        self.definitions.values()
    }

    /// Insert or replace a definition, keeping the code index in step.
    pub(crate) fn put(&mut self, definition: ExamDefinition) {
        if let Some(previous) = self.definitions.get(&definition.id) {
            self.codes.remove(&code_key(&previous.code));
        }
        self.codes.insert(code_key(&definition.code), definition.id);
        self.definitions.insert(definition.id, definition);
    }
}

pub(crate) type InstanceCell = Arc<Mutex<ExamInstance>>;

/// Instance index plus per-request ordering of top-level instances.
#[derive(Debug, Default)]
pub(crate) struct Instances {
    cells: HashMap<InstanceId, InstanceCell>,
    requests: HashMap<RequestId, Vec<InstanceId>>,
}

impl Instances {
    pub(crate) fn cell(&self, id: InstanceId) -> Option<InstanceCell> {
        self.cells.get(&id).cloned()
    }

    pub(crate) fn insert(&mut self, instance: ExamInstance) {
        if instance.is_top_level() {
            self.requests
                .entry(instance.request_id)
                .or_default()
                .push(instance.id);
        }
        self.cells
            .insert(instance.id, Arc::new(Mutex::new(instance)));
    }

    pub(crate) fn top_level(&self, request_id: RequestId) -> Vec<InstanceCell> {
        self.requests
            .get(&request_id)
            .map(|ids| ids.iter().filter_map(|id| self.cell(*id)).collect())
            .unwrap_or_default()
    }
}
