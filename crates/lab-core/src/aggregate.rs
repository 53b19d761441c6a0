//! Request-level status aggregation.
//!
//! The derived status of a request is always recomputed from its instances;
//! it is never stored.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::ExamInstance;
use crate::enums::InstanceState;

/// Tally of top-level instance states for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestAggregate {
    pub pending: u32,
    pub in_process: u32,
    pub completed: u32,
    pub overall: InstanceState,
}

impl RequestAggregate {
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.pending + self.in_process + self.completed
    }
}

/// Aggregate the instances attached to a request.
///
/// Child instances of composites are skipped; their parent's state already
/// reflects them.
pub fn aggregate<'a, I>(instances: I) -> RequestAggregate
where
    I: IntoIterator<Item = &'a ExamInstance>,
{
    aggregate_states(
        instances
            .into_iter()
            .filter(|inst| inst.is_top_level())
            .map(|inst| inst.state),
    )
}

/// Tally raw states and derive the overall status.
///
/// Precedence: every instance completed → `completed`; any progress at all
/// (in process or completed) → `in_process`; otherwise `pending`. An empty
/// request is `pending`.
pub fn aggregate_states<I>(states: I) -> RequestAggregate
where
    I: IntoIterator<Item = InstanceState>,
{
    let (mut pending, mut in_process, mut completed) = (0u32, 0u32, 0u32);
    for state in states {
        match state {
            InstanceState::Pending => pending += 1,
            InstanceState::InProcess => in_process += 1,
            InstanceState::Completed => completed += 1,
        }
    }

    let total = pending + in_process + completed;
    let overall = if total > 0 && completed == total {
        InstanceState::Completed
    } else if in_process > 0 || completed > 0 {
        InstanceState::InProcess
    } else {
        InstanceState::Pending
    };

    RequestAggregate {
        pending,
        in_process,
        completed,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use InstanceState::{Completed, InProcess, Pending};
    use chrono::Utc;

    use crate::enums::ExamType;
    use crate::ids::{DefinitionId, InstanceId, RequestId};

    fn overall(states: &[InstanceState]) -> InstanceState {
        aggregate_states(states.iter().copied()).overall
    }

    #[test]
    fn all_completed_is_completed() {
        assert_eq!(overall(&[Completed, Completed]), Completed);
    }

    #[test]
    fn all_pending_is_pending() {
        assert_eq!(overall(&[Pending, Pending]), Pending);
    }

    #[test]
    fn partial_completion_is_in_process() {
        assert_eq!(overall(&[Completed, Pending]), InProcess);
        assert_eq!(overall(&[Completed, Pending, Pending]), InProcess);
    }

    #[test]
    fn any_in_process_is_in_process() {
        assert_eq!(overall(&[InProcess, Pending]), InProcess);
    }

    #[test]
    fn empty_request_is_pending() {
        let agg = aggregate_states([]);
        assert_eq!(agg.overall, Pending);
        assert_eq!(agg.total(), 0);
    }

    #[test]
    fn counts_are_a_tally() {
        let agg = aggregate_states([Pending, InProcess, InProcess, Completed]);
        assert_eq!((agg.pending, agg.in_process, agg.completed), (1, 2, 1));
        assert_eq!(agg.total(), 4);
    }

    #[test]
    fn child_instances_are_not_counted() {
        let now = Utc::now();
        let make = |id: i64, parent: Option<i64>, state| ExamInstance {
            id: InstanceId(id),
            request_id: RequestId(1),
            definition_id: DefinitionId(1),
            exam_type: ExamType::Simple,
            fields: Vec::new(),
            parent_id: parent.map(InstanceId),
            state,
            completed_at: None,
            captures: Vec::new(),
            child_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let instances = [
            make(1, None, Completed),
            make(2, Some(1), Completed),
            make(3, Some(1), Pending),
        ];

        let agg = aggregate(&instances);
        assert_eq!(agg.total(), 1);
        assert_eq!(agg.overall, Completed);
    }
}
