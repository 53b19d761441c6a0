//! Property tests for request aggregation and section grouping.

use chrono::Utc;
use lab_core::aggregate::aggregate_states;
use lab_core::entities::{ResultCapture, ResultValue};
use lab_core::enums::InstanceState;
use lab_core::ids::{FieldId, InstanceId};
use lab_core::sections::{SectionKey, group_by_section};
use proptest::prelude::*;

fn state_strategy() -> impl Strategy<Value = InstanceState> {
    prop_oneof![
        Just(InstanceState::Pending),
        Just(InstanceState::InProcess),
        Just(InstanceState::Completed),
    ]
}

fn capture(idx: usize, section: Option<&str>, order: u32) -> ResultCapture {
    ResultCapture {
        instance_id: InstanceId(1),
        field_id: FieldId(i64::try_from(idx).unwrap()),
        field_name: format!("f{idx}"),
        value: ResultValue::Number(1.0),
        unit: None,
        reference: None,
        out_of_range: false,
        observations: None,
        section: section.map(String::from),
        order,
        captured_at: Utc::now(),
    }
}

proptest! {
    #[test]
    fn counts_always_sum_to_input_len(states in prop::collection::vec(state_strategy(), 0..40)) {
        let agg = aggregate_states(states.iter().copied());
        prop_assert_eq!(agg.total() as usize, states.len());
    }

    #[test]
    fn overall_follows_precedence(states in prop::collection::vec(state_strategy(), 0..40)) {
        let agg = aggregate_states(states.iter().copied());
        let expected = if !states.is_empty() && states.iter().all(|s| *s == InstanceState::Completed) {
            InstanceState::Completed
        } else if states.iter().any(|s| *s != InstanceState::Pending) {
            InstanceState::InProcess
        } else {
            InstanceState::Pending
        };
        prop_assert_eq!(agg.overall, expected);
    }

    #[test]
    fn aggregation_ignores_input_order(mut states in prop::collection::vec(state_strategy(), 0..20)) {
        let forward = aggregate_states(states.iter().copied());
        states.reverse();
        prop_assert_eq!(aggregate_states(states.iter().copied()), forward);
    }

    #[test]
    fn grouping_keeps_every_item_once(
        specs in prop::collection::vec(
            (prop::option::of(prop_oneof![Just("A"), Just("B"), Just("C")]), 0u32..10),
            0..30,
        )
    ) {
        let captures: Vec<ResultCapture> = specs
            .iter()
            .enumerate()
            .map(|(i, (section, order))| capture(i, *section, *order))
            .collect();
        let buckets = group_by_section(&captures);

        let total: usize = buckets.iter().map(|b| b.items.len()).sum();
        prop_assert_eq!(total, captures.len());

        for bucket in &buckets {
            let orders: Vec<u32> = bucket.items.iter().map(|c| c.order).collect();
            let mut sorted = orders.clone();
            sorted.sort_unstable();
            prop_assert_eq!(orders, sorted);
        }

        let unsectioned_at = buckets.iter().position(|b| b.key == SectionKey::Unsectioned);
        if let Some(pos) = unsectioned_at {
            prop_assert_eq!(pos, buckets.len() - 1);
        }
    }
}
