use bulkswitch::{BatchKind, DataSink, Entity, Harness, Outcome, Record, Scenario, SinkConfig};
use proptest::prelude::*;

fn other(kind: BatchKind) -> BatchKind {
    match kind {
        BatchKind::Insert => BatchKind::Update,
        BatchKind::Update => BatchKind::Insert,
    }
}

fn arb_kind() -> impl Strategy<Value = BatchKind> {
    prop_oneof![Just(BatchKind::Insert), Just(BatchKind::Update)]
}

/// Both tasks get one record (in `leader` order), then `extra` deliveries,
/// then both streams end with the leader ending first or last.
fn build(leader: BatchKind, extra: &[BatchKind], leader_ends_first: bool) -> Scenario {
    let mut next_id = 1;
    let mut record = |kind: BatchKind| {
        let id = match kind {
            BatchKind::Insert => {
                next_id += 1;
                next_id
            }
            BatchKind::Update => 1,
        };
        Record::new(id, id)
    };
    let mut scenario = Scenario::new("generated");
    for kind in [leader, other(leader)] {
        scenario = scenario.send(kind, record(kind));
    }
    for kind in extra {
        scenario = scenario.send(*kind, record(*kind));
    }
    let (first_end, second_end) = if leader_ends_first {
        (leader, other(leader))
    } else {
        (other(leader), leader)
    };
    scenario.end(first_end).end(second_end)
}

fn run(scenario: &Scenario) -> Outcome {
    let sink = DataSink::connect(SinkConfig::default()).expect("connect");
    Harness::new(sink, Entity::test_model())
        .run(scenario)
        .expect("valid scenario")
        .outcome
}

proptest! {
    #[test]
    fn only_the_relative_end_order_matters(
        leader in arb_kind(),
        extra in prop::collection::vec(arb_kind(), 0..12),
        leader_ends_first in any::<bool>(),
    ) {
        let scenario = build(leader, &extra, leader_ends_first);
        let expected = if leader_ends_first { Outcome::Failure } else { Outcome::Success };
        prop_assert_eq!(run(&scenario), expected);
    }

    #[test]
    fn swapping_operation_kinds_keeps_the_outcome(
        extra_len in 0usize..8,
        leader_ends_first in any::<bool>(),
    ) {
        let insert_led = build(BatchKind::Insert, &vec![BatchKind::Update; extra_len], leader_ends_first);
        let update_led = build(BatchKind::Update, &vec![BatchKind::Insert; extra_len], leader_ends_first);
        prop_assert_eq!(run(&insert_led), run(&update_led));
    }
}
