use bulkswitch::harness::builtin::{
    EMPTY_INSERT_STREAM, INSERT_CLOSES_FIRST, INTERLEAVED_RECORDS, UPDATE_CLOSES_FIRST,
    UPDATE_LED_INSERT_CLOSES_FIRST, UPDATE_LED_UPDATE_CLOSES_FIRST, builtin_scenarios,
    find_builtin,
};
use bulkswitch::{
    BatchKind, CooperativeTask, DataSink, Entity, Feed, Harness, Outcome, Record, Scenario,
    SessionError, SinkConfig, TaskStatus, Value, run_builtin,
};
use bulkswitch::session::scope::ScopeId;
use tempfile::tempdir;

fn harness() -> Harness {
    let sink = DataSink::connect(SinkConfig::default()).expect("connect");
    Harness::new(sink, Entity::test_model())
}

fn run_named(harness: &Harness, name: &str) -> bulkswitch::ScenarioReport {
    let scenario = find_builtin(name).expect("builtin scenario");
    harness.run(&scenario).expect("run")
}

#[test]
fn insert_first_then_insert_closes_first_fails() {
    let harness = harness();
    let report = run_named(&harness, INSERT_CLOSES_FIRST);
    assert_eq!(report.outcome, Outcome::Failure);
    assert_eq!(report.error_kind.as_deref(), Some("resource_finalized"));
    assert!(matches!(
        report.error,
        Some(SessionError::ResourceFinalized { .. })
    ));
    assert_eq!(
        harness.sink().row_count(harness.entity()).expect("count"),
        0,
        "failed scenario must not leave rows behind"
    );
}

#[test]
fn insert_first_then_update_closes_first_commits() {
    let harness = harness();
    let report = run_named(&harness, UPDATE_CLOSES_FIRST);
    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.error_kind, None);
    assert_eq!(
        harness.sink().row(harness.entity(), 2).expect("read"),
        Some(Value::Integer(2))
    );
    assert_eq!(harness.sink().commit_seq(), 1);
}

#[test]
fn interleaved_record_deliveries_do_not_change_the_outcome() {
    let harness = harness();
    let report = run_named(&harness, INTERLEAVED_RECORDS);
    assert!(report.is_success());
    let rows = harness.sink().rows(harness.entity()).expect("rows");
    let ids: Vec<i64> = rows.keys().copied().collect();
    assert_eq!(ids, vec![3, 4, 5]);
}

#[test]
fn outcome_depends_on_start_order_not_operation_kind() {
    let harness = harness();
    let failing = run_named(&harness, UPDATE_LED_UPDATE_CLOSES_FIRST);
    assert_eq!(failing.outcome, Outcome::Failure);
    assert_eq!(failing.error_kind.as_deref(), Some("resource_finalized"));

    let passing = run_named(&harness, UPDATE_LED_INSERT_CLOSES_FIRST);
    assert_eq!(passing.outcome, Outcome::Success);
}

#[test]
fn empty_stream_completes_without_nesting() {
    let harness = harness();
    let report = run_named(&harness, EMPTY_INSERT_STREAM);
    assert!(report.is_success());
    assert_eq!(report.commit.map(|c| c.rows_inserted), Some(0));
}

#[test]
fn builtin_catalog_meets_every_expectation_on_one_sink() {
    let reports = run_builtin(SinkConfig::default()).expect("run builtin");
    assert_eq!(reports.len(), builtin_scenarios().len());
    for report in &reports {
        assert!(
            report.matches_expectation(),
            "{} ended with {} ({:?})",
            report.scenario_name,
            report.outcome,
            report.error
        );
    }
}

#[test]
fn direct_task_driving_matches_the_harness() {
    let sink = DataSink::connect(SinkConfig::default()).expect("connect");
    let entity = Entity::test_model();
    sink.create_table(&entity);
    let session = sink.open_session();

    let mut insert = CooperativeTask::new(BatchKind::Insert, session.clone(), entity.clone());
    let mut update = CooperativeTask::new(BatchKind::Update, session.clone(), entity.clone());
    assert_eq!(
        insert.start(Feed::Record(Record::new(2, 2))).expect("insert start"),
        TaskStatus::Suspended
    );
    assert_eq!(
        update.start(Feed::Record(Record::new(1, 2))).expect("update start"),
        TaskStatus::Suspended
    );
    assert!(matches!(
        insert.resume(Feed::End).expect("insert end"),
        TaskStatus::Finished(_)
    ));
    let err = update.resume(Feed::End).expect_err("update end");
    assert_eq!(err.code_str(), "resource_finalized");
    assert!(!session.is_open());
    assert_eq!(session.commit().expect_err("commit after failure"), err);

    session.close();
    assert!(!session.is_open());
    assert_eq!(sink.row_count(&entity).expect("count"), 0);
}

#[test]
fn submissions_after_commit_fail_for_either_task() {
    let sink = DataSink::connect(SinkConfig::default()).expect("connect");
    let entity = Entity::test_model();
    sink.create_table(&entity);
    let session = sink.open_session();

    let mut insert = CooperativeTask::new(BatchKind::Insert, session.clone(), entity.clone());
    let mut update = CooperativeTask::new(BatchKind::Update, session.clone(), entity.clone());
    insert.start(Record::new(10, 1).into()).expect("insert start");
    update.start(Record::new(10, 2).into()).expect("update start");
    session.commit().expect("commit");

    let insert_err = insert.resume(Feed::End).expect_err("insert after commit");
    let update_err = update.resume(Feed::End).expect_err("update after commit");
    assert_eq!(insert_err, update_err);
    assert!(insert_err.is_resource_finalized());
    assert_eq!(sink.row_count(&entity).expect("count"), 0);
}

#[test]
fn submissions_after_close_fail_for_either_task() {
    let sink = DataSink::connect(SinkConfig::default()).expect("connect");
    let entity = Entity::test_model();
    sink.create_table(&entity);
    let session = sink.open_session();

    let mut insert = CooperativeTask::new(BatchKind::Insert, session.clone(), entity.clone());
    let mut update = CooperativeTask::new(BatchKind::Update, session.clone(), entity.clone());
    insert.start(Record::new(11, 1).into()).expect("insert start");
    update.start(Record::new(11, 2).into()).expect("update start");
    session.close();

    let expected = SessionError::ResourceFinalized {
        scope: ScopeId::ROOT,
    };
    assert_eq!(insert.resume(Feed::End).expect_err("insert after close"), expected);
    assert_eq!(update.resume(Feed::End).expect_err("update after close"), expected);
    assert_eq!(sink.row_count(&entity).expect("count"), 0);
}

#[test]
fn scenario_file_round_trip_runs() {
    let dir = tempdir().expect("temp");
    let path = dir.path().join("scenario.json");
    let scenario = Scenario::new("from_file")
        .expect(Outcome::Failure)
        .send(BatchKind::Insert, Record::new(2, 2))
        .send(BatchKind::Update, Record::new(1, 2))
        .end(BatchKind::Insert)
        .end(BatchKind::Update);
    std::fs::write(&path, scenario.to_json().expect("encode")).expect("write");

    let loaded = Scenario::load(&path).expect("load");
    assert_eq!(loaded, scenario);
    let report = harness().run(&loaded).expect("run");
    assert!(report.matches_expectation());
    assert_eq!(
        report.to_json().expect("json"),
        r#"{"scenario_name":"from_file","outcome":"failure","error_kind":"resource_finalized"}"#
    );
}

#[test]
fn missing_scenario_file_is_a_decode_error() {
    let dir = tempdir().expect("temp");
    let err = Scenario::load(&dir.path().join("absent.json")).expect_err("missing file");
    assert_eq!(err.code_str(), "decode");
}
