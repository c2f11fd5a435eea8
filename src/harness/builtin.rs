use crate::catalog::types::Record;
use crate::harness::report::Outcome;
use crate::harness::scenario::Scenario;
use crate::session::BatchKind::{Insert, Update};

pub const INSERT_CLOSES_FIRST: &str = "insert_closes_first";
pub const UPDATE_CLOSES_FIRST: &str = "update_closes_first";
pub const INTERLEAVED_RECORDS: &str = "interleaved_records";
pub const UPDATE_LED_UPDATE_CLOSES_FIRST: &str = "update_led_update_closes_first";
pub const UPDATE_LED_INSERT_CLOSES_FIRST: &str = "update_led_insert_closes_first";
pub const EMPTY_INSERT_STREAM: &str = "empty_insert_stream";

/// The fixed catalog of interleavings, in run order.
///
/// Inserted ids never repeat across the catalog, so every scenario can run
/// against the same sink one after another.
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(INSERT_CLOSES_FIRST)
            .describe("insert started first; the insert stream is ended before the update stream")
            .expect(Outcome::Failure)
            .send(Insert, Record::new(2, 2))
            .send(Update, Record::new(1, 2))
            .end(Insert)
            .end(Update),
        Scenario::new(UPDATE_CLOSES_FIRST)
            .describe("insert started first; the update stream is ended before the insert stream")
            .expect(Outcome::Success)
            .send(Insert, Record::new(2, 2))
            .send(Update, Record::new(1, 2))
            .end(Update)
            .end(Insert),
        Scenario::new(INTERLEAVED_RECORDS)
            .describe("several records to both streams, then update ends before insert")
            .expect(Outcome::Success)
            .send(Insert, Record::new(3, 3))
            .send(Update, Record::new(1, 3))
            .send(Insert, Record::new(4, 4))
            .send(Update, Record::new(2, 3))
            .send(Insert, Record::new(5, 5))
            .end(Update)
            .end(Insert),
        Scenario::new(UPDATE_LED_UPDATE_CLOSES_FIRST)
            .describe("update started first; the update stream is ended before the insert stream")
            .expect(Outcome::Failure)
            .send(Update, Record::new(1, 6))
            .send(Insert, Record::new(6, 6))
            .end(Update)
            .end(Insert),
        Scenario::new(UPDATE_LED_INSERT_CLOSES_FIRST)
            .describe("update started first; the insert stream is ended before the update stream")
            .expect(Outcome::Success)
            .send(Update, Record::new(2, 7))
            .send(Insert, Record::new(7, 7))
            .end(Insert)
            .end(Update),
        Scenario::new(EMPTY_INSERT_STREAM)
            .describe("insert started with the sentinel finishes at once and never nests the update")
            .expect(Outcome::Success)
            .end(Insert)
            .send(Update, Record::new(1, 2))
            .end(Update),
    ]
}

pub fn find_builtin(name: &str) -> Option<Scenario> {
    builtin_scenarios().into_iter().find(|s| s.name == name)
}
