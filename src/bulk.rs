use crate::catalog::Entity;
use crate::error::SessionError;
use crate::session::{BatchKind, BatchReport, SessionHandle};
use crate::stream::RecordStream;
use tracing::debug;

/// Bulk insert fed by a lazily filled stream.
///
/// The batch scope opens before the first record is pulled and all records
/// are submitted together once the stream ends.
pub async fn bulk_insert_mappings(
    session: SessionHandle,
    entity: Entity,
    records: RecordStream,
) -> Result<BatchReport, SessionError> {
    run_batch(session, BatchKind::Insert, entity, records).await
}

/// Bulk update counterpart of [`bulk_insert_mappings`].
pub async fn bulk_update_mappings(
    session: SessionHandle,
    entity: Entity,
    records: RecordStream,
) -> Result<BatchReport, SessionError> {
    run_batch(session, BatchKind::Update, entity, records).await
}

async fn run_batch(
    session: SessionHandle,
    kind: BatchKind,
    entity: Entity,
    records: RecordStream,
) -> Result<BatchReport, SessionError> {
    let scope = session.begin_batch();
    debug!(kind = %kind, scope = %scope.id(), table = %entity, "bulk operation started");
    let records = records.collect().await;
    scope.submit(kind, &entity, records)
}

#[cfg(test)]
mod tests {
    use super::{bulk_insert_mappings, bulk_update_mappings};
    use crate::catalog::Entity;
    use crate::catalog::types::{Record, Value};
    use crate::config::SinkConfig;
    use crate::sink::DataSink;
    use crate::stream::{Feed, FeedSlot, RecordStream};
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    fn poll_once<F: Future>(fut: std::pin::Pin<&mut F>) -> Poll<F::Output> {
        let mut cx = Context::from_waker(Waker::noop());
        fut.poll(&mut cx)
    }

    #[test]
    fn nothing_reaches_the_session_until_the_stream_ends() {
        let sink = DataSink::connect(SinkConfig::default()).expect("connect");
        let entity = Entity::test_model();
        sink.create_table(&entity);
        let session = sink.open_session();

        let slot = FeedSlot::default();
        let stream = RecordStream::new(Record::new(1, 1).into(), slot.clone());
        let mut op = pin!(bulk_insert_mappings(session.clone(), entity.clone(), stream));
        assert!(poll_once(op.as_mut()).is_pending());
        slot.put(Record::new(2, 2).into());
        assert!(poll_once(op.as_mut()).is_pending());
        assert_eq!(session.staged_rows(), 0);

        slot.put(Feed::End);
        let Poll::Ready(result) = poll_once(op.as_mut()) else {
            panic!("bulk insert should finish on the sentinel");
        };
        let report = result.expect("insert");
        assert_eq!(report.records, 2);
        assert_eq!(session.staged_rows(), 2);
    }

    #[test]
    fn empty_stream_finishes_on_first_poll() {
        let sink = DataSink::connect(SinkConfig::default()).expect("connect");
        let entity = Entity::test_model();
        sink.create_table(&entity);
        let session = sink.open_session();

        let stream = RecordStream::new(Feed::End, FeedSlot::default());
        let op = pin!(bulk_update_mappings(session.clone(), entity, stream));
        let Poll::Ready(result) = poll_once(op) else {
            panic!("empty update should not suspend");
        };
        let report = result.expect("update");
        assert_eq!(report.records, 0);
        assert_eq!(report.rows_matched, 0);
        assert!(session.is_open());
        assert_eq!(
            sink.row(&Entity::test_model(), 1).expect("read"),
            None::<Value>
        );
    }
}
