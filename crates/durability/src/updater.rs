use tcc_core::{Error, Status, TransactionId};
use tcc_wire::Patch;

use crate::queue::Queue;

/// Execute one conditional, durable state transition: the durable state
/// updater primitive every mutation in this crate funnels through.
///
/// `method` is a human-readable tag folded into any transport error, purely
/// to make operator-facing messages actionable (`"Confirm: connection
/// reset"` rather than just `"connection reset"`).
///
/// On success, returns `Ok(())`. On a lost race or an already-decided
/// transaction, returns `Err(Error::StatusConflict)` or
/// `Err(Error::NotFound)` — both `can_commit() == true`, since nothing was
/// written and the enclosing queue transaction is free to proceed. On a
/// transport failure, returns `Err(Error::Io)`, for which
/// `can_commit() == false`: the caller must ensure the enclosing queue
/// transaction is rolled back so no partial sub-record advance leaks.
pub async fn apply<Q: Queue>(
    queue: &Q,
    tx: Option<&Q::Tx>,
    id: TransactionId,
    patch: Patch,
    assert_status: Status,
    method: &'static str,
    touch_retry_at: bool,
) -> Result<(), Error> {
    let tag_io = |e: Error| match e {
        Error::Io(msg) => Error::Io(format!("{method}: {msg}")),
        other => other,
    };

    let applied = queue
        .cas_update(tx, id, assert_status, patch, touch_retry_at)
        .await
        .map_err(tag_io)?;

    if applied {
        tracing::debug!(method, %id, %assert_status, "durable update applied");
        return Ok(());
    }

    match queue.read_status(tx, id).await.map_err(tag_io)? {
        None => {
            tracing::warn!(method, %id, "durable update found no such transaction");
            Err(Error::NotFound { id })
        }
        Some(actual) => {
            tracing::debug!(method, %id, %assert_status, %actual, "durable update lost the status race");
            Err(Error::StatusConflict {
                id,
                expected: assert_status,
                actual,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use tcc_core::{ActionStatus, TccPayload};

    use super::*;
    use crate::queue::Handler;

    /// The smallest possible `Queue` fake: a single row, guarded by a
    /// mutex, with no transactional handle worth modeling.
    struct SingleRowQueue {
        row: Mutex<Option<(Status, TccPayload)>>,
    }

    impl SingleRowQueue {
        fn new(status: Status) -> Self {
            Self {
                row: Mutex::new(Some((status, TccPayload::new(false)))),
            }
        }

        fn missing() -> Self {
            Self {
                row: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Queue for SingleRowQueue {
        type Tx = ();

        async fn register(&self, _queue_name: &str, _handler: Arc<dyn Handler<Self>>) -> Result<(), Error> {
            Ok(())
        }

        async fn produce(
            &self,
            _created_at: chrono::DateTime<Utc>,
            _retry_at: chrono::DateTime<Utc>,
            payload: TccPayload,
        ) -> Result<TransactionId, Error> {
            *self.row.lock() = Some((payload.status, payload));
            Ok(TransactionId(1))
        }

        async fn cas_update(
            &self,
            _tx: Option<&Self::Tx>,
            _id: TransactionId,
            assert_status: Status,
            patch: Patch,
            _touch_retry_at: bool,
        ) -> Result<bool, Error> {
            let mut row = self.row.lock();
            match row.as_mut() {
                Some((status, payload)) if *status == assert_status => {
                    tcc_wire::apply(payload, &patch);
                    if let Patch::SetStatus(s) = patch {
                        *status = s;
                    }
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn read_status(
            &self,
            _tx: Option<&Self::Tx>,
            _id: TransactionId,
        ) -> Result<Option<Status>, Error> {
            Ok(self.row.lock().as_ref().map(|(status, _)| *status))
        }

        async fn trigger_consume(&self) {}
    }

    #[tokio::test]
    async fn applies_when_the_assertion_matches() {
        let queue = SingleRowQueue::new(Status::Trying);
        let result = apply(
            &queue,
            None,
            TransactionId(1),
            Patch::SetStatus(Status::Confirmed),
            Status::Trying,
            "Confirm",
            true,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(
            queue.read_status(None, TransactionId(1)).await.unwrap(),
            Some(Status::Confirmed)
        );
    }

    #[tokio::test]
    async fn reports_not_found_when_the_row_is_gone() {
        let queue = SingleRowQueue::missing();
        let err = apply(
            &queue,
            None,
            TransactionId(1),
            Patch::SetStatus(Status::Canceled),
            Status::Trying,
            "Cancel",
            true,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound { id: TransactionId(1) }));
        assert!(err.can_commit());
    }

    #[tokio::test]
    async fn reports_status_conflict_when_already_decided() {
        let queue = SingleRowQueue::new(Status::Confirmed);
        let err = apply(
            &queue,
            None,
            TransactionId(1),
            Patch::SetStatus(Status::Canceled),
            Status::Trying,
            "Cancel",
            true,
        )
        .await
        .unwrap_err();
        match &err {
            Error::StatusConflict { actual, .. } => assert_eq!(*actual, Status::Confirmed),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.can_commit());
    }

    #[tokio::test]
    async fn append_action_patch_does_not_require_a_status_change() {
        let queue = SingleRowQueue::new(Status::Trying);
        let result = apply(
            &queue,
            None,
            TransactionId(1),
            Patch::AppendAction(tcc_core::ActionRecord {
                name: "a".into(),
                raw: serde_json::Value::Null,
                status: ActionStatus::Pending,
            }),
            Status::Trying,
            "Try",
            false,
        )
        .await;
        assert!(result.is_ok());
    }
}
