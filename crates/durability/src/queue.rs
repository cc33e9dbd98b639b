use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tcc_core::{Error, Status, TransactionId};
use tcc_wire::Patch;

/// The bounded deadline every call into a `Queue` is expected to honor. A
/// real, SQL-backed implementation should wrap its round-trips in this
/// timeout so a stalled database cannot wedge a worker indefinitely; the
/// in-memory reference implementation cannot actually stall and only
/// documents the constant.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A single delivery of a transaction to the recovery handler.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: TransactionId,
    pub payload: tcc_core::TccPayload,
    /// The queue's own redelivery attempt counter for this message,
    /// 1 on first delivery. Fed directly into `RetryPolicy::next` — the
    /// coordinator keeps no separate attempt counter of its own.
    pub attempt: u32,
}

/// Outcome of one recovery delivery, returned to the queue.
#[derive(Debug)]
pub enum HandleOutcome {
    /// Every sub-record is terminal and matches the transaction's decided
    /// status; the queue may delete the record.
    Done,
    /// Work remains, or an error was encountered. The queue commits (or
    /// rolls back, per `can_commit`) its enclosing transaction and
    /// redelivers after `after`.
    Retry {
        after: Duration,
        can_commit: bool,
        error: Error,
    },
}

impl HandleOutcome {
    pub fn retry(after: Duration, can_commit: bool, error: Error) -> Self {
        HandleOutcome::Retry {
            after,
            can_commit,
            error,
        }
    }
}

/// The callback a `Queue` invokes for every delivery of a record, inside a
/// transaction the callback may use for further writes.
///
/// Implemented by `tcc_engine::Engine` — this is component C5 of the
/// design, expressed as a trait so the queue can hold it as
/// `Arc<dyn Handler<Q>>` without knowing about the engine crate.
#[async_trait]
pub trait Handler<Q: Queue>: Send + Sync {
    async fn handle(&self, tx: &Q::Tx, delivery: Delivery) -> HandleOutcome;
}

/// The external durable message queue contract the coordinator is built
/// against. Storage layout, polling loop and at-least-once delivery belong
/// to the implementation; this crate only needs the handful of primitives
/// below.
///
/// `Tx` is the transactional handle a recovery delivery runs inside.
/// Because a `concurrent = true` transaction fans its confirm/cancel work
/// out across multiple in-flight futures that all need to reach the same
/// delivery's transaction, `Tx` is required to be `Sync` and is always
/// handed out as a shared reference rather than `&mut` — mirroring the
/// guarantee a `database/sql`-style transaction handle gives when it is
/// documented safe for concurrent use from multiple workers. A
/// `Queue` wrapping a handle that is not natively `Sync` should put its own
/// interior mutability (a mutex, a connection pool checkout per call) behind
/// that boundary.
#[async_trait]
pub trait Queue: Send + Sync + 'static {
    type Tx: Send + Sync;

    /// Register `handler` as the callback for deliveries on `queue_name`.
    /// Fails if the name is already registered on this queue instance.
    async fn register(&self, queue_name: &str, handler: Arc<dyn Handler<Self>>) -> Result<(), Error>;

    /// Insert a new transaction record. Returns the queue-assigned id,
    /// always `> 0`.
    async fn produce(
        &self,
        created_at: DateTime<Utc>,
        retry_at: DateTime<Utc>,
        payload: tcc_core::TccPayload,
    ) -> Result<TransactionId, Error>;

    /// Conditionally apply `patch` to the row for `id`: succeeds only if
    /// the row exists, belongs to this coordinator's queue namespace, and
    /// its current status equals `assert_status`. Returns `true` iff the
    /// patch was applied. When `touch_retry_at` is set, `retry_at` is also
    /// reset to now as part of the same update, so the queue redelivers
    /// promptly.
    ///
    /// `tx` is `None` on the foreground path (an autocommitted connection)
    /// and `Some` when called from within a recovery delivery.
    async fn cas_update(
        &self,
        tx: Option<&Self::Tx>,
        id: TransactionId,
        assert_status: Status,
        patch: Patch,
        touch_retry_at: bool,
    ) -> Result<bool, Error>;

    /// Read the row's current top-level status, or `None` if it no longer
    /// exists. Only ever called as the follow-up read after a `cas_update`
    /// affected zero rows, to distinguish "gone" from "wrong status".
    async fn read_status(
        &self,
        tx: Option<&Self::Tx>,
        id: TransactionId,
    ) -> Result<Option<Status>, Error>;

    /// Hint to the queue that a record is due for redelivery sooner than
    /// its current schedule. Used after `Confirm`/`Cancel` to shorten
    /// recovery latency; implementations may treat this as a no-op.
    async fn trigger_consume(&self);
}
