use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tcc_core::{Error, Status, TccPayload, TransactionId};
use tcc_durability::{Delivery, HandleOutcome, Handler, Queue};
use tcc_wire::Patch;

struct Row {
    created_at: DateTime<Utc>,
    retry_at: DateTime<Utc>,
    payload: TccPayload,
    attempt: u32,
}

/// An in-process, mutex-guarded `Queue`. This is the one reference
/// implementation this workspace ships: every integration test and the
/// demo binary run against it. It has no transactional handle worth
/// modeling (`Tx = ()`), so every `cas_update` commits immediately —
/// there is no enclosing transaction for `can_commit = false` to roll
/// back. A real, SQL-backed `Queue` would use its driver's transaction
/// type and genuinely honor that signal.
///
/// Delivery is not driven by a background poller here; call
/// [`MemoryQueue::deliver_due`] to replay whatever is due, the way a test
/// advances a fake clock.
pub struct MemoryQueue {
    rows: Mutex<HashMap<i64, Row>>,
    next_id: AtomicI64,
    registration: RwLock<Option<Registration>>,
}

struct Registration {
    queue_name: String,
    handler: Arc<dyn Handler<MemoryQueue>>,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            registration: RwLock::new(None),
        }
    }

    /// Replay every row whose `retry_at` is at or before `now` through the
    /// registered handler, applying whatever outcome it returns. Returns
    /// the ids that were delivered (deleted ones included).
    pub async fn deliver_due(&self, now: DateTime<Utc>) -> Vec<TransactionId> {
        let due: Vec<(i64, TccPayload, u32)> = {
            let rows = self.rows.lock();
            rows.iter()
                .filter(|(_, row)| row.retry_at <= now)
                .map(|(id, row)| (*id, row.payload.clone(), row.attempt))
                .collect()
        };

        let handler = {
            let reg = self.registration.read();
            reg.as_ref().map(|r| r.handler.clone())
        };

        let Some(handler) = handler else {
            return Vec::new();
        };

        let mut delivered = Vec::with_capacity(due.len());
        for (id, payload, attempt) in due {
            {
                let mut rows = self.rows.lock();
                if let Some(row) = rows.get_mut(&id) {
                    row.attempt += 1;
                }
            }
            let outcome = handler
                .handle(
                    &(),
                    Delivery {
                        id: TransactionId(id),
                        payload,
                        attempt: attempt + 1,
                    },
                )
                .await;
            match outcome {
                HandleOutcome::Done => {
                    self.rows.lock().remove(&id);
                }
                HandleOutcome::Retry { after, error, .. } => {
                    tracing::debug!(id, %error, retry_in = ?after, "recovery delivery requested a retry");
                    let mut rows = self.rows.lock();
                    if let Some(row) = rows.get_mut(&id) {
                        row.retry_at = now + chrono::Duration::from_std(after).unwrap_or_default();
                    }
                }
            }
            delivered.push(TransactionId(id));
        }
        delivered
    }

    /// Number of rows still resident (not yet deleted by a `Done` outcome).
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    type Tx = ();

    async fn register(&self, queue_name: &str, handler: Arc<dyn Handler<Self>>) -> Result<(), Error> {
        let mut reg = self.registration.write();
        if reg.is_some() {
            return Err(Error::Internal(format!(
                "queue name {queue_name:?} is already registered on this queue instance"
            )));
        }
        *reg = Some(Registration {
            queue_name: queue_name.to_string(),
            handler,
        });
        Ok(())
    }

    async fn produce(
        &self,
        created_at: DateTime<Utc>,
        retry_at: DateTime<Utc>,
        payload: TccPayload,
    ) -> Result<TransactionId, Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().insert(
            id,
            Row {
                created_at,
                retry_at,
                payload,
                attempt: 0,
            },
        );
        Ok(TransactionId(id))
    }

    async fn cas_update(
        &self,
        _tx: Option<&Self::Tx>,
        id: TransactionId,
        assert_status: Status,
        patch: Patch,
        touch_retry_at: bool,
    ) -> Result<bool, Error> {
        let mut rows = self.rows.lock();
        let Some(row) = rows.get_mut(&id.0) else {
            return Ok(false);
        };
        if row.payload.status != assert_status {
            return Ok(false);
        }
        tcc_wire::apply(&mut row.payload, &patch);
        if touch_retry_at {
            row.retry_at = Utc::now();
        }
        Ok(true)
    }

    async fn read_status(&self, _tx: Option<&Self::Tx>, id: TransactionId) -> Result<Option<Status>, Error> {
        Ok(self.rows.lock().get(&id.0).map(|row| row.payload.status))
    }

    async fn trigger_consume(&self) {
        // The in-memory harness has no background poller; tests drive
        // delivery explicitly via `deliver_due`.
    }
}
