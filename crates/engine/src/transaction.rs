use std::sync::Arc;

use tcc_core::{Action, ActionRecord, ActionStatus, Error, Status, TccPayload, TransactionId};
use tcc_durability::Queue;
use tcc_wire::Patch;

use crate::facade::EngineInner;

/// The foreground path (component C4): assembles a transaction by running
/// `Try` for each action, then decides it with `Confirm` or `Cancel`.
///
/// Strictly sequential — a single caller drives one `Transaction` at a
/// time; there is no internal parallelism here (that only happens during
/// recovery, for `concurrent = true` transactions).
pub struct Transaction<Q: Queue> {
    engine: Arc<EngineInner<Q>>,
    id: TransactionId,
    payload: TccPayload,
}

impl<Q: Queue> Transaction<Q> {
    pub(crate) fn new(engine: Arc<EngineInner<Q>>, id: TransactionId, payload: TccPayload) -> Self {
        Self { engine, id, payload }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    fn assert_trying(&self) -> Result<(), Error> {
        if self.payload.status != Status::Trying {
            return Err(Error::StatusConflict {
                id: self.id,
                expected: Status::Trying,
                actual: self.payload.status,
            });
        }
        Ok(())
    }

    /// Verify `action` against the registry, durably append its sub-record,
    /// then run its in-memory `try_op`.
    ///
    /// The append happens *before* `try_op` runs: if the process crashes in
    /// between, recovery will see a `Pending` sub-record and `Cancel` it as
    /// though `Try` had run and failed, which is safe only because actions
    /// must tolerate a `Cancel` with no matching reservation.
    pub async fn try_action(&mut self, action: Box<dyn Action>) -> Result<(), Error> {
        self.engine.registry.check(action.as_ref())?;
        self.assert_trying()?;

        let raw = action.to_raw()?;
        let record = ActionRecord {
            name: action.name().to_string(),
            raw,
            status: ActionStatus::Pending,
        };

        tcc_durability::apply(
            &self.engine.queue,
            None,
            self.id,
            Patch::AppendAction(record.clone()),
            Status::Trying,
            "Try",
            false,
        )
        .await?;
        self.payload.actions.push(record);

        action
            .try_op()
            .await
            .map_err(|source| Error::Action {
                action: action.name().to_string(),
                source,
            })
    }

    /// Flip the transaction to `confirmed`, asserting it is still
    /// `trying`. Wakes the queue so recovery drives the sub-records to
    /// `confirmed` without waiting for the timeout.
    pub async fn confirm(&mut self) -> Result<(), Error> {
        self.assert_trying()?;
        tcc_durability::apply(
            &self.engine.queue,
            None,
            self.id,
            Patch::SetStatus(Status::Confirmed),
            Status::Trying,
            "Confirm",
            true,
        )
        .await?;
        self.payload.status = Status::Confirmed;
        tracing::debug!(id = %self.id, "tcc transaction confirmed");
        self.engine.queue.trigger_consume().await;
        Ok(())
    }

    /// Flip the transaction to `canceled`, asserting it is still `trying`.
    /// Used both on the failure path after a failed `Try` and as a
    /// caller-initiated abort.
    pub async fn cancel(&mut self) -> Result<(), Error> {
        self.assert_trying()?;
        tcc_durability::apply(
            &self.engine.queue,
            None,
            self.id,
            Patch::SetStatus(Status::Canceled),
            Status::Trying,
            "Cancel",
            true,
        )
        .await?;
        self.payload.status = Status::Canceled;
        tracing::debug!(id = %self.id, "tcc transaction canceled");
        self.engine.queue.trigger_consume().await;
        Ok(())
    }
}
