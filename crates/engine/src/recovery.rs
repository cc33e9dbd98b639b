use async_trait::async_trait;
use tcc_concurrency::fan_out;
use tcc_core::{ActionRecord, ActionStatus, Error, Status};
use tcc_durability::{Delivery, HandleOutcome, Handler, Queue};
use tcc_wire::Patch;

use crate::facade::EngineInner;

#[async_trait]
impl<Q: Queue> Handler<Q> for EngineInner<Q> {
    /// Replay a pending transaction: resolve a still-`trying` record to
    /// `canceled` (the queue only redelivers a `trying` record once its
    /// `retry_at` has elapsed, i.e. the caller never decided it in time),
    /// then drain whichever sub-records have not yet reached the
    /// transaction's terminal status.
    async fn handle(&self, tx: &Q::Tx, delivery: Delivery) -> HandleOutcome {
        let Delivery { id, mut payload, attempt } = delivery;

        if payload.status == Status::Trying {
            match tcc_durability::apply(
                &self.queue,
                Some(tx),
                id,
                Patch::SetStatus(Status::Canceled),
                Status::Trying,
                "Cancel",
                true,
            )
            .await
            {
                Ok(()) => {
                    tracing::info!(%id, "tcc transaction timed out, canceling");
                    payload.status = Status::Canceled;
                }
                // The caller decided it first (Confirm or Cancel) while this
                // delivery was in flight. Whichever status won, proceed
                // with it — the sub-records still need draining.
                Err(Error::StatusConflict { actual, .. }) => payload.status = actual,
                Err(Error::NotFound { .. }) => return HandleOutcome::Done,
                Err(e) => {
                    let after = self.retry_policy.next(attempt);
                    return HandleOutcome::retry(after, e.can_commit(), e);
                }
            }
        }

        let confirming = payload.status == Status::Confirmed;
        let mut indices = payload.pending_indices_ascending();
        if !confirming {
            indices.reverse();
        }

        if indices.is_empty() {
            return HandleOutcome::Done;
        }

        let concurrent = payload.concurrent;
        let actions = payload.actions.clone();

        let results = fan_out(indices, concurrent, |i| {
            self.settle_one(tx, id, &actions[i], i, confirming)
        })
        .await;

        let errors: Vec<(usize, Error)> = results
            .into_iter()
            .filter_map(|(i, r)| r.err().map(|e| (i, e)))
            .collect();

        if errors.is_empty() {
            return HandleOutcome::Done;
        }

        let can_commit = errors.iter().all(|(_, e)| e.can_commit());
        let after = errors
            .iter()
            .map(|(_, e)| e.forced_backoff().unwrap_or_else(|| self.retry_policy.next(attempt)))
            .max()
            .expect("errors is non-empty");
        let joined = errors
            .iter()
            .map(|(i, e)| format!("{}: {e}", actions[*i].name))
            .collect::<Vec<_>>()
            .join("; ");

        HandleOutcome::retry(after, can_commit, Error::Internal(joined))
    }
}

impl<Q: Queue> EngineInner<Q> {
    /// Confirm or cancel one sub-record: materialise its action via the
    /// registry, invoke the corresponding operation, and on success
    /// durably advance its status.
    ///
    /// An unresolvable materialise failure (`NotRegistered`/`Decode`) means
    /// a code deploy mismatch, not a transient condition — propagated as-is
    /// so the caller applies the one-hour forced backoff instead of the
    /// ordinary retry schedule.
    async fn settle_one(
        &self,
        tx: &Q::Tx,
        id: tcc_core::TransactionId,
        record: &ActionRecord,
        index: usize,
        confirming: bool,
    ) -> Result<(), Error> {
        let action = self.registry.materialise(&record.name, record.raw.clone())?;

        let action_result = if confirming {
            action.confirm().await
        } else {
            action.cancel().await
        };

        let action_result = action_result.map_err(|source| Error::Action {
            action: record.name.clone(),
            source,
        });
        action_result?;

        let status = if confirming {
            ActionStatus::Confirmed
        } else {
            ActionStatus::Canceled
        };
        let assert_status = if confirming { Status::Confirmed } else { Status::Canceled };
        let method = if confirming { "Confirm" } else { "Cancel" };

        tcc_durability::apply(
            &self.queue,
            Some(tx),
            id,
            Patch::SetActionStatus { index, status },
            assert_status,
            method,
            false,
        )
        .await
    }
}
