use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use tcc_concurrency::RetryPolicy;
use tcc_core::{Action, ActionRegistry, Error, TccPayload};
use tcc_durability::Queue;

use crate::transaction::Transaction;

/// Shared state behind every `Engine` handle and every `Transaction` spawned
/// from it. Cheap to clone (it's an `Arc`), so `Engine` itself is `Clone`.
pub(crate) struct EngineInner<Q: Queue> {
    pub(crate) queue: Q,
    pub(crate) registry: ActionRegistry,
    pub(crate) retry_policy: RetryPolicy,
    #[allow(dead_code)]
    pub(crate) queue_name: String,
}

/// The coordinator facade (component C7): registers the recovery callback
/// with a `Queue`, constructs new transactions, and holds the action
/// registry every `Try`/recovery delivery consults.
pub struct Engine<Q: Queue> {
    pub(crate) inner: Arc<EngineInner<Q>>,
}

impl<Q: Queue> Clone for Engine<Q> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Q: Queue> Engine<Q> {
    /// Build a coordinator named `name`, backed by `queue`. Registers this
    /// engine's recovery handler under the queue name `tcc:{name}` —
    /// parameterized so multiple coordinators can share one physical queue,
    /// as long as each uses a distinct `name`.
    pub async fn new(name: impl Into<String>, queue: Q) -> Result<Self, Error> {
        let name = name.into();
        let queue_name = format!("tcc:{name}");
        let inner = Arc::new(EngineInner {
            queue,
            registry: ActionRegistry::new(),
            retry_policy: RetryPolicy::default(),
            queue_name: queue_name.clone(),
        });
        inner.queue.register(&queue_name, inner.clone()).await?;
        tracing::info!(name = queue_name, "tcc engine registered");
        Ok(Self { inner })
    }

    /// Register one or more action prototypes. Registering the same name
    /// twice is a programmer error and panics — see
    /// `tcc_core::ActionRegistry::register`.
    pub fn register<A>(&self, action: A)
    where
        A: Action + DeserializeOwned + 'static,
    {
        self.inner.registry.register(action);
    }

    /// The underlying queue, for callers that need to drive delivery
    /// explicitly (a `MemoryQueue`-backed test harness, for instance — a
    /// production queue normally redelivers on its own).
    pub fn queue(&self) -> &Q {
        &self.inner.queue
    }

    /// Start a new transaction. `timeout` bounds how long the coordinator
    /// waits for the caller to reach a decision before treating the
    /// transaction as abandoned and canceling it on the queue's next
    /// delivery.
    pub async fn new_transaction(&self, timeout: Duration, concurrent: bool) -> Result<Transaction<Q>, Error> {
        let now = Utc::now();
        let payload = TccPayload::new(concurrent);
        let retry_at = now
            + ChronoDuration::from_std(timeout).map_err(|e| Error::Internal(e.to_string()))?;
        let id = self.inner.queue.produce(now, retry_at, payload.clone()).await?;
        tracing::debug!(%id, concurrent, "tcc transaction created");
        Ok(Transaction::new(self.inner.clone(), id, payload))
    }

    /// Convenience composition: create a transaction, `Try` each action in
    /// order, `Confirm` on full success, `Cancel` on the first failure.
    pub async fn run(
        &self,
        timeout: Duration,
        concurrent: bool,
        actions: Vec<Box<dyn Action>>,
    ) -> Result<(), Error> {
        let mut tx = self.new_transaction(timeout, concurrent).await?;
        for action in actions {
            if let Err(try_err) = tx.try_action(action).await {
                if let Err(cancel_err) = tx.cancel().await {
                    tracing::error!(
                        error = %cancel_err,
                        try_error = %try_err,
                        "implicit cancel after a failed Try also failed"
                    );
                }
                return Err(try_err);
            }
        }
        tx.confirm().await
    }
}
