//! # tcc
//!
//! A durable Try/Confirm/Cancel transaction coordinator.
//!
//! `tcc` drives a two-phase compensation protocol — `Try` each action,
//! then `Confirm` or `Cancel` all of them — durably enough to survive a
//! crash between any two steps. Durability and retry are delegated to a
//! [`Queue`]: an at-least-once message queue the caller already runs
//! (backed by a real database), not a store this crate owns. On
//! redelivery, the coordinator replays whatever sub-records have not yet
//! reached the transaction's terminal status and drains them, in order for
//! a serial transaction or concurrently for one that opted in.
//!
//! ## Quick start
//!
//! ```ignore
//! use tcc::prelude::*;
//! use tcc_storage::MemoryQueue;
//!
//! let engine = Engine::new("checkout", MemoryQueue::new()).await?;
//! engine.register(ReserveSeat { seat: 0 });
//! engine.register(ChargeCard { amount_cents: 0, should_fail: false });
//!
//! let mut tx = engine.new_transaction(Duration::from_secs(30), false).await?;
//! tx.try_action(Box::new(ReserveSeat { seat: 12 })).await?;
//! tx.try_action(Box::new(ChargeCard { amount_cents: 500, should_fail: false })).await?;
//! tx.confirm().await?;
//! ```
//!
//! ## Crates
//!
//! - [`tcc_core`] — the [`Action`] trait, the action registry, the error
//!   taxonomy, and the record types that make up a transaction's payload.
//! - `tcc_wire` — path-scoped patches applied to a payload without
//!   clobbering sibling sub-records.
//! - `tcc_durability` — the [`Queue`] contract every backing store
//!   implements, and the conditional updater built on top of it.
//! - `tcc_concurrency` — the retry schedule and the serial/concurrent
//!   fan-out used during recovery.
//! - `tcc_engine` — [`Engine`] and [`Transaction`], the pieces most callers
//!   use directly.
//! - `tcc_storage` — [`tcc_storage::MemoryQueue`], an in-process `Queue`
//!   for tests and demos.

#![warn(missing_docs)]

pub mod prelude;

pub use tcc_core::{
    Action, ActionError, ActionRecord, ActionRegistry, ActionStatus, Error, Status, TccPayload,
    TransactionId, TransactionRecord,
};
pub use tcc_durability::{Delivery, HandleOutcome, Handler, Queue, DEFAULT_TIMEOUT};
pub use tcc_engine::{Engine, Transaction};

/// Convenience alias for this crate's fallible results.
pub type Result<T> = std::result::Result<T, Error>;
