//! The `Queue` contract and the conditional durable state updater.
//!
//! This crate has no storage of its own — it defines what a durable
//! message queue must offer the coordinator (`Queue`, `Handler`,
//! `Delivery`), and the one primitive every persisted mutation in this
//! workspace funnels through (`updater::apply`). `tcc-storage` provides the
//! one concrete `Queue` this workspace ships; production callers bring
//! their own.

mod queue;
mod updater;

pub use queue::{Delivery, HandleOutcome, Handler, Queue, DEFAULT_TIMEOUT};
pub use updater::apply;
