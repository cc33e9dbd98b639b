//! The transaction driver, recovery handler, and coordinator facade.
//!
//! `Engine<Q>` (C7) is the entry point: it registers itself with a `Queue`
//! as the recovery callback (C5, in `recovery`), constructs
//! `Transaction<Q>` values (C4, in `transaction`) for the caller to drive
//! through `Try`/`Confirm`/`Cancel`, and owns the action registry every
//! delivery consults.

mod facade;
mod recovery;
mod transaction;

pub use facade::Engine;
pub use transaction::Transaction;
