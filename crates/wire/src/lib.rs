//! Path-scoped patch encoding for the TCC transaction payload.
//!
//! Isolated from `tcc-durability` and `tcc-storage` the same way the
//! teacher keeps wire-format concerns out of its storage engine: this crate
//! knows how to describe and apply one targeted mutation of a
//! [`tcc_core::TccPayload`]; it has no notion of a queue, a transaction, or
//! a CAS assertion.

mod patch;

pub use patch::{apply, Patch};
