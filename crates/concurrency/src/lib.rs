//! Retry scheduling and serial/concurrent fan-out for recovery.
//!
//! Two small, independent pieces: [`RetryPolicy`] maps an attempt count to
//! a backoff, and [`fan_out`] drives a closure over a set of sub-record
//! indices either all at once or one at a time in a given order. Neither
//! knows about transactions, queues, or actions — `tcc-engine` is the only
//! crate that composes them into recovery.

mod fanout;
mod retry;

pub use fanout::fan_out;
pub use retry::RetryPolicy;
