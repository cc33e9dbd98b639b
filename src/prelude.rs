//! Glob import for the common path: defining an [`Action`] and driving it
//! through an [`Engine`].
//!
//! ```ignore
//! use tcc::prelude::*;
//! ```

pub use std::time::Duration;

pub use tcc_core::{Action, ActionError, Error, Status, TransactionId};
pub use tcc_durability::Queue;
pub use tcc_engine::{Engine, Transaction};
