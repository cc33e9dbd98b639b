use std::any::Any;
use std::fmt;

use async_trait::async_trait;

use crate::error::{ActionError, Error};

/// The capability set every business action exposes to the coordinator:
/// a stable name, a raw-bytes form for persistence, and the three
/// idempotent operations of the protocol.
///
/// `Name` must be globally unique within one [`crate::registry::ActionRegistry`].
/// `Try`/`Confirm`/`Cancel` must tolerate being invoked more than once and,
/// for `Confirm`/`Cancel`, with no prior `Try` having actually run (the
/// coordinator may replay a sub-record whose `Try` crashed mid-flight).
#[async_trait]
pub trait Action: Any + Send + Sync + fmt::Debug {
    /// Registry key. Implementations typically return a `'static` literal.
    fn name(&self) -> &'static str;

    /// Encode this action's current field values for persistence. Called
    /// once, immediately after `Try` is invoked, before the in-memory
    /// `try_op` runs.
    fn to_raw(&self) -> Result<serde_json::Value, Error>;

    /// Human-readable type name of the concrete value behind this trait
    /// object, used only for [`Error::TypeMismatch`] diagnostics. The
    /// default forwards to `std::any::type_name`, which every impl gets for
    /// free — resolved per concrete type even when called through `&dyn
    /// Action`, since each impl contributes its own vtable entry.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Reserve or provision whatever this action represents.
    async fn try_op(&self) -> Result<(), ActionError>;

    /// Commit the reservation made by `try_op`.
    async fn confirm(&self) -> Result<(), ActionError>;

    /// Compensate a reservation made (or attempted) by `try_op`.
    async fn cancel(&self) -> Result<(), ActionError>;
}
