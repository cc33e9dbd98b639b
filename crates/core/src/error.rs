use std::time::Duration;

use thiserror::Error;

use crate::record::{Status, TransactionId};

/// Error returned by an action's own `Try`/`Confirm`/`Cancel`. Kept
/// deliberately opaque — the coordinator only needs to format and, in the
/// recovery path, decide a backoff for it, never inspect it.
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The coordinator's single public error type.
///
/// Every fallible operation in this crate returns `Result<_, Error>`. The
/// variants mirror the error taxonomy a durable coordinator needs to
/// distinguish: programmer mistakes (fatal, no retry), optimistic-concurrency
/// losses (informative, no retry), transport failures (retry, and the
/// enclosing queue transaction must roll back), and the caller's own action
/// code misbehaving (retry, but the transaction record itself is fine).
#[derive(Debug, Error)]
pub enum Error {
    /// `Try` (or recovery) referenced an action name never passed to
    /// `register`.
    #[error("action {name:?} is not registered")]
    NotRegistered { name: String },

    /// `Try` was called with a value of a different concrete type than the
    /// one originally registered under this name.
    #[error("action {name:?} was registered as {registered}, but tried as {tried}")]
    TypeMismatch {
        name: String,
        registered: &'static str,
        tried: &'static str,
    },

    /// The action value could not be serialized to its raw form.
    #[error("failed to encode action: {0}")]
    Encode(String),

    /// A persisted action payload could not be decoded back into its
    /// registered type.
    #[error("failed to decode action: {0}")]
    Decode(String),

    /// The conditional update lost the race, or the transaction had already
    /// reached a different terminal status than the caller expected.
    #[error("this tcc({id}) is {actual}, not {expected}")]
    StatusConflict {
        id: TransactionId,
        expected: Status,
        actual: Status,
    },

    /// The transaction row no longer exists.
    #[error("tcc({id}) not exists")]
    NotFound { id: TransactionId },

    /// The queue (or its backing transport) failed. The enclosing queue
    /// transaction must be rolled back — see [`Error::can_commit`].
    #[error("queue error: {0}")]
    Io(String),

    /// An action's `Try`/`Confirm`/`Cancel` returned an error. Propagated
    /// verbatim to the caller on the foreground path; treated as transient
    /// on the recovery path.
    #[error("{action}: {source}")]
    Action {
        action: String,
        #[source]
        source: ActionError,
    },

    /// Anything else — reserved for invariant violations this crate itself
    /// would be responsible for, never surfaced from well-formed callers.
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Whether the enclosing queue transaction may still be committed after
    /// this error. `false` only for transport failures: the sub-record
    /// advance that produced the error never happened, so there is nothing
    /// safe to persist.
    pub fn can_commit(&self) -> bool {
        !matches!(self, Error::Io(_))
    }

    /// `true` for [`Error::Io`].
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// `true` for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// `true` for [`Error::StatusConflict`].
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::StatusConflict { .. })
    }

    /// The fixed one-hour backoff recovery uses for errors that cannot be
    /// resolved by retrying sooner (unknown action, undecodable payload).
    pub fn forced_backoff(&self) -> Option<Duration> {
        match self {
            Error::NotRegistered { .. } | Error::Decode(_) | Error::TypeMismatch { .. } => {
                Some(Duration::from_secs(3600))
            }
            _ => None,
        }
    }
}
