use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque, queue-assigned identifier for a transaction. The queue numbers
/// ids starting at 1; `0` never appears once a record has actually been
/// produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Top-level status of a transaction. Terminal once it leaves `Trying` —
/// see invariant 1 of the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Trying,
    Confirmed,
    Canceled,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Trying)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Trying => "trying",
            Status::Confirmed => "confirmed",
            Status::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// Status of a single action sub-record. `Pending` is the implicit initial
/// state (just `Try`'d, nothing decided yet) and is never written to the
/// persisted payload — see the `skip_serializing_if` below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    #[default]
    Pending,
    Confirmed,
    Canceled,
}

impl ActionStatus {
    fn is_pending(&self) -> bool {
        matches!(self, ActionStatus::Pending)
    }
}

/// The persisted entry representing one action inside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub name: String,
    pub raw: serde_json::Value,
    #[serde(default, skip_serializing_if = "ActionStatus::is_pending")]
    pub status: ActionStatus,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// The part of a transaction record that is actually serialized into the
/// queue's payload column. `id`, `created_at` and `retry_at` are owned by
/// the queue itself and never round-trip through this type — see
/// [`TransactionRecord`] for the assembled view a caller works with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TccPayload {
    pub status: Status,
    #[serde(default, skip_serializing_if = "is_false")]
    pub concurrent: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionRecord>,
}

impl TccPayload {
    pub fn new(concurrent: bool) -> Self {
        Self {
            status: Status::Trying,
            concurrent,
            actions: Vec::new(),
        }
    }

    /// Index of the first sub-record not yet at the payload's terminal
    /// status, in ascending order. Empty once every sub-record has settled.
    pub fn pending_indices_ascending(&self) -> Vec<usize> {
        let target = match self.status {
            Status::Confirmed => ActionStatus::Confirmed,
            Status::Canceled => ActionStatus::Canceled,
            Status::Trying => return Vec::new(),
        };
        self.actions
            .iter()
            .enumerate()
            .filter(|(_, a)| a.status != target)
            .map(|(i, _)| i)
            .collect()
    }
}

/// The full in-memory view of a transaction: queue-owned metadata plus the
/// decoded payload. Assembled by the caller from whatever the `Queue`
/// implementation returns; never serialized as a whole.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub created_at: DateTime<Utc>,
    pub retry_at: DateTime<Utc>,
    pub payload: TccPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(payload: &TccPayload) -> TccPayload {
        let encoded = serde_json::to_value(payload).unwrap();
        serde_json::from_value(encoded).unwrap()
    }

    #[test]
    fn codec_roundtrips_empty_payload() {
        let payload = TccPayload::new(false);
        assert_eq!(roundtrip(&payload), payload);
    }

    #[test]
    fn codec_roundtrips_populated_payload() {
        let mut payload = TccPayload::new(true);
        payload.actions.push(ActionRecord {
            name: "reserve-seat".into(),
            raw: serde_json::json!({"seat": 12}),
            status: ActionStatus::Pending,
        });
        payload.actions.push(ActionRecord {
            name: "charge-card".into(),
            raw: serde_json::json!({"amount_cents": 500}),
            status: ActionStatus::Confirmed,
        });
        assert_eq!(roundtrip(&payload), payload);
    }

    #[test]
    fn pending_action_status_is_omitted_from_payload() {
        let mut payload = TccPayload::new(false);
        payload.actions.push(ActionRecord {
            name: "noop".into(),
            raw: serde_json::json!({}),
            status: ActionStatus::Pending,
        });
        let encoded = serde_json::to_value(&payload).unwrap();
        assert!(encoded["actions"][0].get("status").is_none());
    }

    #[test]
    fn pending_indices_respect_transaction_outcome() {
        let mut payload = TccPayload::new(false);
        payload.status = Status::Confirmed;
        payload.actions.push(ActionRecord {
            name: "a".into(),
            raw: serde_json::Value::Null,
            status: ActionStatus::Confirmed,
        });
        payload.actions.push(ActionRecord {
            name: "b".into(),
            raw: serde_json::Value::Null,
            status: ActionStatus::Pending,
        });
        assert_eq!(payload.pending_indices_ascending(), vec![1]);
    }

    #[test]
    fn pending_indices_empty_while_still_trying() {
        let payload = TccPayload::new(false);
        assert!(payload.pending_indices_ascending().is_empty());
    }
}
