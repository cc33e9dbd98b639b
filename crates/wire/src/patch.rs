use tcc_core::{ActionRecord, ActionStatus, Status, TccPayload};

/// A single path-scoped mutation of a [`TccPayload`].
///
/// Every durable transition the coordinator performs is one of these three
/// shapes. Keeping them separate (rather than handing the updater a
/// whole-record replacement) is what lets a `Queue` implementation apply
/// each one as a targeted, single-field SQL `SET` — `status = ?`,
/// `actions = actions || ?`, `actions[i].status = ?` — so that peer
/// sub-records of a `concurrent = true` transaction, each advancing under
/// their own patch, never clobber one another.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Flip the transaction's top-level status.
    SetStatus(Status),
    /// Append a freshly-tried action to the end of the actions list.
    AppendAction(ActionRecord),
    /// Set one action's status by its stable, append-order index.
    SetActionStatus { index: usize, status: ActionStatus },
}

/// Apply `patch` to `payload` in place. This is the reference semantics
/// every `Queue` implementation's conditional update must realize — used
/// directly by `tcc_storage::MemoryQueue`, and the thing a SQL-backed
/// `Queue` would instead express as a `jsonb`/`json_set` expression.
pub fn apply(payload: &mut TccPayload, patch: &Patch) {
    match patch {
        Patch::SetStatus(status) => payload.status = *status,
        Patch::AppendAction(record) => payload.actions.push(record.clone()),
        Patch::SetActionStatus { index, status } => {
            if let Some(action) = payload.actions.get_mut(*index) {
                action.status = *status;
            }
        }
    }
}
