use std::any::{Any, TypeId};
use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;

use crate::action::Action;
use crate::error::Error;

type Factory = Box<dyn Fn(serde_json::Value) -> Result<Box<dyn Action>, Error> + Send + Sync>;

struct Prototype {
    type_id: TypeId,
    type_name: &'static str,
    factory: Factory,
}

/// Process-wide mapping from action name to the concrete type registered
/// under it. Read-mostly: writes only happen during startup-phase
/// `register` calls, reads happen on every `Try` and every recovery
/// delivery, so the table is guarded by a readers/writer lock rather than a
/// plain mutex.
///
/// There is no way to unregister an action once it is in — this mirrors
/// the "compiled in, not dynamically loaded" nature of action code that the
/// coordinator expects.
pub struct ActionRegistry {
    entries: RwLock<HashMap<&'static str, Prototype>>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register an action prototype. `A` must also be `DeserializeOwned` so
    /// the registry can materialise fresh instances of it during recovery.
    ///
    /// Registering two different types under the same name is a programmer
    /// error caught at startup, not a runtime condition the caller should
    /// handle — this panics synchronously, matching the "fails hard" rule
    /// for duplicate registration.
    pub fn register<A>(&self, action: A)
    where
        A: Action + DeserializeOwned + 'static,
    {
        let name = action.name();
        let mut entries = self.entries.write();
        if entries.contains_key(name) {
            panic!(
                "{}: action {:?} is already registered",
                Utc::now().to_rfc3339(),
                name
            );
        }
        entries.insert(
            name,
            Prototype {
                type_id: TypeId::of::<A>(),
                type_name: std::any::type_name::<A>(),
                factory: Box::new(|raw| {
                    let value: A =
                        serde_json::from_value(raw).map_err(|e| Error::Decode(e.to_string()))?;
                    Ok(Box::new(value) as Box<dyn Action>)
                }),
            },
        );
    }

    /// Verify `action` is known and of the same concrete type as the
    /// registered prototype. Called before every `Try`.
    pub fn check(&self, action: &dyn Action) -> Result<(), Error> {
        let entries = self.entries.read();
        match entries.get(action.name()) {
            None => Err(Error::NotRegistered {
                name: action.name().to_string(),
            }),
            Some(proto) if proto.type_id != action.type_id() => Err(Error::TypeMismatch {
                name: action.name().to_string(),
                registered: proto.type_name,
                tried: action.type_name(),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Reconstruct a fresh action instance of the type registered under
    /// `name`, populated from `raw`. Used by recovery to replay `Confirm`
    /// or `Cancel` on a sub-record whose in-memory `Try` value is long
    /// gone.
    pub fn materialise(&self, name: &str, raw: serde_json::Value) -> Result<Box<dyn Action>, Error> {
        let entries = self.entries.read();
        let proto = entries.get(name).ok_or_else(|| Error::NotRegistered {
            name: name.to_string(),
        })?;
        (proto.factory)(raw)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::error::ActionError;

    #[derive(Debug, Serialize, Deserialize)]
    struct ReserveSeat {
        seat: u32,
    }

    #[async_trait]
    impl Action for ReserveSeat {
        fn name(&self) -> &'static str {
            "reserve-seat"
        }

        fn to_raw(&self) -> Result<serde_json::Value, Error> {
            serde_json::to_value(self).map_err(|e| Error::Encode(e.to_string()))
        }

        async fn try_op(&self) -> Result<(), ActionError> {
            Ok(())
        }

        async fn confirm(&self) -> Result<(), ActionError> {
            Ok(())
        }

        async fn cancel(&self) -> Result<(), ActionError> {
            Ok(())
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct ChargeCard {
        amount_cents: u32,
    }

    #[async_trait]
    impl Action for ChargeCard {
        fn name(&self) -> &'static str {
            "reserve-seat"
        }

        fn to_raw(&self) -> Result<serde_json::Value, Error> {
            serde_json::to_value(self).map_err(|e| Error::Encode(e.to_string()))
        }

        async fn try_op(&self) -> Result<(), ActionError> {
            Ok(())
        }

        async fn confirm(&self) -> Result<(), ActionError> {
            Ok(())
        }

        async fn cancel(&self) -> Result<(), ActionError> {
            Ok(())
        }
    }

    #[test]
    fn check_passes_for_the_registered_type() {
        let registry = ActionRegistry::new();
        registry.register(ReserveSeat { seat: 1 });
        assert!(registry.check(&ReserveSeat { seat: 2 }).is_ok());
    }

    #[test]
    fn check_rejects_an_unregistered_name() {
        let registry = ActionRegistry::new();
        let err = registry.check(&ReserveSeat { seat: 1 }).unwrap_err();
        assert!(matches!(err, Error::NotRegistered { .. }));
    }

    #[test]
    fn check_rejects_a_type_mismatch_under_the_same_name() {
        let registry = ActionRegistry::new();
        registry.register(ReserveSeat { seat: 1 });
        let err = registry.check(&ChargeCard { amount_cents: 500 }).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn register_panics_on_duplicate_name() {
        let registry = ActionRegistry::new();
        registry.register(ReserveSeat { seat: 1 });
        registry.register(ReserveSeat { seat: 2 });
    }

    #[test]
    fn materialise_reconstructs_the_registered_type() {
        let registry = ActionRegistry::new();
        registry.register(ReserveSeat { seat: 7 });
        let raw = serde_json::json!({"seat": 7});
        let action = registry.materialise("reserve-seat", raw).unwrap();
        assert_eq!(action.name(), "reserve-seat");
    }

    #[test]
    fn materialise_rejects_an_unregistered_name() {
        let registry = ActionRegistry::new();
        let err = registry.materialise("ghost", serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, Error::NotRegistered { .. }));
    }
}
