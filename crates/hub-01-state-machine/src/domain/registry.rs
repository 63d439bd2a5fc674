//! # Action Registry
//!
//! Domain modules register `{mutator, validator}` pairs on an
//! [`ActionRegistryBuilder`] during startup. [`ActionRegistryBuilder::build`]
//! freezes the table into an [`ActionRegistry`], which is read-only for the
//! rest of the process lifetime.
//!
//! Registering the same id twice overwrites the earlier pair (last one
//! wins); there is no removal.

use crate::domain::errors::RegistryError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_types::{ActionId, State};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Pure state transition: `(current, payload) -> next`.
pub type Mutator = Arc<dyn Fn(&State, &Value) -> State + Send + Sync>;

/// Payload check run before the mutator. `false` drops the dispatch.
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A registered action.
#[derive(Clone)]
pub struct ActionDescriptor {
    id: ActionId,
    mutator: Mutator,
    validator: Validator,
}

impl ActionDescriptor {
    pub fn id(&self) -> &ActionId {
        &self.id
    }

    /// Run the validator. Only success or failure is observed.
    pub fn validate(&self, payload: &Value) -> bool {
        (self.validator)(payload)
    }

    /// Run the mutator against `state`, producing the candidate snapshot.
    pub fn apply(&self, state: &State, payload: &Value) -> State {
        (self.mutator)(state, payload)
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// A domain module contributing actions at startup.
pub trait ActionModule {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Register this module's actions.
    fn register(&self, registry: &mut ActionRegistryBuilder) -> Result<(), RegistryError>;
}

/// Mutable registration phase of the registry.
#[derive(Default)]
pub struct ActionRegistryBuilder {
    actions: HashMap<ActionId, ActionDescriptor>,
}

impl ActionRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action over raw JSON payloads.
    ///
    /// The id is validated and uppercased; a second registration under the
    /// same id replaces the first.
    pub fn register<M, V>(
        &mut self,
        id: &str,
        mutator: M,
        validator: V,
    ) -> Result<&mut Self, RegistryError>
    where
        M: Fn(&State, &Value) -> State + Send + Sync + 'static,
        V: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let id = ActionId::parse(id)?;
        let descriptor = ActionDescriptor {
            id: id.clone(),
            mutator: Arc::new(mutator),
            validator: Arc::new(validator),
        };
        if self.actions.insert(id.clone(), descriptor).is_some() {
            debug!(action = %id, "Action re-registered, previous definition replaced");
        } else {
            debug!(action = %id, "Action registered");
        }
        Ok(self)
    }

    /// Register an action whose payload deserializes into `P`.
    ///
    /// A payload that does not deserialize fails validation, so the typed
    /// validator and mutator only ever see well-formed payloads.
    pub fn register_typed<P, M, V>(
        &mut self,
        id: &str,
        mutator: M,
        validator: V,
    ) -> Result<&mut Self, RegistryError>
    where
        P: DeserializeOwned,
        M: Fn(&State, P) -> State + Send + Sync + 'static,
        V: Fn(&P) -> bool + Send + Sync + 'static,
    {
        self.register(
            id,
            move |state, payload| match P::deserialize(payload) {
                Ok(typed) => mutator(state, typed),
                // Unreachable after validation; keep the state as is.
                Err(_) => state.clone(),
            },
            move |payload| {
                P::deserialize(payload)
                    .map(|typed| validator(&typed))
                    .unwrap_or(false)
            },
        )
    }

    /// Let a domain module register its actions.
    pub fn with_module(&mut self, module: &dyn ActionModule) -> Result<&mut Self, RegistryError> {
        module.register(self)?;
        debug!(module = module.name(), "Action module registered");
        Ok(self)
    }

    /// Number of actions registered so far.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Freeze the table.
    pub fn build(self) -> ActionRegistry {
        ActionRegistry {
            actions: self.actions,
        }
    }
}

impl fmt::Debug for ActionRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistryBuilder")
            .field("actions", &self.actions.len())
            .finish()
    }
}

/// Frozen action table, keyed by normalized id.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<ActionId, ActionDescriptor>,
}

impl ActionRegistry {
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::new()
    }

    pub fn get(&self, id: &ActionId) -> Option<&ActionDescriptor> {
        self.actions.get(id)
    }

    pub fn contains(&self, id: &ActionId) -> bool {
        self.actions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<&ActionId> {
        let mut ids: Vec<_> = self.actions.keys().collect();
        ids.sort();
        ids
    }
}
