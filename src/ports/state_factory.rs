//! State Factory Port - maps state identifiers to runnable states.
//!
//! The catalog of conversation states is domain-specific and lives with the
//! host application; the engine only needs a way to build a state from its
//! identifier, plus the default and (optional) expired entry points.
//! [`StateRegistry`] is the shipped implementation: an explicit map from
//! identifier to constructor, populated at startup.

use std::collections::HashMap;

use crate::domain::conversation::{ConversationState, StateAction, StateData};
use crate::domain::foundation::StateId;

/// Errors raised when building states.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("unknown state id '{0}'")]
    UnknownState(StateId),
}

/// Where a dispatch enters the conversation graph.
///
/// When `action` is `None` the dispatcher applies its own default: `listen`
/// for the default entry point, `ask` for the expired one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub state_id: StateId,
    pub action: Option<StateAction>,
}

impl EntryPoint {
    pub fn new(state_id: impl Into<StateId>) -> Self {
        Self {
            state_id: state_id.into(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: StateAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Port for the domain-specific state catalog.
pub trait StateFactory: Send + Sync {
    /// The state a fresh (or finished) conversation starts in.
    fn default_state(&self) -> EntryPoint;

    /// The state an expired conversation is redirected to, if the catalog
    /// defines one. The snapshot is provided so catalogs can branch on it.
    fn expired_state(&self, data: &StateData) -> Option<EntryPoint> {
        let _ = data;
        None
    }

    /// Builds the runnable state for `id`.
    fn build(&self, id: &StateId) -> Result<Box<dyn ConversationState>, FactoryError>;
}

type StateCtor = Box<dyn Fn() -> Box<dyn ConversationState> + Send + Sync>;

/// A [`StateFactory`] backed by an explicit registry of constructors.
pub struct StateRegistry {
    states: HashMap<StateId, StateCtor>,
    default_state: EntryPoint,
    expired_state: Option<EntryPoint>,
}

impl StateRegistry {
    /// Creates a registry whose default entry point is `default_state`.
    pub fn new(default_state: impl Into<StateId>) -> Self {
        Self {
            states: HashMap::new(),
            default_state: EntryPoint::new(default_state.into()),
            expired_state: None,
        }
    }

    /// Registers a constructor for `id`.
    pub fn register<F>(mut self, id: impl Into<StateId>, ctor: F) -> Self
    where
        F: Fn() -> Box<dyn ConversationState> + Send + Sync + 'static,
    {
        self.states.insert(id.into(), Box::new(ctor));
        self
    }

    /// Redirects expired conversations to `id`.
    pub fn with_expired_state(mut self, id: impl Into<StateId>) -> Self {
        self.expired_state = Some(EntryPoint::new(id.into()));
        self
    }

    /// Overrides the action the default entry point starts with.
    pub fn with_default_action(mut self, action: StateAction) -> Self {
        self.default_state = self.default_state.clone().with_action(action);
        self
    }
}

impl StateFactory for StateRegistry {
    fn default_state(&self) -> EntryPoint {
        self.default_state.clone()
    }

    fn expired_state(&self, _data: &StateData) -> Option<EntryPoint> {
        self.expired_state.clone()
    }

    fn build(&self, id: &StateId) -> Result<Box<dyn ConversationState>, FactoryError> {
        self.states
            .get(id)
            .map(|ctor| ctor())
            .ok_or_else(|| FactoryError::UnknownState(id.clone()))
    }
}

impl std::fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRegistry")
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("default_state", &self.default_state)
            .field("expired_state", &self.expired_state)
            .finish()
    }
}
