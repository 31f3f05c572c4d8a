//! Dispatcher - runs one full dispatch cycle per inbound message.
//!
//! A cycle resolves the session identity, then loops: load the snapshot,
//! resolve the entry point, build and run the current state, persist the
//! computed successor. Most dispatches run a single state, but a chain of
//! ask transitions executes synchronously within one cycle, stopping only
//! when the engine is waiting on input again (or the conversation ended).
//! Queued session messages are flushed once, at the end.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::domain::conversation::{Session, StateAction, StateData, StepContext};
use crate::domain::foundation::{ClientId, StateId};
use crate::ports::chat_adapter::{AdapterError, ChatAdapter, Identity, MessageContext, User};
use crate::ports::snapshot_storage::{SnapshotRepository, SnapshotStorage, StorageError};
use crate::ports::state_factory::StateFactory;

/// Errors that escape a dispatch call.
///
/// State execution failures are not among them: those reset the
/// conversation and are reported to the user, never to the caller.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Orchestrates dispatch cycles over an adapter, a snapshot store, and a
/// state catalog.
pub struct Dispatcher {
    adapter: Arc<dyn ChatAdapter>,
    snapshots: SnapshotRepository,
    factory: Arc<dyn StateFactory>,
    config: EngineConfig,
}

impl Dispatcher {
    pub fn new(
        adapter: Arc<dyn ChatAdapter>,
        storage: Arc<dyn SnapshotStorage>,
        factory: Arc<dyn StateFactory>,
        config: EngineConfig,
    ) -> Self {
        Self {
            adapter,
            snapshots: SnapshotRepository::new(storage),
            factory,
            config,
        }
    }

    /// Processes one inbound message: resolves the session, runs states
    /// until the engine is listening again (or the conversation ended), and
    /// flushes the session's queued output.
    pub async fn dispatch(
        &self,
        message: &str,
        context: &MessageContext,
    ) -> Result<(), DispatchError> {
        let client_id = self.adapter.client_id(Identity::Context(context))?;
        let channel = self.adapter.channel(Identity::Context(context))?;
        let user = self.adapter.user_from(context);

        let message = message.trim();
        info!(client_id = %client_id, message, "received message");

        let mut session = Session::new(client_id, channel, user);
        self.run_states(&mut session, Some(message)).await?;
        self.adapter.flush_session(&mut session, None).await?;
        Ok(())
    }

    /// Proactively opens (or redirects) a conversation for `user`, outside
    /// the inbound-message flow.
    ///
    /// Writes a snapshot pointing at `state_id` with an `ask` action,
    /// optionally queues `initial_message` as a direct message, then runs
    /// the dispatch loop with no inbound text. Any conversation already in
    /// progress is overwritten; callers that must not clobber one consult
    /// [`Dispatcher::conversation_state`] first.
    pub async fn start_conversation(
        &self,
        user: &User,
        state_id: impl Into<StateId>,
        initial_message: Option<&str>,
    ) -> Result<(), DispatchError> {
        let client_id = self.adapter.client_id(Identity::User(user))?;
        let channel = self.adapter.channel(Identity::User(user))?;

        let mut data = StateData::new();
        data.set_state(Some(state_id.into()), Some(StateAction::Ask));
        self.snapshots.persist(&client_id, &mut data).await?;

        let mut session = Session::new(client_id, channel, Some(user.clone()));
        if let Some(text) = initial_message {
            self.adapter.queue_direct_message(&mut session, text, user)?;
        }

        self.run_states(&mut session, None).await?;
        self.adapter.flush_session(&mut session, None).await?;
        Ok(())
    }

    /// The persisted snapshot for `user`, or `None` if absent, finished, or
    /// expired. Callers use this to avoid starting over a conversation that
    /// is still in progress.
    pub async fn conversation_state(
        &self,
        user: &User,
    ) -> Result<Option<StateData>, DispatchError> {
        let client_id = self.adapter.client_id(Identity::User(user))?;

        let Some(data) = self.snapshots.fetch(&client_id).await? else {
            return Ok(None);
        };

        if data.finished() {
            return Ok(None);
        }
        if let Some(timeout) = self.config.expired_timeout() {
            if data.expired(timeout) {
                return Ok(None);
            }
        }
        Ok(Some(data))
    }

    /// The inner dispatch loop. `message` is consumed by at most one listen
    /// step: the loop stops before running a second one.
    async fn run_states(
        &self,
        session: &mut Session,
        message: Option<&str>,
    ) -> Result<(), DispatchError> {
        loop {
            let mut data = self.load_snapshot(session.client_id()).await;
            self.resolve_entry_point(&mut data);

            let (current_id, current_action) = match (data.state_id(), data.state_action()) {
                (Some(id), Some(action)) => (id.clone(), action),
                _ => return Ok(()),
            };

            let state = match self.factory.build(&current_id) {
                Ok(state) => state,
                Err(e) => {
                    warn!(state = %current_id, error = %e, "unable to build state");
                    return self.reset_conversation(session).await;
                }
            };

            let mut ctx = StepContext::new(
                &mut data,
                session,
                self.adapter.as_ref(),
                current_id.clone(),
                current_action,
            );

            let outcome = match current_action {
                StateAction::Ask => state.ask(&mut ctx).await,
                StateAction::Listen => match message {
                    Some(text) => state.listen(&mut ctx, text).await,
                    None => return Ok(()),
                },
                StateAction::End => return Ok(()),
            };

            let successor = match outcome {
                Ok(()) => ctx.into_successor(),
                Err(e) => {
                    warn!(
                        state = %current_id,
                        action = ?current_action,
                        error = %e,
                        "error while processing state action"
                    );
                    return self.reset_conversation(session).await;
                }
            };

            let (next_id, next_action) = successor;
            data.set_state(next_id, next_action);
            self.snapshots.persist(session.client_id(), &mut data).await?;

            if Self::done_transitioning(&data) {
                return Ok(());
            }
        }
    }

    /// Loads the snapshot for `client_id`, substituting a fresh one when the
    /// backend fails or none exists.
    async fn load_snapshot(&self, client_id: &ClientId) -> StateData {
        match self.snapshots.fetch(client_id).await {
            Ok(Some(data)) => data,
            Ok(None) => StateData::new(),
            Err(e) => {
                warn!(
                    client_id = %client_id,
                    error = %e,
                    "unable to load snapshot, starting fresh"
                );
                StateData::new()
            }
        }
    }

    /// Points a finished snapshot at the catalog's default entry point, and
    /// an expired one at the catalog's expired entry point when configured.
    fn resolve_entry_point(&self, data: &mut StateData) {
        if data.finished() {
            let entry = self.factory.default_state();
            data.set_state(
                Some(entry.state_id),
                Some(entry.action.unwrap_or(StateAction::Listen)),
            );
            return;
        }

        if let Some(timeout) = self.config.expired_timeout() {
            if data.expired(timeout) {
                if let Some(entry) = self.factory.expired_state(data) {
                    data.set_state(
                        Some(entry.state_id),
                        Some(entry.action.unwrap_or(StateAction::Ask)),
                    );
                }
            }
        }
    }

    /// Recovery for a failed state step: notify the user with the configured
    /// error message, wipe the conversation, flush, and return normally.
    ///
    /// The error message is sent immediately on the session's current
    /// channel, carrying along whatever the failing dispatch had already
    /// queued there. Other channels flush afterward.
    async fn reset_conversation(&self, session: &mut Session) -> Result<(), DispatchError> {
        self.adapter
            .queue_message(session, &self.config.error_message, true)
            .await?;

        let mut fresh = StateData::new();
        self.snapshots
            .persist(session.client_id(), &mut fresh)
            .await?;

        self.adapter.flush_session(session, None).await?;
        Ok(())
    }

    /// The loop stops when the engine is waiting on user input or there is
    /// no state left to run.
    fn done_transitioning(data: &StateData) -> bool {
        if data.state_action() == Some(StateAction::Listen) {
            return true;
        }
        data.finished()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
