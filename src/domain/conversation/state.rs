//! The conversation state contract and the per-step context.
//!
//! A state is a unit of conversation behavior with two overridable
//! operations: `ask` emits output, `listen` interprets one input. Each
//! dispatch step binds a fresh state instance to the current snapshot and
//! session through a [`StepContext`]; the context records the computed
//! successor, which the dispatcher writes back into the snapshot before the
//! instance is discarded.

use async_trait::async_trait;

use crate::domain::conversation::{Session, StateAction, StateData, StateDataError};
use crate::domain::foundation::{StateId, Timestamp};
use crate::ports::chat_adapter::{AdapterError, ChatAdapter, User};

/// Errors a state's `ask`/`listen` may fail with.
///
/// These never cross the dispatch boundary: the dispatcher recovers by
/// resetting the conversation and notifying the user.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Data(#[from] StateDataError),

    #[error("{0}")]
    Failed(String),
}

impl StateError {
    /// An arbitrary state-specific failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        StateError::Failed(reason.into())
    }
}

/// A named unit of conversation behavior.
///
/// Both operations default to no-ops so states implement only the side of
/// the exchange they participate in.
#[async_trait]
pub trait ConversationState: Send + Sync {
    /// Emit output and/or record a transition.
    async fn ask(&self, ctx: &mut StepContext<'_>) -> Result<(), StateError> {
        let _ = ctx;
        Ok(())
    }

    /// Interpret one inbound input and record a transition.
    async fn listen(&self, ctx: &mut StepContext<'_>, input: &str) -> Result<(), StateError> {
        let _ = (ctx, input);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Successor {
    state_id: Option<StateId>,
    action: Option<StateAction>,
}

/// Everything one dispatch step hands to the running state: the snapshot,
/// the session, the transport, and the transition recorder.
pub struct StepContext<'a> {
    data: &'a mut StateData,
    session: &'a mut Session,
    adapter: &'a dyn ChatAdapter,
    current_id: StateId,
    current_action: StateAction,
    next: Option<Successor>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        data: &'a mut StateData,
        session: &'a mut Session,
        adapter: &'a dyn ChatAdapter,
        current_id: StateId,
        current_action: StateAction,
    ) -> Self {
        Self {
            data,
            session,
            adapter,
            current_id,
            current_action,
            next: None,
        }
    }

    pub fn data(&self) -> &StateData {
        self.data
    }

    pub fn data_mut(&mut self) -> &mut StateData {
        self.data
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    pub fn adapter(&self) -> &dyn ChatAdapter {
        self.adapter
    }

    /// The identifier of the state this step is running.
    pub fn current_state_id(&self) -> &StateId {
        &self.current_id
    }

    /// The action this step is running.
    pub fn current_action(&self) -> StateAction {
        self.current_action
    }

    /// The current wall-clock time, handy for states that compute with it.
    pub fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    /// Queues a reply on the session's current channel.
    pub fn respond(&mut self, message: impl Into<String>) {
        let channel = self.session.channel().clone();
        self.session.queue(&channel, message);
    }

    /// Queues a message on the recipient's direct-message channel.
    pub fn respond_direct(
        &mut self,
        recipient: &User,
        message: impl Into<String>,
    ) -> Result<(), StateError> {
        self.adapter
            .queue_direct_message(self.session, &message.into(), recipient)?;
        Ok(())
    }

    /// Records the successor state, resolving the action when none is given:
    /// transitioning to the end sentinel ends the conversation, transitioning
    /// to this same state alternates ask/listen, and transitioning to a
    /// different state defaults to ask.
    pub fn transition_to(&mut self, target: impl Into<StateId>) {
        let target = target.into();
        let action = if target.is_end() {
            StateAction::End
        } else if target == self.current_id {
            self.current_action.flipped()
        } else {
            StateAction::Ask
        };

        self.next = Some(Successor {
            state_id: Some(target),
            action: Some(action),
        });
    }

    /// Records the successor state with an explicit action, bypassing the
    /// default-action resolution.
    pub fn transition_with_action(&mut self, target: impl Into<StateId>, action: StateAction) {
        self.next = Some(Successor {
            state_id: Some(target.into()),
            action: Some(action),
        });
    }

    /// Re-runs the current state and action next time, used to re-prompt on
    /// invalid input without losing position.
    pub fn repeat_action(&mut self) {
        self.next = Some(Successor {
            state_id: Some(self.current_id.clone()),
            action: Some(self.current_action),
        });
    }

    /// Clears the entire payload and transitions to the end sentinel.
    pub fn end_conversation(&mut self) {
        self.data.clear();
        self.next = Some(Successor {
            state_id: Some(StateId::end()),
            action: Some(StateAction::End),
        });
    }

    /// The successor state id the dispatcher will persist. Defaults to this
    /// state when no transition was recorded.
    pub fn next_state_id(&self) -> Option<&StateId> {
        match &self.next {
            Some(successor) => successor.state_id.as_ref(),
            None => Some(&self.current_id),
        }
    }

    /// The successor action the dispatcher will persist. Defaults to the
    /// flipped current action when no transition was recorded, so a plain
    /// ask step waits for input next and vice versa.
    pub fn next_state_action(&self) -> Option<StateAction> {
        match &self.next {
            Some(successor) => successor.action,
            None => Some(self.current_action.flipped()),
        }
    }

    /// Resolves the recorded (or defaulted) successor, releasing the
    /// snapshot and session borrows.
    pub fn into_successor(self) -> (Option<StateId>, Option<StateAction>) {
        match self.next {
            Some(successor) => (successor.state_id, successor.action),
            None => (
                Some(self.current_id),
                Some(self.current_action.flipped()),
            ),
        }
    }
}

impl std::fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepContext")
            .field("current_id", &self.current_id)
            .field("current_action", &self.current_action)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::chat::MemoryAdapter;
    use crate::domain::foundation::{Channel, ClientId};
    use serde_json::json;

    fn session() -> Session {
        Session::new(ClientId::from("MEMORY"), Channel::from("C1"), None)
    }

    fn context<'a>(
        data: &'a mut StateData,
        session: &'a mut Session,
        adapter: &'a MemoryAdapter,
        current: (&str, StateAction),
    ) -> StepContext<'a> {
        StepContext::new(data, session, adapter, StateId::from(current.0), current.1)
    }

    #[test]
    fn transition_default_action_table_holds() {
        use StateAction::{Ask, Listen};

        // (current state/action, target state, explicit action, expected)
        let table = [
            // Common transitions, automated action determination.
            (("state_a", Ask), "state_b", None, ("state_b", Ask)),
            (("state_a", Listen), "state_b", None, ("state_b", Ask)),
            // Transition back to self, automated action determination.
            (("state_a", Listen), "state_a", None, ("state_a", Ask)),
            (("state_a", Ask), "state_a", None, ("state_a", Listen)),
            // Explicit action always wins.
            (("state_a", Ask), "state_a", Some(Ask), ("state_a", Ask)),
            (("state_a", Listen), "state_a", Some(Listen), ("state_a", Listen)),
            (("state_a", Listen), "state_b", Some(Listen), ("state_b", Listen)),
            (("state_a", Ask), "state_b", Some(Listen), ("state_b", Listen)),
        ];

        for (current, target, action, expected) in table {
            let adapter = MemoryAdapter::new();
            let mut data = StateData::new();
            let mut session = session();
            let mut ctx = context(&mut data, &mut session, &adapter, current);

            match action {
                Some(action) => ctx.transition_with_action(target, action),
                None => ctx.transition_to(target),
            }

            assert_eq!(
                ctx.next_state_id(),
                Some(&StateId::from(expected.0)),
                "target {target} from {current:?}"
            );
            assert_eq!(
                ctx.next_state_action(),
                Some(expected.1),
                "target {target} from {current:?}"
            );
        }
    }

    #[test]
    fn transition_to_the_end_sentinel_ends_the_conversation() {
        let adapter = MemoryAdapter::new();
        let mut data = StateData::new();
        let mut session = session();
        let mut ctx = context(
            &mut data,
            &mut session,
            &adapter,
            ("state_a", StateAction::Ask),
        );

        ctx.transition_to(StateId::end());

        assert_eq!(ctx.next_state_id(), Some(&StateId::end()));
        assert_eq!(ctx.next_state_action(), Some(StateAction::End));
    }

    #[test]
    fn default_successor_reruns_self_with_flipped_action() {
        let adapter = MemoryAdapter::new();
        let mut data = StateData::new();
        let mut session = session();
        let ctx = context(
            &mut data,
            &mut session,
            &adapter,
            ("state_a", StateAction::Ask),
        );

        assert_eq!(ctx.next_state_id(), Some(&StateId::from("state_a")));
        assert_eq!(ctx.next_state_action(), Some(StateAction::Listen));
    }

    #[test]
    fn repeat_action_keeps_state_and_action() {
        let adapter = MemoryAdapter::new();
        let mut data = StateData::new();
        let mut session = session();
        let mut ctx = context(
            &mut data,
            &mut session,
            &adapter,
            ("state_a", StateAction::Ask),
        );

        ctx.repeat_action();

        assert_eq!(ctx.next_state_id(), Some(&StateId::from("state_a")));
        assert_eq!(ctx.next_state_action(), Some(StateAction::Ask));
    }

    #[test]
    fn end_conversation_clears_the_payload() {
        let adapter = MemoryAdapter::new();
        let mut data = StateData::new();
        data.set("name", json!("Fitzgibbons"));
        data.set("age", json!(42));
        let mut session = session();
        let mut ctx = context(
            &mut data,
            &mut session,
            &adapter,
            ("state_a", StateAction::Ask),
        );

        ctx.end_conversation();

        assert_eq!(ctx.next_state_id(), Some(&StateId::end()));
        assert_eq!(ctx.next_state_action(), Some(StateAction::End));
        assert!(!ctx.data().has_key("name"));
        assert!(!ctx.data().has_key("age"));
    }

    #[test]
    fn respond_queues_on_the_session_channel() {
        let adapter = MemoryAdapter::new();
        let mut data = StateData::new();
        let mut session = session();
        let mut ctx = context(
            &mut data,
            &mut session,
            &adapter,
            ("state_a", StateAction::Ask),
        );

        ctx.respond("ABC987");

        assert_eq!(session.queued(&Channel::from("C1")), ["ABC987"]);
    }
}
