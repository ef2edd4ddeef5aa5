use super::error::{StateError, StateResult};
use super::{event::StateTransition, AppEvent, AppState};

const HISTORY_LIMIT: usize = 64;

/// Idle/Busy guard around asynchronous editor operations.
#[derive(Debug)]
pub struct StateMachine {
    state: AppState,
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: AppState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn next_state(&self, event: AppEvent) -> Option<AppState> {
        match (self.state, event) {
            (AppState::Idle, AppEvent::Begin(operation)) => Some(AppState::Busy(operation)),
            (AppState::Busy(_), AppEvent::Finish) => Some(AppState::Idle),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: AppEvent) -> StateResult<AppState> {
        tracing::debug!(from = ?self.state, event = ?event, "request state transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(self.state, event, next);
        self.state = next;
        if self.transition_history.len() == HISTORY_LIMIT {
            self.transition_history.remove(0);
        }
        self.transition_history.push(record);

        Ok(self.state)
    }

    /// Returns to Idle from any state.
    pub fn reset(&mut self) {
        if self.state.is_busy() {
            let _ = self.transition(AppEvent::Finish);
        }
    }
}

#[cfg(test)]
impl StateMachine {
    fn can_transition(&self, event: AppEvent) -> bool {
        self.next_state(event).is_some()
    }

    fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Operation;

    #[test]
    fn begin_is_refused_while_busy() {
        let mut machine = StateMachine::new();
        assert!(machine.can_transition(AppEvent::Begin(Operation::Upload)));
        assert!(!machine.can_transition(AppEvent::Finish));

        machine
            .transition(AppEvent::Begin(Operation::Upload))
            .expect("idle -> busy should transition");
        assert!(machine.is_busy());

        let err = machine
            .transition(AppEvent::Begin(Operation::Export))
            .expect_err("second operation must be refused");
        assert!(err.is_busy());
        assert_eq!(machine.state(), AppState::Busy(Operation::Upload));
    }

    #[test]
    fn transition_records_history_with_ordered_entries() {
        let mut machine = StateMachine::new();
        machine
            .transition(AppEvent::Begin(Operation::RandomTemplate))
            .expect("begin");
        machine.transition(AppEvent::Finish).expect("finish");

        assert_eq!(machine.state(), AppState::Idle);
        assert_eq!(
            machine.history(),
            &[
                StateTransition::new(
                    AppState::Idle,
                    AppEvent::Begin(Operation::RandomTemplate),
                    AppState::Busy(Operation::RandomTemplate)
                ),
                StateTransition::new(
                    AppState::Busy(Operation::RandomTemplate),
                    AppEvent::Finish,
                    AppState::Idle
                ),
            ]
        );
    }

    #[test]
    fn finish_while_idle_fails_without_mutating_history() {
        let mut machine = StateMachine::new();
        let err = machine
            .transition(AppEvent::Finish)
            .expect_err("idle -> finish should fail");
        assert!(!err.is_busy());
        assert_eq!(machine.state(), AppState::Idle);
        assert!(machine.history().is_empty());

        machine.reset();
        assert!(machine.history().is_empty());
    }

    #[test]
    fn history_is_bounded() {
        let mut machine = StateMachine::new();
        for _ in 0..HISTORY_LIMIT {
            machine
                .transition(AppEvent::Begin(Operation::Export))
                .expect("begin");
            machine.reset();
        }
        assert_eq!(machine.history().len(), HISTORY_LIMIT);
        assert_eq!(machine.state(), AppState::Idle);
    }
}
