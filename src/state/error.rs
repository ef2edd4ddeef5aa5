use super::event::AppEvent;
use super::model::AppState;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid state transition: from {from:?} using event {event:?}")]
    InvalidStateTransition { from: AppState, event: AppEvent },
}

impl StateError {
    /// True when the refusal came from another operation still running.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::InvalidStateTransition {
                from: AppState::Busy(_),
                event: AppEvent::Begin(_)
            }
        )
    }
}
