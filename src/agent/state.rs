use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Phases of one chat-with-tools turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationState {
    Idle,
    ToolsLoaded,
    FirstCallSent,
    /// The first reply is the final answer
    NoToolsRequested,
    ToolsRequested,
    ToolsExecuted,
    SecondCallSent,
    Done,
}

impl OrchestrationState {
    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition_to(self, next: OrchestrationState) -> bool {
        use OrchestrationState::*;

        matches!(
            (self, next),
            (Idle, ToolsLoaded)
                | (ToolsLoaded, FirstCallSent)
                | (FirstCallSent, NoToolsRequested)
                | (FirstCallSent, ToolsRequested)
                | (NoToolsRequested, Done)
                | (ToolsRequested, ToolsExecuted)
                | (ToolsExecuted, SecondCallSent)
                | (SecondCallSent, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == OrchestrationState::Done
    }
}

impl fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The states a turn passed through, starting at [`OrchestrationState::Idle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTrace {
    states: Vec<OrchestrationState>,
}

impl StateTrace {
    pub fn new() -> Self {
        Self {
            states: vec![OrchestrationState::Idle],
        }
    }

    pub fn current(&self) -> OrchestrationState {
        self.states
            .last()
            .copied()
            .unwrap_or(OrchestrationState::Idle)
    }

    /// Records a move to `next`.
    pub fn advance(&mut self, next: OrchestrationState) {
        let current = self.current();
        if current.can_transition_to(next) {
            debug!(from = %current, to = %next, "Orchestration transition");
        } else {
            warn!(from = %current, to = %next, "Unexpected orchestration transition");
        }
        self.states.push(next);
    }

    pub fn states(&self) -> &[OrchestrationState] {
        &self.states
    }

    pub fn into_states(self) -> Vec<OrchestrationState> {
        self.states
    }
}

impl Default for StateTrace {
    fn default() -> Self {
        Self::new()
    }
}
