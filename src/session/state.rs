//! Session state machine.

use serde::{Deserialize, Serialize};

/// Current state of an engine session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    #[default]
    Unstarted,
    Running,
    AwaitingChoice,
    Saturated,
    Refuted,
    Failed,
}

impl EngineState {
    /// Terminal states only change on an explicit restart.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Saturated | Self::Refuted | Self::Failed)
    }

    /// States in which the session owns a live process.
    #[must_use]
    pub fn has_process(self) -> bool {
        matches!(self, Self::Running | Self::AwaitingChoice)
    }
}
