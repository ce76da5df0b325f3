//! Session error types.

use crate::engine::SpawnError;
use crate::protocol::ParseError;

use super::EngineState;

/// Reason a session ended in `Failed`.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The engine could not be started.
    #[error("Failed to launch engine: {0}")]
    Launch(#[from] SpawnError),

    /// A clause request line did not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The engine reported a user error.
    #[error("Engine error: {message}")]
    Engine { message: String },

    /// Output ended without a verdict or clause request.
    #[error("Engine output ended without a recognizable verdict")]
    ProtocolExhaustion,

    /// Reading from or writing to the engine failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned when a choice is supplied at the wrong time.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    #[error("No clause selection pending (session is {state:?})")]
    NotAwaitingChoice { state: EngineState },
}
