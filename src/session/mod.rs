//! Engine session: the state machine driving automatic and interactive runs.

mod error;
mod runner;
mod state;

pub use error::*;
pub use runner::*;
pub use state::*;
