//! Engine process supervision: spawning, line I/O and termination.

mod lines;
mod process;

pub use lines::*;
pub use process::*;
