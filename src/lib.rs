//! Vampire Supervisor - drive the Vampire prover automatically or one clause selection at a time.

pub mod config;
pub mod display;
pub mod engine;
pub mod protocol;
pub mod session;
