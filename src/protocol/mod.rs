//! Engine output protocol: marker prefixes and line classification.

mod classifier;
mod markers;

pub use classifier::*;
pub use markers::*;
