//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::protocol::MarkerSet;

/// Configuration for launching and talking to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine executable, resolved through `PATH` when relative.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    /// Arguments placed before the engine flags (e.g. a wrapper script).
    #[serde(default)]
    pub leading_args: Vec<String>,
    /// Input syntax of problem files.
    #[serde(default = "default_input_syntax")]
    pub input_syntax: String,
    /// Arguments appended after the engine flags.
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Protocol line prefixes.
    #[serde(default)]
    pub markers: MarkerSet,
}

fn default_binary() -> PathBuf {
    PathBuf::from("vampire")
}

fn default_input_syntax() -> String {
    "smtlib2".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            leading_args: Vec::new(),
            input_syntax: default_input_syntax(),
            extra_args: Vec::new(),
            markers: MarkerSet::default(),
        }
    }
}

impl EngineConfig {
    /// Build a config for a wrapper invocation such as `sh fake_engine.sh`.
    #[must_use]
    pub fn with_launcher(binary: impl Into<PathBuf>, leading_args: &[&str]) -> Self {
        Self {
            binary: binary.into(),
            leading_args: leading_args.iter().map(|s| (*s).to_string()).collect(),
            ..Default::default()
        }
    }
}
