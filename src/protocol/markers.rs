//! Line prefixes the engine uses to signal verdicts and input requests.

use serde::{Deserialize, Serialize};

/// Prefix of the line that announces a refutation (proof found).
pub const REFUTATION_MARKER: &str = "% Refutation found. Thanks to";

/// Prefix of the SZS status line for a satisfiable (saturated) problem.
pub const SATISFIABLE_MARKER: &str = "% SZS status Satisfiable";

/// Prefix of a user error report.
pub const USER_ERROR_MARKER: &str = "User error: ";

/// Prefix of a manual clause selection request.
pub const CHOICE_REQUEST_MARKER: &str = "Pick a clause from:";

/// The set of recognized line prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSet {
    /// Refutation found.
    pub refutation: String,
    /// Satisfiable status.
    pub satisfiable: String,
    /// Engine-reported user error.
    pub user_error: String,
    /// Clause selection request.
    pub choice_request: String,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            refutation: REFUTATION_MARKER.to_string(),
            satisfiable: SATISFIABLE_MARKER.to_string(),
            user_error: USER_ERROR_MARKER.to_string(),
            choice_request: CHOICE_REQUEST_MARKER.to_string(),
        }
    }
}

impl MarkerSet {
    /// Check that every prefix is non-empty and distinct from the others.
    ///
    /// An empty prefix matches every line, and two equal prefixes make the
    /// classification depend on check order.
    ///
    /// # Errors
    ///
    /// Returns the first offending marker by field name.
    pub fn validate(&self) -> Result<(), InvalidMarker> {
        let entries = self.entries();
        for (i, &(name, prefix)) in entries.iter().enumerate() {
            if prefix.is_empty() {
                return Err(InvalidMarker::Empty(name));
            }
            if let Some(&(other, _)) = entries[..i].iter().find(|(_, p)| *p == prefix) {
                return Err(InvalidMarker::Duplicate(other, name));
            }
        }
        Ok(())
    }

    fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("choice_request", &self.choice_request),
            ("refutation", &self.refutation),
            ("satisfiable", &self.satisfiable),
            ("user_error", &self.user_error),
        ]
    }
}

/// A marker table that cannot classify lines unambiguously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMarker {
    #[error("marker `{0}` is empty and would match every line")]
    Empty(&'static str),
    #[error("markers `{0}` and `{1}` are identical")]
    Duplicate(&'static str, &'static str),
}
