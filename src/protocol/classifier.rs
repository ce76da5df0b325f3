//! Stateless classification of engine output lines.
//!
//! Every line the engine prints is either ordinary diagnostic output or one
//! of a handful of protocol lines, recognized by a fixed prefix. The
//! classifier looks at exactly one line at a time and keeps no memory of
//! earlier lines.

use super::MarkerSet;

/// Identifier of a clause offered for manual selection.
pub type ClauseId = u64;

/// Error raised when a clause request line carries a malformed id list.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed clause list (bad token {token:?}): {line}")]
pub struct ParseError {
    /// The full offending line.
    pub line: String,
    /// The token that failed to parse (empty when the list is empty).
    pub token: String,
}

/// Classification of a single output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// The engine waits for one of these clause ids, in the engine's order.
    ChoiceRequest(Vec<ClauseId>),
    /// A refutation was found.
    Refuted,
    /// The clause set was saturated; the problem is satisfiable.
    Saturated,
    /// The engine reported a user error.
    EngineError,
    /// Anything else.
    Ordinary,
}

impl LineClass {
    /// Returns true for the classes that end a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Refuted | Self::Saturated | Self::EngineError)
    }
}

/// Final verdict of a run, derived from the first terminal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Refuted,
    Saturated,
    EngineError,
}

/// Prefix-based line classifier.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    markers: MarkerSet,
}

impl Classifier {
    #[must_use]
    pub fn new(markers: MarkerSet) -> Self {
        Self { markers }
    }

    /// Classify one line of engine output.
    ///
    /// Clause requests are checked first, then refutation, satisfiable and
    /// user error markers.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the line is a clause request whose id list
    /// is empty or contains a non-integer token.
    pub fn classify(&self, line: &str) -> Result<LineClass, ParseError> {
        if let Some(rest) = line.strip_prefix(self.markers.choice_request.as_str()) {
            return parse_choices(line, rest).map(LineClass::ChoiceRequest);
        }
        Ok(self.terminal_class(line).unwrap_or(LineClass::Ordinary))
    }

    /// Find the verdict of a complete run.
    ///
    /// Scans `lines` in emission order and returns the verdict of the first
    /// terminal line together with its index. Clause request lines are not
    /// terminal and are skipped like ordinary output.
    #[must_use]
    pub fn verdict<S: AsRef<str>>(&self, lines: &[S]) -> Option<(usize, Verdict)> {
        lines.iter().enumerate().find_map(|(index, line)| {
            let verdict = match self.terminal_class(line.as_ref())? {
                LineClass::Refuted => Verdict::Refuted,
                LineClass::Saturated => Verdict::Saturated,
                _ => Verdict::EngineError,
            };
            Some((index, verdict))
        })
    }

    fn terminal_class(&self, line: &str) -> Option<LineClass> {
        if line.starts_with(self.markers.refutation.as_str()) {
            Some(LineClass::Refuted)
        } else if line.starts_with(self.markers.satisfiable.as_str()) {
            Some(LineClass::Saturated)
        } else if line.starts_with(self.markers.user_error.as_str()) {
            Some(LineClass::EngineError)
        } else {
            None
        }
    }
}

/// Parse the comma-separated id list that follows the request marker.
///
/// The engine terminates the list with a comma (`3,7,12,`), so a single
/// trailing separator is dropped before splitting.
fn parse_choices(line: &str, rest: &str) -> Result<Vec<ClauseId>, ParseError> {
    let list = rest.trim();
    let list = list.strip_suffix(',').unwrap_or(list);
    if list.trim().is_empty() {
        return Err(ParseError {
            line: line.to_string(),
            token: String::new(),
        });
    }

    list.split(',')
        .map(str::trim)
        .map(|token| {
            token.parse::<ClauseId>().map_err(|_| ParseError {
                line: line.to_string(),
                token: token.to_string(),
            })
        })
        .collect()
}
