//! Colored CLI display utilities for engine sessions.
//!
//! Engine output and verdicts go to stdout, engine output uncolored so it
//! can be piped. Prompts and errors go to stderr, so stdout stays a clean
//! stream of reports under `--json`.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::protocol::ClauseId;
use crate::session::{EngineSession, EngineState};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for the rendered choice list.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum number of characters, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize, raw_mode: bool) -> String {
    if raw_mode || s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// Render offered clause ids in engine order.
#[must_use]
pub fn format_choices(choices: &[ClauseId], raw_mode: bool) -> String {
    let joined = choices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    truncate(&joined, DEFAULT_MAX_LEN, raw_mode)
}

/// Print a batch of engine output lines verbatim.
pub fn print_lines(lines: &[String]) {
    let mut out = io::stdout().lock();
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
    let _ = out.flush();
}

/// Print the clause ids the engine is waiting on.
pub fn print_choices(choices: &[ClauseId], raw_mode: bool) {
    eprintln!(
        "{} {} clause(s): {}",
        "[SELECT]".cyan().bold(),
        choices.len(),
        format_choices(choices, raw_mode).bold()
    );
    let _ = io::stderr().flush();
}

/// Print the input prompt for a clause id.
pub fn print_prompt() {
    eprint!("{} ", "clause>".cyan());
    let _ = io::stderr().flush();
}

/// Print the final outcome of a run.
pub fn print_verdict(session: &EngineSession) {
    let ts = timestamp();
    let rounds = session.rounds();
    match session.state() {
        EngineState::Refuted => println!(
            "{} {} Refutation found {}",
            ts.dimmed(),
            "[VERDICT]".green().bold(),
            format!("rounds={rounds}").dimmed()
        ),
        EngineState::Saturated => println!(
            "{} {} Saturated (satisfiable) {}",
            ts.dimmed(),
            "[VERDICT]".blue().bold(),
            format!("rounds={rounds}").dimmed()
        ),
        EngineState::Failed => {
            let reason = session
                .failure()
                .map_or_else(|| "unknown failure".to_string(), ToString::to_string);
            println!(
                "{} {} {}",
                ts.dimmed(),
                "[FAILED]".red().bold(),
                reason.red()
            );
        }
        other => println!(
            "{} {} {:?}",
            ts.dimmed(),
            "[STATE]".yellow().bold(),
            other
        ),
    }
    let _ = io::stdout().flush();
}

/// Print an error message to stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}
