//! Engine session orchestration.
//!
//! An [`EngineSession`] drives the engine through one run at a time, either
//! to completion (automatic mode) or one clause selection at a time
//! (interactive mode). Every entry point returns the output lines produced
//! since the previous call. Engine-side failures never surface as `Err`;
//! they move the session to [`EngineState::Failed`] and are available via
//! [`EngineSession::failure`].

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::engine::{EngineCommand, ProcessSupervisor, RunMode};
use crate::protocol::{Classifier, ClauseId, LineClass, Verdict};

use super::{EngineState, SelectError, SessionError};

/// Serializable snapshot of a session after a call.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub run_id: Option<Uuid>,
    pub mode: Option<RunMode>,
    pub state: EngineState,
    pub pending_choices: Vec<ClauseId>,
    pub rounds: usize,
    pub failure: Option<String>,
    pub lines: Vec<String>,
    pub reported_at: DateTime<Utc>,
}

/// A supervised engine session owning at most one engine process.
#[derive(Debug)]
pub struct EngineSession {
    config: EngineConfig,
    classifier: Classifier,
    process: ProcessSupervisor,
    state: EngineState,
    pending_choices: Vec<ClauseId>,
    failure: Option<SessionError>,
    mode: Option<RunMode>,
    rounds: usize,
    run_id: Uuid,
}

impl EngineSession {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            classifier: Classifier::new(config.markers.clone()),
            config,
            process: ProcessSupervisor::new(),
            state: EngineState::Unstarted,
            pending_choices: Vec::new(),
            failure: None,
            mode: None,
            rounds: 0,
            run_id: Uuid::nil(),
        }
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Clause ids offered by the engine, in the engine's order.
    ///
    /// Empty unless the session is in `AwaitingChoice`.
    #[must_use]
    pub fn pending_choices(&self) -> &[ClauseId] {
        &self.pending_choices
    }

    /// Returns true if `id` is among the currently offered clauses.
    #[must_use]
    pub fn offers(&self, id: ClauseId) -> bool {
        self.pending_choices.contains(&id)
    }

    /// Why the session failed, if it did.
    #[must_use]
    pub fn failure(&self) -> Option<&SessionError> {
        self.failure.as_ref()
    }

    #[must_use]
    pub fn mode(&self) -> Option<RunMode> {
        self.mode
    }

    /// Number of choices supplied since the last start.
    #[must_use]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Identifier of the current run, once a run has been started.
    #[must_use]
    pub fn run_id(&self) -> Option<Uuid> {
        (!self.run_id.is_nil()).then_some(self.run_id)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Process ID of the live engine, if any.
    #[must_use]
    pub fn process_id(&self) -> Option<u32> {
        self.process.id()
    }

    /// Snapshot the session together with the lines of the last call.
    #[must_use]
    pub fn report(&self, lines: Vec<String>) -> SessionReport {
        SessionReport {
            run_id: self.run_id(),
            mode: self.mode,
            state: self.state,
            pending_choices: self.pending_choices.clone(),
            rounds: self.rounds,
            failure: self.failure.as_ref().map(ToString::to_string),
            lines,
            reported_at: Utc::now(),
        }
    }

    /// Run the engine on `problem` without manual clause selection.
    ///
    /// Waits for the engine to exit and returns its complete output. The
    /// first verdict line in the output decides the final state; without
    /// one the session fails.
    pub async fn start(&mut self, problem: impl AsRef<Path>) -> Vec<String> {
        let command = self.restart(problem.as_ref(), RunMode::Automatic).await;
        if let Err(e) = self.process.spawn(&command).await {
            self.finish(EngineState::Failed, Some(e.into())).await;
            return Vec::new();
        }
        self.transition(EngineState::Running);

        let mut lines = Vec::new();
        loop {
            match self.process.read_line().await {
                Ok(Some(line)) => lines.push(line),
                Ok(None) => break,
                Err(e) => {
                    self.finish(EngineState::Failed, Some(e.into())).await;
                    return lines;
                }
            }
        }

        if let Err(e) = self.process.wait().await {
            tracing::warn!(run_id = %self.run_id, error = %e, "Failed to reap engine");
        }

        match self.classifier.verdict(&lines) {
            Some((_, Verdict::Refuted)) => self.finish(EngineState::Refuted, None).await,
            Some((_, Verdict::Saturated)) => self.finish(EngineState::Saturated, None).await,
            Some((index, Verdict::EngineError)) => {
                let message = lines[index].clone();
                self.finish(EngineState::Failed, Some(SessionError::Engine { message }))
                    .await;
            }
            None => {
                self.finish(EngineState::Failed, Some(SessionError::ProtocolExhaustion))
                    .await;
            }
        }
        lines
    }

    /// Alias of [`EngineSession::start`].
    pub async fn run_to_completion(&mut self, problem: impl AsRef<Path>) -> Vec<String> {
        self.start(problem).await
    }

    /// Start the engine on `problem` with manual clause selection.
    ///
    /// Returns the output printed before the first clause request or
    /// verdict.
    pub async fn start_interactive(&mut self, problem: impl AsRef<Path>) -> Vec<String> {
        let command = self.restart(problem.as_ref(), RunMode::Interactive).await;
        if let Err(e) = self.process.spawn(&command).await {
            self.finish(EngineState::Failed, Some(e.into())).await;
            return Vec::new();
        }
        self.transition(EngineState::Running);
        self.drain().await
    }

    /// Alias of [`EngineSession::start_interactive`].
    pub async fn begin_interactive(&mut self, problem: impl AsRef<Path>) -> Vec<String> {
        self.start_interactive(problem).await
    }

    /// Send the selected clause id to the engine.
    ///
    /// The id is not checked against [`EngineSession::pending_choices`];
    /// the engine decides whether it is acceptable. Returns the output
    /// printed before the next clause request or verdict.
    ///
    /// # Errors
    ///
    /// Returns `SelectError::NotAwaitingChoice` if the engine is not
    /// waiting for a selection. The session is left unchanged.
    pub async fn select(&mut self, id: ClauseId) -> Result<Vec<String>, SelectError> {
        if self.state != EngineState::AwaitingChoice {
            return Err(SelectError::NotAwaitingChoice { state: self.state });
        }
        if !self.offers(id) {
            tracing::debug!(run_id = %self.run_id, id, "Selected clause was not offered");
        }

        self.pending_choices.clear();
        self.rounds = self.rounds.saturating_add(1);
        self.transition(EngineState::Running);

        if let Err(e) = self.process.write_line(&id.to_string()).await {
            self.finish(EngineState::Failed, Some(e.into())).await;
            return Ok(Vec::new());
        }
        Ok(self.drain().await)
    }

    /// Alias of [`EngineSession::select`].
    ///
    /// # Errors
    ///
    /// See [`EngineSession::select`].
    pub async fn supply_choice(&mut self, id: ClauseId) -> Result<Vec<String>, SelectError> {
        self.select(id).await
    }

    /// Terminate any live engine and dispose of the session.
    pub async fn close(mut self) {
        self.process.terminate().await;
    }

    /// Tear down the previous run and prepare the command for a new one.
    async fn restart(&mut self, problem: &Path, mode: RunMode) -> EngineCommand {
        self.process.terminate().await;
        self.pending_choices.clear();
        self.failure = None;
        self.rounds = 0;
        self.mode = Some(mode);
        self.run_id = Uuid::new_v4();
        self.transition(EngineState::Unstarted);

        tracing::info!(
            run_id = %self.run_id,
            problem = %problem.display(),
            ?mode,
            "Starting engine run"
        );
        EngineCommand::new(&self.config, problem, mode)
    }

    /// Collect ordinary lines until the engine asks for a clause or ends.
    async fn drain(&mut self) -> Vec<String> {
        let mut batch = Vec::new();
        loop {
            let line = match self.process.read_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.finish(EngineState::Failed, Some(SessionError::ProtocolExhaustion))
                        .await;
                    return batch;
                }
                Err(e) => {
                    self.finish(EngineState::Failed, Some(e.into())).await;
                    return batch;
                }
            };

            match self.classifier.classify(&line) {
                Ok(LineClass::Ordinary) => batch.push(line),
                Ok(LineClass::ChoiceRequest(ids)) => {
                    tracing::debug!(
                        run_id = %self.run_id,
                        choices = ?ids,
                        "Engine awaits clause selection"
                    );
                    self.pending_choices = ids;
                    self.transition(EngineState::AwaitingChoice);
                    return batch;
                }
                Ok(LineClass::Refuted) => {
                    self.finish(EngineState::Refuted, None).await;
                    return batch;
                }
                Ok(LineClass::Saturated) => {
                    self.finish(EngineState::Saturated, None).await;
                    return batch;
                }
                Ok(LineClass::EngineError) => {
                    let error = SessionError::Engine { message: line };
                    self.finish(EngineState::Failed, Some(error)).await;
                    return batch;
                }
                Err(e) => {
                    self.finish(EngineState::Failed, Some(e.into())).await;
                    return batch;
                }
            }
        }
    }

    /// Enter a terminal state, releasing the engine process.
    async fn finish(&mut self, state: EngineState, failure: Option<SessionError>) {
        self.process.terminate().await;
        self.pending_choices.clear();
        match &failure {
            Some(error) => tracing::warn!(run_id = %self.run_id, %error, "Engine run failed"),
            None => tracing::info!(run_id = %self.run_id, ?state, "Engine run finished"),
        }
        self.failure = failure;
        self.transition(state);
    }

    fn transition(&mut self, new_state: EngineState) {
        debug_assert_eq!(
            self.process.is_alive(),
            new_state.has_process(),
            "process liveness disagrees with {new_state:?}"
        );
        tracing::debug!(from = ?self.state, to = ?new_state, "State transition");
        self.state = new_state;
    }
}
