//! Engine process spawning and control.
//!
//! [`EngineCommand`] assembles the engine command line for a run mode,
//! [`EngineProcess`] wraps one running child with its pipes, and
//! [`ProcessSupervisor`] owns at most one such child at a time.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use super::{LineStream, DEFAULT_CHANNEL_BUFFER};
use crate::config::EngineConfig;

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The binary was not found.
    #[error("Engine binary not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Permission denied when spawning.
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    /// A requested pipe was not captured.
    #[error("Process {0} not available")]
    NoPipe(&'static str),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(program: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(program.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_path_buf()),
            _ => Self::Io(err),
        }
    }
}

/// How the engine selects clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// The engine runs to completion on its own.
    Automatic,
    /// The engine asks the operator for every clause selection.
    Interactive,
}

/// Flags enabling verbose tracing of the saturation loop.
const TRACE_FLAGS: [&str; 12] = [
    "--show_preprocessing",
    "on",
    "--show_new",
    "on",
    "--show_passive",
    "on",
    "--show_active",
    "on",
    "--show_reductions",
    "on",
    "--proof_extra",
    "full",
];

/// A fully resolved engine command line.
#[derive(Debug, Clone)]
pub struct EngineCommand {
    program: PathBuf,
    args: Vec<String>,
    mode: RunMode,
}

impl EngineCommand {
    /// Build the command line for running `problem` in `mode`.
    #[must_use]
    pub fn new(config: &EngineConfig, problem: &Path, mode: RunMode) -> Self {
        let mut args = config.leading_args.clone();
        args.extend([
            "--input_syntax".to_string(),
            config.input_syntax.clone(),
            "-av".to_string(),
            "off".to_string(),
            problem.to_string_lossy().into_owned(),
            "--manual_cs".to_string(),
        ]);
        args.push(
            match mode {
                RunMode::Automatic => "off",
                RunMode::Interactive => "on",
            }
            .to_string(),
        );
        args.extend(TRACE_FLAGS.iter().map(|s| (*s).to_string()));

        // The engine must wait indefinitely for the operator.
        if mode == RunMode::Interactive {
            args.push("--time_limit".to_string());
            args.push("0".to_string());
        }

        args.extend(config.extra_args.iter().cloned());

        Self {
            program: config.binary.clone(),
            args,
            mode,
        }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn mode(&self) -> RunMode {
        self.mode
    }
}

/// A running engine process.
///
/// stdout and stderr share one pipe, so the [`LineStream`] sees lines in
/// the order the engine wrote them. stdin is only captured for interactive
/// runs.
#[derive(Debug)]
pub struct EngineProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: LineStream,
}

impl EngineProcess {
    /// Spawn the engine described by `command`.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the output pipe cannot be created or the
    /// process fails to spawn.
    pub fn spawn(command: &EngineCommand) -> Result<Self, SpawnError> {
        let stdin = match command.mode {
            RunMode::Automatic => Stdio::null(),
            RunMode::Interactive => Stdio::piped(),
        };

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).stdin(stdin).kill_on_drop(true);
        let (mut child, lines) = spawn_with_output(cmd, &command.program)?;

        Ok(Self {
            stdin: child.stdin.take(),
            child,
            lines,
        })
    }

    /// Get the process ID, if still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Write `text` followed by a newline to stdin and flush.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin was not captured or the write fails.
    pub async fn write_line(&mut self, text: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "engine stdin not captured"))?;
        stdin.write_all(format!("{text}\n").as_bytes()).await?;
        stdin.flush().await
    }

    /// Read the next output line. `Ok(None)` marks end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from an output pipe failed.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await.transpose()
    }

    /// Wait for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Forcefully kill the process and reap it.
    ///
    /// # Errors
    ///
    /// Returns an error if the kill signal cannot be sent.
    pub async fn kill(&mut self) -> io::Result<()> {
        self.child.kill().await
    }
}

/// Spawn `cmd` with stdout and stderr writing into a single pipe.
///
/// The parent's write ends live inside `cmd` and are dropped with it, so the
/// stream reaches end of file once the engine and its children exit.
#[cfg(unix)]
fn spawn_with_output(
    mut cmd: Command,
    program: &Path,
) -> Result<(Child, LineStream), SpawnError> {
    use std::os::fd::OwnedFd;
    use tokio::net::unix::pipe;

    let (reader, writer) = io::pipe()?;
    cmd.stdout(writer.try_clone()?).stderr(writer);
    let child = cmd.spawn().map_err(|e| SpawnError::from_io(program, e))?;
    drop(cmd);

    let receiver = pipe::Receiver::from_owned_fd(OwnedFd::from(reader))?;
    Ok((child, LineStream::from_reader(receiver, DEFAULT_CHANNEL_BUFFER)))
}

/// Spawn `cmd` with separate stdout and stderr pipes merged by two pumps.
#[cfg(not(unix))]
fn spawn_with_output(
    mut cmd: Command,
    program: &Path,
) -> Result<(Child, LineStream), SpawnError> {
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SpawnError::from_io(program, e))?;

    let stdout = child.stdout.take().ok_or(SpawnError::NoPipe("stdout"))?;
    let stderr = child.stderr.take().ok_or(SpawnError::NoPipe("stderr"))?;
    Ok((child, LineStream::merged(stdout, stderr, DEFAULT_CHANNEL_BUFFER)))
}

/// Owner of the single supervised engine process.
///
/// Spawning replaces the current child; the old one is killed and reaped
/// before the new one starts, so two children are never alive together.
#[derive(Debug, Default)]
pub struct ProcessSupervisor {
    process: Option<EngineProcess>,
}

impl ProcessSupervisor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any current child, then spawn a new one.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the new process fails to spawn. The old
    /// process is gone either way.
    pub async fn spawn(&mut self, command: &EngineCommand) -> Result<(), SpawnError> {
        self.terminate().await;

        let process = EngineProcess::spawn(command)?;
        tracing::info!(
            pid = ?process.id(),
            program = %command.program().display(),
            mode = ?command.mode(),
            "Spawned engine"
        );
        self.process = Some(process);
        Ok(())
    }

    /// Write one line to the child's stdin.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` when no process is owned, or the write error.
    pub async fn write_line(&mut self, text: &str) -> io::Result<()> {
        let process = self
            .process
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no engine running"))?;
        process.write_line(text).await
    }

    /// Read the next line of merged output.
    ///
    /// Returns `Ok(None)` at end of stream or when no process is owned.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from an output pipe failed.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        match self.process.as_mut() {
            Some(process) => process.read_line().await,
            None => Ok(None),
        }
    }

    /// Release the child after it exits on its own and return its status.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails; the handle is released anyway.
    pub async fn wait(&mut self) -> io::Result<Option<ExitStatus>> {
        let Some(mut process) = self.process.take() else {
            return Ok(None);
        };
        let status = process.wait().await?;
        tracing::debug!(%status, "Engine exited");
        Ok(Some(status))
    }

    /// Kill the child if one is owned. Idempotent.
    pub async fn terminate(&mut self) {
        let Some(mut process) = self.process.take() else {
            return;
        };
        let pid = process.id();
        match process.kill().await {
            Ok(()) => tracing::debug!(?pid, "Terminated engine"),
            Err(e) => tracing::debug!(?pid, error = %e, "Engine already gone"),
        }
    }

    /// Returns true while a child is owned.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.process.is_some()
    }

    /// Process ID of the owned child, if any.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.process.as_ref().and_then(EngineProcess::id)
    }
}
