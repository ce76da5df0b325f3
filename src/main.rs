//! Vampire Supervisor - drive the Vampire prover automatically or one clause selection at a time.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vampire_supervisor::config::{ConfigLoader, EngineConfig};
use vampire_supervisor::display;
use vampire_supervisor::protocol::ClauseId;
use vampire_supervisor::session::{EngineSession, EngineState};

#[derive(Parser)]
#[command(
    name = "vampire-supervisor",
    about = "Drive the Vampire prover automatically or with manual clause selection",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a config file (defaults to the standard search paths).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Engine binary, overriding the config file.
    #[arg(short, long, global = true)]
    binary: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine to completion and print its full output.
    Run {
        /// The problem file.
        problem: PathBuf,
        /// Print a JSON report instead of plain output.
        #[arg(long)]
        json: bool,
    },
    /// Run the engine with manual clause selection.
    Interactive {
        /// The problem file.
        problem: PathBuf,
        /// Always select the first offered clause.
        #[arg(long)]
        auto_select: bool,
        /// Print a JSON report per round instead of plain output.
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<EngineConfig, vampire_supervisor::config::ConfigError> {
    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = loader.load()?;
    if let Some(binary) = &cli.binary {
        config.binary.clone_from(binary);
    }
    Ok(config)
}

/// Print the lines of one call, as text or as a JSON report.
fn emit(session: &EngineSession, lines: Vec<String>, json: bool) {
    if json {
        match serde_json::to_string(&session.report(lines)) {
            Ok(report) => println!("{report}"),
            Err(e) => display::print_error(&format!("Failed to serialize report: {e}")),
        }
        return;
    }
    display::print_lines(&lines);
    if session.is_terminal() {
        display::print_verdict(session);
    }
}

/// Ask the operator for one of the offered clause ids.
///
/// Returns `None` when stdin is closed.
async fn prompt_choice(
    session: &EngineSession,
    input: &mut Lines<BufReader<Stdin>>,
) -> std::io::Result<Option<ClauseId>> {
    loop {
        display::print_choices(session.pending_choices(), false);
        display::print_prompt();

        let Some(answer) = input.next_line().await? else {
            return Ok(None);
        };
        match answer.trim().parse::<ClauseId>() {
            Ok(id) if session.offers(id) => return Ok(Some(id)),
            Ok(id) => display::print_error(&format!("Clause {id} is not offered")),
            Err(_) => display::print_error(&format!("Not a clause id: {}", answer.trim())),
        }
    }
}

async fn run_interactive(
    session: &mut EngineSession,
    problem: &Path,
    auto_select: bool,
    json: bool,
) -> std::io::Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut lines = session.start_interactive(problem).await;

    loop {
        emit(session, lines, json);
        if session.state() != EngineState::AwaitingChoice {
            return Ok(());
        }

        let choice = if auto_select {
            session.pending_choices().first().copied()
        } else {
            prompt_choice(session, &mut input).await?
        };
        let Some(id) = choice else {
            tracing::info!("Input closed, stopping engine");
            return Ok(());
        };

        tracing::debug!(id, round = session.rounds() + 1, "Selecting clause");
        lines = match session.select(id).await {
            Ok(lines) => lines,
            Err(e) => {
                display::print_error(&e.to_string());
                return Ok(());
            }
        };
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::from(2);
        }
    };
    tracing::info!(binary = %config.binary.display(), "Loaded engine config");

    let mut session = EngineSession::new(config);
    match cli.command {
        Commands::Run { problem, json } => {
            let lines = session.start(&problem).await;
            emit(&session, lines, json);
        }
        Commands::Interactive {
            problem,
            auto_select,
            json,
        } => {
            if let Err(e) = run_interactive(&mut session, &problem, auto_select, json).await {
                display::print_error(&format!("Failed to read input: {e}"));
            }
        }
    }

    let state = session.state();
    session.close().await;
    match state {
        EngineState::Refuted | EngineState::Saturated => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
