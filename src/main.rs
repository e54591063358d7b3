//! depgov - Dependency-version governance CLI
//!
//! Commands:
//! - `resolve`: pick the best allowed version of each declared dependency
//! - `diff`: compare two snapshot files

use clap::Parser;
use depgov::cli::{CliArgs, Command, DiffArgs, ResolveArgs};
use depgov::config::EngineConfig;
use depgov::orchestrator::{read_dependencies, Orchestrator};
use depgov::output::{create_formatter, OutputConfig, OutputFormatter};
use depgov::snapshot::{read_snapshot, write_snapshot, DiffReport};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code when migrations were found but not applied
const EXIT_MIGRATIONS_PENDING: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose, args.quiet);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "depgov=debug"
    } else if quiet {
        "depgov=error"
    } else {
        "depgov=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let mut output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet);
    output_config.color = io::stdout().is_terminal();
    let formatter = create_formatter(output_config);

    match args.command {
        Command::Resolve(ref resolve) => {
            let show_progress = !args.quiet && !args.json && io::stderr().is_terminal();
            run_resolve(resolve, show_progress, formatter.as_ref()).await
        }
        Command::Diff(ref diff) => run_diff(diff, formatter.as_ref()),
    }
}

async fn run_resolve(
    args: &ResolveArgs,
    show_progress: bool,
    formatter: &dyn OutputFormatter,
) -> anyhow::Result<ExitCode> {
    let config = EngineConfig::from_args(args)?;
    let dependencies = read_dependencies(&args.dependencies)?;
    tracing::debug!(
        "resolving {} dependencies from {}",
        dependencies.len(),
        args.dependencies.display()
    );

    let orchestrator = Orchestrator::new(config)?.with_progress(show_progress);
    let report = orchestrator.run_until(dependencies, shutdown_signal()).await?;

    let mut stdout = io::stdout().lock();
    formatter.format_resolve(&report, &mut stdout)?;
    stdout.flush()?;

    if let Some(ref path) = args.snapshot_out {
        write_snapshot(path, &report.snapshot())?;
        tracing::info!("snapshot written to {}", path.display());
    }

    if report.has_pending_migrations() {
        Ok(ExitCode::from(EXIT_MIGRATIONS_PENDING))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn run_diff(args: &DiffArgs, formatter: &dyn OutputFormatter) -> anyhow::Result<ExitCode> {
    let before = read_snapshot(&args.before)?;
    let after = read_snapshot(&args.after)?;
    let report = DiffReport::new(&before, &after);

    let mut stdout = io::stdout().lock();
    formatter.format_diff(&report, &mut stdout)?;
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
