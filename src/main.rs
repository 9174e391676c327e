//! depbatch - Batch dependency upgrader and NuGet config normalizer
//!
//! Two maintenance commands for .NET repositories:
//! - `upgrade`: apply a fixed list of package upgrades to every project file
//! - `fix-configs`: rewrite broken nuget.config headers into well-formed XML

use clap::Parser;
use depbatch::cli::{CliArgs, Command, FixConfigsArgs, UpgradeArgs};
use depbatch::domain::{ManifestRef, UpgradePlan};
use depbatch::error::AppError;
use depbatch::invoker::UpgradeInvoker;
use depbatch::locator::{self, NamePattern};
use depbatch::normalizer;
use depbatch::orchestrator::{Orchestrator, OrchestratorConfig};
use depbatch::output::{create_formatter, OutputFormatter};
use depbatch::progress::Progress;
use depbatch::runner::SystemCommandRunner;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code when at least one invocation or file failed
const EXIT_FAILURES: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the level
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("depbatch v{}", env!("CARGO_PKG_VERSION"));
    }

    let formatter = create_formatter(args.output_config().with_color(io::stdout().is_terminal()));

    match &args.command {
        Command::Upgrade(upgrade) => run_upgrade(&args, upgrade, formatter.as_ref()).await,
        Command::FixConfigs(fix) => run_fix_configs(&args, fix, formatter.as_ref()),
    }
}

async fn run_upgrade(
    args: &CliArgs,
    upgrade: &UpgradeArgs,
    formatter: &dyn OutputFormatter,
) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("Target: {}", upgrade.path.display());
        eprintln!(
            "Program: {} (timeout {}s)",
            upgrade.program,
            upgrade.timeout.as_secs()
        );
    }

    let (plan, manifests) = prepare_upgrade(upgrade, args.show_progress())?;
    formatter.format_start(manifests.len(), plan.len(), &mut io::stdout())?;

    let invoker = UpgradeInvoker::new(SystemCommandRunner::new())
        .with_program(upgrade.program.as_str())
        .with_timeout(upgrade.timeout);
    let config = OrchestratorConfig::default()
        .with_jobs(upgrade.jobs)
        .with_progress(args.show_progress());
    let orchestrator = Orchestrator::with_config(invoker, config);

    // Pair lines are printed as each upgrade finishes.
    let mut write_result = Ok(());
    let report = orchestrator
        .run_with_observer(&plan, &manifests, |pair| {
            if write_result.is_ok() {
                write_result = formatter.format_pair(pair, &mut io::stdout());
            }
        })
        .await;
    write_result?;

    let mut stdout = io::stdout().lock();
    formatter.format_report(&report, &mut stdout)?;
    stdout.flush()?;

    if report.has_failures() {
        Ok(ExitCode::from(EXIT_FAILURES))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Load and filter the plan, then locate manifests
fn prepare_upgrade(
    upgrade: &UpgradeArgs,
    show_progress: bool,
) -> Result<(UpgradePlan, Vec<ManifestRef>), AppError> {
    let plan = match &upgrade.plan {
        Some(path) => UpgradePlan::from_file(path)?,
        None => UpgradePlan::default_plan(),
    }
    .filtered(&upgrade.plan_filter());

    let mut progress = Progress::new(show_progress);
    progress.locating("project files");
    let manifests = locator::find_manifests(&upgrade.path, &upgrade.pattern);
    progress.clear();

    Ok((plan, manifests?))
}

fn run_fix_configs(
    args: &CliArgs,
    fix: &FixConfigsArgs,
    formatter: &dyn OutputFormatter,
) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("Target: {}", fix.path.display());
        if fix.dry_run {
            eprintln!("Mode: dry-run");
        }
    }

    let files = locate_configs(fix, args.show_progress())?;
    let summary = normalizer::normalize_files(&files, fix.dry_run);

    let mut stdout = io::stdout().lock();
    formatter.format_normalize(&summary, &mut stdout)?;
    stdout.flush()?;

    if summary.has_failures() {
        Ok(ExitCode::from(EXIT_FAILURES))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn locate_configs(fix: &FixConfigsArgs, show_progress: bool) -> Result<Vec<PathBuf>, AppError> {
    let pattern = NamePattern::new(&fix.pattern)?;

    let mut progress = Progress::new(show_progress);
    progress.locating("config files");
    let files = locator::find_files(&fix.path, &pattern);
    progress.clear();

    Ok(files?)
}
