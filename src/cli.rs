//! CLI argument parsing module for depbatch

use crate::domain::PlanFilter;
use crate::invoker::{DEFAULT_PROGRAM, DEFAULT_TIMEOUT};
use crate::locator::{CONFIG_PATTERN, MANIFEST_PATTERN};
use crate::output::OutputConfig;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Parse duration string in format: Ns (seconds), Nm (minutes)
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num_str, unit) = if let Some(n) = s.strip_suffix('s') {
        (n, 's')
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 'm')
    } else {
        return Err(format!("invalid duration format: {}", s));
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in duration: {}", num_str))?;
    if num == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    let seconds = match unit {
        's' => num,
        _ => num
            .checked_mul(60)
            .ok_or_else(|| format!("duration too large: {}", s))?,
    };

    Ok(Duration::from_secs(seconds))
}

/// Batch dependency upgrader and NuGet config normalizer
#[derive(Parser, Debug, Clone)]
#[command(
    name = "depbatch",
    version,
    about = "Batch dependency upgrader and NuGet config normalizer"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Apply every planned upgrade to every project file under PATH
    Upgrade(UpgradeArgs),
    /// Rewrite nuget.config files under PATH into well-formed XML
    FixConfigs(FixConfigsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UpgradeArgs {
    /// Root directory to search (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// TOML file with `[[upgrade]]` entries (default: built-in phase-1 plan)
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Apply only specific packages (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub only: Vec<String>,

    /// Skip specific packages (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// File-name glob for project files
    #[arg(long, default_value = MANIFEST_PATTERN)]
    pub pattern: String,

    /// Package manager executable
    #[arg(long, default_value = DEFAULT_PROGRAM)]
    pub program: String,

    /// Limit per invocation (e.g., 60s, 2m)
    #[arg(long, value_parser = parse_duration, default_value = "60s")]
    pub timeout: Duration,

    /// Number of project files upgraded concurrently
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,
}

impl UpgradeArgs {
    /// Package filter built from --only / --exclude
    pub fn plan_filter(&self) -> PlanFilter {
        PlanFilter::new()
            .with_only(self.only.clone())
            .with_exclude(self.exclude.clone())
    }
}

#[derive(Args, Debug, Clone)]
pub struct FixConfigsArgs {
    /// Root directory to search (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// File-name glob for config files
    #[arg(long, default_value = CONFIG_PATTERN)]
    pub pattern: String,

    /// Dry run mode - show what would be rewritten without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Output configuration from the global flags
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig::from_cli(self.json, self.verbose, self.quiet)
    }

    /// Whether progress bars may be drawn
    pub fn show_progress(&self) -> bool {
        !self.json && !self.quiet
    }
}
