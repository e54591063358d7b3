//! CLI argument parsing module for depgov

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Parse duration string in format: Nms (milliseconds), Ns (seconds), Nm (minutes)
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    crate::config::parse_duration(s).map_err(|e| e.to_string())
}

/// Dependency-version governance engine
#[derive(Parser, Debug, Clone)]
#[command(
    name = "depgov",
    version,
    about = "Dependency-version governance engine"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve the best allowed version of every dependency in a JSON document
    Resolve(ResolveArgs),
    /// Compare two snapshot files
    Diff(DiffArgs),
}

/// Options of `depgov resolve`
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// JSON array of dependency records
    pub dependencies: PathBuf,

    /// TOML configuration file supplying defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum number of concurrent lookups (default: CPU cores)
    #[arg(short = 'j', long)]
    pub parallelism: Option<usize>,

    /// Timeout of each version lookup (e.g., 30s, 2m, 500ms)
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    // Policy documents
    /// Migration document URL or path (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub migrations: Vec<String>,

    /// Retraction document URL or path (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub retractions: Vec<String>,

    /// Pin document URL or path (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub pins: Vec<String>,

    /// Ignore document URL or path (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub ignores: Vec<String>,

    /// Move dependencies to migrated coordinates instead of only reporting them
    #[arg(long)]
    pub apply_migrations: bool,

    // Index options
    /// Binary version suffix of cross-built artifacts (e.g., 2.13, 3)
    #[arg(long)]
    pub scala_version: Option<String>,

    /// Plugin API version used in legacy plugin artifact names (e.g., 1.0)
    #[arg(long)]
    pub plugin_api: Option<String>,

    /// Search endpoint of a Maven Central compatible index
    #[arg(long)]
    pub index_url: Option<String>,

    /// Write the resolved dependencies as a snapshot file
    #[arg(long)]
    pub snapshot_out: Option<PathBuf>,
}

/// Options of `depgov diff`
#[derive(Args, Debug, Clone)]
pub struct DiffArgs {
    /// Snapshot before the change
    pub before: PathBuf,
    /// Snapshot after the change
    pub after: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn resolve_args(args: &[&str]) -> ResolveArgs {
        let mut argv = vec!["depgov", "resolve"];
        argv.extend_from_slice(args);
        match CliArgs::parse_from(argv).command {
            Command::Resolve(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let args = resolve_args(&["deps.json"]);
        assert_eq!(args.dependencies, PathBuf::from("deps.json"));
        assert!(args.config.is_none());
        assert!(args.parallelism.is_none());
        assert!(args.timeout.is_none());
        assert!(args.migrations.is_empty());
        assert!(args.retractions.is_empty());
        assert!(args.pins.is_empty());
        assert!(args.ignores.is_empty());
        assert!(!args.apply_migrations);
        assert!(args.snapshot_out.is_none());
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["depgov", "resolve", "deps.json", "--json", "-q"]);
        assert!(args.json);
        assert!(args.quiet);
        assert!(!args.verbose);

        let args = CliArgs::parse_from(["depgov", "--verbose", "diff", "a.tsv", "b.tsv"]);
        assert!(args.verbose);
    }

    #[test]
    fn test_policy_lists() {
        let args = resolve_args(&[
            "deps.json",
            "--pins",
            "https://example.org/pins.json",
            "--pins",
            "local-pins.toml",
            "--migrations",
            "file:///etc/depgov/migrations.json",
        ]);
        assert_eq!(
            args.pins,
            vec!["https://example.org/pins.json", "local-pins.toml"]
        );
        assert_eq!(args.migrations, vec!["file:///etc/depgov/migrations.json"]);
    }

    #[test]
    fn test_timeout_and_parallelism() {
        let args = resolve_args(&["deps.json", "--timeout", "2m", "-j", "4"]);
        assert_eq!(args.timeout, Some(Duration::from_secs(120)));
        assert_eq!(args.parallelism, Some(4));
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let result = CliArgs::try_parse_from(["depgov", "resolve", "deps.json", "--timeout", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_diff_command() {
        let args = CliArgs::parse_from(["depgov", "diff", "before.tsv", "after.tsv"]);
        match args.command {
            Command::Diff(diff) => {
                assert_eq!(diff.before, PathBuf::from("before.tsv"));
                assert_eq!(diff.after, PathBuf::from("after.tsv"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_combined_flags() {
        let args = resolve_args(&[
            "deps.json",
            "--apply-migrations",
            "--scala-version",
            "3",
            "--plugin-api",
            "1.0",
            "--snapshot-out",
            "after.tsv",
            "--config",
            "depgov.toml",
        ]);
        assert!(args.apply_migrations);
        assert_eq!(args.scala_version.as_deref(), Some("3"));
        assert_eq!(args.plugin_api.as_deref(), Some("1.0"));
        assert_eq!(args.snapshot_out, Some(PathBuf::from("after.tsv")));
        assert_eq!(args.config, Some(PathBuf::from("depgov.toml")));
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(CliArgs::try_parse_from(["depgov"]).is_err());
    }
}
