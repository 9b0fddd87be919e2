use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use table_snapshot_core::SnapshotConfig;
use table_snapshot_sqlite::Snapshotter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "db-snapshot")]
#[command(version)]
#[command(about = "Dump every table of a SQLite database to a JSON snapshot")]
struct Cli {
    /// SQLite database to read (default: ~/.compass/compass.db).
    #[arg(long)]
    db: Option<PathBuf>,
    /// JSON file to write (default: compass_snapshot.json).
    #[arg(long)]
    output: Option<PathBuf>,
    /// Maximum rows captured per table; 0 captures schemas only (default: 100).
    #[arg(long, conflicts_with = "no_limit")]
    row_limit: Option<u64>,
    /// Capture every row of every table.
    #[arg(long)]
    no_limit: bool,
    /// YAML file providing database, output, and row_limit.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the snapshot to stdout instead of writing a file.
    #[arg(long, conflicts_with = "output")]
    stdout: bool,
    /// Log each table as it is captured.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Installs a stderr subscriber; `RUST_LOG` overrides the level chosen here.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "table_snapshot_sqlite=debug,db_snapshot=debug,warn"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let stdout = cli.stdout;
    let config = resolve_config(cli)?;
    tracing::debug!(?config, "resolved configuration");

    if stdout {
        return print_snapshot(&config);
    }

    let snapshot = table_snapshot_sqlite::snapshot(&config).map_err(|e| e.to_string())?;
    println!(
        "Snapshot complete: {} tables, {} rows written to '{}'.",
        snapshot.len(),
        snapshot.row_count(),
        config.output.display()
    );
    Ok(())
}

/// Captures the database and prints the JSON to stdout; no file is written.
fn print_snapshot(config: &SnapshotConfig) -> Result<(), String> {
    let snapshot = Snapshotter::open(&config.database)
        .and_then(|mut snapshotter| snapshotter.capture(config.row_limit))
        .map_err(|e| e.to_string())?;

    let mut out = io::stdout().lock();
    snapshot
        .to_writer(&mut out)
        .and_then(|()| writeln!(out).map_err(serde_json::Error::io))
        .map_err(|e| format!("Failed to write snapshot to stdout: {e}"))
}

/// Layers flags over the config file over built-in defaults.
fn resolve_config(cli: Cli) -> Result<SnapshotConfig, String> {
    let mut config = match &cli.config {
        Some(path) => SnapshotConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => SnapshotConfig::default(),
    };

    if let Some(db) = cli.db {
        config.database = db;
    }
    if let Some(output) = cli.output {
        config.output = output;
    }
    if cli.no_limit {
        config.row_limit = None;
    } else if let Some(limit) = cli.row_limit {
        config.row_limit = Some(limit);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["db-snapshot"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = resolve_config(parse(&[])).unwrap();
        assert_eq!(config, SnapshotConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let config =
            resolve_config(parse(&["--db", "a.db", "--output", "b.json", "--row-limit", "0"]))
                .unwrap();
        assert_eq!(config.database, PathBuf::from("a.db"));
        assert_eq!(config.output, PathBuf::from("b.json"));
        assert_eq!(config.row_limit, Some(0));
    }

    #[test]
    fn test_no_limit_clears_row_limit() {
        let config = resolve_config(parse(&["--no-limit"])).unwrap();
        assert_eq!(config.row_limit, None);
    }

    #[test]
    fn test_row_limit_conflicts_with_no_limit() {
        let result = Cli::try_parse_from(["db-snapshot", "--row-limit", "5", "--no-limit"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file_is_reported() {
        let err = resolve_config(parse(&["--config", "/nonexistent/snap.yml"])).unwrap_err();
        assert!(err.contains("Failed to load config"));
    }
}
