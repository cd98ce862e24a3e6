//! CLI entry point for the Moodle grades merger.
//!
//! Merges a folder of per-exercise grade exports into one roster CSV, using
//! either the best attempt or a weighted mix of all attempts.

use anyhow::{Context, Result};
use clap::Parser;
use moodle_grades_merger::{
    config::MergeConfig,
    merge::merge,
    output::{RunSummary, print_json, project, write_table},
    roster::Policy,
    source::DirectorySource,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "moodle_grades_merger")]
#[command(about = "Merge per-exercise Moodle grade exports into one roster", long_about = None)]
struct Cli {
    /// Folder with the downloaded grade CSV files
    #[arg(value_name = "GRADES_DIR")]
    grades_dir: PathBuf,

    /// Weight of the best attempt in [0, 1]; enables multi-attempt mode
    #[arg(value_name = "HIGH_PCT", value_parser = parse_high_pct)]
    high_pct: Option<f64>,

    /// CSV file to write the merged roster to
    #[arg(short, long, default_value = "result.csv")]
    output: PathBuf,

    /// JSON file overriding column names, file suffix or ungraded marker
    #[arg(long, value_name = "PATH")]
    columns: Option<PathBuf>,

    /// Log a JSON summary of the run
    #[arg(long, default_value_t = false)]
    summary: bool,
}

fn parse_high_pct(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    Policy::weighted(value).map_err(|e| e.to_string())?;
    Ok(value)
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/moodle_grades_merger.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("moodle_grades_merger.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let _file_guard = init_logging()?;

    let cli = Cli::parse();

    let config = match &cli.columns {
        Some(path) => MergeConfig::load(path)
            .with_context(|| format!("loading column overrides from {}", path.display()))?,
        None => MergeConfig::default(),
    };
    let policy = Policy::from_high_pct(cli.high_pct)?;

    let mut source = DirectorySource::new(&cli.grades_dir, &config);
    if let Some(name) = cli.output.file_name().and_then(OsStr::to_str) {
        source = source.excluding(name);
    }

    let roster = merge(&source, &config, policy)
        .with_context(|| format!("merging grades in {}", cli.grades_dir.display()))?;
    let rows = project(&roster);
    write_table(&cli.output, &rows)?;

    info!(
        output = %cli.output.display(),
        students = roster.students().len(),
        exercises = roster.exercises().len(),
        %policy,
        "Merge complete"
    );

    if cli.summary {
        print_json(&RunSummary::from_roster(&roster))?;
    }

    Ok(())
}
