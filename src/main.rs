use anyhow::{Context, Result};
use clap::Parser;
use configuration::CliOverrides;
use core_types::StudentRecord;
use database::{RecordSink, StudentRepository, insert_all};
use decoder::Decoder;
use std::fmt;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the roster loader.
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let report = run(cli).await?;
    println!("{report}");
    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Loads a CSV roster of students into a PostgreSQL table.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to `loader.toml` in the working directory, if present).
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Decode the file and report how many records would be loaded, without
    /// touching the database.
    #[arg(long)]
    dry_run: bool,

    /// Log progress at debug level (otherwise only errors are logged).
    #[arg(long, short)]
    verbose: bool,

    #[command(flatten)]
    overrides: CliOverrides,
}

/// The single line printed when a run completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Report {
    Inserted(u64),
    Decoded(usize),
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Inserted(count) => write!(f, "Records inserted: {count}"),
            Report::Decoded(count) => write!(f, "Records decoded: {count}"),
        }
    }
}

/// Filter used when `RUST_LOG` is not set.
fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "error" }
}

/// Logs go to stderr so stdout carries nothing but the report line.
fn init_tracing(verbose: bool) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose))),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

// ==============================================================================
// Load Logic
// ==============================================================================

/// Runs configuration, decoding and insertion in that order.
async fn run(cli: Cli) -> Result<Report> {
    // Configuration is settled before the input file or database is touched.
    let mut settings =
        configuration::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.overrides.apply(&mut settings);
    settings.validate().context("Invalid configuration")?;

    let decoder = Decoder::new(settings.input.delimiter_byte()?, settings.input.on_malformed);
    let outcome = decoder
        .decode_path(&settings.input.path)
        .with_context(|| format!("Failed to decode {}", settings.input.path.display()))?;

    if cli.dry_run {
        tracing::info!("Dry run requested; skipping the database.");
        return Ok(Report::Decoded(outcome.records.len()));
    }

    let repository = StudentRepository::connect(settings.database)
        .await
        .context("Failed to connect to the database")?;
    tracing::info!(
        table = repository.table(),
        records = outcome.records.len(),
        "Inserting records."
    );

    load_into(repository, &outcome.records).await
}

/// Inserts `records` through `sink`, then closes it whether or not every
/// insert succeeded.
async fn load_into<S: RecordSink>(sink: S, records: &[StudentRecord]) -> Result<Report> {
    let result = insert_all(&sink, records).await;
    sink.close().await;

    let inserted = result.context("Failed to insert records")?;
    Ok(Report::Inserted(inserted))
}
