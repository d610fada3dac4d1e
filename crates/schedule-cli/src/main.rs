//! `schedule` CLI — occurrence queries, conflict checks and slot search over a
//! practice dataset from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Occurrence dates of series 5 in January (request on stdin)
//! echo '{"seriesId":5,"windowStart":"2024-01-01","windowEnd":"2024-01-31"}' \
//!   | schedule occurrences --data practice.json
//!
//! # Check a proposed booking
//! schedule conflicts --data practice.json -i candidate.json
//!
//! # Free 50-minute slots, with custom working hours
//! schedule --config practice-config.json slots --data practice.json -i search.json -o slots.json
//!
//! # Audit scan for overlapping bookings
//! echo '{"from":"2024-01-01","to":"2024-03-31"}' | schedule clusters --data practice.json
//! ```
//!
//! Output is pretty-printed JSON. Logs go to stderr; set `RUST_LOG` or pass
//! `--verbose` to see them.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use schedule_engine::api::{self, Dataset, OccurrenceQuery, ScanRequest};
use schedule_engine::conflict::Candidate;
use schedule_engine::{EngineConfig, SlotSearchRequest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, Read};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "schedule",
    version,
    about = "Recurrence, conflict and availability queries for a therapy practice"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine config JSON (working hours, slot step); defaults apply if omitted
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log engine decisions to stderr at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct Io {
    /// Practice dataset JSON (therapists, appointments, series, absences, holidays)
    #[arg(short, long)]
    data: String,
    /// Request JSON file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the occurrence dates of a series inside a window
    Occurrences(Io),
    /// Check a proposed booking for overlaps with existing ones
    Conflicts(Io),
    /// Search free slots across therapists and days
    Slots(Io),
    /// Find every group of overlapping bookings in a date range
    Clusters(Io),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Occurrences(io) => {
            let dataset = load_dataset(&io.data)?;
            let query: OccurrenceQuery = read_request(io.input.as_deref())?;
            let occurrences = api::query_occurrences(&dataset, &query)
                .context("Failed to expand series occurrences")?;
            write_json(io.output.as_deref(), &occurrences)?;
        }
        Commands::Conflicts(io) => {
            let dataset = load_dataset(&io.data)?;
            let candidate: Candidate = read_request(io.input.as_deref())?;
            let result =
                api::check_conflicts(&dataset, &candidate).context("Failed to check conflicts")?;
            write_json(io.output.as_deref(), &result)?;
        }
        Commands::Slots(io) => {
            let dataset = load_dataset(&io.data)?;
            let request: SlotSearchRequest = read_request(io.input.as_deref())?;
            let response = api::search_slots(&dataset, &request, &config)
                .context("Failed to search free slots")?;
            info!(total = response.total_slots_found, "slot search complete");
            write_json(io.output.as_deref(), &response)?;
        }
        Commands::Clusters(io) => {
            let dataset = load_dataset(&io.data)?;
            let request: ScanRequest = read_request(io.input.as_deref())?;
            let clusters = api::scan_conflicts(&dataset, &request)
                .context("Failed to scan for conflict clusters")?;
            write_json(io.output.as_deref(), &clusters)?;
        }
    }

    Ok(())
}

/// Stderr subscriber. `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        }
        None => EngineConfig::default(),
    };
    config.validate().context("Invalid engine config")?;
    Ok(config)
}

fn load_dataset(path: &str) -> Result<Dataset> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset file: {}", path))?;
    let dataset: Dataset = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse dataset file: {}", path))?;
    info!(
        therapists = dataset.therapists.len(),
        appointments = dataset.appointments.len(),
        series = dataset.series.len(),
        "loaded dataset"
    );
    Ok(dataset)
}

/// Deserialize a request from `path`, or from stdin when no path is given.
fn read_request<T: DeserializeOwned>(path: Option<&str>) -> Result<T> {
    let (raw, source) = match path {
        Some(path) => (
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read request file: {}", path))?,
            path,
        ),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            (buf, "stdin")
        }
    };
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse request JSON from {}", source))
}

fn write_json<T: Serialize>(path: Option<&str>, value: &T) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, pretty)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", pretty);
        }
    }
    Ok(())
}
