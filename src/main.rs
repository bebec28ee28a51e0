//! csvbridge - convert data set files between CSV and JSON
//!
//! ```bash
//! csvbridge to-json users.csv           # CSV rows as JSON objects
//! csvbridge from-json users.json        # JSON/YAML flattened to CSV
//! csvbridge inspect users.csv           # Columns and row count
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use csvbridge::constants::{APP_NAME, APP_VERSION};
use csvbridge::dataset::to_indented_json;
use csvbridge::storage::{self, Settings};

#[derive(Parser)]
#[command(name = "csvbridge", version)]
#[command(about = "Convert data set files between CSV and JSON", long_about = None)]
struct Cli {
    /// Settings file (default: ~/.csvbridge/config.yaml)
    #[arg(long, env = "CSVBRIDGE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a CSV file to a JSON array of objects
    ToJson {
        /// Input CSV file ("-" for stdin)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Convert a JSON or YAML file to CSV
    FromJson {
        /// Input JSON or YAML file ("-" reads JSON from stdin)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the columns and row count of a data set file
    Inspect {
        /// CSV, JSON or YAML file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    // Initialize logging to file
    let log_dir = settings.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::never(&log_dir, &settings.log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    tracing::info!(app = APP_NAME, version = APP_VERSION, "Starting");

    match cli.command {
        Commands::ToJson {
            input,
            output,
            pretty,
            compact,
        } => {
            let pretty = if pretty || compact { pretty } else { settings.pretty };
            to_json(&input, output.as_deref(), pretty)
        }
        Commands::FromJson { input, output } => from_json(&input, output.as_deref()),
        Commands::Inspect { input } => inspect(&input),
    }
}

fn to_json(input: &Path, output: Option<&Path>, pretty: bool) -> Result<()> {
    let text = read_input(input)?;
    let table = csvbridge::from_csv(&text);
    let objects: Vec<Value> = csvbridge::to_object(&table)
        .into_iter()
        .map(Value::Object)
        .collect();

    let json = if pretty {
        to_indented_json(&objects)
    } else {
        serde_json::to_string(&objects)?
    };

    tracing::info!(input = %input.display(), rows = objects.len(), "Converted CSV to JSON");
    write_output(output, &json)
}

fn from_json(input: &Path, output: Option<&Path>) -> Result<()> {
    let value: Value = if is_stdin(input) {
        serde_json::from_str(&read_input(input)?).context("Invalid JSON on stdin")?
    } else {
        storage::read_value(input)?
    };

    let table = csvbridge::from_object(&value);
    tracing::info!(
        input = %input.display(),
        columns = table.columns.len(),
        rows = table.rows.len(),
        "Converted JSON to CSV"
    );
    write_output(output, &csvbridge::to_csv_string(&table))
}

fn inspect(input: &Path) -> Result<()> {
    let table = storage::load_table(input)?;

    println!("File:    {}", input.display());
    println!("Columns: {}", table.columns.len());
    for column in &table.columns {
        println!("  - {}", column);
    }
    println!("Rows:    {}", table.rows.len());
    Ok(())
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_input(path: &Path) -> Result<String> {
    if is_stdin(path) {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
