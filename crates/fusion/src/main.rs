use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use fusion_core::config::PipelineConfig;
use fusion_core::filters::{EqualityFilter, FilterSpec};
use fusion_core::ingest::{read_input, IngestSummary};
use fusion_core::outputs::{cell_text, distinct_values, write_csv};
use fusion_core::pipeline::{derive_table, process};
use polars::prelude::DataFrame;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Flatten sportsbook odds updates into CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process an update file and export the filtered table as CSV
    Convert(ConvertArgs),
    /// List the distinct values of a column, for choosing filters
    Values(ValuesArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// TOML pipeline config (falls back to FUSION_CONFIG, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Newline-delimited JSON update file
    input: PathBuf,
    /// CSV destination
    #[arg(long, short, default_value = "processed_betting_data.csv")]
    output: PathBuf,
    #[command(flatten)]
    config: ConfigArgs,
    /// Keep only this market type (e.g. MoneylineUpdates)
    #[arg(long)]
    market_type: Option<String>,
    #[arg(long)]
    bookmaker: Option<String>,
    #[arg(long)]
    period_type: Option<String>,
    #[arg(long)]
    period_number: Option<String>,
    #[arg(long)]
    player_participant_id: Option<String>,
    #[arg(long)]
    line: Option<String>,
    /// Additional equality filter, repeatable
    #[arg(long = "filter", value_name = "COLUMN=VALUE")]
    filters: Vec<EqualityFilter>,
    /// Earliest receive time of day (HH:MM:SS) in the window zone
    #[arg(long)]
    start_time: Option<String>,
    /// Latest receive time of day (HH:MM:SS) in the window zone
    #[arg(long)]
    end_time: Option<String>,
    /// Number of rows to print as a preview
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

#[derive(Args, Debug)]
struct ValuesArgs {
    input: PathBuf,
    column: String,
    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Convert(args) => handle_convert(args),
        Command::Values(args) => handle_values(args),
    }
}

fn load_config(args: &ConfigArgs) -> Result<PipelineConfig> {
    dotenvy::dotenv().ok();

    let path = args
        .config
        .clone()
        .or_else(|| env::var_os("FUSION_CONFIG").map(PathBuf::from));

    match path {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn build_filter_spec(args: &ConvertArgs) -> Result<FilterSpec> {
    let named = [
        ("market_type", &args.market_type),
        ("Bookmaker", &args.bookmaker),
        ("PeriodType", &args.period_type),
        ("PeriodNumber", &args.period_number),
        ("PlayerParticipantId", &args.player_participant_id),
        ("Line", &args.line),
    ];

    let mut builder = FilterSpec::builder();
    for (column, value) in named {
        if let Some(value) = value {
            builder = builder.equals(column, value.as_str());
        }
    }
    for filter in &args.filters {
        builder = builder.filter(filter.clone());
    }
    if let Some(start) = &args.start_time {
        builder = builder.start_time(start.as_str());
    }
    if let Some(end) = &args.end_time {
        builder = builder.end_time(end.as_str());
    }

    Ok(builder.build()?)
}

fn handle_convert(args: ConvertArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let spec = build_filter_spec(&args)?;
    let content = load_input(&args.input)?;

    let output = process(&content, &config, &spec)
        .with_context(|| format!("failed to process {}", args.input.display()))?;

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    write_csv(&output.table, &mut writer).context("failed to write CSV export")?;

    info!(
        output = %args.output.display(),
        rows = output.table.height(),
        "CSV export written"
    );

    print_summary(&output.summary, output.derived_rows(), output.table.height());
    if output.table.height() == 0 {
        println!("No rows matched the requested filters.");
    } else if args.preview > 0 {
        println!("{}", preview_table(&output.table, args.preview)?);
    }
    println!("Wrote {}", args.output.display());

    Ok(())
}

fn handle_values(args: ValuesArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let content = load_input(&args.input)?;

    let (derived, _) = derive_table(&content, &config)
        .with_context(|| format!("failed to process {}", args.input.display()))?;
    let values = distinct_values(&derived, &args.column)?;

    if values.is_empty() {
        println!("Column '{}' has no values.", args.column);
    }
    for value in values {
        println!("{value}");
    }

    Ok(())
}

fn load_input(path: &Path) -> Result<Vec<u8>> {
    read_input(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_summary(summary: &IngestSummary, derived_rows: usize, kept_rows: usize) {
    println!("Input hash:      {}", summary.input_hash);
    println!("Lines read:      {}", summary.lines_read);
    println!("Lines parsed:    {}", summary.parsed_lines);
    println!(
        "Lines skipped:   {} ({} blank, {} not objects)",
        summary.skipped.len() + summary.blank_lines + summary.prefiltered_lines,
        summary.blank_lines,
        summary.prefiltered_lines
    );
    for skipped in &summary.skipped {
        println!("  line {}: {}", skipped.line_number, skipped.message);
    }
    println!("Rows derived:    {derived_rows}");
    println!("Rows exported:   {kept_rows}");
}

fn preview_table(df: &DataFrame, rows: usize) -> Result<Table> {
    let mut table = Table::new();
    table.set_header(
        df.get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>(),
    );

    for idx in 0..df.height().min(rows) {
        let mut cells = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            cells.push(cell_text(column, idx)?);
        }
        table.add_row(cells);
    }

    Ok(table)
}
