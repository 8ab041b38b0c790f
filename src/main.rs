use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use weekly_processor::app::ports::{GeocodeClient, TableSink};
use weekly_processor::config::Config;
use weekly_processor::domain::{GeocodeStatus, RunSummary};
use weekly_processor::infra::{load_reference_csv, CsvTableSink, GoogleGeocoder, JsonTableSink};
use weekly_processor::observability::logging;
use weekly_processor::pipeline::processing::clean_address;
use weekly_processor::pipeline::{parse_raw_records, PipelineOrchestrator, RateLimiter};

#[derive(Parser)]
#[command(name = "weekly_processor")]
#[command(about = "Cleans, geocodes and enriches weekly aid-applicant exports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over one JSON export
    Process {
        /// JSON array of raw applicant records
        #[arg(long)]
        input: PathBuf,
        /// Postcode reference CSV with postcode, city and state columns
        #[arg(long)]
        postcodes: PathBuf,
        /// Where to write the cleaned table
        #[arg(long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
        /// Year ages are computed against (defaults to config, then the current year)
        #[arg(long, value_parser = clap::value_parser!(i32).range(1900..=9999))]
        reference_year: Option<i32>,
        /// Also write the run summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Clean and geocode a single address
    Geocode {
        #[arg(long)]
        address: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the cleaned form of an address without geocoding it
    CleanAddress {
        #[arg(long)]
        address: String,
    },
}

fn geocoder(config: &Config) -> Result<GoogleGeocoder> {
    let api_key = config.api_key().with_context(|| {
        format!("Geocoding API key not found in ${}", config.geocoding.api_key_env)
    })?;
    Ok(GoogleGeocoder::new(&config.geocoding, api_key)?)
}

fn print_summary(summary: &RunSummary, output: &Path) {
    println!("\nRun {} finished", summary.run_id);
    println!("   Records: {}", summary.total_records);
    for status in GeocodeStatus::ALL {
        println!("   {:<10} {}", status.as_str(), summary.count(status));
    }
    println!("   Success rate: {:.1}%", summary.success_rate());
    println!("   Reference matches: {}", summary.reference_matches);
    println!("   IC errors: {}", summary.ic_errors);
    println!("   Output file: {}", output.display());

    if !summary.failed_addresses.is_empty() {
        println!("\nAddresses needing review:");
        for failed in &summary.failed_addresses {
            println!(
                "   row {} [{}] {}",
                failed.row,
                failed.status,
                failed.address.as_deref().unwrap_or("<no address>")
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn process(
    config: Config,
    input: PathBuf,
    postcodes: PathBuf,
    output: PathBuf,
    format: OutputFormat,
    reference_year: Option<i32>,
    summary_path: Option<PathBuf>,
) -> Result<()> {
    let raw = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read input {}", input.display()))?;
    let records = parse_raw_records(&raw)?;
    info!(input = %input.display(), records = records.len(), "Loaded raw records");

    let reference = load_reference_csv(&postcodes)?;
    let geocoder: Arc<dyn GeocodeClient> = Arc::new(geocoder(&config)?);
    let limiter = RateLimiter::new(config.limits());
    let reference_year = reference_year.unwrap_or_else(|| config.reference_year());

    let orchestrator = PipelineOrchestrator::new(geocoder, limiter, reference_year);
    let result = orchestrator.run(records, Some(&reference)).await?;

    let sink: Box<dyn TableSink> = match format {
        OutputFormat::Csv => Box::new(CsvTableSink::new(&output)),
        OutputFormat::Json => Box::new(JsonTableSink::new(&output)),
    };
    sink.write_table(&result.table).await?;

    if let Some(path) = summary_path {
        let json = serde_json::to_string_pretty(&result.summary)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
        info!(path = %path.display(), "Wrote run summary");
    }

    print_summary(&result.summary, &output);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            postcodes,
            output,
            format,
            reference_year,
            summary,
            config,
        } => {
            let config = Config::load(config.as_deref())?;
            let _guard = logging::init_logging(&config.pipeline.log_dir);
            if let Err(e) =
                process(config, input, postcodes, output, format, reference_year, summary).await
            {
                error!("Pipeline failed: {:#}", e);
                return Err(e);
            }
        }
        Commands::Geocode { address, config } => {
            let config = Config::load(config.as_deref())?;
            let _guard = logging::init_logging(&config.pipeline.log_dir);
            let cleaned = clean_address(&address);
            let result = geocoder(&config)?.lookup(&cleaned).await;
            println!("Address: {cleaned}");
            println!("Status:  {}", result.status());
            if let (Some(lat), Some(lon)) = (result.lat(), result.lon()) {
                println!("Lat/Lon: {lat}, {lon}");
            }
        }
        Commands::CleanAddress { address } => {
            println!("{}", clean_address(&address));
        }
    }
    Ok(())
}
