//! TripStats - ride-hailing trip history statistics
//!
//! A CLI tool that reads a trip history CSV export and prints total
//! spend, trip counts, breakdowns and ride time.
//!
//! Exit codes:
//!   0 - Success, or no data to process
//!   1 - Runtime error (bad config, missing columns, malformed record)

mod analysis;
mod cli;
mod config;
mod models;
mod reader;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use reader::ReaderOptions;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("TripStats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .tripstats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .tripstats.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .tripstats.toml")?;

    println!("✅ Created .tripstats.toml with default settings.");
    println!("   Edit it to change the input path, delimiter, error policy and labels.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so the report on stdout stays clean. `RUST_LOG`
/// takes precedence over the CLI verbosity flags.
fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Read, aggregate and report. Returns the exit code.
fn run(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let input = PathBuf::from(&config.input.path);
    let options = ReaderOptions::from(&config.input);

    // Step 1: Read the export
    let trips = match reader::read_trips(&input, &options) {
        Ok(trips) => trips,
        Err(e) if e.is_fatal() => {
            return Err(anyhow::Error::new(e).context(format!("Failed to read {}", input.display())));
        }
        Err(e) => {
            warn!("{}", e);
            eprintln!("⚠️  {}", e);
            Vec::new()
        }
    };

    if trips.is_empty() {
        println!("{}", report::no_data_message(&config.input.path));
        return Ok(0);
    }

    info!("Loaded {} trip records", trips.len());

    // Step 2: Aggregate
    let stats = analysis::process(&trips, config.processing.on_error)
        .with_context(|| format!("Failed to process {}", input.display()))?;

    if stats.skipped_records > 0 {
        warn!(
            "Skipped {} malformed records out of {}",
            stats.skipped_records,
            trips.len()
        );
    }

    // Step 3: Render and write the report
    let output = report::generate_report(&stats, &config.report)?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .tripstats.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ErrorPolicy;
    use crate::cli::tests::make_args;
    use crate::cli::OutputFormat;

    fn fixture_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/trips_data.csv")
    }

    #[test]
    fn test_fixture_statistics() {
        let trips = reader::read_trips(&fixture_path(), &ReaderOptions::default()).unwrap();
        let stats = analysis::process(&trips, ErrorPolicy::Abort).unwrap();

        assert_eq!(stats.total_trips, 7);
        assert_eq!(stats.completed_count, 4);
        assert_eq!(stats.canceled_count, 2);
        assert!((stats.total_spent - 106.95).abs() < 1e-9);
        assert!((stats.total_distance - 14.18).abs() < 1e-9);

        let years: Vec<(&str, u64)> = stats.trips_by_year.iter().collect();
        assert_eq!(years, vec![("2021", 2), ("2022", 3), ("2023", 2)]);
        let months: Vec<(&str, u64)> = stats.trips_by_month.iter().collect();
        assert_eq!(months, vec![("11", 2), ("03", 2), ("12", 1), ("07", 2)]);
        let cities: Vec<(&str, u64)> = stats.trips_by_city.iter().collect();
        assert_eq!(cities, vec![("Bucharest", 4), ("Cluj-Napoca", 1), ("Iasi", 2)]);
        let products: Vec<(&str, u64)> = stats.trips_by_product.iter().collect();
        assert_eq!(products, vec![("UberX", 4), ("Comfort", 2)]);

        assert_eq!(stats.total_duration_seconds, 1272 + 690 + 900 + 330);
        assert_eq!(stats.shortest_trip_minutes, 5.5);
        assert_eq!(stats.longest_trip_minutes, 21.2);
    }

    #[test]
    fn test_run_writes_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");

        let mut args = make_args();
        args.input = Some(fixture_path());
        args.format = Some(OutputFormat::Json);
        args.output = Some(output.clone());

        assert_eq!(run(args).unwrap(), 0);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(json["total_trips"], 7);
        assert_eq!(json["trips_by_city"]["Iasi"], 2);
    }

    #[test]
    fn test_run_with_missing_input_reports_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.txt");

        let mut args = make_args();
        args.input = Some(dir.path().join("trips_data.csv"));
        args.output = Some(output.clone());

        assert_eq!(run(args).unwrap(), 0);
        assert!(!output.exists());
    }

    #[test]
    fn test_run_with_undecodable_input_reports_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trips.csv");
        let output = dir.path().join("report.txt");
        let mut content = std::fs::read(fixture_path()).unwrap();
        content.extend_from_slice(b"Ia\xffi,UberX,CANCELED,2023-07-16 19:20:00 +0000 UTC,,,,,,,,,0,5,RON\n");
        std::fs::write(&input, content).unwrap();

        let mut args = make_args();
        args.input = Some(input);
        args.output = Some(output.clone());

        assert_eq!(run(args).unwrap(), 0);
        assert!(!output.exists());
    }

    #[test]
    fn test_run_aborts_on_malformed_record() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trips.csv");
        let content = std::fs::read_to_string(fixture_path())
            .unwrap()
            .replace("41.2", "forty");
        std::fs::write(&input, content).unwrap();

        let mut args = make_args();
        args.input = Some(input.clone());
        args.output = Some(dir.path().join("report.txt"));

        let err = run(args).unwrap_err();
        assert!(format!("{:#}", err).contains("record 5 (line 6)"));

        let mut args = make_args();
        args.input = Some(input);
        args.output = Some(dir.path().join("report.txt"));
        args.lenient = true;

        assert_eq!(run(args).unwrap(), 0);
        let report = std::fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert!(report.contains("Total trips: 6\n"));
        assert!(report.contains("Skipped malformed records: 1\n"));
    }

    #[test]
    fn test_run_rejects_export_without_required_columns() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trips.csv");
        std::fs::write(&input, "City,Fare Amount\nIasi,10\n").unwrap();

        let mut args = make_args();
        args.input = Some(input);

        let err = run(args).unwrap_err();
        assert!(format!("{:#}", err).contains("Missing required columns"));
    }
}
