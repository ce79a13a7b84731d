//! Facts CLI binary.
//!
//! Retrieves EDINET filings, resolves their XBRL instance documents into
//! canonical records and manages the exported dataset.

use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use facts::{
    BatchReport, FetchConfig, FetchOutcome, FetchReport, FilingFetcher, FilingOutcome,
    FilingPipeline, JsonFileStore, Metric, PipelineConfig, collect_instance_files,
    records_to_frame, today_jst, write_parquet,
};
use polars::prelude::DataFrame;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facts")]
#[command(about = "Canonical financial records from EDINET XBRL filings", long_about = None)]
#[command(version)]
struct Cli {
    /// Dataset root (overrides DATASET_PATH)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Filings resolved at once (overrides FACTS_CONCURRENCY)
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Report type for filings whose file name carries none: annual or quarterly
    #[arg(long, global = true)]
    report_type: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and unpack annual reports from EDINET
    Fetch {
        /// First submission date, YYYY-MM-DD (default: the end date)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last submission date, YYYY-MM-DD (default: today in JST)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Download root (overrides FACTS_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Resolve the fetched filings, exporting when a dataset is configured
        #[arg(long)]
        resolve: bool,
    },

    /// Resolve filings and print their records as JSON
    Resolve {
        /// Instance files or directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Resolve filings and write them to the dataset
    Export {
        /// Instance files or directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Resolve filings and report metric coverage
    Summary {
        /// Instance files or directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Also write the records as parquet
        #[arg(long)]
        parquet: Option<PathBuf>,
    },

    /// Show the dataset manifest
    Manifest {
        /// Rebuild the manifest from the records on disk
        #[arg(long)]
        rebuild: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = PipelineConfig::from_env()?;
    if let Some(dataset) = cli.dataset {
        config = config.with_dataset_path(dataset);
    }
    if let Some(concurrency) = cli.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(report_type) = cli.report_type {
        config = config.with_default_report_type(report_type.parse()?);
    }

    match cli.command {
        Commands::Fetch {
            from,
            to,
            data_dir,
            resolve: then_resolve,
        } => {
            let mut fetch_config = FetchConfig::from_env()?;
            if let Some(dir) = data_dir {
                fetch_config = fetch_config.with_data_dir(dir);
            }
            let end = to.unwrap_or_else(today_jst);
            let start = from.unwrap_or(end);

            let fetcher = FilingFetcher::from_config(&fetch_config)?;
            info!(%start, %end, data_dir = %fetch_config.data_dir.display(), "Fetching filings");
            let fetched = fetcher.fetch_range(start, end).await?;
            for outcome in &fetched.outcomes {
                report_fetch(outcome);
            }
            eprintln!(
                "{} filing(s): {} downloaded, {} skipped, {} failed; {} day(s) unavailable",
                fetched.outcomes.len(),
                fetched.downloaded(),
                fetched.skipped(),
                fetched.failed(),
                fetched.failed_dates.len()
            );

            if then_resolve {
                let report = FilingPipeline::from_config(&config)
                    .process_paths(&fetched.instances())
                    .await;
                for outcome in &report.outcomes {
                    report_outcome(outcome);
                }
                if let Some(dataset) = &config.dataset_path {
                    JsonFileStore::new(dataset).write_manifest().await?;
                }
                check_failures(&report)?;
            }
            check_fetch_failures(&fetched)?;
        }
        Commands::Resolve { paths } => {
            // Printing only, nothing is exported
            config.dataset_path = None;
            let report = resolve(&config, &paths).await?;
            let records: Vec<_> = report.records().collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
            check_failures(&report)?;
        }
        Commands::Export { paths } => {
            let dataset = config
                .dataset_path
                .clone()
                .ok_or("no dataset root: pass --dataset or set DATASET_PATH")?;
            let report = resolve(&config, &paths).await?;
            let manifest = JsonFileStore::new(&dataset).write_manifest().await?;
            println!(
                "Exported {} record(s) to {} ({} in dataset)",
                report.succeeded(),
                dataset.display(),
                manifest.total_records
            );
            check_failures(&report)?;
        }
        Commands::Summary { paths, parquet } => {
            config.dataset_path = None;
            let report = resolve(&config, &paths).await?;
            let records: Vec<_> = report.records().cloned().collect();
            let mut df = records_to_frame(&records)?;
            print_coverage(&df);
            if let Some(path) = parquet {
                write_parquet(&mut df, &path)?;
                println!("Wrote {} row(s) to {}", df.height(), path.display());
            }
            check_failures(&report)?;
        }
        Commands::Manifest { rebuild } => {
            let dataset = config
                .dataset_path
                .ok_or("no dataset root: pass --dataset or set DATASET_PATH")?;
            let store = JsonFileStore::new(dataset);
            let manifest = if rebuild {
                Some(store.write_manifest().await?)
            } else {
                store.read_manifest().await?
            };
            match manifest {
                Some(manifest) => println!("{}", serde_json::to_string_pretty(&manifest)?),
                None => println!(
                    "No manifest at {}; run with --rebuild",
                    store.manifest_path().display()
                ),
            }
        }
    }

    Ok(())
}

async fn resolve(
    config: &PipelineConfig,
    paths: &[PathBuf],
) -> Result<BatchReport, Box<dyn std::error::Error>> {
    let files = collect_instance_files(paths)?;
    info!(files = files.len(), concurrency = config.concurrency, "Resolving filings");

    let report = FilingPipeline::from_config(config).process_paths(&files).await;
    for outcome in &report.outcomes {
        report_outcome(outcome);
    }
    Ok(report)
}

fn report_outcome(outcome: &FilingOutcome) {
    match outcome {
        FilingOutcome::Success {
            doc_id,
            location,
            diagnostics,
            ..
        } => {
            if let Some(location) = location {
                eprintln!("  ✓ {doc_id} -> {location}");
            } else {
                eprintln!("  ✓ {doc_id}");
            }
            for diagnostic in diagnostics {
                eprintln!("      {diagnostic}");
            }
        }
        FilingOutcome::Empty {
            doc_id,
            diagnostics,
            ..
        } => {
            eprintln!("  - {doc_id}: no facts for either year");
            for diagnostic in diagnostics {
                eprintln!("      {diagnostic}");
            }
        }
        FilingOutcome::Failed { doc_id, error } => eprintln!("  ✗ {doc_id}: {error}"),
    }
}

fn report_fetch(outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Downloaded { doc_id, instances, .. } => {
            eprintln!("  ↓ {doc_id} ({} instance(s))", instances.len());
        }
        FetchOutcome::Skipped { doc_id, .. } => eprintln!("  = {doc_id} already downloaded"),
        FetchOutcome::Failed { doc_id, error } => eprintln!("  ✗ {doc_id}: {error}"),
    }
}

fn check_fetch_failures(report: &FetchReport) -> Result<(), Box<dyn std::error::Error>> {
    for (date, error) in &report.failed_dates {
        eprintln!("  ✗ {date}: {error}");
    }
    if report.failed() > 0 {
        return Err(format!("{} filing(s) could not be fetched", report.failed()).into());
    }
    Ok(())
}

fn check_failures(report: &BatchReport) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!(
        "{} filing(s): {} resolved, {} empty, {} failed",
        report.len(),
        report.succeeded(),
        report.empty(),
        report.failed()
    );
    if report.failed() > 0 {
        return Err(format!("{} of {} filing(s) failed", report.failed(), report.len()).into());
    }
    Ok(())
}

fn print_coverage(df: &DataFrame) {
    println!("Year blocks: {}", df.height());
    println!("{:<40} {:>8}", "metric", "present");
    for metric in Metric::ALL {
        let present = df
            .column(metric.as_str())
            .map_or(0, |column| column.len() - column.null_count());
        println!("{:<40} {:>8}", metric.as_str(), present);
    }
}
