use dataset_loader::{
    Confirm, ConnectionFactory, ConsoleConfirm, DatabaseCredentials, ExistingTableAction, FailurePolicy,
    IngestionOptions, IngestionPipeline, IngestionRequest, LoadError, LoaderConfig, PresetConfirm,
    SqliteConnectionFactory, UnmappedLabelPolicy,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dataset-loader")]
#[command(about = "Load labelled CSV files with a shared schema into one database table")]
#[command(version)]
struct Args {
    /// CSV files to load, in order; each file's position becomes its source index
    files: Vec<PathBuf>,

    /// Loader configuration (schema, label mapping, table names)
    #[arg(short, long, default_value = "loader.json")]
    config: PathBuf,

    /// Directory holding the SQLite database files (default: ./data)
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Target table (overrides the config)
    #[arg(long)]
    table: Option<String>,

    /// Provenance table (overrides the config)
    #[arg(long)]
    provenance_table: Option<String>,

    /// Label mapping table (overrides the config)
    #[arg(long)]
    label_table: Option<String>,

    /// What to do when the target table already exists
    #[arg(long, value_enum, default_value_t = OnExisting::Ask)]
    on_existing: OnExisting,

    /// Skip files that fail validation instead of stopping the run
    #[arg(long)]
    skip_bad_files: bool,

    /// Store NULL for labels missing from the mapping instead of failing
    #[arg(long)]
    allow_unmapped_labels: bool,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OnExisting {
    Ask,
    Drop,
    Append,
    Abort,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(args: Args) -> Result<()> {
    if args.files.is_empty() {
        info!("No files selected, nothing to do");
        return Ok(());
    }

    let mut config = LoaderConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(table) = args.table {
        config.target_table = table;
    }
    if let Some(table) = args.provenance_table {
        config.provenance_table = table;
    }
    if let Some(table) = args.label_table {
        config.label_table = table;
    }
    if args.skip_bad_files {
        config.on_file_error = FailurePolicy::SkipFile;
    }
    if args.allow_unmapped_labels {
        config.unmapped_labels = UnmappedLabelPolicy::Null;
    }
    config.validate()?;

    let credentials = DatabaseCredentials::from_env().context("Database credentials are incomplete")?;
    let factory = SqliteConnectionFactory::new(&args.data_dir);
    let mut store = factory.connect(&credentials)?;

    let mut confirm: Box<dyn Confirm> = match args.on_existing {
        OnExisting::Ask => Box::new(ConsoleConfirm::stdio()),
        OnExisting::Drop => Box::new(PresetConfirm::new(ExistingTableAction::Drop)),
        OnExisting::Append => Box::new(PresetConfirm::new(ExistingTableAction::Append)),
        OnExisting::Abort => Box::new(PresetConfirm::new(ExistingTableAction::Abort)),
    };

    let pipeline = IngestionPipeline::with_options(IngestionOptions::from(&config));
    let request = IngestionRequest::from_config(&config, args.files);
    let report = pipeline.run(&mut store, &request, confirm.as_mut())?;

    println!("\n=== Ingestion Summary ===");
    println!("Run:    {}", report.run_id);
    println!("Table:  {} ({:?})", report.target_table, report.table_outcome);
    println!("Rows:   {}", report.rows_written);
    for file in &report.files {
        println!("  [{}] {} - {} rows, {:?}", file.index, file.file_name, file.rows_written, file.status);
    }

    if let Some(path) = args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

/// 2: operator abort, 3: input data rejected, 4: store failure, 1: anything else
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<LoadError>() {
        Some(LoadError::UserAbort { .. }) => 2,
        Some(LoadError::SchemaMismatch { .. })
        | Some(LoadError::UnmappedLabel { .. })
        | Some(LoadError::Csv { .. })
        | Some(LoadError::MalformedRow { .. }) => 3,
        Some(LoadError::ConnectionFailure(_)) | Some(LoadError::WriteFailure(_)) => 4,
        _ => 1,
    }
}
