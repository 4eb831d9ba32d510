pub mod cli;
pub mod data;
pub mod error;
pub mod export;
pub mod format;
pub mod ingest;
pub mod insights;
pub mod io_utils;
pub mod layout;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod roles;
pub mod stats;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, InputArgs, LayoutArgs, OutputFormat},
    ingest::IngestOptions,
    layout::LayoutContract,
    report::RenderOptions,
};

pub use crate::{
    error::InsightError,
    pipeline::{AnalysisReport, analyze_dataset},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sales_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => handle_analyze(&args),
        Commands::Classify(args) => handle_classify(&args),
        Commands::Stats(args) => handle_stats(&args),
        Commands::Export(args) => handle_export(&args),
        Commands::Verify(args) => handle_verify(&args),
    }
}

fn ingest_options(args: &InputArgs) -> Result<IngestOptions> {
    Ok(IngestOptions {
        sheet: args.sheet.clone(),
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    })
}

fn resolve_layout(args: &LayoutArgs) -> Result<Option<LayoutContract>> {
    if let Some(path) = &args.layout {
        return Ok(Some(LayoutContract::load(path)?));
    }
    Ok(args.legacy_layout.then(LayoutContract::legacy))
}

fn handle_analyze(args: &cli::AnalyzeArgs) -> Result<()> {
    info!("Analyzing '{}'", args.input.input.display());
    let options = ingest_options(&args.input)?;
    let layout = resolve_layout(&args.layout)?;
    let report = pipeline::analyze_file(&args.input.input, &options, layout.as_ref())?;

    if let Some(path) = &args.export {
        let delimiter = io_utils::resolve_output_delimiter(Some(path.as_path()), args.export_delimiter);
        export::export_to_path(path, delimiter, &report.derived)
            .with_context(|| format!("Exporting derived rows to {path:?}"))?;
    }

    match args.format {
        OutputFormat::Table => {
            let options = RenderOptions {
                show_statistics: args.show_stats,
                show_rows: args.show_rows,
            };
            print!("{}", report::render_text(&report, &options));
        }
        OutputFormat::Json => println!("{}", report::render_json(&report)?),
    }
    Ok(())
}

fn handle_classify(args: &InputArgs) -> Result<()> {
    let dataset = ingest::load_dataset(&args.input, &ingest_options(args)?)?;
    let roles = roles::classify(dataset.headers());
    print!(
        "{}",
        table::render_table(
            &["role".to_string(), "column".to_string()],
            &roles.render_rows(),
            &[],
        )
    );
    let missing = roles.missing_required();
    if !missing.is_empty() {
        info!(
            "Revenue cannot be derived until these roles are present: {}",
            missing
                .iter()
                .map(|role| role.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}

fn handle_stats(args: &InputArgs) -> Result<()> {
    let report = pipeline::analyze_file(&args.input, &ingest_options(args)?, None)?;
    print!("{}", report::render_statistics(&report.statistics));
    info!(
        "Computed summary statistics for {} column(s)",
        report.statistics.descriptive.len()
    );
    Ok(())
}

fn handle_export(args: &cli::ExportArgs) -> Result<()> {
    let dataset = ingest::load_dataset(&args.input.input, &ingest_options(&args.input)?)?;
    let roles = roles::classify(dataset.headers());
    let output = metrics::compute(&dataset, &roles)?;
    let path = args.output.as_deref();
    let delimiter = io_utils::resolve_output_delimiter(path, args.output_delimiter);
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    let written = export::write_derived(&mut writer, &output.derived)?;
    info!(
        "Exported {written} derived row(s) with delimiter '{}'",
        io_utils::printable_delimiter(delimiter)
    );
    Ok(())
}

fn handle_verify(args: &cli::VerifyArgs) -> Result<()> {
    let contract = match &args.layout {
        Some(path) => LayoutContract::load(path)?,
        None => LayoutContract::legacy(),
    };
    let dataset = ingest::load_dataset(&args.input.input, &ingest_options(&args.input)?)?;
    contract.validate(dataset.headers())?;
    info!(
        "✓ {:?} matches the expected {}-column layout",
        args.input.input,
        contract.columns.len()
    );
    println!("Layout OK");
    Ok(())
}
