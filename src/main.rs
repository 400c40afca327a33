use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ecommerce_pipeline::config::PipelineConfig;
use ecommerce_pipeline::loader::DatasetLoader;
use ecommerce_pipeline::models::StatusFilter;
use ecommerce_pipeline::pipeline::JoinPipeline;
use ecommerce_pipeline::processor::{PreprocessOptions, PreparedTables, Preprocessor};
use ecommerce_pipeline::storage::TableWriter;
use ecommerce_pipeline::views::build_report;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "src/configs/pipeline.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join the source tables and write the unified order record
    Export {
        #[arg(long)]
        datasets: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compute the delivery, problematic order and revenue views
    Report {
        #[arg(long)]
        datasets: Option<PathBuf>,
        /// Also write the report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let args = Args::parse();
    let mut config = PipelineConfig::load(&args.config)
        .context("Failed to load pipeline configuration")?;

    match args.command {
        Command::Export { datasets, output } => {
            if let Some(dir) = datasets {
                config.datasets.dir = dir;
            }
            if let Some(path) = output {
                config.output.path = path;
            }
            run_export(&config)
        }
        Command::Report { datasets, json } => {
            if let Some(dir) = datasets {
                config.datasets.dir = dir;
            }
            run_report(&config, json)
        }
    }
}

fn prepare(config: &PipelineConfig) -> Result<PreparedTables> {
    let loader = DatasetLoader::new(config.datasets.dir.clone())
        .with_infer_schema_length(config.datasets.infer_schema_length);
    let raw = loader.load_all().with_context(|| {
        format!(
            "Failed to load datasets from {}",
            config.datasets.dir.display()
        )
    })?;

    for (table, (rows, cols)) in raw.shapes() {
        info!("  {}: {} rows x {} columns", table, rows, cols);
    }

    let options = PreprocessOptions {
        numeric_fill: config.preprocess.numeric_fill,
    };
    Preprocessor::new(options)
        .prepare(&raw)
        .context("Failed to preprocess source tables")
}

fn run_export(config: &PipelineConfig) -> Result<()> {
    info!("🚀 Starting e-commerce merge pipeline");

    let tables = prepare(config)?;

    let status_filter = StatusFilter::from(config.pipeline.statuses.clone());
    let unified = JoinPipeline::unified(status_filter)
        .run(&tables)
        .context("Failed to join source tables")?;

    if unified.frame.height() == 0 {
        warn!("Unified table is empty; writing header only");
    }

    TableWriter::new(config.output.format)
        .write(&unified.frame, &config.output.path)
        .with_context(|| format!("Failed to write {}", config.output.path.display()))?;

    info!("=== Join Summary ===");
    info!(
        "Orders: {} total, {} after status filter",
        unified.report.orders_total, unified.report.orders_after_filter
    );
    for step in &unified.report.steps {
        info!(
            "  + {} on {}: {} -> {} rows",
            step.right, step.key, step.rows_before, step.rows_after
        );
    }
    info!(
        "🎉 Merged data saved to {}",
        config.output.path.display()
    );
    Ok(())
}

fn run_report(config: &PipelineConfig, json: Option<PathBuf>) -> Result<()> {
    info!("🚀 Starting e-commerce analytics report");

    let tables = prepare(config)?;
    let report = build_report(&tables, &config.views).context("Failed to compute views")?;

    info!("=== Delivery Duration ===");
    info!(
        "{} delivered orders, mean {:?} days, median {:?} days, max {:?} days",
        report.delivery.order_count,
        report.delivery.mean_days,
        report.delivery.median_days,
        report.delivery.max_days
    );

    info!("=== Problematic Orders ({}) ===", report.problematic.year);
    info!(
        "{} orders, {} item rows",
        report.problematic.order_count, report.problematic.item_rows
    );
    for entry in &report.problematic.top_categories {
        info!("  category {}: {}", entry.key, entry.count);
    }
    for entry in &report.problematic.top_sellers {
        info!("  seller {}: {}", entry.key, entry.count);
    }

    info!("=== Category Revenue ===");
    for quarter in &report.revenue.top_per_quarter {
        let names: Vec<&str> = quarter.top.iter().map(|r| r.category.as_str()).collect();
        info!("  {}: {:?}", quarter.label, names);
    }
    if report.revenue.consistent_categories.is_empty() {
        let names: Vec<&str> = report
            .revenue
            .overall_top
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        warn!("No category is top in every quarter; overall top: {:?}", names);
    } else {
        info!(
            "Consistent top categories: {:?}",
            report.revenue.consistent_categories
        );
    }

    if let Some(path) = json {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&report)?;
        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
