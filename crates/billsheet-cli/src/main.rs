//! billsheet CLI - Invoice Spreadsheet Generator
//!
//! Command-line interface for previewing and issuing monthly invoices.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use billsheet_core::{GeneratedDocument, InvoiceData, InvoiceKey, LineItem, Period};
use billsheet_render::{EmbeddedTemplate, InvoiceAssembler, TemplateFile, TemplateSource};
use billsheet_service::{InvoiceService, JsonInvoiceSource, JsonSummaryStore, SummaryStore};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "billsheet")]
#[command(author, version, about = "Template-driven invoice spreadsheet generator", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file
    #[arg(long, env = "BILLSHEET_CONFIG", global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Template file (built-in template if not specified)
    #[arg(short, long, global = true, value_name = "FILE")]
    template: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InvoiceArgs {
    /// Secretary issuing the invoice
    #[arg(short, long)]
    secretary: String,

    /// Billing period (YYYY-MM)
    #[arg(short, long)]
    period: Period,

    /// JSON invoice data file
    #[arg(short, long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an invoice without recording a summary
    Preview(InvoiceArgs),

    /// Build an invoice and record its monthly summary
    Issue {
        #[command(flatten)]
        invoice: InvoiceArgs,

        /// JSON summary store
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
    },

    /// Show where a template's detail blocks end up
    Anchors {
        /// Number of line items to lay out
        #[arg(short = 'n', long, default_value_t = 1)]
        items: usize,
    },

    /// List recorded monthly summaries
    Summaries {
        /// JSON summary store
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = CliConfig::load_or_default(cli.config.as_deref())?;
    if cli.template.is_some() {
        config.template = cli.template;
    }

    match cli.command {
        Commands::Preview(args) => {
            let service = InvoiceService::new(data_source(&args, &config)?, store(None, &config))
                .template(template(&config))
                .layout(config.layout.clone());
            let document = service.preview(&invoice_key(&args))?;
            write_document(&document, args.out_dir.as_deref(), &config)?;
        }
        Commands::Issue { invoice, store: store_path } => {
            let service =
                InvoiceService::new(data_source(&invoice, &config)?, store(store_path, &config))
                    .template(template(&config))
                    .layout(config.layout.clone());
            let issued = service.issue(&invoice_key(&invoice))?;
            write_document(&issued.document, invoice.out_dir.as_deref(), &config)?;
            eprintln!(
                "Recorded summary: {} tasks, {} min, total {}",
                issued.summary.task_count, issued.summary.total_minutes, issued.summary.total_fee
            );
        }
        Commands::Anchors { items } => {
            let placement = layout_report(&config, items)?;
            println!("{}", serde_json::to_string_pretty(&placement)?);
        }
        Commands::Summaries { store: store_path, json } => {
            let summaries = store(store_path, &config).list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                eprintln!("No summaries recorded");
            } else {
                for s in &summaries {
                    println!(
                        "{}\t{}\t{}\t{}\t{}\t{:?}",
                        s.secretary_id, s.period, s.total_fee, s.task_count, s.total_minutes, s.status
                    );
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn invoice_key(args: &InvoiceArgs) -> InvoiceKey {
    InvoiceKey::new(args.secretary.clone(), args.period)
}

fn template(config: &CliConfig) -> Box<dyn TemplateSource> {
    match &config.template {
        Some(path) => Box::new(TemplateFile::new(path)),
        None => Box::new(EmbeddedTemplate),
    }
}

fn data_source(args: &InvoiceArgs, config: &CliConfig) -> Result<JsonInvoiceSource> {
    match args.data.as_ref().or(config.data.as_ref()) {
        Some(path) => Ok(JsonInvoiceSource::new(path)),
        None => bail!("no invoice data file; pass --data or set `data` in the config"),
    }
}

fn store(flag: Option<PathBuf>, config: &CliConfig) -> JsonSummaryStore {
    JsonSummaryStore::new(flag.unwrap_or_else(|| config.store_path()))
}

fn write_document(document: &GeneratedDocument, out_dir: Option<&Path>, config: &CliConfig) -> Result<()> {
    let dir = out_dir
        .or(config.output_dir.as_deref())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

    let path = dir.join(&document.file_name);
    std::fs::write(&path, &document.bytes)
        .with_context(|| format!("cannot write {}", path.display()))?;
    debug!(path = %path.display(), bytes = document.bytes.len(), "document written");
    println!("{}", path.display());
    Ok(())
}

/// Lay out `items` placeholder rows in the configured template
fn layout_report(config: &CliConfig, items: usize) -> Result<billsheet_render::Placement> {
    let mut data = InvoiceData::new(InvoiceKey::new("layout", Period::new(2000, 1)?));
    data.line_items = (1..=items)
        .map(|i| LineItem::new(format!("item-{i}")).label(format!("Item {i}")))
        .collect();

    let assembled = InvoiceAssembler::new(config.layout.clone())
        .build_sheet(&template(config), &data)
        .context("cannot lay out template")?;
    Ok(assembled.placement)
}
