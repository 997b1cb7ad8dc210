//! labelpress command-line host
//!
//! Drives the label transforms on files. Logs go to stderr; stdout only
//! carries results (customer JSON or the path of the written PDF).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use labelpress_core::{
    compose_grid, compose_hybrid, extract_customers, layout_leaflets, validate_customers,
    CustomerRecord, LabelPressError, LayoutConfig,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "labelpress")]
#[command(version, about = "Reprint shipping labels and print thank-you leaflets")]
struct Args {
    /// Directory for generated PDFs (created if missing)
    #[arg(long, global = true, default_value = ".")]
    out_dir: PathBuf,

    /// JSON layout configuration (defaults to $LABELPRESS_CONFIG, then built-in values)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the customers found on the labels as JSON
    Extract { input: PathBuf },

    /// Reprint the labels four to a page
    Grid { input: PathBuf },

    /// Labels in the corners, leaflets in the middle
    Hybrid {
        input: PathBuf,

        /// JSON list of customers to use instead of the ones on the labels
        #[arg(long)]
        customers: Option<PathBuf>,
    },

    /// Thank-you leaflets, eight to a page
    Leaflets {
        /// Label PDF to take customer names from
        input: Option<PathBuf>,

        /// JSON list of customers
        #[arg(long)]
        customers: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<LayoutConfig> {
    let config = match path {
        Some(path) => LayoutConfig::load(path)?,
        None => LayoutConfig::from_env()?,
    };
    Ok(config)
}

fn read_customers(path: &Path) -> Result<Vec<CustomerRecord>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read customer list {}", path.display()))?;
    let customers: Vec<CustomerRecord> = serde_json::from_str(&json)
        .with_context(|| format!("Invalid customer list {}", path.display()))?;
    validate_customers(&customers)?;
    Ok(customers)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Extract { input } => {
            let customers = extract_customers(&input)?;
            println!("{}", serde_json::to_string_pretty(&customers)?);
        }
        Command::Grid { input } => {
            let output = compose_grid(&input, &args.out_dir, &config)?;
            println!("{}", output.display());
        }
        Command::Hybrid { input, customers } => {
            let customers = match customers {
                Some(path) => read_customers(&path)?,
                None => match extract_customers(&input) {
                    Ok(customers) => customers,
                    Err(LabelPressError::NoCustomersFound) => {
                        tracing::warn!("No customers on the labels; printing labels only");
                        Vec::new()
                    }
                    Err(e) => return Err(e.into()),
                },
            };
            let output = compose_hybrid(&input, &customers, &args.out_dir, &config)?;
            println!("{}", output.display());
        }
        Command::Leaflets { input, customers } => {
            let customers = match (customers, input) {
                (Some(path), _) => read_customers(&path)?,
                (None, Some(input)) => extract_customers(&input)?,
                (None, None) => bail!("leaflets needs a label PDF or --customers"),
            };
            let output = layout_leaflets(&customers, &args.out_dir, &config)?;
            println!("{}", output.display());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries results, so all logging goes to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("labelpress v{}", env!("CARGO_PKG_VERSION"));
    run(args)
}
