//! Sentiment vs macro indicator batch runner
//!
//! Loads the survey and indicator CSVs named in a TOML config, joins them by
//! month, fits the configured regressions and writes one report per model.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use sm_pipeline::{Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(author, version, about = "Consumer sentiment vs macro indicator regressions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dataset, fit every model and write reports
    Run {
        /// Pipeline configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Override the configured output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the joined schema, pre/post means and correlations
    Inspect {
        /// Pipeline configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    // Setup logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output_dir } => {
            let config = PipelineConfig::load(&config)?;
            let out_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());

            let output = Pipeline::new(config).run()?;
            for model in &output.models {
                println!("{}", model.summary);
            }

            let written = output
                .write(&out_dir)
                .with_context(|| format!("Failed to write reports to {}", out_dir.display()))?;
            info!(files = written.len(), dir = %out_dir.display(), "reports written");
        }
        Commands::Inspect { config } => {
            let config = PipelineConfig::load(&config)?;
            let inspection = Pipeline::new(config).inspect()?;
            println!("{}", inspection);
        }
    }

    Ok(())
}
