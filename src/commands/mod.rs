pub mod generate;
pub mod ordinal;

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use crate::utils::config::Config;
use crate::utils::errors::GeneratorError;

/// Render animated price charts for stocks and crypto as MP4 videos
#[derive(Debug, Parser)]
#[command(name = "ticker-anim", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch prices and render the animation
    Generate(generate::GenerateArgs),
    /// Print the long-form label for a date, e.g. "March 22nd 2024"
    Ordinal(ordinal::OrdinalArgs),
}

/// Run one command and return the line to show the user
pub async fn handle_command(cli: Cli, config: &Config) -> Result<String, GeneratorError> {
    match cli.command {
        Commands::Generate(args) => {
            info!("Executing generate command for {}", args.symbol);
            generate::execute(args, config).await
        }
        Commands::Ordinal(args) => {
            debug!("Executing ordinal command for {}", args.date);
            ordinal::execute(&args)
        }
    }
}
