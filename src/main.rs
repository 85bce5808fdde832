use clap::Parser;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod commands;
mod models;
mod services;
mod utils;

use commands::Cli;
use utils::{status_message, Config};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    let mut filter = EnvFilter::from_default_env();
    for directive in ["ticker_anim=info", "reqwest=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    info!("🎬 Starting ticker-anim v{}", env!("CARGO_PKG_VERSION"));

    match commands::handle_command(cli, &config).await {
        Ok(status) => println!("{}", status),
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", status_message(&e));
            process::exit(1);
        }
    }
}
