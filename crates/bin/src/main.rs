use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;

use cli::{Cli, Commands, ServeArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("drawconnect=info".parse()?))
        .init();

    match cli.command {
        Some(Commands::Health(args)) => commands::health::run(&args).await,
        Some(Commands::Serve(args)) => commands::serve::run(&args).await,
        None => commands::serve::run(&ServeArgs::default()).await,
    }
}
