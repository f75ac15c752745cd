mod app;
mod bootstrap;
mod cli;
mod commands;
mod handlers;
mod models;
mod ui;

use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Testnet(args) => commands::testnet::run(&args).await,
        Commands::Chat(args) => commands::chat::run(&args).await,
    }
}
