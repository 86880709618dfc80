use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use segi9::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // stdout carries values and protocol messages; logs go to stderr
    init_tracing();

    match args.get_command() {
        cli::Commands::Agent => {
            commands::agent::execute(&args.config).await?;
        }
        cli::Commands::Manual {
            url,
            auth,
            user,
            pass,
        } => {
            let code = commands::manual::execute(url, auth, user, pass).await;
            std::process::exit(code);
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&args.config)?,
            cli::ConfigCommands::Validate => commands::config::validate(&args.config)?,
        },
        cli::Commands::Version => {
            println!("{} v{}", segi9::plugin::PLUGIN_NAME, env!("CARGO_PKG_VERSION"));
            println!("Rust {}", env!("CARGO_PKG_RUST_VERSION"));
        }
    }

    Ok(())
}
