use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "segi9", version, about = "HTTP/HTTPS GET monitoring plugin")]
pub struct Cli {
    /// Plugin configuration file path
    #[arg(short, long, default_value = "segi9.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve host agent requests on stdin/stdout (default)
    Agent,

    /// Perform one request and print the body, bypassing the agent
    Manual {
        /// URL to request
        url: String,

        /// Authentication type: none | basic | bearer
        #[arg(short, long, default_value = "none")]
        auth: String,

        /// Username (basic) or token (bearer)
        #[arg(short, long)]
        user: Option<String>,

        /// Password for basic auth
        #[arg(short, long)]
        pass: Option<String>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display the plugin configuration and the settings it resolves to
    Show,

    /// Validate configuration file
    Validate,
}

impl Cli {
    /// Get the command to execute, defaulting to Agent if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Agent)
    }
}
