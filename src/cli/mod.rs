pub mod commands;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Repair shop portal - jobs, live message and ticket sync, notifications")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the notification functions server")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to FUNCTIONS_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "List the jobs visible to a user")]
    Jobs {
        #[arg(long, env = "PORTAL_TOKEN", help = "Access token of the viewer")]
        token: String,
    },

    #[command(about = "Follow unread messages and ticket alerts live")]
    Watch {
        #[arg(long, env = "PORTAL_TOKEN", help = "Access token of the viewer")]
        token: String,
    },

    #[command(about = "Send a notification through the functions")]
    Notify {
        #[command(subcommand)]
        cmd: commands::notify::NotifyCommands,
    },

    #[command(about = "Mint a development access token")]
    Token {
        #[arg(help = "User id the token is issued for")]
        user: uuid::Uuid,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let result = match cli.command {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::Jobs { token } => commands::jobs::handle(&token, output_format).await,
        Commands::Watch { token } => commands::watch::handle(&token, output_format).await,
        Commands::Notify { cmd } => commands::notify::handle(cmd, output_format).await,
        Commands::Token { user, email } => commands::token::handle(user, email, output_format),
    };

    // jobs and watch open the shared pool
    DatabaseManager::close().await;
    result
}

/// Print a value as pretty JSON
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
