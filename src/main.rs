use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use pulsecheck::cli;

#[derive(Debug, Parser)]
#[command(name = "pulsecheck")]
#[command(about = "Digital responsibility dashboard for your social activity")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the web dashboard
    Serve {
        /// Listen address (default from [web].addr)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Store a session from an access token
    Login {
        /// Access token issued by the login surface
        #[arg(long)]
        token: String,
        /// Token expiry as unix seconds
        #[arg(long)]
        expires_at: String,
    },
    /// Forget the stored session
    Logout,
    /// Fetch insights for the stored session and print the dashboard
    Report {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Aggregate a saved analysis response without contacting any service
    Aggregate {
        /// JSON file: an analysis response or a bare array of records
        file: PathBuf,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check the analysis service, config and session
    Health,
    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file to ~/.pulsecheck/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `analysis.method nltk`
    Set { key: String, value: String },
    /// Reset the config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Serve { addr } => cli::run_serve(addr.as_deref()),
        Commands::Login { token, expires_at } => cli::run_login(&token, &expires_at),
        Commands::Logout => cli::run_logout(),
        Commands::Report { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_report(fmt)
        }
        Commands::Aggregate { file, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_aggregate(&file, fmt)
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
