use clap::{Args, Parser, Subcommand};
use printquote_protocol::common::ModeKey;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod auth;
mod cli;
mod client;
mod config;
mod draft;
mod error;
mod optimize;
mod prompt;
mod quotes;
mod session;
mod store;
mod ui;
mod validation;
mod workspace;

#[cfg(test)]
mod tests;

use cli::CliHandler;
use error::{ErrorCode, PqError};
use ui::UI;

#[derive(Parser)]
#[command(
    name = "printquote",
    about = "Cost quotes for 3D prints",
    long_about = "PrintQuote - cost quotes for 3D prints

OVERVIEW:
  Describe a print job (printer, filament, energy, model and commercial terms)
  and the PrintQuote server estimates material use, waste and total cost. It can
  also suggest faster, cheaper or balanced print settings for a saved quote.

QUICK START:
  printquote register                   # Create an account
  printquote login                      # Log in with username or email
  printquote create                     # Fill in a new quote interactively
  printquote create --file quote.json   # Create a quote from a JSON file
  printquote list                       # List your quotes
  printquote optimize <ID>              # Compare optimization proposals
  printquote status                     # Check session and server status",
    version = env!("CARGO_PKG_VERSION"),
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use a different configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with username or email
    Login(LoginArgs),

    /// Create an account and log in
    Register,

    /// Forget the stored session
    Logout,

    /// Show session and server status
    #[command(aliases = &["st"])]
    Status,

    /// List your quotes
    #[command(aliases = &["ls"])]
    List,

    /// Show one quote with its cost summary
    Show(ShowArgs),

    /// Create a quote
    #[command(aliases = &["new"])]
    Create(CreateArgs),

    /// Edit a saved quote
    Edit(EditArgs),

    /// Delete a quote
    #[command(aliases = &["rm"])]
    Delete(DeleteArgs),

    /// Show optimization proposals for a quote and optionally apply one
    #[command(aliases = &["opt"])]
    Optimize(OptimizeArgs),

    /// Configure settings
    #[command(aliases = &["cfg"])]
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct LoginArgs {
    /// Username or email
    #[arg(short, long = "username", value_name = "IDENTIFIER")]
    pub identifier: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Args)]
pub struct CreateArgs {
    /// Read the quote from a JSON file instead of prompting
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct EditArgs {
    pub id: String,

    /// Replace the quote with the contents of a JSON file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct OptimizeArgs {
    pub id: String,

    /// Apply a proposal: fast, economic or balanced
    #[arg(short, long, value_name = "MODE")]
    pub apply: Option<ModeKey>,

    /// Apply without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    Show,
    SetEndpoint { url: String },
    SetApiPrefix { prefix: String },
    SetTimeout { seconds: u64 },
    SetVerbose { enabled: String },
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let ui = UI::new();

    let mut handler = CliHandler::with_config_path(cli.config);
    let config_verbose = match handler.load_config().await {
        Ok(config) => config.verbose,
        Err(e) => {
            report(&ui, &e);
            std::process::exit(1);
        }
    };

    let log_level = if cli.verbose || config_verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("printquote={}", log_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = handler.execute(cli.command).await {
        report(&ui, &e);
        std::process::exit(1);
    }
}

fn report(ui: &UI, err: &PqError) {
    ui.error(&format!("Error: {}", err));
    if let Some(errors) = err.field_errors() {
        ui.field_errors(errors);
    }
    if err.code() == ErrorCode::SessionExpired {
        eprintln!("Run `printquote login` to start a new session.");
    }
}
