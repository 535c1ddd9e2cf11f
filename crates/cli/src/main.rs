//! Purchase Tester CLI - entitlement and checkout harness

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use purchase_tester_cli::{commands, Cli, Commands, SessionStore};
use purchase_tester_core::CancellationToken;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PURCHASE_TESTER_LOG";

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    let code = match run(cli, &cancel) {
        Ok(()) => 0,
        Err(e) => {
            if matches!(
                e.downcast_ref::<purchase_tester_core::Error>(),
                Some(purchase_tester_core::Error::Cancelled)
            ) {
                eprintln!("  {}", "Cancelled".yellow());
                130
            } else {
                eprintln!("  {} {:#}", "Error:".red().bold(), e);
                1
            }
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "purchase_tester_core=debug,purchase_tester_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, cancel: &CancellationToken) -> Result<()> {
    let store = SessionStore::locate(cli.home.as_deref())?;

    // Single logical thread: every suspension point is a network call or timer.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Setup(args) => commands::setup::run(&store, &args),
            Commands::User { user_id } => commands::user::run(&store, user_id.as_deref()),
            Commands::Offerings => commands::offerings::run(&store, cancel).await,
            Commands::Offering { offering_id } => {
                commands::offerings::run_one(&store, &offering_id, cancel).await
            }
            Commands::Subscriber { json } => commands::subscriber::run(&store, json, cancel).await,
            Commands::Attribute { key, value } => {
                commands::subscriber::set_attribute(&store, &key, &value, cancel).await
            }
            Commands::Checkout {
                offering_id,
                package_id,
                force,
            } => commands::checkout::run(&store, &offering_id, &package_id, force, cancel).await,
            Commands::Complete(args) => commands::complete::run(&store, &args, cancel).await,
            Commands::Reset => commands::user::reset(&store),
            Commands::Logout => commands::user::logout(&store),
        }
    })
}
