//! Purchase Tester CLI library — exposed for integration tests

pub mod commands;
pub mod output;
pub mod progress;
pub mod session;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use session::SessionStore;

#[derive(Parser)]
#[command(name = "purchase-tester")]
#[command(about = "Exercise an entitlement service and checkout provider end to end", long_about = None)]
#[command(version = purchase_tester_core::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding config.toml and user.json (default: ~/.config/purchase-tester)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Debug-level logging from the purchase pipeline
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the integration configuration
    Setup(commands::setup::SetupArgs),

    /// Select the user (anonymous when no id is given)
    User {
        /// App user id
        user_id: Option<String>,
    },

    /// List offerings with prices and owned state
    Offerings,

    /// Show the packages of one offering
    Offering {
        /// Offering identifier
        offering_id: String,
    },

    /// Show the current subscriber snapshot
    Subscriber {
        /// Print the raw service response
        #[arg(long)]
        json: bool,
    },

    /// Set a subscriber attribute
    Attribute {
        key: String,
        value: String,
    },

    /// Print the checkout payload for a package
    Checkout {
        /// Offering identifier
        offering_id: String,

        /// Package identifier
        package_id: String,

        /// Build the payload even if the product is already owned
        #[arg(long)]
        force: bool,
    },

    /// Report a completed checkout to the entitlement service
    Complete(commands::complete::CompleteArgs),

    /// Remove the stored configuration and user
    Reset,

    /// Forget the selected user
    Logout,
}
