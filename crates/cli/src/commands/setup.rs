//! Setup command — write the integration configuration

use anyhow::Result;
use colored::Colorize;
use purchase_tester_core::{CheckoutEnvironment, Config};

use crate::session::SessionStore;

#[derive(Debug, Clone, clap::Args)]
pub struct SetupArgs {
    /// Entitlement service public API key
    #[arg(long)]
    pub entitlement_key: String,

    /// Checkout provider client-side token (required for `pdl_` keys)
    #[arg(long)]
    pub checkout_key: Option<String>,

    /// Route entitlement requests through this URL
    #[arg(long)]
    pub proxy_url: Option<String>,

    /// Two-letter country for localized prices
    #[arg(long)]
    pub country: Option<String>,

    /// Wait this long after checkout before submitting the receipt
    #[arg(long)]
    pub submission_delay_ms: Option<u64>,

    /// Never send receipts; completed checkouts are only logged
    #[arg(long)]
    pub disable_receipts: bool,

    /// Fetch prices from the production checkout environment
    #[arg(long)]
    pub production: bool,
}

impl SetupArgs {
    /// Merges the arguments over `base`, keeping its retry tuning.
    pub fn into_config(self, base: Option<Config>) -> Config {
        let mut config = base.unwrap_or_default();
        config.entitlement_key = self.entitlement_key;
        config.checkout_key = self.checkout_key;
        config.proxy_url = self.proxy_url;
        config.country_code = self.country;
        config.submission_delay_ms = self.submission_delay_ms;
        config.disable_receipt_submission = self.disable_receipts;
        config.checkout_environment = if self.production {
            CheckoutEnvironment::Production
        } else {
            CheckoutEnvironment::Sandbox
        };
        config
    }
}

pub fn run(store: &SessionStore, args: &SetupArgs) -> Result<()> {
    let config = args.clone().into_config(store.load_config()?);
    config.validate()?;
    store.save_config(&config)?;

    eprintln!(
        "  {} Saved configuration to {}",
        "✓".green(),
        store.dir().display()
    );
    eprintln!("    entitlement API: {}", config.entitlement_base_url());
    if config.checkout_key.is_some() {
        eprintln!("    checkout environment: {}", config.checkout_environment);
    }
    if config.disable_receipt_submission {
        eprintln!("    {}", "receipt submission disabled".yellow());
    }

    Ok(())
}
