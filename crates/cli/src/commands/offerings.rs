//! Offerings commands — reconcile and display the purchasable catalog

use anyhow::{anyhow, Result};
use colored::Colorize;
use purchase_tester_core::cancel::run_cancellable;
use purchase_tester_core::{
    reconcile_offerings, CancellationToken, CheckoutClient, EntitlementApi, EntitlementClient,
    Reconciliation, Session,
};

use super::fetch_snapshot;
use crate::output::terminal;
use crate::progress::Step;
use crate::session::SessionStore;

/// Runs the catalog bridge for `session`, reporting unmatched packages.
pub(crate) async fn reconcile(
    session: &Session,
    api: &EntitlementClient,
    cancel: &CancellationToken,
) -> Result<Reconciliation> {
    let checkout = CheckoutClient::new(&session.config)?;

    let step = Step::new("Reconciling offerings");
    match reconcile_offerings(session, api, &checkout, cancel).await {
        Ok(reconciliation) => {
            step.finish(&format!(
                "{} offering(s)",
                reconciliation.offerings.offerings.len()
            ));
            if !reconciliation.unmatched.is_empty() {
                eprintln!("{}", terminal::format_unmatched(&reconciliation.unmatched));
            }
            Ok(reconciliation)
        }
        Err(e) => {
            step.fail();
            Err(e.into())
        }
    }
}

pub async fn run(store: &SessionStore, cancel: &CancellationToken) -> Result<()> {
    let session = store.session()?;
    let api = EntitlementClient::new(&session.config)?;

    if session.config.checkout_key().is_err() {
        return run_without_prices(&session, &api, cancel).await;
    }

    let reconciliation = reconcile(&session, &api, cancel).await?;
    let snapshot = fetch_snapshot(&api, &session, cancel).await?;

    println!();
    println!(
        "{}",
        terminal::format_offerings(&reconciliation.offerings, Some(&snapshot))
    );
    Ok(())
}

/// Without a checkout key there is nothing to join against.
async fn run_without_prices(
    session: &Session,
    api: &EntitlementClient,
    cancel: &CancellationToken,
) -> Result<()> {
    let step = Step::new("Fetching offerings");
    let raw = run_cancellable(
        cancel,
        api.fetch_offerings(session.entitlement_key(), session.user_id()),
    )
    .await;
    let raw = match raw {
        Ok(raw) => {
            step.finish(&format!("{} offering(s)", raw.offerings.len()));
            raw
        }
        Err(e) => {
            step.fail();
            return Err(e.into());
        }
    };

    eprintln!(
        "  {}: no checkout key configured, prices unavailable",
        "warn".yellow()
    );
    println!();
    print!("{}", terminal::format_raw_offerings(&raw));
    Ok(())
}

pub async fn run_one(
    store: &SessionStore,
    offering_id: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let session = store.session()?;
    let api = EntitlementClient::new(&session.config)?;

    let reconciliation = reconcile(&session, &api, cancel).await?;
    let offerings = &reconciliation.offerings;
    let offering = offerings
        .get(offering_id)
        .ok_or_else(|| anyhow!("Offering '{}' not found", offering_id))?;
    let snapshot = fetch_snapshot(&api, &session, cancel).await?;

    let is_current = offerings.current_offering_id.as_deref() == Some(offering_id);
    println!();
    print!(
        "{}",
        terminal::format_offering(offering, is_current, Some(&snapshot))
    );
    Ok(())
}
