//! Checkout command — build the overlay payload for one package

use anyhow::{anyhow, bail, Result};
use colored::Colorize;
use purchase_tester_core::{is_purchased, CancellationToken, CheckoutRequest, EntitlementClient};

use super::fetch_snapshot;
use super::offerings::reconcile;
use crate::session::SessionStore;

pub async fn run(
    store: &SessionStore,
    offering_id: &str,
    package_id: &str,
    force: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let session = store.session()?;
    let api = EntitlementClient::new(&session.config)?;

    let reconciliation = reconcile(&session, &api, cancel).await?;
    let package = reconciliation
        .offerings
        .get(offering_id)
        .ok_or_else(|| anyhow!("Offering '{}' not found", offering_id))?
        .package(package_id)
        .ok_or_else(|| {
            anyhow!(
                "Package '{}' is not purchasable in offering '{}'",
                package_id,
                offering_id
            )
        })?;
    let price_id = &package.product.price_id;

    let snapshot = fetch_snapshot(&api, &session, cancel).await?;
    if is_purchased(price_id, &snapshot) {
        if !force {
            bail!("{} is already purchased (use --force to check out anyway)", price_id);
        }
        eprintln!("  {}: {} is already purchased", "warn".yellow(), price_id);
    }

    let country = session.config.country();
    let request = CheckoutRequest::for_package(
        price_id,
        session.user_id(),
        offering_id,
        package_id,
        country.as_deref(),
    );
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}
