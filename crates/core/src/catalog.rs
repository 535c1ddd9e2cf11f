//! Catalog bridge: joins entitlement offerings with checkout prices
//!
//! Flow:
//! 1. Fetch the raw offering set from the entitlement service
//! 2. Collect the distinct product references across every package
//! 3. Preview prices for exactly those references (skipped when there are none)
//! 4. Inner-join packages to line items by exact price id; misses are dropped
//!    and reported as [`UnmatchedProduct`] notices
//! 5. Point `current` at the offering named by the service's current id

use crate::cancel::run_cancellable;
use crate::checkout::CheckoutProvider;
use crate::config::Session;
use crate::entitlement::EntitlementApi;
use crate::error::{Error, Result, UnmatchedProduct};
use crate::model::{
    PriceCatalog, Product, RawOfferingSet, ReconciledOffering, ReconciledOfferingSet,
    ReconciledPackage,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// A reconciled catalog plus the packages that could not be priced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    pub offerings: ReconciledOfferingSet,
    pub unmatched: Vec<UnmatchedProduct>,
}

/// Fetches both catalogs and joins them.
///
/// Upstream failures surface as [`Error::Catalog`]; unmatched packages never
/// fail the call.
#[instrument(skip_all, fields(user_id = %session.user_id()))]
pub async fn reconcile_offerings<E, C>(
    session: &Session,
    entitlements: &E,
    checkout: &C,
    cancel: &CancellationToken,
) -> Result<Reconciliation>
where
    E: EntitlementApi + ?Sized,
    C: CheckoutProvider + ?Sized,
{
    let raw = run_cancellable(
        cancel,
        entitlements.fetch_offerings(session.entitlement_key(), session.user_id()),
    )
    .await
    .map_err(Error::catalog)?;

    let refs = raw.product_refs();
    let prices = if refs.is_empty() {
        PriceCatalog::default()
    } else {
        let country = session.config.country();
        run_cancellable(cancel, checkout.price_preview(&refs, country.as_deref()))
            .await
            .map_err(Error::catalog)?
    };

    let reconciliation = join_offerings(&raw, &prices);
    info!(
        offerings = reconciliation.offerings.offerings.len(),
        unmatched = reconciliation.unmatched.len(),
        "offerings reconciled"
    );
    Ok(reconciliation)
}

/// Pure inner join of offerings against a price catalog.
pub fn join_offerings(raw: &RawOfferingSet, prices: &PriceCatalog) -> Reconciliation {
    let mut unmatched = Vec::new();

    let offerings = raw
        .offerings
        .iter()
        .map(|offering| {
            let packages = offering
                .packages
                .iter()
                .filter_map(|package| match prices.find(&package.platform_product_identifier) {
                    Some(item) => Some(ReconciledPackage {
                        identifier: package.identifier.clone(),
                        product: Product::from_line_item(item),
                    }),
                    None => {
                        let notice = UnmatchedProduct {
                            offering_id: offering.identifier.clone(),
                            package_id: package.identifier.clone(),
                            product_ref: package.platform_product_identifier.clone(),
                        };
                        warn!(
                            offering = %notice.offering_id,
                            package = %notice.package_id,
                            product = %notice.product_ref,
                            "product not found in price catalog; package dropped"
                        );
                        unmatched.push(notice);
                        None
                    }
                })
                .collect();

            ReconciledOffering {
                identifier: offering.identifier.clone(),
                description: offering.description.clone(),
                packages,
            }
        })
        .collect::<Vec<_>>();

    let current_offering_id = raw
        .current_offering_id
        .as_ref()
        .filter(|id| offerings.iter().any(|o| &o.identifier == *id))
        .cloned();

    Reconciliation {
        offerings: ReconciledOfferingSet {
            current_offering_id,
            offerings,
        },
        unmatched,
    }
}
