//! Purchase state evaluation
//!
//! A product counts as owned when it appears in any purchase grouping of the
//! subscriber snapshot. Expiry is deliberately not consulted here: an expired
//! subscription still disables repurchase. Entitlement activity is a separate
//! concern (see [`Entitlement::is_active`](crate::model::Entitlement::is_active)).

use crate::model::{PurchaseRecords, SubscriberState};
use std::collections::BTreeMap;

/// Which purchase grouping a product was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PurchaseKind {
    Subscription,
    NonSubscription,
    Other,
}

impl std::fmt::Display for PurchaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseKind::Subscription => write!(f, "Subscription"),
            PurchaseKind::NonSubscription => write!(f, "One-time purchase"),
            PurchaseKind::Other => write!(f, "Other purchase"),
        }
    }
}

/// True iff `product_id` is a key in any of the three purchase groupings.
pub fn is_purchased(product_id: &str, state: &SubscriberState) -> bool {
    state.subscriptions.contains_key(product_id)
        || state.non_subscriptions.contains_key(product_id)
        || state.other_purchases.contains_key(product_id)
}

/// One owned product for display.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedProduct<'a> {
    pub product_id: &'a str,
    pub kind: PurchaseKind,
    pub records: &'a PurchaseRecords,
}

/// Every owned product, grouped subscriptions first, then one-time, then other.
pub fn owned_products(state: &SubscriberState) -> Vec<OwnedProduct<'_>> {
    let groups: [(PurchaseKind, &BTreeMap<String, PurchaseRecords>); 3] = [
        (PurchaseKind::Subscription, &state.subscriptions),
        (PurchaseKind::NonSubscription, &state.non_subscriptions),
        (PurchaseKind::Other, &state.other_purchases),
    ];

    groups
        .into_iter()
        .flat_map(|(kind, group)| {
            group.iter().map(move |(product_id, records)| OwnedProduct {
                product_id: product_id.as_str(),
                kind,
                records,
            })
        })
        .collect()
}
