//! Typed records for both upstream systems and the reconciled catalog
//!
//! Wire shapes are parsed here, at the network boundary. Anything that does not
//! match becomes [`Error::Parse`](crate::Error::Parse) instead of flowing on as
//! loosely-typed JSON.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) fn parse_json<T: DeserializeOwned>(context: &'static str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| Error::Parse { context, source })
}

// ── Entitlement service: offerings ──────────────────────────────────────────

/// The entitlement service's offering set for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOfferingSet {
    #[serde(default)]
    pub current_offering_id: Option<String>,
    #[serde(default)]
    pub offerings: Vec<RawOffering>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOffering {
    pub identifier: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub packages: Vec<RawPackage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPackage {
    /// Entitlement-side package identifier (e.g. `$rc_monthly`)
    pub identifier: String,
    /// Product reference on the checkout provider (its price id)
    pub platform_product_identifier: String,
}

impl RawOfferingSet {
    /// Distinct product references across all packages, in first-seen order.
    pub fn product_refs(&self) -> Vec<String> {
        let mut refs: Vec<String> = Vec::new();
        for package in self.offerings.iter().flat_map(|o| o.packages.iter()) {
            if !refs.contains(&package.platform_product_identifier) {
                refs.push(package.platform_product_identifier.clone());
            }
        }
        refs
    }
}

// ── Checkout provider: price preview ────────────────────────────────────────

/// Priced line items returned by the checkout provider's price preview.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceCatalog {
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub line_items: Vec<PriceLineItem>,
}

impl PriceCatalog {
    /// Exact-match lookup by price id.
    pub fn find(&self, price_id: &str) -> Option<&PriceLineItem> {
        self.line_items.iter().find(|item| item.price.id == price_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLineItem {
    pub price: Price,
    #[serde(default)]
    pub product: ProductInfo,
    #[serde(default)]
    pub formatted_totals: FormattedTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    /// Present on recurring prices only
    #[serde(default)]
    pub billing_cycle: Option<BillingCycle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingCycle {
    pub interval: String,
    pub frequency: u32,
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.frequency, self.interval)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormattedTotals {
    #[serde(default)]
    pub subtotal: Option<String>,
    #[serde(default)]
    pub tax: Option<String>,
    #[serde(default)]
    pub total: String,
}

// ── Reconciled catalog ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Subscription,
    OneTimePurchase,
}

impl ProductType {
    /// Recurring iff the price carries a billing cycle.
    pub fn classify(price: &Price) -> Self {
        if price.billing_cycle.is_some() {
            ProductType::Subscription
        } else {
            ProductType::OneTimePurchase
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductType::Subscription => write!(f, "Subscription"),
            ProductType::OneTimePurchase => write!(f, "One-time purchase"),
        }
    }
}

/// A product joined from a package reference and its price line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Checkout provider price id, equal to the package's product reference
    pub price_id: String,
    pub name: String,
    pub description: Option<String>,
    pub formatted_total: String,
    pub billing_cycle: Option<BillingCycle>,
    pub product_type: ProductType,
}

impl Product {
    pub fn from_line_item(item: &PriceLineItem) -> Self {
        Self {
            price_id: item.price.id.clone(),
            name: item.product.name.clone(),
            description: item.product.description.clone(),
            formatted_total: item.formatted_totals.total.clone(),
            billing_cycle: item.price.billing_cycle.clone(),
            product_type: ProductType::classify(&item.price),
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.product_type == ProductType::Subscription
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledPackage {
    pub identifier: String,
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledOffering {
    pub identifier: String,
    pub description: Option<String>,
    pub packages: Vec<ReconciledPackage>,
}

impl ReconciledOffering {
    pub fn package(&self, identifier: &str) -> Option<&ReconciledPackage> {
        self.packages.iter().find(|p| p.identifier == identifier)
    }
}

/// All reconciled offerings in service order, plus the current one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReconciledOfferingSet {
    pub current_offering_id: Option<String>,
    pub offerings: Vec<ReconciledOffering>,
}

impl ReconciledOfferingSet {
    pub fn get(&self, identifier: &str) -> Option<&ReconciledOffering> {
        self.offerings.iter().find(|o| o.identifier == identifier)
    }

    /// The offering named by the service's current-offering id, if reconciled.
    pub fn current(&self) -> Option<&ReconciledOffering> {
        self.current_offering_id
            .as_deref()
            .and_then(|id| self.get(id))
    }
}

// ── Entitlement service: subscriber ─────────────────────────────────────────

/// Envelope returned by the subscriber endpoint and by receipt submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberResponse {
    #[serde(default)]
    pub request_date: Option<String>,
    pub subscriber: SubscriberState,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubscriberState {
    #[serde(default)]
    pub original_app_user_id: String,
    #[serde(default)]
    pub first_seen: Option<String>,
    #[serde(default)]
    pub management_url: Option<String>,
    #[serde(default)]
    pub entitlements: BTreeMap<String, Entitlement>,
    #[serde(default)]
    pub subscriptions: BTreeMap<String, PurchaseRecords>,
    #[serde(default)]
    pub non_subscriptions: BTreeMap<String, PurchaseRecords>,
    #[serde(default)]
    pub other_purchases: BTreeMap<String, PurchaseRecords>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entitlement {
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub expires_date: Option<String>,
    #[serde(default)]
    pub product_identifier: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<String>,
}

impl Entitlement {
    /// Shown as active when flagged active or when it never expires.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false) || self.expires_date.is_none()
    }
}

/// A purchase grouping value: the service sends one object or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PurchaseRecords {
    Many(Vec<PurchaseEvent>),
    One(PurchaseEvent),
}

impl PurchaseRecords {
    pub fn events(&self) -> &[PurchaseEvent] {
        match self {
            PurchaseRecords::Many(events) => events,
            PurchaseRecords::One(event) => std::slice::from_ref(event),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PurchaseEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub expires_date: Option<String>,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub unsubscribe_detected: Option<bool>,
    #[serde(default)]
    pub is_sandbox: Option<bool>,
}

// ── Receipt submission ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRequest {
    pub app_user_id: String,
    pub fetch_token: String,
    pub presented_offering_identifier: String,
}

/// Entitlement confirmation returned after a receipt is accepted.
pub type ReceiptConfirmation = SubscriberResponse;
