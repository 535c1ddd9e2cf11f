//! Checkout provider interface
//!
//! The pipeline only needs price previews from the provider. The checkout
//! overlay itself is external: this module builds the payload it is opened
//! with and parses the completion event it emits.

use crate::config::{CheckoutEnvironment, Config};
use crate::error::{ConfigError, Error, Result};
use crate::model::{parse_json, PriceCatalog};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const SANDBOX_API_URL: &str = "https://sandbox-api.paddle.com";
const PRODUCTION_API_URL: &str = "https://api.paddle.com";
const TIMEOUT_SECS: u64 = 15;

/// Event name the overlay emits once payment succeeds.
pub const CHECKOUT_COMPLETED: &str = "checkout.completed";

/// Price lookup on the checkout provider.
///
/// Implementations are constructed (initialized) by the caller and passed in
/// as a ready handle; reconciliation never initializes a provider itself.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Previews prices for exactly `price_ids`, scoped to `country` when given.
    async fn price_preview(&self, price_ids: &[String], country: Option<&str>)
        -> Result<PriceCatalog>;
}

#[derive(Serialize)]
struct PreviewItem<'a> {
    price_id: &'a str,
    quantity: u32,
}

#[derive(Serialize)]
struct PreviewAddress<'a> {
    country_code: &'a str,
}

#[derive(Serialize)]
struct PreviewRequest<'a> {
    items: Vec<PreviewItem<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<PreviewAddress<'a>>,
}

#[derive(Deserialize)]
struct PreviewResponse {
    data: PreviewData,
}

#[derive(Deserialize)]
struct PreviewData {
    #[serde(default)]
    currency_code: Option<String>,
    details: PreviewDetails,
}

#[derive(Deserialize)]
struct PreviewDetails {
    #[serde(default)]
    line_items: Vec<crate::model::PriceLineItem>,
}

/// reqwest-backed [`CheckoutProvider`] using the provider's pricing preview API.
#[derive(Debug, Clone)]
pub struct CheckoutClient {
    client: Client,
    base_url: String,
    token: String,
}

impl CheckoutClient {
    /// Initializes a provider handle from the configured client token.
    pub fn new(config: &Config) -> Result<Self> {
        let token = config.checkout_key()?;
        let base_url = match config.checkout_environment {
            CheckoutEnvironment::Sandbox => SANDBOX_API_URL,
            CheckoutEnvironment::Production => PRODUCTION_API_URL,
        };
        Self::with_base_url(base_url, token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ConfigError::MissingCheckoutKey.into());
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl CheckoutProvider for CheckoutClient {
    #[instrument(skip(self))]
    async fn price_preview(
        &self,
        price_ids: &[String],
        country: Option<&str>,
    ) -> Result<PriceCatalog> {
        let body = PreviewRequest {
            items: price_ids
                .iter()
                .map(|id| PreviewItem {
                    price_id: id,
                    quantity: 1,
                })
                .collect(),
            address: country.map(|country_code| PreviewAddress { country_code }),
        };

        let url = format!("{}/pricing-preview", self.base_url);
        debug!(%url, items = price_ids.len(), "price preview request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "price preview failed");
            return Err(Error::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: PreviewResponse = parse_json("price preview", &text)?;
        Ok(PriceCatalog {
            currency_code: parsed.data.currency_code,
            line_items: parsed.data.details.line_items,
        })
    }
}

// ── Checkout overlay payloads ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub price_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutAddress {
    pub country_code: String,
}

/// Payload for opening the checkout overlay on one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<CheckoutAddress>,
    /// Echoed back verbatim on the completion event
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_data: BTreeMap<String, String>,
}

impl CheckoutRequest {
    /// A single-quantity checkout for `price_id`, tagged with who is buying what.
    pub fn for_package(
        price_id: &str,
        user_id: &str,
        offering_id: &str,
        package_id: &str,
        country: Option<&str>,
    ) -> Self {
        let mut custom_data = BTreeMap::new();
        custom_data.insert("app_user_id".to_string(), user_id.to_string());
        custom_data.insert("offering_id".to_string(), offering_id.to_string());
        custom_data.insert("package_id".to_string(), package_id.to_string());

        Self {
            items: vec![CheckoutItem {
                price_id: price_id.to_string(),
                quantity: 1,
            }],
            address: country.map(|c| CheckoutAddress {
                country_code: c.to_string(),
            }),
            custom_data,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawCheckoutEvent {
    name: String,
    #[serde(default)]
    data: Option<RawCheckoutEventData>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCheckoutEventData {
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    custom_data: Option<BTreeMap<String, serde_json::Value>>,
}

/// A completed checkout, ready for receipt submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCompleted {
    pub transaction_id: String,
    pub custom_data: BTreeMap<String, serde_json::Value>,
}

impl CheckoutCompleted {
    /// Offering id echoed back through custom data, if the checkout was opened with one.
    pub fn offering_id(&self) -> Option<&str> {
        self.custom_data.get("offering_id").and_then(|v| v.as_str())
    }
}

/// Parses an overlay event. Returns `None` for events other than completion.
pub fn parse_checkout_event(json: &str) -> Result<Option<CheckoutCompleted>> {
    let event: RawCheckoutEvent = parse_json("checkout event", json)?;
    if event.name != CHECKOUT_COMPLETED {
        return Ok(None);
    }

    let data = event.data.unwrap_or(RawCheckoutEventData {
        transaction_id: None,
        custom_data: None,
    });
    match data.transaction_id.filter(|id| !id.trim().is_empty()) {
        Some(transaction_id) => Ok(Some(CheckoutCompleted {
            transaction_id,
            custom_data: data.custom_data.unwrap_or_default(),
        })),
        None => {
            warn!("checkout.completed event without a transaction id");
            Ok(None)
        }
    }
}
