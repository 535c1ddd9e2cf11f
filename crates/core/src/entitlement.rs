//! HTTP client for the entitlement service
//!
//! Four calls: offerings, subscriber, attribute write and receipt submission.
//! Every call fails with [`Error::Http`] on a non-2xx status and with
//! [`Error::Network`] when no response arrives.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{parse_json, RawOfferingSet, ReceiptConfirmation, ReceiptRequest, SubscriberResponse};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

const PLATFORM_HEADER: &str = "X-Platform";
const PLATFORM_WEB: &str = "web";
const APPLICATION_HEADER: &str = "X-Application";
pub const APPLICATION_NAME: &str = "Purchase tester";
const TIMEOUT_SECS: u64 = 15;

/// Entitlement service operations the pipeline depends on.
#[async_trait]
pub trait EntitlementApi: Send + Sync {
    async fn fetch_offerings(&self, key: &str, user_id: &str) -> Result<RawOfferingSet>;

    async fn fetch_subscriber(&self, key: &str, user_id: &str) -> Result<SubscriberResponse>;

    async fn set_attribute(
        &self,
        key: &str,
        user_id: &str,
        attr_key: &str,
        attr_value: &str,
    ) -> Result<()>;

    /// Reports a completed checkout. Call through [`crate::receipt::submit_receipt`].
    async fn submit_receipt(
        &self,
        key: &str,
        user_id: &str,
        transaction_id: &str,
        offering_id: &str,
    ) -> Result<ReceiptConfirmation>;
}

#[derive(Serialize)]
struct AttributeBody<'a> {
    value: &'a str,
}

/// reqwest-backed [`EntitlementApi`].
#[derive(Debug, Clone)]
pub struct EntitlementClient {
    client: Client,
    base_url: String,
}

impl EntitlementClient {
    /// Client for the base URL resolved from `config` (proxy or public endpoint).
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config.entitlement_base_url())
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Subscriber response exactly as the service sent it, untyped.
    #[instrument(skip(self, key))]
    pub async fn fetch_subscriber_raw(
        &self,
        key: &str,
        user_id: &str,
    ) -> Result<serde_json::Value> {
        let path = format!("/subscribers/{}", encode(user_id));
        let body = self.send(self.request(Method::GET, &path, key)).await?;
        parse_json("subscriber", &body)
    }

    fn request(&self, method: Method, path: &str, key: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "entitlement request");
        self.client
            .request(method, url)
            .bearer_auth(key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(PLATFORM_HEADER, PLATFORM_WEB)
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "entitlement service returned an error");
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))
    }
}

#[async_trait]
impl EntitlementApi for EntitlementClient {
    #[instrument(skip(self, key))]
    async fn fetch_offerings(&self, key: &str, user_id: &str) -> Result<RawOfferingSet> {
        let path = format!("/subscribers/{}/offerings", encode(user_id));
        let body = self.send(self.request(Method::GET, &path, key)).await?;
        parse_json("offerings", &body)
    }

    #[instrument(skip(self, key))]
    async fn fetch_subscriber(&self, key: &str, user_id: &str) -> Result<SubscriberResponse> {
        let path = format!("/subscribers/{}", encode(user_id));
        let body = self.send(self.request(Method::GET, &path, key)).await?;
        parse_json("subscriber", &body)
    }

    #[instrument(skip(self, key, attr_value))]
    async fn set_attribute(
        &self,
        key: &str,
        user_id: &str,
        attr_key: &str,
        attr_value: &str,
    ) -> Result<()> {
        let path = format!(
            "/subscribers/{}/attributes/{}",
            encode(user_id),
            encode(attr_key)
        );
        let request = self
            .request(Method::POST, &path, key)
            .json(&AttributeBody { value: attr_value });
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, key))]
    async fn submit_receipt(
        &self,
        key: &str,
        user_id: &str,
        transaction_id: &str,
        offering_id: &str,
    ) -> Result<ReceiptConfirmation> {
        let body = ReceiptRequest {
            app_user_id: user_id.to_string(),
            fetch_token: transaction_id.to_string(),
            presented_offering_identifier: offering_id.to_string(),
        };
        let request = self
            .request(Method::POST, "/receipts", key)
            .header(APPLICATION_HEADER, APPLICATION_NAME)
            .json(&body);
        let body = self.send(request).await?;
        parse_json("receipt confirmation", &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = EntitlementClient::with_base_url("http://localhost:1234/v1/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234/v1");
    }

    #[test]
    fn client_follows_config_proxy() {
        let config = Config::new("k").with_proxy_url("https://proxy.test");
        let client = EntitlementClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://proxy.test/v1");
    }
}
