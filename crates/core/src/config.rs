//! Configuration and session identity
//!
//! The core never reads configuration on its own; callers build a [`Session`]
//! and pass it into every operation.

use crate::error::ConfigError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Public endpoint of the entitlement service.
pub const ENTITLEMENT_API_URL: &str = "https://api.revenuecat.com/v1";

/// Suffix appended to a proxy URL that has no trailing slash.
pub const PROXY_VERSION_SUFFIX: &str = "/v1";

/// Entitlement keys with this prefix belong to the checkout-provider integration.
pub const CHECKOUT_INTEGRATION_KEY_PREFIX: &str = "pdl_";

/// Prefix of system-generated user ids.
pub const ANONYMOUS_ID_PREFIX: &str = "$RCAnonymousID:";

/// Which checkout-provider environment prices are fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl std::fmt::Display for CheckoutEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutEnvironment::Sandbox => write!(f, "sandbox"),
            CheckoutEnvironment::Production => write!(f, "production"),
        }
    }
}

/// Credentials and tuning for one integration under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Entitlement service public API key
    #[serde(default)]
    pub entitlement_key: String,

    /// Checkout provider client-side token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_key: Option<String>,

    /// Route entitlement requests through this base URL instead of the public endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,

    /// Wait this long after checkout completes before the first receipt attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_delay_ms: Option<u64>,

    /// ISO 3166-1 alpha-2 country used for price previews and checkout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    /// Skip receipt submission (purchases are recorded server-side via webhook)
    #[serde(default)]
    pub disable_receipt_submission: bool,

    #[serde(default)]
    pub checkout_environment: CheckoutEnvironment,

    #[serde(default)]
    pub retry: RetrySettings,
}

/// Backoff tuning for receipt submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_max_jitter_ms() -> u64 {
    1000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("")
    }
}

impl Config {
    pub fn new(entitlement_key: impl Into<String>) -> Self {
        Self {
            entitlement_key: entitlement_key.into(),
            checkout_key: None,
            proxy_url: None,
            submission_delay_ms: None,
            country_code: None,
            disable_receipt_submission: false,
            checkout_environment: CheckoutEnvironment::default(),
            retry: RetrySettings::default(),
        }
    }

    #[must_use]
    pub fn with_checkout_key(mut self, key: impl Into<String>) -> Self {
        self.checkout_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_country_code(mut self, country: impl Into<String>) -> Self {
        self.country_code = Some(country.into());
        self
    }

    /// True when the entitlement key belongs to the checkout-provider integration.
    pub fn requires_checkout_key(&self) -> bool {
        self.entitlement_key
            .trim()
            .starts_with(CHECKOUT_INTEGRATION_KEY_PREFIX)
    }

    /// Checks credentials for the selected integration mode.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entitlement_key.trim().is_empty() {
            return Err(ConfigError::MissingEntitlementKey);
        }

        if self.requires_checkout_key() && self.checkout_key().is_err() {
            return Err(ConfigError::MissingCheckoutKey);
        }

        if let Some(proxy) = self.proxy_url.as_deref() {
            match url::Url::parse(proxy) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                _ => return Err(ConfigError::InvalidProxyUrl(proxy.to_string())),
            }
        }

        if let Some(country) = self.country_code.as_deref().map(str::trim) {
            if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ConfigError::InvalidCountryCode(country.to_string()));
            }
        }

        Ok(())
    }

    /// The checkout provider key, or `MissingCheckoutKey` when unset or blank.
    pub fn checkout_key(&self) -> Result<&str, ConfigError> {
        match self.checkout_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingCheckoutKey),
        }
    }

    /// Base URL for entitlement requests, without a trailing slash.
    ///
    /// A proxy URL ending in `/` is used as-is (minus the slash); otherwise the
    /// version suffix is appended.
    pub fn entitlement_base_url(&self) -> String {
        match self.proxy_url.as_deref().map(str::trim) {
            Some(proxy) if !proxy.is_empty() => match proxy.strip_suffix('/') {
                Some(stripped) => stripped.to_string(),
                None => format!("{proxy}{PROXY_VERSION_SUFFIX}"),
            },
            _ => ENTITLEMENT_API_URL.to_string(),
        }
    }

    /// Uppercased country code, if configured.
    pub fn country(&self) -> Option<String> {
        self.country_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_ascii_uppercase)
    }

    pub fn submission_delay(&self) -> Option<Duration> {
        self.submission_delay_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// The user every operation acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    /// True when the id was generated rather than supplied by the operator
    #[serde(default)]
    pub is_anonymous: bool,
}

impl UserIdentity {
    /// Generates a fresh anonymous id (`$RCAnonymousID:<uuid>`).
    pub fn anonymous() -> Self {
        Self {
            user_id: format!("{ANONYMOUS_ID_PREFIX}{}", uuid::Uuid::new_v4()),
            is_anonymous: true,
        }
    }

    /// Operator-supplied id.
    pub fn named(user_id: impl Into<String>) -> Result<Self, ConfigError> {
        let user_id = user_id.into().trim().to_string();
        if user_id.is_empty() {
            return Err(ConfigError::EmptyUserId);
        }
        Ok(Self {
            user_id,
            is_anonymous: false,
        })
    }
}

/// Configuration plus identity, handed explicitly to each core operation.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: Config,
    pub identity: UserIdentity,
}

impl Session {
    /// Validates the configuration and pairs it with an identity.
    pub fn new(config: Config, identity: UserIdentity) -> Result<Self, ConfigError> {
        config.validate()?;
        if identity.user_id.trim().is_empty() {
            return Err(ConfigError::EmptyUserId);
        }
        Ok(Self { config, identity })
    }

    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    pub fn entitlement_key(&self) -> &str {
        self.config.entitlement_key.trim()
    }
}
