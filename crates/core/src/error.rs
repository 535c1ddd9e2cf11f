//! Error types for the reconciliation and receipt pipeline

use thiserror::Error;

/// Status codes the receipt protocol treats as transient.
pub const RETRYABLE_STATUS_CODES: &[u16] = &[425, 429, 502, 503, 504];

/// Errors surfaced by the entitlement client, catalog bridge and receipt protocol.
#[derive(Error, Debug)]
pub enum Error {
    /// No response was received (DNS, connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered with a non-2xx status.
    #[error("HTTP error: status {status}")]
    Http {
        /// Response status code
        status: u16,
        /// Response body, kept for diagnostics only
        body: String,
    },

    /// Reconciliation could not complete because an upstream fetch failed.
    #[error("catalog error: {0}")]
    Catalog(#[source] Box<Error>),

    /// A required credential is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The response body did not match the expected shape.
    #[error("failed to parse {context}: {source}")]
    Parse {
        /// What was being parsed
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The operation was cancelled at a suspension point.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns true if the receipt protocol may retry after this error.
    ///
    /// Only transport failures and the statuses in [`RETRYABLE_STATUS_CODES`] qualify.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => RETRYABLE_STATUS_CODES.contains(status),
            Self::Catalog(_) | Self::Configuration(_) | Self::Parse { .. } | Self::Cancelled => {
                false
            }
        }
    }

    /// HTTP status of the failure, if it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Catalog(inner) => inner.status(),
            _ => None,
        }
    }

    pub(crate) fn catalog(err: Error) -> Self {
        match err {
            // Cancellation and configuration problems keep their identity.
            Self::Cancelled => Self::Cancelled,
            Self::Configuration(_) | Self::Catalog(_) => err,
            other => Self::Catalog(Box::new(other)),
        }
    }
}

/// Problems with the configuration bundle, detected before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("entitlement service API key is missing")]
    MissingEntitlementKey,

    #[error("checkout provider key is required for this entitlement key")]
    MissingCheckoutKey,

    #[error("invalid proxy URL: {0}")]
    InvalidProxyUrl(String),

    #[error("invalid country code: {0} (expected two letters, e.g. US)")]
    InvalidCountryCode(String),

    #[error("user id must not be empty")]
    EmptyUserId,
}

/// A package whose product reference has no price-catalog entry.
///
/// Not an error: the package is dropped from the reconciled offering and this
/// notice is reported alongside the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedProduct {
    pub offering_id: String,
    pub package_id: String,
    pub product_ref: String,
}

impl std::fmt::Display for UnmatchedProduct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "product {} (package {} in offering {}) not found in price catalog",
            self.product_ref, self.package_id, self.offering_id
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
