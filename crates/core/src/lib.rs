//! Purchase Tester Core - Offering Reconciliation and Receipt Submission
//!
//! This crate holds the cross-system logic of the purchase tester:
//! - Entitlement service client (offerings, subscriber, attributes, receipts)
//! - Catalog bridge joining entitlement offerings with checkout-provider prices
//! - Receipt submission protocol with bounded, cancellable retries
//! - Ownership evaluation against the latest subscriber snapshot
//!
//! Nothing here reads ambient state: every operation takes a [`Session`].

pub mod cancel;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod entitlement;
pub mod error;
pub mod model;
pub mod ownership;
pub mod receipt;

pub use catalog::{join_offerings, reconcile_offerings, Reconciliation};
pub use checkout::{
    parse_checkout_event, CheckoutClient, CheckoutCompleted, CheckoutProvider, CheckoutRequest,
};
pub use config::{CheckoutEnvironment, Config, RetrySettings, Session, UserIdentity};
pub use entitlement::{EntitlementApi, EntitlementClient};
pub use error::{ConfigError, Error, Result, UnmatchedProduct};
pub use model::{
    Product, ProductType, RawOfferingSet, ReconciledOffering, ReconciledOfferingSet,
    SubscriberResponse, SubscriberState,
};
pub use ownership::{is_purchased, owned_products, OwnedProduct, PurchaseKind};
pub use receipt::{
    submit_receipt, PurchaseCompletion, ReceiptSubmission, RetryPolicy, SubmissionOutcome,
    SubmissionReport, SubmissionState,
};

pub use tokio_util::sync::CancellationToken;

/// Purchase Tester version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
