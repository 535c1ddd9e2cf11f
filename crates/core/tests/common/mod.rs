//! Scripted fakes for the entitlement service and checkout provider

#![allow(dead_code)]

use async_trait::async_trait;
use purchase_tester_core::model::{
    PriceCatalog, RawOfferingSet, ReceiptConfirmation, SubscriberResponse, SubscriberState,
};
use purchase_tester_core::{
    CheckoutProvider, Config, EntitlementApi, Error, Result, Session, UserIdentity,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// How one scripted call should fail or succeed.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Ok,
    Status(u16),
    NetworkDown,
}

impl Reply {
    fn into_result<T>(self, ok: impl FnOnce() -> T) -> Result<T> {
        match self {
            Reply::Ok => Ok(ok()),
            Reply::Status(status) => Err(Error::Http {
                status,
                body: String::new(),
            }),
            Reply::NetworkDown => Err(Error::Network("connection refused".into())),
        }
    }
}

pub fn confirmation(user_id: &str) -> ReceiptConfirmation {
    SubscriberResponse {
        request_date: None,
        subscriber: SubscriberState {
            original_app_user_id: user_id.to_string(),
            ..Default::default()
        },
    }
}

/// Entitlement service fake. Receipt replies are consumed in order; once the
/// script runs out every call succeeds.
#[derive(Default)]
pub struct FakeEntitlements {
    pub offerings: Mutex<Option<Result<RawOfferingSet>>>,
    pub receipt_script: Mutex<VecDeque<Reply>>,
    pub offering_calls: AtomicU32,
    pub receipt_calls: AtomicU32,
    pub seen_tokens: Mutex<Vec<String>>,
}

impl FakeEntitlements {
    pub fn with_offerings(offerings: RawOfferingSet) -> Self {
        let fake = Self::default();
        *fake.offerings.lock().unwrap() = Some(Ok(offerings));
        fake
    }

    pub fn failing_offerings(err: Error) -> Self {
        let fake = Self::default();
        *fake.offerings.lock().unwrap() = Some(Err(err));
        fake
    }

    pub fn with_receipt_script(replies: &[Reply]) -> Self {
        let fake = Self::default();
        fake.receipt_script
            .lock()
            .unwrap()
            .extend(replies.iter().copied());
        fake
    }

    pub fn receipt_calls(&self) -> u32 {
        self.receipt_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntitlementApi for FakeEntitlements {
    async fn fetch_offerings(&self, _key: &str, _user_id: &str) -> Result<RawOfferingSet> {
        self.offering_calls.fetch_add(1, Ordering::SeqCst);
        match self.offerings.lock().unwrap().take() {
            Some(result) => result,
            None => Ok(RawOfferingSet {
                current_offering_id: None,
                offerings: vec![],
            }),
        }
    }

    async fn fetch_subscriber(&self, _key: &str, user_id: &str) -> Result<SubscriberResponse> {
        Ok(confirmation(user_id))
    }

    async fn set_attribute(
        &self,
        _key: &str,
        _user_id: &str,
        _attr_key: &str,
        _attr_value: &str,
    ) -> Result<()> {
        Ok(())
    }

    async fn submit_receipt(
        &self,
        _key: &str,
        user_id: &str,
        transaction_id: &str,
        _offering_id: &str,
    ) -> Result<ReceiptConfirmation> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens
            .lock()
            .unwrap()
            .push(transaction_id.to_string());
        let reply = self
            .receipt_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Ok);
        reply.into_result(|| confirmation(user_id))
    }
}

/// Checkout provider fake returning a fixed catalog.
#[derive(Default)]
pub struct FakeCheckout {
    pub catalog: PriceCatalog,
    pub fail_with: Option<u16>,
    pub calls: AtomicU32,
    pub requested: Mutex<Vec<(Vec<String>, Option<String>)>>,
}

impl FakeCheckout {
    pub fn with_catalog(catalog: PriceCatalog) -> Self {
        Self {
            catalog,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckoutProvider for FakeCheckout {
    async fn price_preview(
        &self,
        price_ids: &[String],
        country: Option<&str>,
    ) -> Result<PriceCatalog> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .unwrap()
            .push((price_ids.to_vec(), country.map(str::to_string)));
        match self.fail_with {
            Some(status) => Err(Error::Http {
                status,
                body: String::new(),
            }),
            None => Ok(self.catalog.clone()),
        }
    }
}

pub fn session(config: Config) -> Session {
    Session::new(config, UserIdentity::named("tester").unwrap()).unwrap()
}
