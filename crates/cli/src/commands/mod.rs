//! CLI commands

pub mod checkout;
pub mod complete;
pub mod offerings;
pub mod setup;
pub mod subscriber;
pub mod user;

use anyhow::Result;
use purchase_tester_core::{
    CancellationToken, EntitlementApi, EntitlementClient, Session, SubscriberState,
};

use crate::progress::Step;

/// Fetches the subscriber snapshot behind a spinner.
pub(crate) async fn fetch_snapshot(
    api: &EntitlementClient,
    session: &Session,
    cancel: &CancellationToken,
) -> Result<SubscriberState> {
    let step = Step::new("Fetching subscriber");
    let fetched = purchase_tester_core::cancel::run_cancellable(
        cancel,
        api.fetch_subscriber(session.entitlement_key(), session.user_id()),
    )
    .await;
    match fetched {
        Ok(response) => {
            step.finish(&response.subscriber.original_app_user_id);
            Ok(response.subscriber)
        }
        Err(e) => {
            step.fail();
            Err(e.into())
        }
    }
}
