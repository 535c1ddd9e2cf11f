//! Subscriber commands — snapshot display and attributes

use anyhow::Result;
use colored::Colorize;
use purchase_tester_core::cancel::run_cancellable;
use purchase_tester_core::{CancellationToken, EntitlementApi, EntitlementClient};

use super::fetch_snapshot;
use crate::output::terminal;
use crate::progress::Step;
use crate::session::SessionStore;

pub async fn run(store: &SessionStore, json: bool, cancel: &CancellationToken) -> Result<()> {
    let session = store.session()?;
    let api = EntitlementClient::new(&session.config)?;

    if json {
        let response = run_cancellable(
            cancel,
            api.fetch_subscriber_raw(session.entitlement_key(), session.user_id()),
        )
        .await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let snapshot = fetch_snapshot(&api, &session, cancel).await?;
    println!();
    print!("{}", terminal::format_subscriber(&snapshot));
    Ok(())
}

pub async fn set_attribute(
    store: &SessionStore,
    key: &str,
    value: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let session = store.session()?;
    let api = EntitlementClient::new(&session.config)?;

    let step = Step::new(format!("Setting {}", key.bold()));
    let result = run_cancellable(
        cancel,
        api.set_attribute(session.entitlement_key(), session.user_id(), key, value),
    )
    .await;
    match result {
        Ok(()) => {
            step.finish("");
            Ok(())
        }
        Err(e) => {
            step.fail();
            Err(e.into())
        }
    }
}
