//! Complete command — report a finished checkout through the receipt protocol

use anyhow::{anyhow, bail, Context, Result};
use purchase_tester_core::{
    parse_checkout_event, submit_receipt, CancellationToken, EntitlementClient,
    PurchaseCompletion, SubmissionOutcome,
};
use std::path::PathBuf;

use crate::output::terminal;
use crate::progress::Step;
use crate::session::SessionStore;

#[derive(Debug, Clone, clap::Args)]
pub struct CompleteArgs {
    /// Checkout provider transaction id
    #[arg(long)]
    pub transaction: Option<String>,

    /// Offering the purchase was presented from
    #[arg(long)]
    pub offering: Option<String>,

    /// Read the transaction from a saved `checkout.completed` event
    #[arg(long, conflicts_with = "transaction")]
    pub event: Option<PathBuf>,
}

impl CompleteArgs {
    /// Resolves the completion from flags or an event file. `--offering`
    /// overrides the offering echoed in the event's custom data.
    pub fn completion(&self) -> Result<PurchaseCompletion> {
        let (transaction_id, echoed_offering) = match (&self.event, &self.transaction) {
            (Some(path), _) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let completed = parse_checkout_event(&json)?.ok_or_else(|| {
                    anyhow!("{} is not a completed checkout event", path.display())
                })?;
                let offering = completed.offering_id().map(str::to_string);
                (completed.transaction_id, offering)
            }
            (None, Some(transaction)) => (transaction.clone(), None),
            (None, None) => bail!("Pass --transaction <id> or --event <file>"),
        };

        let offering_id = self
            .offering
            .clone()
            .or(echoed_offering)
            .ok_or_else(|| anyhow!("Pass --offering <id>"))?;

        Ok(PurchaseCompletion {
            transaction_id,
            offering_id,
        })
    }
}

pub async fn run(store: &SessionStore, args: &CompleteArgs, cancel: &CancellationToken) -> Result<()> {
    let completion = args.completion()?;
    let session = store.session()?;
    let api = EntitlementClient::new(&session.config)?;

    let step = Step::new(format!("Submitting receipt {}", completion.transaction_id));
    let report = match submit_receipt(&api, &session, &completion, cancel).await {
        Ok(report) => {
            step.finish("");
            report
        }
        Err(e) => {
            step.fail();
            return Err(e.into());
        }
    };

    println!("{}", terminal::format_submission(&report));
    if let SubmissionOutcome::Confirmed(confirmation) = &report.outcome {
        println!();
        print!("{}", terminal::format_subscriber(&confirmation.subscriber));
    }
    Ok(())
}
