//! Terminal output formatting

use colored::Colorize;
use purchase_tester_core::model::{RawOfferingSet, ReconciledPackage};
use purchase_tester_core::{
    is_purchased, owned_products, ReconciledOffering, ReconciledOfferingSet, SubmissionOutcome,
    SubmissionReport, SubscriberState, UnmatchedProduct,
};
use std::fmt::Write;

/// One line per package: price, cadence and whether the user already owns it.
pub fn format_package(package: &ReconciledPackage, owned: Option<&SubscriberState>) -> String {
    let product = &package.product;
    let cadence = match &product.billing_cycle {
        Some(cycle) => format!("every {}", cycle),
        None => "one-time".to_string(),
    };
    let marker = match owned {
        Some(state) if is_purchased(&product.price_id, state) => format!(" {}", "[owned]".green()),
        _ => String::new(),
    };

    format!(
        "    {} {} ({}, {}){}",
        package.identifier.bold(),
        product.formatted_total,
        product.name,
        cadence.dimmed(),
        marker
    )
}

pub fn format_offering(
    offering: &ReconciledOffering,
    is_current: bool,
    owned: Option<&SubscriberState>,
) -> String {
    let mut out = String::new();
    let title = if is_current {
        format!("{} {}", offering.identifier.bold(), "(current)".cyan())
    } else {
        offering.identifier.bold().to_string()
    };
    let _ = writeln!(out, "  {}", title);
    if let Some(description) = offering.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "    {}", description.dimmed());
    }
    if offering.packages.is_empty() {
        let _ = writeln!(out, "    {}", "no purchasable packages".dimmed());
    }
    for package in &offering.packages {
        let _ = writeln!(out, "{}", format_package(package, owned));
    }
    out
}

pub fn format_offerings(set: &ReconciledOfferingSet, owned: Option<&SubscriberState>) -> String {
    if set.offerings.is_empty() {
        return format!("  {}\n", "No offerings configured".dimmed());
    }

    let current = set.current_offering_id.as_deref();
    set.offerings
        .iter()
        .map(|offering| format_offering(offering, current == Some(offering.identifier.as_str()), owned))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Offerings as the entitlement service knows them, before prices are joined in.
pub fn format_raw_offerings(raw: &RawOfferingSet) -> String {
    let mut out = String::new();
    for offering in &raw.offerings {
        let current = raw.current_offering_id.as_deref() == Some(offering.identifier.as_str());
        let suffix = if current { " (current)" } else { "" };
        let _ = writeln!(out, "  {}{}", offering.identifier.bold(), suffix.cyan());
        for package in &offering.packages {
            let _ = writeln!(
                out,
                "    {} -> {}",
                package.identifier,
                package.platform_product_identifier.dimmed()
            );
        }
    }
    out
}

pub fn format_unmatched(unmatched: &[UnmatchedProduct]) -> String {
    unmatched
        .iter()
        .map(|u| format!("  {}: {}", "warn".yellow(), u))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_subscriber(state: &SubscriberState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {} {}", "User:".bold(), state.original_app_user_id);
    if let Some(first_seen) = &state.first_seen {
        let _ = writeln!(out, "  {} {}", "First seen:".bold(), first_seen);
    }
    if let Some(url) = &state.management_url {
        let _ = writeln!(out, "  {} {}", "Manage:".bold(), url);
    }

    let _ = writeln!(out, "\n  {}", "Entitlements".bold());
    if state.entitlements.is_empty() {
        let _ = writeln!(out, "    {}", "none".dimmed());
    }
    for (name, entitlement) in &state.entitlements {
        let status = if entitlement.is_active() {
            "active".green()
        } else {
            "inactive".red()
        };
        let expires = entitlement
            .expires_date
            .as_deref()
            .map(|d| format!(" until {}", d))
            .unwrap_or_default();
        let _ = writeln!(out, "    {} {}{}", name, status, expires.dimmed());
    }

    let _ = writeln!(out, "\n  {}", "Purchases".bold());
    let owned = owned_products(state);
    if owned.is_empty() {
        let _ = writeln!(out, "    {}", "none".dimmed());
    }
    for product in owned {
        let count = product.records.events().len();
        let _ = writeln!(
            out,
            "    {} [{}] x{}",
            product.product_id, product.kind, count
        );
    }

    out
}

pub fn format_submission(report: &SubmissionReport) -> String {
    let attempts = match report.attempts {
        1 => "1 attempt".to_string(),
        n => format!("{} attempts", n),
    };
    match &report.outcome {
        SubmissionOutcome::Confirmed(_) => {
            format!("  {} receipt confirmed after {}", "✓".green(), attempts)
        }
        SubmissionOutcome::Skipped => format!(
            "  {} receipt submission disabled, nothing sent",
            "–".yellow()
        ),
    }
}
