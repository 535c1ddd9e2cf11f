//! User selection, logout and reset

use anyhow::Result;
use colored::Colorize;
use purchase_tester_core::UserIdentity;

use crate::session::SessionStore;

/// Stores `user_id`, or a fresh anonymous id when none is given.
pub fn run(store: &SessionStore, user_id: Option<&str>) -> Result<()> {
    let identity = match user_id {
        Some(id) => UserIdentity::named(id)?,
        None => UserIdentity::anonymous(),
    };
    store.save_identity(&identity)?;

    let kind = if identity.is_anonymous {
        " (anonymous)".dimmed().to_string()
    } else {
        String::new()
    };
    eprintln!("  {} Using {}{}", "✓".green(), identity.user_id.bold(), kind);
    Ok(())
}

pub fn logout(store: &SessionStore) -> Result<()> {
    store.clear_identity()?;
    eprintln!("  {} Logged out", "✓".green());
    Ok(())
}

pub fn reset(store: &SessionStore) -> Result<()> {
    store.clear_all()?;
    eprintln!("  {} Cleared configuration and user", "✓".green());
    Ok(())
}
