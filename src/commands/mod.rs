//! Terminal front-end: one handler per page of the app.
//!
//! - `session`: login, logout, status
//! - `dashboard`: instance list with status sync, quick send, delete
//! - `details`: single instance view and status refresh
//! - `connect`: the device-linking wizard

mod connect;
mod dashboard;
mod details;
mod session;

#[cfg(test)]
mod tests;

pub use connect::{run_connect, ConnectArgs};
pub use dashboard::{handle_delete, handle_list, handle_send};
pub use details::handle_show;
pub use session::{handle_login, handle_logout, handle_status};

use chapchap_core::types::{ConnectionStatus, Instance, User};
use chapchap_store::Store;
use console::style;

/// Every page except login needs a session.
pub async fn require_session(store: &Store) -> anyhow::Result<User> {
    match store.current_user().await? {
        Some(user) => Ok(user),
        None => anyhow::bail!("not logged in. Run: chapchap login --email <EMAIL>"),
    }
}

/// Look an instance up by id, id prefix, or friendly name.
pub(crate) async fn resolve_instance(store: &Store, selector: &str) -> anyhow::Result<Instance> {
    store
        .find_instance(selector)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Instance not found: {selector}"))
}

/// `Live` for open instances, otherwise the fallback label in orange.
///
/// Padded to `width` before styling so ANSI codes don't skew table columns.
pub(crate) fn status_badge(status: ConnectionStatus, offline_label: &str, width: usize) -> String {
    if status.is_open() {
        style(format!("{:<width$}", "● Live")).green().bold().to_string()
    } else {
        style(format!("{:<width$}", format!("● {offline_label}")))
            .yellow()
            .to_string()
    }
}
