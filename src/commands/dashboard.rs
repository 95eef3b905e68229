//! Dashboard handlers: instance list, quick send, delete.

use super::{resolve_instance, status_badge};
use chapchap_core::{
    error::ChapchapError,
    format::{clean_number, format_phone},
    traits::Gateway,
    types::Instance,
};
use chapchap_store::Store;
use console::style;
use futures_util::future::join_all;
use tracing::{error, warn};

/// Re-check every local instance against the gateway, persisting changes.
pub(crate) async fn sync_statuses(
    gateway: &dyn Gateway,
    store: &Store,
) -> Result<Vec<Instance>, ChapchapError> {
    let local = store.instances().await?;
    let states = join_all(
        local
            .iter()
            .map(|inst| gateway.connection_state(&inst.evo_instance_name)),
    )
    .await;

    let mut synced = Vec::with_capacity(local.len());
    for (mut inst, status) in local.into_iter().zip(states) {
        if status != inst.status {
            if let Err(e) = store.update_instance_status(&inst.id, status, None).await {
                warn!("failed to sync status for {}: {e}", inst.id);
            } else {
                inst.status = status;
            }
        }
        synced.push(inst);
    }
    Ok(synced)
}

pub async fn handle_list(gateway: &dyn Gateway, store: &Store) -> anyhow::Result<()> {
    let instances = sync_statuses(gateway, store).await?;

    if instances.is_empty() {
        println!("No instances yet. Link a phone with: chapchap connect");
        return Ok(());
    }

    println!(
        "{}",
        style(format!(
            "{:<24} {:<14} {:<24} {}",
            "NAME", "STATUS", "PHONE", "ID"
        ))
        .dim()
    );
    for inst in &instances {
        let phone = format_phone(inst.phone.as_deref())
            .unwrap_or_else(|| "Waiting for number...".to_string());
        let badge = status_badge(inst.status, "Connecting", 14);
        println!("{:<24} {badge} {:<24} {}", inst.name, phone, inst.id);
    }
    Ok(())
}

/// Send a text through a connected instance.
pub(crate) async fn send_message(
    gateway: &dyn Gateway,
    store: &Store,
    selector: &str,
    to: &str,
    text: &str,
) -> anyhow::Result<(Instance, serde_json::Value)> {
    let inst = resolve_instance(store, selector).await?;
    if !inst.status.is_open() {
        anyhow::bail!(
            "instance '{}' is not connected (status: {}). Run `chapchap show {} --refresh` first.",
            inst.name,
            inst.status,
            inst.id
        );
    }

    let number = clean_number(to);
    if number.is_empty() {
        anyhow::bail!("a destination phone number is required");
    }
    if text.trim().is_empty() {
        anyhow::bail!("message text is required");
    }

    let res = gateway
        .send_text(&inst.evo_instance_name, &number, text)
        .await?;
    Ok((inst, res))
}

pub async fn handle_send(
    gateway: &dyn Gateway,
    store: &Store,
    selector: &str,
    to: &str,
    text: &str,
) -> anyhow::Result<()> {
    let (inst, _) = send_message(gateway, store, selector, to, text).await?;
    println!(
        "{} Message sent successfully via {}",
        style("✔").green(),
        inst.name
    );
    Ok(())
}

/// Best-effort remote logout, then unconditional local delete.
pub(crate) async fn delete_instance(
    gateway: &dyn Gateway,
    store: &Store,
    inst: &Instance,
) -> Result<bool, ChapchapError> {
    if let Err(e) = gateway.logout(&inst.evo_instance_name).await {
        error!(
            "logout failed on API for {}, removing locally: {e}",
            inst.evo_instance_name
        );
    }
    store.remove_instance(&inst.id).await
}

pub async fn handle_delete(
    gateway: &dyn Gateway,
    store: &Store,
    selector: &str,
    yes: bool,
) -> anyhow::Result<()> {
    let inst = resolve_instance(store, selector).await?;

    if !yes {
        let confirmed: bool = cliclack::confirm(format!(
            "Disconnect and delete '{}'? This cannot be undone.",
            inst.name
        ))
        .initial_value(false)
        .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    delete_instance(gateway, store, &inst).await?;
    println!("Deleted '{}'.", inst.name);
    Ok(())
}
