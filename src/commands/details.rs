//! Instance details page.

use super::{resolve_instance, status_badge};
use chapchap_core::{error::ChapchapError, format::format_phone, traits::Gateway, types::Instance};
use chapchap_store::Store;
use chrono::{Local, TimeZone};
use console::style;

/// Re-query the remote state of one instance and persist it.
pub(crate) async fn refresh_status(
    gateway: &dyn Gateway,
    store: &Store,
    mut inst: Instance,
) -> Result<Instance, ChapchapError> {
    let status = gateway.connection_state(&inst.evo_instance_name).await;
    store.update_instance_status(&inst.id, status, None).await?;
    inst.status = status;
    Ok(inst)
}

fn format_created(created_at: Option<i64>) -> String {
    created_at
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%B %-d, %Y %H:%M").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

pub async fn handle_show(
    gateway: &dyn Gateway,
    store: &Store,
    selector: &str,
    refresh: bool,
) -> anyhow::Result<()> {
    let mut inst = resolve_instance(store, selector).await?;
    if refresh {
        inst = refresh_status(gateway, store, inst).await?;
    }

    println!(
        "{}  {}",
        style(&inst.name).bold(),
        status_badge(inst.status, "Offline", 0)
    );
    println!();
    let phone = format_phone(inst.phone.as_deref()).unwrap_or_else(|| "N/A".to_string());
    println!("  Phone:         {phone}");
    println!("  Instance:      {}", inst.evo_instance_name);
    println!("  Auth token:    {}", inst.evo_auth_token);
    println!("  Connected on:  {}", format_created(inst.created_at));
    println!("  Local id:      {}", inst.id);
    println!();

    if inst.status.is_open() {
        println!(
            "Your instance is currently {}. Messages can be sent and received in real-time.",
            inst.status
        );
    } else {
        println!(
            "Your instance is currently {}. Please check your phone internet connection.",
            inst.status
        );
        println!("Re-check with: chapchap show {} --refresh", inst.id);
    }
    Ok(())
}
