//! Session and status handlers: login, logout, status.

use chapchap_core::config::Config;
use chapchap_evolution::EvolutionClient;
use chapchap_store::Store;
use console::style;

pub async fn handle_login(store: &Store, email: &str, name: Option<&str>) -> anyhow::Result<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        anyhow::bail!("a valid email address is required");
    }
    let user = store.login(email, name).await?;
    println!(
        "{} Signed in as {} <{}>",
        style("✔").green(),
        user.name,
        user.email
    );
    Ok(())
}

pub async fn handle_logout(store: &Store) -> anyhow::Result<()> {
    store.logout().await?;
    println!("Signed out.");
    Ok(())
}

pub async fn handle_status(
    config_path: &str,
    cfg: &Config,
    gateway: &EvolutionClient,
    store: &Store,
) -> anyhow::Result<()> {
    println!("Chapchap Status Check\n");
    println!("Config: {config_path}");
    println!("Data dir: {}", cfg.chapchap.data_dir);
    println!();

    let reachable = gateway.is_reachable().await;
    println!(
        "  gateway: {} ({})",
        gateway.base_url(),
        if reachable {
            style("reachable").green().to_string()
        } else {
            style("unreachable").red().to_string()
        }
    );
    println!(
        "  api key: {}",
        if cfg.gateway.api_key.is_empty() {
            "missing"
        } else {
            "configured"
        }
    );

    match store.current_user().await? {
        Some(user) => println!("  session: {} <{}>", user.name, user.email),
        None => println!("  session: not logged in"),
    }

    let instances = store.instances().await?;
    let live = instances.iter().filter(|i| i.status.is_open()).count();
    println!("  instances: {} ({live} live at last sync)", instances.len());
    Ok(())
}
