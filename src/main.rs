mod commands;
mod linking;
#[cfg(test)]
mod test_support;

use chapchap_core::{config, shellexpand};
use chapchap_evolution::EvolutionClient;
use chapchap_store::Store;
use clap::{Parser, Subcommand};
use commands::ConnectArgs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(
    name = "chapchap",
    version,
    about = "Chapchap: WhatsApp instances on an Evolution API gateway"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session.
    Login {
        #[arg(long)]
        email: String,
        /// Display name (defaults to "Demo User").
        #[arg(long)]
        name: Option<String>,
    },
    /// End the session.
    Logout,
    /// Check gateway reachability and local state.
    Status,
    /// List instances, syncing their status with the gateway.
    List,
    /// Show one instance.
    Show {
        /// Instance id, id prefix, or name.
        instance: String,
        /// Re-check the connection state first.
        #[arg(long)]
        refresh: bool,
    },
    /// Link a new phone (QR code or pairing code).
    Connect {
        /// Friendly name for the instance.
        #[arg(long)]
        name: Option<String>,
        /// Link with a pairing code for this WhatsApp number instead of a QR code.
        #[arg(long, value_name = "NUMBER")]
        pairing: Option<String>,
        /// Stop waiting for the phone after this many seconds (0 = never).
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Send a text message through a connected instance.
    Send {
        /// Instance id, id prefix, or name.
        instance: String,
        /// Destination phone number.
        #[arg(long)]
        to: String,
        /// The message to send.
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
    },
    /// Disconnect and delete an instance.
    Delete {
        /// Instance id, id prefix, or name.
        instance: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _log_guard = init_logging(&cfg, stderr_directive(&cli.command))?;
    match &cfg.source {
        Some(path) => tracing::info!("Loaded config from {}", path.display()),
        None => tracing::info!("Config file not found at {}, using defaults", cli.config),
    }

    let store = Store::new(&cfg.store).await?;
    let gateway = EvolutionClient::from_config(&cfg.gateway, &cfg.messaging)?;

    let needs_session = !matches!(
        cli.command,
        Commands::Login { .. } | Commands::Logout | Commands::Status
    );
    if needs_session {
        commands::require_session(&store).await?;
        if cfg.gateway.api_key.is_empty() {
            tracing::warn!(
                "gateway.api_key is empty. Set it in config.toml or the {} env var.",
                config::ENV_API_KEY
            );
        }
    }

    match cli.command {
        Commands::Login { email, name } => {
            commands::handle_login(&store, &email, name.as_deref()).await?;
        }
        Commands::Logout => commands::handle_logout(&store).await?,
        Commands::Status => {
            commands::handle_status(&cli.config, &cfg, &gateway, &store).await?;
        }
        Commands::List => commands::handle_list(&gateway, &store).await?,
        Commands::Show { instance, refresh } => {
            commands::handle_show(&gateway, &store, &instance, refresh).await?;
        }
        Commands::Connect {
            name,
            pairing,
            timeout,
        } => {
            let args = ConnectArgs {
                name,
                pairing_number: pairing,
                timeout_secs: timeout,
            };
            commands::run_connect(&gateway, &store, &cfg, args).await?;
        }
        Commands::Send { instance, to, text } => {
            let text = text.join(" ");
            commands::handle_send(&gateway, &store, &instance, &to, &text).await?;
        }
        Commands::Delete { instance, yes } => {
            commands::handle_delete(&gateway, &store, &instance, yes).await?;
        }
    }

    Ok(())
}

/// Default stderr filter. The connect wizard draws live spinners, so its
/// retries and poll failures only go to the log file.
fn stderr_directive(command: &Commands) -> &'static str {
    match command {
        Commands::Connect { .. } => "off",
        _ => "warn",
    }
}

/// Log to `{data_dir}/logs/chapchap.log` at the configured level, and to
/// stderr at `stderr_level`. `RUST_LOG` overrides both.
fn init_logging(
    cfg: &config::Config,
    stderr_level: &str,
) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = PathBuf::from(shellexpand(&cfg.chapchap.data_dir)).join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, "chapchap.log"));

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.chapchap.log_level));
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(stderr_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(stderr_filter),
        )
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_keeps_stderr_quiet() {
        let cli = Cli::parse_from(["chapchap", "connect", "--name", "Sales"]);
        assert_eq!(stderr_directive(&cli.command), "off");
    }

    #[test]
    fn test_other_commands_warn_on_stderr() {
        for args in [
            vec!["chapchap", "list"],
            vec!["chapchap", "send", "Sales", "--to", "2547", "hi", "there"],
            vec!["chapchap", "delete", "Sales", "-y"],
        ] {
            let cli = Cli::parse_from(args);
            assert_eq!(stderr_directive(&cli.command), "warn");
        }
    }
}
