//! Connect wizard: link a new phone with cliclack prompts.

use crate::linking::{LinkEvent, Linker, PendingLink};
use chapchap_core::{
    config::Config,
    error::ChapchapError,
    format::format_pairing_code,
    shellexpand,
    traits::Gateway,
    types::LinkMethod,
};
use chapchap_evolution::qr::{generate_qr_terminal, save_qr_png};
use chapchap_store::Store;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const NOT_READY_HINT: &str = "Instance is taking longer than expected to initialize.";

/// What to do after a failed QR or pairing attempt.
#[derive(Clone, PartialEq, Eq)]
enum Recovery {
    Retry,
    Switch,
    Cancel,
}

/// Options passed on the command line; anything missing is prompted for.
pub struct ConnectArgs {
    pub name: Option<String>,
    pub pairing_number: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub async fn run_connect(
    gateway: &dyn Gateway,
    store: &Store,
    cfg: &Config,
    args: ConnectArgs,
) -> anyhow::Result<()> {
    cliclack::intro("Connect New Device")?;

    // Step 1: name the device and create the remote instance.
    let name = match args.name.filter(|n| !n.trim().is_empty()) {
        Some(n) => n,
        None => cliclack::input("Instance Name")
            .placeholder("Marketing Team Phone")
            .validate(|input: &String| {
                if input.trim().is_empty() {
                    Err("Give this connection a friendly name")
                } else {
                    Ok(())
                }
            })
            .interact()?,
    };

    let mut linker = Linker::new(gateway, store, &cfg.linking);
    if let Some(secs) = args.timeout_secs {
        linker = linker.with_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }

    let spinner = cliclack::spinner();
    spinner.start("Creating instance...");
    let pending = match linker.begin(&name).await {
        Ok(p) => {
            spinner.stop("Instance created");
            p
        }
        Err(e) => {
            spinner.error(format!("Failed to create instance: {e}"));
            cliclack::outro_cancel("The gateway may be unreachable.")?;
            return Err(e.into());
        }
    };

    // Step 2: show a QR code or a pairing code.
    let mut method = match args.pairing_number {
        Some(_) => LinkMethod::Pairing,
        None => cliclack::select("How do you want to link?")
            .item(LinkMethod::Qr, "Scan QR Code", "WhatsApp > Linked Devices")
            .item(LinkMethod::Pairing, "Pairing Code", "link with phone number")
            .interact()?,
    };
    let mut pairing_number = args.pairing_number;
    let qr_dir = PathBuf::from(shellexpand(&cfg.chapchap.data_dir)).join("qr");
    let mut qr_png: Option<PathBuf> = None;
    let mut first_qr = true;

    loop {
        let outcome = match method {
            LinkMethod::Qr => {
                let shown = show_qr(&linker, &pending, &qr_dir, first_qr).await;
                first_qr = false;
                shown.map(|path| qr_png = path)
            }
            LinkMethod::Pairing => {
                let number = match pairing_number.take() {
                    Some(n) => n,
                    None => cliclack::input("WhatsApp Number")
                        .placeholder("e.g. 254712345678")
                        .interact()?,
                };
                let shown = show_pairing_code(&linker, &pending, &number).await;
                pairing_number = Some(number);
                shown
            }
        };

        let err = match outcome {
            Ok(()) => break,
            Err(e) => e,
        };

        let message = if err.is_not_ready() {
            NOT_READY_HINT.to_string()
        } else {
            err.to_string()
        };
        cliclack::log::error(message)?;

        let switch_label = match method {
            LinkMethod::Qr => "Use a pairing code instead",
            LinkMethod::Pairing => "Scan a QR code instead",
        };
        let retry_label = match method {
            LinkMethod::Qr => "Try again",
            LinkMethod::Pairing => "Use different number",
        };
        let next = cliclack::select("What next?")
            .item(Recovery::Retry, retry_label, "")
            .item(Recovery::Switch, switch_label, "")
            .item(Recovery::Cancel, "Cancel", "")
            .interact()?;

        match next {
            Recovery::Retry => {
                if method == LinkMethod::Pairing {
                    pairing_number = None;
                }
            }
            Recovery::Switch => {
                method = match method {
                    LinkMethod::Qr => LinkMethod::Pairing,
                    LinkMethod::Pairing => LinkMethod::Qr,
                };
            }
            Recovery::Cancel => {
                cliclack::outro_cancel(format!(
                    "Linking cancelled. Remote instance {} was left on the gateway.",
                    pending.evo_instance_name
                ))?;
                return Ok(());
            }
        }
    }

    // Step 3: wait for the phone to finish linking.
    let waiting = match method {
        LinkMethod::Qr => "Waiting for scan...",
        LinkMethod::Pairing => "Waiting for the code to be entered...",
    };
    let spinner = cliclack::spinner();
    spinner.start(waiting);

    let result = tokio::select! {
        res = linker.wait_until_open(&pending, method, pairing_number.as_deref(), |event| {
            if let LinkEvent::Polled(status) = event {
                spinner.set_message(format!("{waiting} (state: {status})"));
            }
        }) => Some(res),
        _ = tokio::signal::ctrl_c() => None,
    };

    if let Some(path) = qr_png {
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("could not remove {}: {e}", path.display());
        }
    }

    match result {
        Some(Ok(instance)) => {
            spinner.stop("Device linked");
            cliclack::outro(format!(
                "Connected Successfully! Your instance {} is now live.",
                instance.name
            ))?;
            Ok(())
        }
        Some(Err(e)) => {
            spinner.error(e.to_string());
            cliclack::outro_cancel(format!(
                "No device linked. Remote instance {} was left on the gateway.",
                pending.evo_instance_name
            ))?;
            Err(e.into())
        }
        None => {
            spinner.error("Interrupted");
            cliclack::outro_cancel(format!(
                "Linking cancelled. Remote instance {} was left on the gateway.",
                pending.evo_instance_name
            ))?;
            Ok(())
        }
    }
}

/// Fetch and display a QR code. Returns the PNG path written, if any.
async fn show_qr(
    linker: &Linker<'_>,
    pending: &PendingLink,
    qr_dir: &Path,
    first: bool,
) -> Result<Option<PathBuf>, ChapchapError> {
    let spinner = cliclack::spinner();
    spinner.start("Generating QR Code...");

    let on_attempt = |event: LinkEvent| {
        if let LinkEvent::QrAttempt { retry, max_retries } = event {
            if retry > 0 {
                spinner.set_message(format!(
                    "Initializing connection... (Attempt {retry}/{max_retries})"
                ));
            }
        }
    };
    let fetched = if first {
        linker.qr_code(pending, on_attempt).await
    } else {
        linker
            .fetch_qr_with_retry(&pending.evo_instance_name, on_attempt)
            .await
    };
    let qr = match fetched {
        Ok(qr) => {
            spinner.stop("QR code ready");
            qr
        }
        Err(e) => {
            spinner.error("Failed to load QR Code");
            return Err(e);
        }
    };

    let png = match save_qr_png(qr_dir, &pending.evo_instance_name, &qr) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("could not save QR image: {e}");
            None
        }
    };

    let mut body = String::new();
    if let Some(raw) = qr.raw.as_deref() {
        body.push_str(&generate_qr_terminal(raw)?);
        body.push('\n');
    }
    body.push_str("Open WhatsApp > Settings > Linked Devices > Link a Device");
    if let Some(path) = &png {
        body.push_str(&format!("\nImage: {}", path.display()));
    }
    cliclack::note("Scan QR Code", body)?;
    Ok(png)
}

async fn show_pairing_code(
    linker: &Linker<'_>,
    pending: &PendingLink,
    number: &str,
) -> Result<(), ChapchapError> {
    let spinner = cliclack::spinner();
    spinner.start("Generating Pairing Code...");

    let code = match linker.pairing_code(pending, number).await {
        Ok(code) => {
            spinner.stop("Pairing code ready");
            code
        }
        Err(e) => {
            spinner.error("Failed to get pairing code");
            return Err(e);
        }
    };

    cliclack::note(
        "Pairing Code",
        format!(
            "{}\n\n\
             How to connect:\n\
             1. Open WhatsApp on your phone\n\
             2. Go to Settings > Linked Devices\n\
             3. Tap Link a Device\n\
             4. Tap \"Link with phone number instead\"\n\
             5. Enter the code shown above",
            format_pairing_code(&code)
        ),
    )?;
    Ok(())
}
