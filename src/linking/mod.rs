//! Device-linking workflow.
//!
//! Creates a remote instance, obtains a QR code (with retry) or a pairing
//! code, then polls the connection state until the phone is linked and
//! commits exactly one local record.


use chapchap_core::{
    config::LinkingConfig,
    error::ChapchapError,
    format::clean_number,
    traits::Gateway,
    types::{ConnectionStatus, Instance, LinkMethod, QrCode},
};
use chapchap_store::Store;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A remote instance that exists but has no linked device yet.
#[derive(Debug, Clone)]
pub struct PendingLink {
    pub friendly_name: String,
    pub evo_instance_name: String,
    pub evo_auth_token: String,
    /// QR code that came back with the create call, if any.
    pub initial_qr: Option<QrCode>,
}

/// Progress reported while linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// About to request a QR code. `retry` is 0 on the first attempt.
    QrAttempt { retry: u32, max_retries: u32 },
    /// A connection-state poll came back.
    Polled(ConnectionStatus),
}

pub struct Linker<'a> {
    gateway: &'a dyn Gateway,
    store: &'a Store,
    qr_initial_delay: Duration,
    qr_retry_interval: Duration,
    qr_max_retries: u32,
    qr_max_retries_not_ready: u32,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl<'a> Linker<'a> {
    pub fn new(gateway: &'a dyn Gateway, store: &'a Store, config: &LinkingConfig) -> Self {
        Self {
            gateway,
            store,
            qr_initial_delay: config.qr_initial_delay(),
            qr_retry_interval: config.qr_retry_interval(),
            qr_max_retries: config.qr_max_retries,
            qr_max_retries_not_ready: config.qr_max_retries_not_ready,
            poll_interval: config.poll_interval(),
            timeout: config.link_timeout(),
        }
    }

    /// Override the polling bound. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create the remote instance under a fresh name and token.
    pub async fn begin(&self, friendly_name: &str) -> Result<PendingLink, ChapchapError> {
        let evo_instance_name = Uuid::new_v4().to_string();
        let evo_auth_token = Uuid::new_v4().simple().to_string();

        let created = self
            .gateway
            .create_instance(&evo_instance_name, &evo_auth_token)
            .await?;

        info!(
            "created remote instance {evo_instance_name} for '{}' (immediate QR: {})",
            friendly_name,
            created.qr.is_some()
        );

        Ok(PendingLink {
            friendly_name: friendly_name.trim().to_string(),
            evo_instance_name,
            evo_auth_token,
            initial_qr: created.qr,
        })
    }

    /// The QR code to show: the one from the create call, or a fetched one.
    pub async fn qr_code(
        &self,
        pending: &PendingLink,
        progress: impl FnMut(LinkEvent),
    ) -> Result<QrCode, ChapchapError> {
        if let Some(qr) = &pending.initial_qr {
            return Ok(qr.clone());
        }
        tokio::time::sleep(self.qr_initial_delay).await;
        self.fetch_qr_with_retry(&pending.evo_instance_name, progress)
            .await
    }

    /// Fetch a QR code, retrying at a fixed interval.
    ///
    /// The retry budget is picked per failure: larger while the instance says
    /// it is not ready, smaller otherwise. The last error is returned once the
    /// budget is spent.
    pub async fn fetch_qr_with_retry(
        &self,
        evo_instance_name: &str,
        mut progress: impl FnMut(LinkEvent),
    ) -> Result<QrCode, ChapchapError> {
        let mut retry = 0u32;
        loop {
            progress(LinkEvent::QrAttempt {
                retry,
                max_retries: self.qr_max_retries_not_ready,
            });

            match self.gateway.fetch_qr(evo_instance_name).await {
                Ok(qr) => return Ok(qr),
                Err(e) => {
                    warn!("fetch QR attempt {} failed: {e}", retry + 1);
                    let max_retries = if e.is_not_ready() {
                        self.qr_max_retries_not_ready
                    } else {
                        self.qr_max_retries
                    };
                    if retry >= max_retries {
                        return Err(e);
                    }
                    retry += 1;
                    tokio::time::sleep(self.qr_retry_interval).await;
                }
            }
        }
    }

    /// Request a pairing code for `number` (digits are extracted first).
    pub async fn pairing_code(
        &self,
        pending: &PendingLink,
        number: &str,
    ) -> Result<String, ChapchapError> {
        let digits = clean_number(number);
        if digits.is_empty() {
            return Err(ChapchapError::PairingCode(
                "a WhatsApp number is required for pairing".to_string(),
            ));
        }
        self.gateway
            .pairing_code(&pending.evo_instance_name, &digits)
            .await
    }

    /// Poll until the remote instance reports `open`, then record it locally.
    ///
    /// `pairing_number` is stored as the phone only for the pairing method.
    pub async fn wait_until_open(
        &self,
        pending: &PendingLink,
        method: LinkMethod,
        pairing_number: Option<&str>,
        mut progress: impl FnMut(LinkEvent),
    ) -> Result<Instance, ChapchapError> {
        let name = pending.evo_instance_name.as_str();
        let poll = async {
            loop {
                tokio::time::sleep(self.poll_interval).await;
                let status = self.gateway.connection_state(name).await;
                debug!("link poll {name}: {status}");
                progress(LinkEvent::Polled(status));
                if status.is_open() {
                    break;
                }
            }
        };

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, poll)
                .await
                .map_err(|_| ChapchapError::LinkTimeout(limit.as_secs()))?,
            None => poll.await,
        }

        let phone = match method {
            LinkMethod::Pairing => pairing_number.map(clean_number).filter(|p| !p.is_empty()),
            LinkMethod::Qr => None,
        };

        let instance = Instance {
            id: Uuid::new_v4().to_string(),
            name: pending.friendly_name.clone(),
            evo_instance_name: pending.evo_instance_name.clone(),
            evo_auth_token: pending.evo_auth_token.clone(),
            status: ConnectionStatus::Open,
            phone,
            profile_pic_url: None,
            created_at: Some(chrono::Utc::now().timestamp_millis()),
        };

        if self.store.add_instance(&instance).await? {
            info!("linked '{}' as {}", instance.name, instance.evo_instance_name);
            return Ok(instance);
        }

        // Already recorded: hand back the stored record, not the discarded one.
        let existing = self
            .store
            .instances()
            .await?
            .into_iter()
            .find(|i| i.evo_instance_name == instance.evo_instance_name);
        Ok(existing.unwrap_or(instance))
    }
}
