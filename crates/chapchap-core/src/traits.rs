use crate::{
    error::ChapchapError,
    types::{ConnectionStatus, CreatedInstance, QrCode},
};
use async_trait::async_trait;

/// Messaging gateway trait.
///
/// The Evolution API client implements this; the linking workflow and the
/// front-end only talk to the gateway through it.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Create a remote instance with the given name and auth token.
    async fn create_instance(
        &self,
        instance_name: &str,
        token: &str,
    ) -> Result<CreatedInstance, ChapchapError>;

    /// Ask the instance for a QR code to scan.
    async fn fetch_qr(&self, instance_name: &str) -> Result<QrCode, ChapchapError>;

    /// Ask the instance for a pairing code bound to `number`.
    async fn pairing_code(&self, instance_name: &str, number: &str)
        -> Result<String, ChapchapError>;

    /// Current connection state. Never fails: anything unexpected is `Close`.
    async fn connection_state(&self, instance_name: &str) -> ConnectionStatus;

    /// Log the linked device out of the instance.
    async fn logout(&self, instance_name: &str) -> Result<(), ChapchapError>;

    /// Send a plain text message.
    async fn send_text(
        &self,
        instance_name: &str,
        number: &str,
        text: &str,
    ) -> Result<serde_json::Value, ChapchapError>;
}
