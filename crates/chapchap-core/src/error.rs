use thiserror::Error;

/// Top-level error type for Chapchap.
#[derive(Debug, Error)]
pub enum ChapchapError {
    /// Transport or decoding failure talking to the gateway.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// The gateway answered with a non-success status.
    #[error("API Request Failed: {status} - {body}")]
    Api { status: u16, body: String },

    /// The remote instance cannot serve a QR code yet.
    #[error("{0}")]
    QrNotReady(String),

    /// The connect response carried no recognizable QR payload.
    #[error("No QR code found in response")]
    NoQrCode,

    /// Pairing code could not be obtained or was rejected.
    #[error("{0}")]
    PairingCode(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Local store error.
    #[error("store error: {0}")]
    Store(String),

    /// A local record lookup came back empty.
    #[error("not found: {0}")]
    NotFound(String),

    /// Connection polling gave up before the device reported `open`.
    #[error("timed out after {0}s waiting for the device to connect")]
    LinkTimeout(u64),

    /// QR rendering or image decoding failed.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChapchapError {
    /// Whether a QR failure means the instance is still warming up.
    ///
    /// Older gateway builds only signal this through the message text.
    pub fn is_not_ready(&self) -> bool {
        if matches!(self, Self::QrNotReady(_)) {
            return true;
        }
        let msg = self.to_string();
        msg.contains("not ready") || msg.contains("count: 0")
    }
}
