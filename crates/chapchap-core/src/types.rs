//! Domain records shared by the gateway client, the store and the front-end.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Session marker. There is no real authentication behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Connection state of a remote instance as reported by the gateway.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Open,
    Connecting,
    #[default]
    Close,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Connecting => "connecting",
            Self::Close => "close",
            Self::Disconnected => "disconnected",
        }
    }

    /// Lenient parse: anything the gateway reports that we do not know is `close`.
    pub fn from_gateway(state: &str) -> Self {
        state.parse().unwrap_or_default()
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "connecting" => Ok(Self::Connecting),
            "close" => Ok(Self::Close),
            "disconnected" => Ok(Self::Disconnected),
            other => Err(format!("unknown connection status: {other}")),
        }
    }
}

/// A linked WhatsApp instance as tracked locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Local identifier.
    pub id: String,
    /// Friendly name chosen by the user.
    pub name: String,
    /// Remote identifier on the gateway. Unique across local records.
    pub evo_instance_name: String,
    pub evo_auth_token: String,
    pub status: ConnectionStatus,
    pub phone: Option<String>,
    pub profile_pic_url: Option<String>,
    /// Epoch milliseconds. Filled in by the store when absent.
    pub created_at: Option<i64>,
}

/// A QR code ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCode {
    /// Always starts with `data:image`.
    pub data_uri: String,
    /// Raw QR payload (`2@...`) when the gateway sent one along.
    pub raw: Option<String>,
}

/// Result of creating a remote instance.
#[derive(Debug, Clone)]
pub struct CreatedInstance {
    /// QR code included in the create response, if any.
    pub qr: Option<QrCode>,
    pub raw: serde_json::Value,
}

/// How the user links their phone.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LinkMethod {
    #[default]
    Qr,
    Pairing,
}
