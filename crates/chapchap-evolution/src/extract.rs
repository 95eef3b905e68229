//! Normalization of the response shapes the Evolution API returns.
//!
//! Depending on the gateway version the interesting fields sit at the top
//! level or inside a `response` wrapper, and QR payloads arrive either as a
//! bare string, under `base64`, or under `qrcode` (string or object).

use chapchap_core::{
    error::ChapchapError,
    types::{ConnectionStatus, QrCode},
};
use serde_json::Value;

/// Prefix of raw QR reference tokens. Never a valid pairing code.
pub const QR_REF_PREFIX: &str = "2@";

/// Genuine pairing codes are around 8 characters; anything this long is not one.
const MAX_PAIRING_CODE_LEN: usize = 20;

/// A bare string only counts as a QR payload past this length.
const MIN_BARE_QR_LEN: usize = 50;

const DATA_URI_PREFIX: &str = "data:image";
const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

pub(crate) const NOT_READY_MESSAGE: &str = "Instance not ready to generate QR";
const QR_INSTEAD_OF_PAIRING: &str =
    "API returned QR code string instead of Pairing Code. Please try again.";
const NO_PAIRING_CODE: &str = "API did not return a pairing code. Ensure the number is correct.";

/// Non-empty string field.
fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn wrapped(value: &Value) -> Option<&Value> {
    value.get("response").filter(|v| !v.is_null())
}

fn base64_in(value: &Value) -> Option<String> {
    if let Some(s) = value.as_str() {
        return (s.len() > MIN_BARE_QR_LEN).then(|| s.to_string());
    }
    if let Some(b64) = str_field(value, "base64") {
        return Some(b64.to_string());
    }
    match value.get("qrcode") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(qr) => str_field(qr, "base64").map(str::to_string),
        None => None,
    }
}

/// Find a base64 QR image anywhere the gateway is known to put one.
pub fn extract_base64(data: &Value) -> Option<String> {
    base64_in(data).or_else(|| wrapped(data).and_then(base64_in))
}

/// Prefix a bare base64 payload so it is a usable data URI.
pub fn to_data_uri(base64: &str) -> String {
    if base64.starts_with(DATA_URI_PREFIX) {
        base64.to_string()
    } else {
        format!("{PNG_DATA_URI_PREFIX}{base64}")
    }
}

/// Raw QR payload (`2@...`) if the response carries one under `code`.
pub fn extract_qr_ref(data: &Value) -> Option<String> {
    str_field(data, "code")
        .or_else(|| wrapped(data).and_then(|r| str_field(r, "code")))
        .filter(|code| code.starts_with(QR_REF_PREFIX))
        .map(str::to_string)
}

/// QR code embedded in an instance-create response.
///
/// Only the `qrcode.base64` and `base64` fields are trusted here.
pub fn qr_from_create_response(res: &Value) -> Option<QrCode> {
    let pick = |v: &Value| {
        v.get("qrcode")
            .and_then(|qr| str_field(qr, "base64"))
            .or_else(|| str_field(v, "base64"))
            .map(str::to_string)
    };
    let base64 = pick(res).or_else(|| wrapped(res).and_then(pick))?;
    Some(QrCode {
        data_uri: to_data_uri(&base64),
        raw: extract_qr_ref(res),
    })
}

/// QR code from a `/instance/connect` response.
pub fn qr_from_connect_response(res: &Value) -> Result<QrCode, ChapchapError> {
    if res.get("count").and_then(Value::as_i64) == Some(0) {
        return Err(ChapchapError::QrNotReady(NOT_READY_MESSAGE.to_string()));
    }

    match extract_base64(res) {
        Some(base64) => Ok(QrCode {
            data_uri: to_data_uri(&base64),
            raw: extract_qr_ref(res),
        }),
        None => {
            tracing::error!(
                "connect response structure mismatch: {}",
                serde_json::to_string_pretty(res).unwrap_or_default()
            );
            Err(ChapchapError::NoQrCode)
        }
    }
}

/// Pairing code from a `/instance/connect?number=` response.
///
/// `code` is ambiguous (it usually holds the QR reference), so it is only
/// used as a fallback when it is short and not a QR token.
pub fn pairing_code_from_response(res: &Value) -> Result<String, ChapchapError> {
    fn direct(v: &Value) -> Option<&str> {
        str_field(v, "pairingCode").or_else(|| str_field(v, "pCode"))
    }

    let code = direct(res)
        .or_else(|| wrapped(res).and_then(direct))
        .or_else(|| {
            str_field(res, "code")
                .or_else(|| wrapped(res).and_then(|r| str_field(r, "code")))
                .filter(|c| !c.starts_with(QR_REF_PREFIX) && c.len() < MAX_PAIRING_CODE_LEN)
        });

    match code {
        Some(code) if code.starts_with(QR_REF_PREFIX) => {
            Err(ChapchapError::PairingCode(QR_INSTEAD_OF_PAIRING.to_string()))
        }
        Some(code) => Ok(code.to_string()),
        None => {
            tracing::error!("pairing code response: {res}");
            Err(ChapchapError::PairingCode(NO_PAIRING_CODE.to_string()))
        }
    }
}

/// Connection state from a `/instance/connectionState` response.
pub fn state_from_response(res: &Value) -> ConnectionStatus {
    fn state(v: &Value) -> Option<&str> {
        v.get("instance").and_then(|i| str_field(i, "state"))
    }

    state(res)
        .or_else(|| wrapped(res).and_then(state))
        .map(ConnectionStatus::from_gateway)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn long_b64() -> String {
        "iVBORw0KGgo".repeat(8)
    }

    #[test]
    fn test_base64_top_level_fields() {
        let b64 = long_b64();
        assert_eq!(extract_base64(&json!({ "base64": b64 })), Some(b64.clone()));
        assert_eq!(extract_base64(&json!({ "qrcode": b64 })), Some(b64.clone()));
        assert_eq!(
            extract_base64(&json!({ "qrcode": { "base64": b64 } })),
            Some(b64.clone())
        );
    }

    #[test]
    fn test_base64_inside_response_wrapper() {
        let b64 = long_b64();
        assert_eq!(
            extract_base64(&json!({ "response": { "qrcode": { "base64": b64 } } })),
            Some(b64.clone())
        );
        assert_eq!(
            extract_base64(&json!({ "response": b64.clone() })),
            Some(b64)
        );
    }

    #[test]
    fn test_bare_string_must_be_long() {
        assert_eq!(extract_base64(&json!("short")), None);
        assert_eq!(extract_base64(&json!({ "response": "short" })), None);
        let b64 = long_b64();
        assert_eq!(extract_base64(&json!(b64.clone())), Some(b64));
    }

    #[test]
    fn test_data_uri_prefix() {
        assert_eq!(to_data_uri("abc"), "data:image/png;base64,abc");
        assert_eq!(
            to_data_uri("data:image/jpeg;base64,abc"),
            "data:image/jpeg;base64,abc"
        );
    }

    #[test]
    fn test_connect_count_zero_is_not_ready() {
        let err = qr_from_connect_response(&json!({ "count": 0 })).unwrap_err();
        assert!(matches!(err, ChapchapError::QrNotReady(_)));
        assert!(err.is_not_ready());
    }

    #[test]
    fn test_connect_without_qr() {
        let err = qr_from_connect_response(&json!({ "instance": {} })).unwrap_err();
        assert!(matches!(err, ChapchapError::NoQrCode));
        assert!(!err.is_not_ready());
    }

    #[test]
    fn test_connect_captures_raw_code() {
        let res = json!({
            "pairingCode": null,
            "code": "2@abcdef,xyz,123",
            "base64": "data:image/png;base64,AAAA",
            "count": 1
        });
        let qr = qr_from_connect_response(&res).unwrap();
        assert_eq!(qr.data_uri, "data:image/png;base64,AAAA");
        assert_eq!(qr.raw.as_deref(), Some("2@abcdef,xyz,123"));
    }

    #[test]
    fn test_create_response_qr() {
        let res = json!({
            "instance": { "instanceName": "x" },
            "qrcode": { "base64": "AAAA" }
        });
        let qr = qr_from_create_response(&res).unwrap();
        assert_eq!(qr.data_uri, "data:image/png;base64,AAAA");

        let nested = json!({ "response": { "base64": "data:image/png;base64,BBBB" } });
        assert_eq!(
            qr_from_create_response(&nested).unwrap().data_uri,
            "data:image/png;base64,BBBB"
        );

        assert!(qr_from_create_response(&json!({ "instance": {} })).is_none());
    }

    #[test]
    fn test_pairing_code_preferred_fields() {
        assert_eq!(
            pairing_code_from_response(&json!({ "pairingCode": "WX3ZK9QP", "code": "2@x" }))
                .unwrap(),
            "WX3ZK9QP"
        );
        assert_eq!(
            pairing_code_from_response(&json!({ "response": { "pCode": "ABCD1234" } })).unwrap(),
            "ABCD1234"
        );
    }

    #[test]
    fn test_pairing_code_fallback_to_short_code() {
        assert_eq!(
            pairing_code_from_response(&json!({ "code": "ABCD1234" })).unwrap(),
            "ABCD1234"
        );
        assert_eq!(
            pairing_code_from_response(&json!({ "response": { "code": "EFGH5678" } })).unwrap(),
            "EFGH5678"
        );
    }

    #[test]
    fn test_pairing_code_rejects_qr_reference() {
        let err = pairing_code_from_response(&json!({ "code": "2@short" })).unwrap_err();
        assert!(err.to_string().contains("did not return a pairing code"));

        let err = pairing_code_from_response(&json!({ "pairingCode": "2@Zk9xQ,abc" })).unwrap_err();
        assert!(err.to_string().contains("QR code string instead of Pairing Code"));
    }

    #[test]
    fn test_pairing_code_rejects_long_code() {
        let err =
            pairing_code_from_response(&json!({ "code": "ABCDEFGHIJKLMNOPQRSTUV" })).unwrap_err();
        assert!(matches!(err, ChapchapError::PairingCode(_)));
    }

    #[test]
    fn test_state_shapes() {
        assert_eq!(
            state_from_response(&json!({ "instance": { "state": "open" } })),
            ConnectionStatus::Open
        );
        assert_eq!(
            state_from_response(&json!({ "response": { "instance": { "state": "connecting" } } })),
            ConnectionStatus::Connecting
        );
        assert_eq!(state_from_response(&json!({})), ConnectionStatus::Close);
        assert_eq!(
            state_from_response(&json!({ "instance": { "state": "refused" } })),
            ConnectionStatus::Close
        );
    }
}
