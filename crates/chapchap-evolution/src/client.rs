//! HTTP client for the Evolution API.

use crate::extract;
use async_trait::async_trait;
use chapchap_core::{
    config::{GatewayConfig, MessagingConfig},
    error::ChapchapError,
    format::clean_number,
    traits::Gateway,
    types::{ConnectionStatus, CreatedInstance, QrCode},
};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Evolution API gateway.
pub struct EvolutionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    integration: String,
    messaging: MessagingConfig,
}

impl EvolutionClient {
    /// Create from config values.
    pub fn from_config(
        gateway: &GatewayConfig,
        messaging: &MessagingConfig,
    ) -> Result<Self, ChapchapError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(gateway.request_timeout_secs))
            .build()
            .map_err(|e| ChapchapError::Gateway(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            base_url: gateway.base_url.trim_end_matches('/').to_string(),
            api_key: gateway.api_key.clone(),
            integration: gateway.integration.clone(),
            messaging: messaging.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send an authenticated request and decode the JSON body.
    ///
    /// An empty success body decodes to `Value::Null`.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, ChapchapError> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!("evolution: {method} {url}");

        let mut req = self
            .client
            .request(method, &url)
            .header("apikey", &self.api_key)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await.map_err(|e| {
            error!("evolution network error [{endpoint}]: {e}");
            ChapchapError::Gateway(format!("request to {endpoint} failed: {e}"))
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            ChapchapError::Gateway(format!("failed to read response from {endpoint}: {e}"))
        });
        decode_response(endpoint, status, text)
    }

    /// Whether the gateway answers at all.
    pub async fn is_reachable(&self) -> bool {
        match self.request(Method::GET, "/", None).await {
            Ok(_) => true,
            Err(e) => {
                warn!("evolution: gateway not reachable: {e}");
                false
            }
        }
    }
}

/// Turn a status and a (possibly failed) body read into a JSON value.
///
/// Non-2xx becomes `Api`; an empty success body is `Value::Null`.
fn decode_response(
    endpoint: &str,
    status: StatusCode,
    text: Result<String, ChapchapError>,
) -> Result<Value, ChapchapError> {
    if !status.is_success() {
        let text = text.unwrap_or_default();
        error!("evolution API error [{}] {endpoint}: {text}", status.as_u16());
        let reason = status.canonical_reason().unwrap_or_default();
        let body = [reason, text.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" - ");
        return Err(ChapchapError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let text = text.map_err(|e| {
        error!("evolution: {e}");
        e
    })?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text).map_err(|e| {
        error!("evolution: unparseable body from {endpoint}: {e}");
        ChapchapError::Gateway(format!("failed to parse response from {endpoint}: {e}"))
    })
}

#[async_trait]
impl Gateway for EvolutionClient {
    async fn create_instance(
        &self,
        instance_name: &str,
        token: &str,
    ) -> Result<CreatedInstance, ChapchapError> {
        let body = json!({
            "instanceName": instance_name,
            "token": token,
            "qrcode": true,
            "integration": self.integration,
        });
        let raw = self
            .request(Method::POST, "/instance/create", Some(body))
            .await?;
        Ok(CreatedInstance {
            qr: extract::qr_from_create_response(&raw),
            raw,
        })
    }

    async fn fetch_qr(&self, instance_name: &str) -> Result<QrCode, ChapchapError> {
        let res = self
            .request(
                Method::GET,
                &format!("/instance/connect/{instance_name}"),
                None,
            )
            .await?;
        extract::qr_from_connect_response(&res)
    }

    async fn pairing_code(
        &self,
        instance_name: &str,
        number: &str,
    ) -> Result<String, ChapchapError> {
        let number = clean_number(number);
        let res = self
            .request(
                Method::GET,
                &format!("/instance/connect/{instance_name}?number={number}"),
                None,
            )
            .await?;
        extract::pairing_code_from_response(&res)
    }

    async fn connection_state(&self, instance_name: &str) -> ConnectionStatus {
        match self
            .request(
                Method::GET,
                &format!("/instance/connectionState/{instance_name}"),
                None,
            )
            .await
        {
            Ok(res) => extract::state_from_response(&res),
            Err(e) => {
                debug!("evolution: state check for {instance_name} failed, assuming close: {e}");
                ConnectionStatus::Close
            }
        }
    }

    async fn logout(&self, instance_name: &str) -> Result<(), ChapchapError> {
        self.request(
            Method::DELETE,
            &format!("/instance/logout/{instance_name}"),
            None,
        )
        .await?;
        Ok(())
    }

    async fn send_text(
        &self,
        instance_name: &str,
        number: &str,
        text: &str,
    ) -> Result<Value, ChapchapError> {
        let body = json!({
            "number": number,
            "options": {
                "delay": self.messaging.delay_ms,
                "presence": self.messaging.presence,
            },
            "textMessage": {
                "text": text,
            },
        });
        self.request(
            Method::POST,
            &format!("/message/send/text/{instance_name}"),
            Some(body),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_response_body_read_failure_is_an_error() {
        let read_err = Err(ChapchapError::Gateway("connection reset".to_string()));
        let err =
            decode_response("/message/send/text/x", StatusCode::CREATED, read_err).unwrap_err();
        assert!(matches!(err, ChapchapError::Gateway(ref m) if m.contains("connection reset")));
    }

    #[test]
    fn test_decode_response_error_status_without_body() {
        let read_err = Err(ChapchapError::Gateway("connection reset".to_string()));
        let err =
            decode_response("/instance/create", StatusCode::FORBIDDEN, read_err).unwrap_err();
        assert_eq!(err.to_string(), "API Request Failed: 403 - Forbidden");
    }

    #[test]
    fn test_decode_response_empty_success_is_null() {
        let value =
            decode_response("/instance/logout/x", StatusCode::OK, Ok("  ".to_string())).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_decode_response_api_error_joins_reason_and_body() {
        let err = decode_response(
            "/instance/create",
            StatusCode::BAD_REQUEST,
            Ok("{\"error\":\"name taken\"}".to_string()),
        )
        .unwrap_err();
        match err {
            ChapchapError::Api { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "Bad Request - {\"error\":\"name taken\"}");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
