//! Scripted in-process gateway for tests.

use async_trait::async_trait;
use chapchap_core::{
    error::ChapchapError,
    traits::Gateway,
    types::{ConnectionStatus, CreatedInstance, QrCode},
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeGateway {
    pub create_error: Option<u16>,
    pub create_qr: Option<QrCode>,
    /// Popped per `fetch_qr` call. Empty = `NoQrCode`.
    pub qr_results: Mutex<VecDeque<Result<QrCode, ChapchapError>>>,
    /// Popped per state poll. The last one sticks; empty = `Close`.
    pub states: Mutex<VecDeque<ConnectionStatus>>,
    pub pairing: Mutex<Option<Result<String, ChapchapError>>>,
    pub logout_error: bool,
    pub created: Mutex<Vec<(String, String)>>,
    pub logged_out: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<(String, String, String)>>,
    pub pairing_requests: Mutex<Vec<(String, String)>>,
    pub qr_calls: AtomicU32,
    pub state_calls: AtomicU32,
}

pub fn qr(tag: &str) -> QrCode {
    QrCode {
        data_uri: format!("data:image/png;base64,{tag}"),
        raw: None,
    }
}

impl FakeGateway {
    pub fn with_qr_results(results: Vec<Result<QrCode, ChapchapError>>) -> Self {
        Self {
            qr_results: Mutex::new(results.into()),
            ..Default::default()
        }
    }

    pub fn with_states(states: Vec<ConnectionStatus>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            ..Default::default()
        }
    }

    pub fn qr_calls(&self) -> u32 {
        self.qr_calls.load(Ordering::SeqCst)
    }

    pub fn state_calls(&self) -> u32 {
        self.state_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn create_instance(
        &self,
        instance_name: &str,
        token: &str,
    ) -> Result<CreatedInstance, ChapchapError> {
        if let Some(status) = self.create_error {
            return Err(ChapchapError::Api {
                status,
                body: "create refused".to_string(),
            });
        }
        self.created
            .lock()
            .unwrap()
            .push((instance_name.to_string(), token.to_string()));
        Ok(CreatedInstance {
            qr: self.create_qr.clone(),
            raw: serde_json::json!({ "instance": { "instanceName": instance_name } }),
        })
    }

    async fn fetch_qr(&self, _instance_name: &str) -> Result<QrCode, ChapchapError> {
        self.qr_calls.fetch_add(1, Ordering::SeqCst);
        self.qr_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ChapchapError::NoQrCode))
    }

    async fn pairing_code(
        &self,
        instance_name: &str,
        number: &str,
    ) -> Result<String, ChapchapError> {
        self.pairing_requests
            .lock()
            .unwrap()
            .push((instance_name.to_string(), number.to_string()));
        self.pairing
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok("ABCD1234".to_string()))
    }

    async fn connection_state(&self, _instance_name: &str) -> ConnectionStatus {
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        let mut states = self.states.lock().unwrap();
        if states.len() > 1 {
            states.pop_front().unwrap_or_default()
        } else {
            states.front().copied().unwrap_or_default()
        }
    }

    async fn logout(&self, instance_name: &str) -> Result<(), ChapchapError> {
        self.logged_out
            .lock()
            .unwrap()
            .push(instance_name.to_string());
        if self.logout_error {
            return Err(ChapchapError::Gateway("connection refused".to_string()));
        }
        Ok(())
    }

    async fn send_text(
        &self,
        instance_name: &str,
        number: &str,
        text: &str,
    ) -> Result<serde_json::Value, ChapchapError> {
        self.sent.lock().unwrap().push((
            instance_name.to_string(),
            number.to_string(),
            text.to_string(),
        ));
        Ok(serde_json::json!({ "key": { "id": "MSG1" } }))
    }
}
