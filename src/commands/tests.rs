use super::dashboard::{delete_instance, send_message, sync_statuses};
use super::details::refresh_status;
use super::{require_session, resolve_instance, status_badge};
use crate::test_support::FakeGateway;
use chapchap_core::types::{ConnectionStatus, Instance};
use chapchap_store::Store;

fn instance(id: &str, name: &str, status: ConnectionStatus, created_at: i64) -> Instance {
    Instance {
        id: id.to_string(),
        name: name.to_string(),
        evo_instance_name: format!("evo-{id}"),
        evo_auth_token: format!("tok-{id}"),
        status,
        phone: Some("254700000001".to_string()),
        profile_pic_url: None,
        created_at: Some(created_at),
    }
}

async fn store_with(instances: &[Instance]) -> Store {
    let store = Store::in_memory().await.unwrap();
    for inst in instances {
        assert!(store.add_instance(inst).await.unwrap());
    }
    store
}

// --- session ---

#[tokio::test]
async fn test_require_session() {
    let store = Store::in_memory().await.unwrap();
    let err = require_session(&store).await.unwrap_err();
    assert!(err.to_string().contains("not logged in"));

    store.login("ops@example.com", None).await.unwrap();
    let user = require_session(&store).await.unwrap();
    assert_eq!(user.email, "ops@example.com");
}

#[tokio::test]
async fn test_resolve_instance_unknown() {
    let store = Store::in_memory().await.unwrap();
    let err = resolve_instance(&store, "nope").await.unwrap_err();
    assert_eq!(err.to_string(), "Instance not found: nope");
}

// --- dashboard ---

#[tokio::test]
async fn test_sync_statuses_persists_changes() {
    let store = store_with(&[instance("a1", "Sales", ConnectionStatus::Close, 1)]).await;
    let gw = FakeGateway::with_states(vec![ConnectionStatus::Open]);

    let synced = sync_statuses(&gw, &store).await.unwrap();
    assert_eq!(synced.len(), 1);
    assert_eq!(synced[0].status, ConnectionStatus::Open);
    assert_eq!(gw.state_calls(), 1);

    let stored = store.instance("a1").await.unwrap().unwrap();
    assert_eq!(stored.status, ConnectionStatus::Open);
    assert_eq!(stored.phone.as_deref(), Some("254700000001"));
}

#[tokio::test]
async fn test_sync_statuses_checks_every_instance() {
    let store = store_with(&[
        instance("a1", "Sales", ConnectionStatus::Open, 1),
        instance("b2", "Support", ConnectionStatus::Open, 2),
    ])
    .await;
    // Empty script: every poll reports close.
    let gw = FakeGateway::default();

    let synced = sync_statuses(&gw, &store).await.unwrap();
    assert_eq!(gw.state_calls(), 2);
    assert!(synced.iter().all(|i| i.status == ConnectionStatus::Close));
    assert_eq!(synced[0].name, "Sales");
    assert_eq!(synced[1].name, "Support");
}

#[tokio::test]
async fn test_sync_statuses_empty_store() {
    let store = Store::in_memory().await.unwrap();
    let gw = FakeGateway::default();
    assert!(sync_statuses(&gw, &store).await.unwrap().is_empty());
    assert_eq!(gw.state_calls(), 0);
}

#[tokio::test]
async fn test_send_message_cleans_number() {
    let store = store_with(&[instance("a1", "Sales", ConnectionStatus::Open, 1)]).await;
    let gw = FakeGateway::default();

    let (inst, res) = send_message(&gw, &store, "Sales", "+254 712-345 678", "hello")
        .await
        .unwrap();
    assert_eq!(inst.id, "a1");
    assert_eq!(res["key"]["id"], "MSG1");

    let sent = gw.sent.lock().unwrap();
    assert_eq!(
        sent.as_slice(),
        &[(
            "evo-a1".to_string(),
            "254712345678".to_string(),
            "hello".to_string()
        )]
    );
}

#[tokio::test]
async fn test_send_message_requires_open_instance() {
    let store = store_with(&[instance("a1", "Sales", ConnectionStatus::Connecting, 1)]).await;
    let gw = FakeGateway::default();

    let err = send_message(&gw, &store, "a1", "254712345678", "hello")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not connected"));
    assert!(gw.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_message_rejects_blank_input() {
    let store = store_with(&[instance("a1", "Sales", ConnectionStatus::Open, 1)]).await;
    let gw = FakeGateway::default();

    let err = send_message(&gw, &store, "a1", "  +  ", "hello")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("phone number"));

    let err = send_message(&gw, &store, "a1", "254712345678", "   ")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("text"));
    assert!(gw.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_instance_logs_out_and_removes() {
    let inst = instance("a1", "Sales", ConnectionStatus::Open, 1);
    let store = store_with(std::slice::from_ref(&inst)).await;
    let gw = FakeGateway::default();

    assert!(delete_instance(&gw, &store, &inst).await.unwrap());
    assert_eq!(gw.logged_out.lock().unwrap().as_slice(), &["evo-a1".to_string()]);
    assert!(store.instance("a1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_instance_removes_locally_when_logout_fails() {
    let inst = instance("a1", "Sales", ConnectionStatus::Open, 1);
    let store = store_with(std::slice::from_ref(&inst)).await;
    let gw = FakeGateway {
        logout_error: true,
        ..Default::default()
    };

    assert!(delete_instance(&gw, &store, &inst).await.unwrap());
    assert!(store.instances().await.unwrap().is_empty());
}

// --- details ---

#[tokio::test]
async fn test_refresh_status() {
    let inst = instance("a1", "Sales", ConnectionStatus::Open, 1);
    let store = store_with(std::slice::from_ref(&inst)).await;
    let gw = FakeGateway::with_states(vec![ConnectionStatus::Connecting]);

    let refreshed = refresh_status(&gw, &store, inst).await.unwrap();
    assert_eq!(refreshed.status, ConnectionStatus::Connecting);
    let stored = store.instance("a1").await.unwrap().unwrap();
    assert_eq!(stored.status, ConnectionStatus::Connecting);
}

#[test]
fn test_status_badge_labels() {
    console::set_colors_enabled(false);
    assert_eq!(status_badge(ConnectionStatus::Open, "Offline", 0), "● Live");
    assert_eq!(
        status_badge(ConnectionStatus::Close, "Offline", 0),
        "● Offline"
    );
    assert_eq!(
        status_badge(ConnectionStatus::Connecting, "Connecting", 14),
        "● Connecting  "
    );
}
