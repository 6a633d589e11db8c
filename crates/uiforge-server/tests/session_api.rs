//! Session API integration tests over a real listener.

mod common;

use anyhow::Result;
use serde_json::{Value, json};

use common::{ALICE_TOKEN, BOB_TOKEN, TestServer};
use uiforge_session::SessionId;

#[tokio::test]
async fn test_health_returns_version() -> Result<()> {
    let server = TestServer::start().await?;

    let body: Value = server
        .client
        .get(format!("{}/health", server.base_url()))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["status"], "ok");
    assert!(body.get("version").is_some());

    server.stop().await
}

#[tokio::test]
async fn test_me_returns_token_user() -> Result<()> {
    let server = TestServer::start().await?;

    let body: Value = server.get(BOB_TOKEN, "/me").send().await?.json().await?;
    assert_eq!(body["userId"], "bob");

    server.stop().await
}

#[tokio::test]
async fn test_api_rejects_missing_and_invalid_auth() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server
        .client
        .get(format!("{}/api/v1/sessions", server.base_url()))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 401);

    let resp = server.get("wrong-token", "/sessions").send().await?;
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "unauthorized");

    server.stop().await
}

#[tokio::test]
async fn test_first_message_persists_session() -> Result<()> {
    let server = TestServer::start().await?;
    let id = server.create_draft(ALICE_TOKEN).await?;
    assert!(server.store.is_empty());

    let resp = server
        .put(ALICE_TOKEN, &format!("/sessions/{id}"))
        .json(&json!({
            "messages": [{"role": "user", "content": "make a button"}],
            "code": ""
        }))
        .send()
        .await?;
    assert!(resp.status().is_success());
    let body: Value = resp.json().await?;
    assert_eq!(body["session"]["isTemporary"], false);
    assert_eq!(body["session"]["messages"].as_array().map(Vec::len), Some(1));

    let body: Value = server
        .get(ALICE_TOKEN, &format!("/sessions/{id}"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["session"]["isTemporary"], false);
    assert_eq!(body["session"]["messages"][0]["content"], "make a button");

    let body: Value = server
        .get(ALICE_TOKEN, "/sessions")
        .send()
        .await?
        .json()
        .await?;
    let sessions = body["sessions"].as_array().cloned().unwrap_or_default();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["isTemporary"], true);
    assert_ne!(sessions[0]["id"], json!(id));
    assert_eq!(sessions[1]["id"], json!(id));

    assert!(server.store.contains(&SessionId::from(id.as_str())));

    server.stop().await
}

#[tokio::test]
async fn test_draft_edits_stay_out_of_store() -> Result<()> {
    let server = TestServer::start().await?;
    let id = server.create_draft(ALICE_TOKEN).await?;

    let resp = server
        .put(ALICE_TOKEN, &format!("/sessions/{id}"))
        .json(&json!({"code": "<div/>"}))
        .send()
        .await?;
    assert!(resp.status().is_success());
    assert!(server.store.is_empty());

    let body: Value = server
        .get(ALICE_TOKEN, &format!("/sessions/{id}"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["session"]["code"], "<div/>");

    let body: Value = server
        .get(ALICE_TOKEN, "/sessions")
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["sessions"].as_array().map(Vec::len), Some(1));

    server.stop().await
}

#[tokio::test]
async fn test_clearing_messages_removes_from_store() -> Result<()> {
    let server = TestServer::start().await?;
    let id = server.create_draft(ALICE_TOKEN).await?;
    let path = format!("/sessions/{id}");

    server
        .put(ALICE_TOKEN, &path)
        .json(&json!({"messages": [{"role": "user", "content": "hi"}]}))
        .send()
        .await?
        .error_for_status()?;
    assert_eq!(server.store.len(), 1);

    let body: Value = server
        .put(ALICE_TOKEN, &path)
        .json(&json!({"messages": []}))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(body["session"]["isTemporary"], true);
    assert!(server.store.is_empty());

    server.stop().await
}

#[tokio::test]
async fn test_users_cannot_see_each_other() -> Result<()> {
    let server = TestServer::start().await?;
    let id = server.create_draft(ALICE_TOKEN).await?;
    let path = format!("/sessions/{id}");

    server
        .put(ALICE_TOKEN, &path)
        .json(&json!({"messages": [{"role": "user", "content": "private"}]}))
        .send()
        .await?
        .error_for_status()?;

    assert_eq!(server.get(BOB_TOKEN, &path).send().await?.status().as_u16(), 404);
    assert_eq!(
        server
            .put(BOB_TOKEN, &path)
            .json(&json!({"messages": []}))
            .send()
            .await?
            .status()
            .as_u16(),
        404
    );
    assert_eq!(server.delete(BOB_TOKEN, &path).send().await?.status().as_u16(), 404);

    let body: Value = server.get(BOB_TOKEN, "/sessions").send().await?.json().await?;
    let sessions = body["sessions"].as_array().cloned().unwrap_or_default();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["ownerId"], "bob");

    assert_eq!(server.store.len(), 1);

    server.stop().await
}

#[tokio::test]
async fn test_delete_is_idempotent() -> Result<()> {
    let server = TestServer::start().await?;
    let id = server.create_draft(ALICE_TOKEN).await?;
    let path = format!("/sessions/{id}");

    server
        .put(ALICE_TOKEN, &path)
        .json(&json!({"messages": [{"role": "user", "content": "x"}]}))
        .send()
        .await?
        .error_for_status()?;

    for _ in 0..2 {
        let body: Value = server
            .delete(ALICE_TOKEN, &path)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        assert!(body["message"].is_string());
    }

    assert!(server.store.is_empty());
    assert!(server.cache.is_empty().await);
    assert_eq!(server.get(ALICE_TOKEN, &path).send().await?.status().as_u16(), 404);

    server.stop().await
}

#[tokio::test]
async fn test_malformed_update_is_400() -> Result<()> {
    let server = TestServer::start().await?;
    let id = server.create_draft(ALICE_TOKEN).await?;

    let resp = server
        .put(ALICE_TOKEN, &format!("/sessions/{id}"))
        .header("Content-Type", "application/json")
        .body("{\"messages\": \"not a list\"}")
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);

    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "bad_request");

    server.stop().await
}

#[tokio::test]
async fn test_client_messages_round_trip_unchanged() -> Result<()> {
    let server = TestServer::start().await?;
    let id = server.create_draft(ALICE_TOKEN).await?;
    let path = format!("/sessions/{id}");

    let messages = json!([
        {
            "id": 1700000000000_u64,
            "type": "user",
            "content": "make a button",
            "timestamp": "10:23:45 AM",
            "image": null
        },
        {
            "id": 1700000000001_u64,
            "type": "ai",
            "content": "Here you go",
            "timestamp": "10:23:47 AM",
            "codeBlocks": [{"language": "jsx", "code": "<button>Go</button>"}]
        }
    ]);

    let body: Value = server
        .put(ALICE_TOKEN, &path)
        .json(&json!({"messages": messages, "code": "<button>Go</button>"}))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(body["session"]["isTemporary"], false);
    assert_eq!(body["session"]["name"], "make a button");
    assert_eq!(body["session"]["messages"], messages);

    let body: Value = server
        .get(ALICE_TOKEN, &path)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(body["session"]["messages"], messages);
    assert!(server.store.contains(&SessionId::from(id.as_str())));

    server.stop().await
}

#[tokio::test]
async fn test_delete_unscoped_id_succeeds() -> Result<()> {
    let server = TestServer::start().await?;

    let body: Value = server
        .delete(ALICE_TOKEN, "/sessions/work_1700000000")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(body["message"], "Session deleted");

    server.stop().await
}
