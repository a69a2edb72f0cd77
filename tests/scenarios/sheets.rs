//! Character sheet scenarios
//!
//! Stats, adjustments, rest and status effects over HTTP

use serde_json::json;

use crate::harness::TestServer;

/// Test: set stats fills every pool but IP
#[tokio::test]
async fn test_set_stats_refills() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_named("alice", "Alice");

    let sheet = alice.set_stats("Brannoc", 30, 12, 5).await.unwrap();
    assert_eq!(sheet["character_name"], "Brannoc");
    assert_eq!(sheet["display_name"], "Alice");
    assert_eq!(sheet["hp"]["current"], 30);
    assert_eq!(sheet["hp"]["max"], 30);
    assert_eq!(sheet["mp"]["current"], 12);
    assert_eq!(sheet["armor"]["current"], 2);
    assert_eq!(sheet["ip"]["current"], 0);
    assert_eq!(sheet["ip"]["max"], 5);
}

/// Test: damage past zero is kept, healing past max is kept
#[tokio::test]
async fn test_adjust_is_unclamped() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");
    alice.set_stats("Brannoc", 10, 4, 3).await.unwrap();

    let change = alice
        .post_ok("/players/alice/adjust", &json!({"kind": "hp", "amount": -15}))
        .await
        .unwrap();
    assert_eq!(change["before"], 10);
    assert_eq!(change["after"], -5);
    assert_eq!(change["max"], 10);

    let change = alice
        .post_ok("/players/alice/adjust", &json!({"kind": "hp", "amount": 20}))
        .await
        .unwrap();
    assert_eq!(change["after"], 15);
}

/// Test: "full" and "zero" set the pool outright
#[tokio::test]
async fn test_adjust_full_and_zero() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");
    alice.set_stats("Brannoc", 10, 4, 3).await.unwrap();

    let change = alice
        .post_ok("/players/alice/adjust", &json!({"kind": "ip", "amount": "full"}))
        .await
        .unwrap();
    assert_eq!(change["after"], 3);

    let change = alice
        .post_ok("/players/alice/adjust", &json!({"kind": "MP", "amount": "zero"}))
        .await
        .unwrap();
    assert_eq!(change["before"], 4);
    assert_eq!(change["after"], 0);
}

/// Test: a player with no sheet is created on first adjustment
#[tokio::test]
async fn test_adjust_creates_sheet() {
    let server = TestServer::start().await.expect("Failed to start server");
    let bob = server.client_named("bob", "Bob");

    let change = bob
        .post_ok("/players/bob/adjust", &json!({"kind": "barrier", "amount": 2}))
        .await
        .unwrap();
    assert_eq!(change["before"], 0);
    assert_eq!(change["after"], 2);

    let sheet = bob.get_ok("/players/bob").await.unwrap();
    assert_eq!(sheet["display_name"], "Bob");
    assert_eq!(sheet["barrier"]["current"], 2);
}

/// Test: unknown resource names are rejected
#[tokio::test]
async fn test_adjust_rejects_unknown_resource() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");

    let resp = alice
        .post("/players/alice/adjust", &json!({"kind": "stamina", "amount": 1}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_input");
}

/// Test: rest restores everything except IP
#[tokio::test]
async fn test_rest_skips_ip() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");
    alice.set_stats("Brannoc", 10, 4, 3).await.unwrap();

    alice
        .post_ok("/players/alice/adjust", &json!({"kind": "hp", "amount": -7}))
        .await
        .unwrap();
    alice
        .post_ok("/players/alice/adjust", &json!({"kind": "ip", "amount": 2}))
        .await
        .unwrap();

    let changes = alice.post_ok("/players/alice/rest", &json!({})).await.unwrap();
    let kinds: Vec<&str> = changes
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["kind"].as_str().unwrap())
        .collect();
    assert!(!kinds.contains(&"ip"));

    let sheet = alice.get_ok("/players/alice").await.unwrap();
    assert_eq!(sheet["hp"]["current"], 10);
    assert_eq!(sheet["ip"]["current"], 2);
}

/// Test: statuses tick down on the owner's turn and expire at zero
#[tokio::test]
async fn test_status_lifecycle() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");
    alice.set_stats("Brannoc", 10, 4, 3).await.unwrap();

    let resp = alice
        .put("/players/alice/status", &json!({"name": "Bleed", "duration": 2}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["updated"], false);

    // Same name, different case: replaces the duration
    let resp = alice
        .put("/players/alice/status", &json!({"name": "bleed", "duration": 3}))
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["updated"], true);

    let report = alice.post_ok("/players/alice/turn", &json!({})).await.unwrap();
    assert_eq!(report["remaining"][0]["remaining"], 2);
    alice.post_ok("/players/alice/turn", &json!({})).await.unwrap();
    let report = alice.post_ok("/players/alice/turn", &json!({})).await.unwrap();
    assert_eq!(report["expired"][0]["name"], "Bleed");
    assert!(report["remaining"].as_array().unwrap().is_empty());
}

/// Test: removing a status that is not there is a 404
#[tokio::test]
async fn test_remove_status() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");
    alice.set_stats("Brannoc", 10, 4, 3).await.unwrap();
    alice
        .put("/players/alice/status", &json!({"name": "Haste", "duration": 2}))
        .await
        .unwrap();

    let resp = alice.delete("/players/alice/status/haste").await.unwrap();
    assert_eq!(resp.status(), 204);

    let resp = alice.delete("/players/alice/status/haste").await.unwrap();
    assert_eq!(resp.status(), 404);
}

/// Test: deleting a sheet makes it unknown
#[tokio::test]
async fn test_delete_player() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");
    alice.set_stats("Brannoc", 10, 4, 3).await.unwrap();

    let resp = alice.delete("/players/alice").await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = alice.get("/players/alice").await.unwrap();
    assert_eq!(resp.status(), 404);
}
