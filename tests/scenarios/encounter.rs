//! Encounter roster scenarios

use serde_json::json;

use crate::harness::TestServer;

/// Test: listing reflects each roster state
#[tokio::test]
async fn test_roster_states() {
    let server = TestServer::start().await.expect("Failed to start server");
    let gm = server.gm();
    let alice = server.client_as("alice");
    alice.set_stats("Brannoc", 20, 5, 2).await.unwrap();

    let view = alice.get_ok("/encounter").await.unwrap();
    assert_eq!(view["status"], "no_active_encounter");

    gm.post_ok("/encounter/start", &json!({})).await.unwrap();
    let view = alice.get_ok("/encounter").await.unwrap();
    assert_eq!(view["status"], "no_combatants");

    alice
        .post_ok("/encounter/combatants", &json!({"ids": ["alice"]}))
        .await
        .unwrap();
    let view = alice.get_ok("/encounter").await.unwrap();
    assert_eq!(view["status"], "combatants");
    assert_eq!(view["combatants"][0]["name"], "Brannoc");
    assert_eq!(view["combatants"][0]["hp"], json!([20, 20]));

    gm.post_ok("/encounter/end", &json!({})).await.unwrap();
    let view = alice.get_ok("/encounter").await.unwrap();
    assert_eq!(view["status"], "no_active_encounter");
}

/// Test: unknown and duplicate ids are skipped, order is kept
#[tokio::test]
async fn test_add_skips_unknown_and_duplicates() {
    let server = TestServer::start().await.expect("Failed to start server");
    let gm = server.gm();
    server.client_as("alice").set_stats("Brannoc", 20, 5, 2).await.unwrap();
    server.client_as("bob").set_stats("Ysolde", 14, 9, 1).await.unwrap();
    gm.post_ok("/encounter/start", &json!({})).await.unwrap();

    let change = gm
        .post_ok("/encounter/combatants", &json!({"ids": ["bob", "ghost", "alice", "bob"]}))
        .await
        .unwrap();
    assert_eq!(change["applied"], json!(["bob", "alice"]));
    assert_eq!(change["skipped"][0], json!(["ghost", "unknown_player"]));
    assert_eq!(change["skipped"][1], json!(["bob", "already_present"]));

    let view = gm.get_ok("/encounter").await.unwrap();
    let ids: Vec<&str> = view["combatants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["bob", "alice"]);
}

/// Test: removing reports ids that were not on the roster
#[tokio::test]
async fn test_remove_combatants() {
    let server = TestServer::start().await.expect("Failed to start server");
    let gm = server.gm();
    server.client_as("alice").set_stats("Brannoc", 20, 5, 2).await.unwrap();
    gm.post_ok("/encounter/start", &json!({})).await.unwrap();
    gm.post_ok("/encounter/combatants", &json!({"ids": ["alice"]}))
        .await
        .unwrap();

    let resp = gm
        .delete_json("/encounter/combatants", &json!({"ids": ["alice", "bob"]}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let change: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(change["applied"], json!(["alice"]));
    assert_eq!(change["skipped"][0], json!(["bob", "not_present"]));
}

/// Test: roster edits need an active encounter; starting twice conflicts
#[tokio::test]
async fn test_encounter_state_errors() {
    let server = TestServer::start().await.expect("Failed to start server");
    let gm = server.gm();

    let resp = gm
        .post("/encounter/combatants", &json!({"ids": ["alice"]}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let resp = gm.post("/encounter/end", &json!({})).await.unwrap();
    assert_eq!(resp.status(), 409);

    gm.post_ok("/encounter/start", &json!({})).await.unwrap();
    let resp = gm.post("/encounter/start", &json!({})).await.unwrap();
    assert_eq!(resp.status(), 409);
}

/// Test: a deleted sheet leaves the roster
#[tokio::test]
async fn test_deleted_player_leaves_roster() {
    let server = TestServer::start().await.expect("Failed to start server");
    let gm = server.gm();
    let alice = server.client_as("alice");
    alice.set_stats("Brannoc", 20, 5, 2).await.unwrap();
    gm.post_ok("/encounter/start", &json!({})).await.unwrap();
    gm.post_ok("/encounter/combatants", &json!({"ids": ["alice"]}))
        .await
        .unwrap();

    alice.delete("/players/alice").await.unwrap();

    let view = gm.get_ok("/encounter").await.unwrap();
    assert_eq!(view["status"], "no_combatants");
}
