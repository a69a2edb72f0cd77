//! Roll scenarios
//!
//! Attack prompts, penalties, casts and checks with scripted dice

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

use crate::harness::TestServer;

fn attack(modifier: i64) -> Value {
    json!({"die1": "d6", "die2": 6, "modifier": modifier})
}

/// Test: a first attack resolves straight away
#[tokio::test]
async fn test_first_attack_resolves() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");

    server.push_rolls(&[4, 6]);
    let flow = alice.post_ok("/roll/attack", &attack(3)).await.unwrap();
    assert_eq!(flow["status"], "resolved");
    assert_eq!(flow["attempt"], 1);
    assert_eq!(flow["outcome"]["roll1"], 4);
    assert_eq!(flow["outcome"]["roll2"], 6);
    assert_eq!(flow["outcome"]["total"], 10);
    assert_eq!(flow["outcome"]["gate"], 1);
    assert_eq!(flow["outcome"]["damage"], 9);
    assert_eq!(flow["outcome"]["classification"], "hit");
}

/// Test: the second attack pauses until the roller picks a penalty
#[tokio::test]
async fn test_second_attack_prompts_for_penalty() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");
    let bob = server.client_as("bob");

    server.push_rolls(&[3, 3]);
    alice.post_ok("/roll/attack", &attack(0)).await.unwrap();

    let flow = alice.post_ok("/roll/attack", &attack(4)).await.unwrap();
    assert_eq!(flow["status"], "pending_choice");
    assert_eq!(flow["attempt"], 2);
    assert_eq!(
        flow["choices"],
        json!(["gate", "damage50", "damage100", "blind"])
    );
    let token = flow["token"].as_str().unwrap().to_string();

    // Someone else cannot answer the prompt
    let resp = bob
        .post("/roll/attack/resume", &json!({"token": token, "penalty": "gate"}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    server.push_rolls(&[2, 5]);
    let flow = alice
        .post_ok("/roll/attack/resume", &json!({"token": token, "penalty": "gate"}))
        .await
        .unwrap();
    assert_eq!(flow["status"], "resolved");
    assert_eq!(flow["attempt"], 2);
    assert_eq!(flow["penalties"]["gate_bonus"], 1);
    assert_eq!(flow["outcome"]["gate"], 2);
    assert_eq!(flow["outcome"]["classification"], "miss");
    assert_eq!(flow["outcome"]["damage"], 9);
}

/// Test: damage penalties scale the modifier, rounding down
#[tokio::test]
async fn test_damage_penalty_scales_modifier() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");

    alice.post_ok("/roll/attack", &attack(5)).await.unwrap();

    server.push_rolls(&[4, 4]);
    let flow = alice
        .post_ok(
            "/roll/attack",
            &json!({"die1": 6, "die2": 6, "modifier": 5, "penalty": "damage50"}),
        )
        .await
        .unwrap();
    assert_eq!(flow["status"], "resolved");
    assert_eq!(flow["raw_modifier"], 5);
    assert_eq!(flow["effective_modifier"], 2);
    assert_eq!(flow["outcome"]["damage"], 6);
}

/// Test: blind is offered once per round, and can't be picked again
#[tokio::test]
async fn test_blind_not_offered_twice() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");

    alice.post_ok("/roll/attack", &attack(0)).await.unwrap();

    server.push_rolls(&[3, 4]);
    let flow = alice
        .post_ok(
            "/roll/attack",
            &json!({"die1": "d6", "die2": "d6", "penalty": "blind"}),
        )
        .await
        .unwrap();
    assert_eq!(flow["outcome"]["gate"], 3);
    assert_eq!(flow["outcome"]["classification"], "miss");

    let flow = alice.post_ok("/roll/attack", &attack(0)).await.unwrap();
    assert_eq!(flow["status"], "pending_choice");
    assert_eq!(flow["choices"], json!(["gate", "damage50", "damage100"]));

    let token = flow["token"].as_str().unwrap();
    let resp = alice
        .post("/roll/attack/resume", &json!({"token": token, "penalty": "blind"}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

/// Test: a garbled token is rejected
#[tokio::test]
async fn test_resume_with_bad_token() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");

    let resp = alice
        .post("/roll/attack/resume", &json!({"token": "not-a-token", "penalty": "gate"}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

/// Test: casts never prompt
#[tokio::test]
async fn test_cast_never_prompts() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");

    for attempt in 1..=3 {
        server.push_rolls(&[5, 2]);
        let roll = alice.post_ok("/roll/cast", &attack(1)).await.unwrap();
        assert_eq!(roll["kind"], "cast");
        assert_eq!(roll["attempt"], attempt);
        assert_eq!(roll["outcome"]["classification"], "hit");
    }

    // Attacks keep their own counter
    let flow = alice.post_ok("/roll/attack", &attack(0)).await.unwrap();
    assert_eq!(flow["status"], "resolved");
}

/// Test: checks classify without damage
#[tokio::test]
async fn test_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");

    server.push_rolls(&[1, 1]);
    let outcome = alice
        .post_ok("/roll/check", &json!({"die1": "d10", "die2": "d10", "gate": 0}))
        .await
        .unwrap();
    assert_eq!(outcome["classification"], "fumble");
    assert!(outcome["damage"].is_null());

    server.push_rolls(&[7, 7]);
    let outcome = alice
        .post_ok("/roll/check", &json!({"die1": "d10", "die2": "d10", "gate": 9}))
        .await
        .unwrap();
    assert_eq!(outcome["classification"], "critical");

    server.push_rolls(&[9, 4]);
    let outcome = alice
        .post_ok("/roll/check", &json!({"die1": "d10", "die2": "d10", "gate": 4}))
        .await
        .unwrap();
    assert_eq!(outcome["classification"], "miss");
}

/// Test: die sizes outside 1..=100 are rejected
#[tokio::test]
async fn test_invalid_die_size() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");

    let resp = alice
        .post("/roll/attack", &json!({"die1": "d0", "die2": "d6"}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = alice
        .post("/roll/cast", &json!({"die1": 6, "die2": 101}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Rejected rolls do not count as attempts
    let penalties = alice.get_ok("/penalties/alice").await.unwrap();
    assert_eq!(penalties["attack"]["attempts"], 0);
    assert_eq!(penalties["cast"]["attempts"], 0);
}

/// Test: a new round clears every penalty
#[tokio::test]
async fn test_next_round_clears_penalties() {
    let server = TestServer::start().await.expect("Failed to start server");
    let gm = server.gm();
    let alice = server.client_as("alice");

    alice.post_ok("/roll/attack", &attack(0)).await.unwrap();
    alice
        .post_ok(
            "/roll/attack",
            &json!({"die1": 6, "die2": 6, "penalty": "gate"}),
        )
        .await
        .unwrap();

    let penalties = alice.get_ok("/penalties/alice").await.unwrap();
    assert_eq!(penalties["attack"]["attempts"], 2);
    assert_eq!(penalties["attack"]["gate_bonus"], 1);

    let resp = alice.post("/round/next", &json!({})).await.unwrap();
    assert_eq!(resp.status(), 403);

    let cleared = gm.post_ok("/round/next", &json!({})).await.unwrap();
    assert_eq!(cleared["cleared"], 1);

    let flow = alice.post_ok("/roll/attack", &attack(0)).await.unwrap();
    assert_eq!(flow["status"], "resolved");
    assert_eq!(flow["attempt"], 1);
}

/// Test: the GM can reset one player's attack penalties
#[tokio::test]
async fn test_reset_one_kind() {
    let server = TestServer::start().await.expect("Failed to start server");
    let gm = server.gm();
    let alice = server.client_as("alice");

    alice.post_ok("/roll/attack", &attack(0)).await.unwrap();
    alice.post_ok("/roll/cast", &attack(0)).await.unwrap();

    let reset = gm
        .post_ok("/penalties/alice/reset?kind=attack", &json!({}))
        .await
        .unwrap();
    assert_eq!(reset["cleared"], true);

    let penalties = alice.get_ok("/penalties/alice").await.unwrap();
    assert_eq!(penalties["attack"]["attempts"], 0);
    assert_eq!(penalties["cast"]["attempts"], 1);
}

/// Pause alice's second attack and return the prompt token
async fn paused_attack(server: &TestServer, modifier: i64) -> String {
    let alice = server.client_as("alice");
    alice.post_ok("/roll/attack", &attack(0)).await.unwrap();
    let flow = alice.post_ok("/roll/attack", &attack(modifier)).await.unwrap();
    assert_eq!(flow["status"], "pending_choice");
    flow["token"].as_str().unwrap().to_string()
}

/// Test: a token resolves one roll only
#[tokio::test]
async fn test_resume_token_used_once() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");
    let token = paused_attack(&server, 4).await;

    alice
        .post_ok("/roll/attack/resume", &json!({"token": token, "penalty": "damage50"}))
        .await
        .unwrap();

    let resp = alice
        .post("/roll/attack/resume", &json!({"token": token, "penalty": "damage100"}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let penalties = alice.get_ok("/penalties/alice").await.unwrap();
    assert_eq!(penalties["attack"]["attempts"], 2);
    assert_eq!(penalties["attack"]["damage_reduction_percent"], 50);
}

/// Test: a prompt left open dies with the round
#[tokio::test]
async fn test_resume_after_next_round_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");
    let gm = server.gm();
    let alice = server.client_as("alice");
    let token = paused_attack(&server, 4).await;

    gm.post_ok("/round/next", &json!({})).await.unwrap();

    let resp = alice
        .post("/roll/attack/resume", &json!({"token": token, "penalty": "gate"}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let penalties = alice.get_ok("/penalties/alice").await.unwrap();
    assert_eq!(penalties["attack"]["attempts"], 0);
    assert_eq!(penalties["attack"]["gate_bonus"], 0);
}

/// Test: hand-built tokens cannot apply penalties or roll
#[tokio::test]
async fn test_forged_token_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");

    let forge = |payload: Value| URL_SAFE_NO_PAD.encode(payload.to_string());
    let cast = forge(json!({"player_id": "alice", "kind": "cast", "nonce": 1}));
    let resp = alice
        .post("/roll/attack/resume", &json!({"token": cast, "penalty": "blind"}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let attack_token = forge(json!({"player_id": "alice", "kind": "attack", "nonce": 1}));
    let resp = alice
        .post("/roll/attack/resume", &json!({"token": attack_token, "penalty": "blind"}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Old-style payloads carrying their own dice are not tokens
    let legacy = forge(json!({
        "player_id": "alice", "kind": "attack", "die1": 6, "die2": 6, "modifier": 1000
    }));
    let resp = alice
        .post("/roll/attack/resume", &json!({"token": legacy, "penalty": "gate"}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let penalties = alice.get_ok("/penalties/alice").await.unwrap();
    assert_eq!(penalties["attack"]["attempts"], 0);
    assert_eq!(penalties["cast"]["attempts"], 0);
    assert_eq!(penalties["cast"]["blind"], false);
}

/// Test: extreme modifiers saturate instead of failing the request
#[tokio::test]
async fn test_extreme_modifier_saturates() {
    let server = TestServer::start().await.expect("Failed to start server");
    let alice = server.client_as("alice");

    server.push_rolls(&[6, 6]);
    let flow = alice
        .post_ok("/roll/attack", &json!({"die1": 6, "die2": 6, "modifier": i64::MAX}))
        .await
        .unwrap();
    assert_eq!(flow["status"], "resolved");
    assert_eq!(flow["outcome"]["damage"], i64::MAX);

    server.push_rolls(&[6, 6]);
    let flow = alice
        .post_ok(
            "/roll/attack",
            &json!({"die1": 6, "die2": 6, "modifier": i64::MIN, "penalty": "damage50"}),
        )
        .await
        .unwrap();
    assert_eq!(flow["effective_modifier"], i64::MIN / 2);
    assert_eq!(flow["outcome"]["damage"], i64::MIN / 2 + 6);
}
