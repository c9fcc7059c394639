//! Integration tests for the HTTP JSON API

mod common;

use std::io::{Read, Write};
use std::net::TcpStream;

use serde_json::json;

use common::{TestCampus, create_test_campus};
use greencampus::server::{ApiRequest, ApiResponse, Router, start_http_server};

fn get(router: &Router, path: &str, user_id: Option<&str>) -> ApiResponse {
    let (path, query) = match path.split_once('?') {
        Some((p, q)) => (p.to_string(), Some(q.to_string())),
        None => (path.to_string(), None),
    };
    router.dispatch(&ApiRequest {
        method: "GET".to_string(),
        path,
        query,
        user_id: user_id.map(str::to_string),
        body: String::new(),
    })
}

fn post(router: &Router, path: &str, user_id: Option<&str>, body: serde_json::Value) -> ApiResponse {
    router.dispatch(&ApiRequest {
        method: "POST".to_string(),
        path: path.to_string(),
        query: None,
        user_id: user_id.map(str::to_string),
        body: body.to_string(),
    })
}

fn router(env: &TestCampus) -> Router {
    Router::new(env.campus.clone())
}

#[test]
fn test_ping_needs_no_user() {
    let env = create_test_campus();
    let response = get(&router(&env), "/ping", None);
    assert_eq!(response.status, 200);
    assert_eq!(response.body["status"], "ok");
}

#[test]
fn test_user_header_is_required() {
    let env = create_test_campus();
    let router = router(&env);

    let missing = get(&router, "/me", None);
    assert_eq!(missing.status, 401);
    assert_eq!(missing.body["error"], "missing_user");

    let unknown = get(&router, "/me", Some("ghost"));
    assert_eq!(unknown.status, 401);
    assert_eq!(unknown.body["error"], "unknown_user");
}

#[test]
fn test_complete_then_redeem_over_api() {
    let env = create_test_campus();
    let router = router(&env);
    let student = env.student("api@campus.test");
    let user = Some(student.user_id.as_str());
    let (_, payload) = env.mission("Pick Up Litter", 80);
    let reward = env.reward("Notebook", 50, 2);

    let completed = post(&router, "/missions/complete", user, json!({ "payload": payload }));
    assert_eq!(completed.status, 200);
    assert_eq!(completed.body["completed"]["total_points"], 80);

    let again = post(&router, "/missions/complete", user, json!({ "payload": payload }));
    assert_eq!(again.status, 409);
    assert_eq!(again.body["error"], "already_completed");

    let redeemed = post(&router, "/rewards/redeem", user, json!({ "reward_id": reward.id }));
    assert_eq!(redeemed.status, 200);
    assert_eq!(redeemed.body["redeemed"]["remaining_points"], 30);

    let broke = post(&router, "/rewards/redeem", user, json!({ "reward_id": reward.id }));
    assert_eq!(broke.status, 422);
    assert_eq!(broke.body["error"], "insufficient_points");

    let me = get(&router, "/me", user);
    assert_eq!(me.status, 200);
    assert_eq!(me.body["dashboard"]["profile"]["points"], 30);
    let history = &me.body["history"];
    assert_eq!(history["completed_mission_ids"].as_array().unwrap().len(), 1);
    let redemptions = history["redemptions"].as_array().unwrap();
    assert_eq!(redemptions.len(), 1);
    assert_eq!(redemptions[0]["reward_id"], reward.id.as_str());
    assert_eq!(redemptions[0]["points_spent"], 50);
}

#[test]
fn test_invalid_scan_maps_to_not_found() {
    let env = create_test_campus();
    let router = router(&env);
    let student = env.student("scan@campus.test");

    let response = post(
        &router,
        "/missions/complete",
        Some(student.user_id.as_str()),
        json!({ "payload": "QR_NOPE_1" }),
    );
    assert_eq!(response.status, 404);
    assert_eq!(response.body["error"], "invalid_or_inactive_mission");
}

#[test]
fn test_malformed_body_is_rejected() {
    let env = create_test_campus();
    let student = env.student("body@campus.test");
    let response = router(&env).dispatch(&ApiRequest {
        method: "POST".to_string(),
        path: "/missions/complete".to_string(),
        user_id: Some(student.user_id.clone()),
        body: "{not json".to_string(),
        ..Default::default()
    });
    assert_eq!(response.status, 400);
}

#[test]
fn test_admin_routes_check_role() {
    let env = create_test_campus();
    let router = router(&env);
    let student = env.student("nosy@campus.test");
    let draft = json!({ "title": "Audit Bins", "category": "Recycling", "points": 40 });

    let denied = post(&router, "/admin/missions", Some(student.user_id.as_str()), draft.clone());
    assert_eq!(denied.status, 403);

    let admin = Some(env.admin.user_id.as_str());
    let created = post(&router, "/admin/missions", admin, draft);
    assert_eq!(created.status, 200);
    let id = created.body["mission"]["id"].as_str().unwrap().to_string();

    let token = post(&router, &format!("/admin/missions/{id}/token"), admin, json!({}));
    assert_eq!(token.status, 200);

    let deleted = post(&router, &format!("/admin/missions/{id}/delete"), admin, json!({}));
    assert_eq!(deleted.status, 200);
    let gone = post(&router, &format!("/admin/missions/{id}/delete"), admin, json!({}));
    assert_eq!(gone.status, 404);
}

#[test]
fn test_leaderboard_limit_param() {
    let env = create_test_campus();
    let router = router(&env);
    for (i, points) in [10, 20, 30].into_iter().enumerate() {
        let s = env.student(&format!("lb{i}@campus.test"));
        env.award(&s, points);
    }

    let response = get(&router, "/leaderboard?limit=2", None);
    assert_eq!(response.status, 200);
    let entries = response.body["leaderboard"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["points"], 30);

    let bad = get(&router, "/leaderboard?limit=lots", None);
    assert_eq!(bad.status, 400);
}

fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("Failed to connect");
    stream
        .write_all(request.as_bytes())
        .expect("Failed to send request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .expect("Failed to read response");
    response
}

#[test]
fn test_server_checks_token() {
    let env = create_test_campus();
    let server = start_http_server(
        env.campus.clone(),
        "127.0.0.1",
        0,
        Some("sekret".to_string()),
    )
    .unwrap();
    let addr = server.addr().unwrap();

    let denied = raw_request(
        addr,
        "GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(denied.starts_with("HTTP/1.1 401"), "got: {denied}");

    let allowed = raw_request(
        addr,
        "GET /ping HTTP/1.1\r\nHost: localhost\r\nX-GreenCampus-Token: sekret\r\nConnection: close\r\n\r\n",
    );
    assert!(allowed.starts_with("HTTP/1.1 200"), "got: {allowed}");
    assert!(allowed.contains("\"status\":\"ok\""));

    server.shutdown();
}
