//! End-to-end tests of the sync protocol over the real router

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use world_sync_server::app::AppState;
use world_sync_server::config::Config;
use world_sync_server::http::build_router;

fn test_router() -> Router {
    build_router(AppState::new(Config::for_tests()))
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(payload) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_rooms_and_players() {
    let router = test_router();

    let (status, body) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_rooms"], 0);

    send(&router, "POST", "/rooms/alpha/join", Some(json!({}))).await;
    let (_, body) = send(&router, "GET", "/health", None).await;
    assert_eq!(body["active_rooms"], 1);
    assert_eq!(body["active_players"], 1);
}

#[tokio::test]
async fn join_assigns_guest_identity_and_full_snapshot() {
    let router = test_router();

    let (status, body) = send(&router, "POST", "/rooms/alpha/join", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let player_id = body["player_id"].as_str().unwrap();
    assert!(player_id.starts_with("guest-"));
    assert!(body["display_name"].as_str().unwrap().starts_with("Guest_"));

    assert_eq!(body["world"]["width"], 150);
    assert_eq!(body["world"]["height"], 80);
    assert_eq!(body["world"]["grid"].as_array().unwrap().len(), 150);
    // No peers yet
    assert_eq!(body["players"].as_array().unwrap().len(), 0);
    assert_eq!(body["player_count"], 1);
}

#[tokio::test]
async fn join_with_multibyte_player_id_gets_a_valid_guest_name() {
    let router = test_router();

    let (status, body) = send(
        &router,
        "POST",
        "/rooms/alpha/join",
        Some(json!({"player_id": "€€"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player_id"], "€€");
    assert_eq!(body["display_name"], "Guest_€€");
}

#[tokio::test]
async fn sandbox_room_scenario() {
    // Room "alpha" is 150x80. Client A joins, places stone at (10, 5), then
    // clears it. Client B pulls deltas from A's starting watermark and must
    // see exactly two ordered mutations leaving the cell empty. A mutation
    // at x=200 is rejected outright.
    let router = test_router();

    let (_, joined) = send(
        &router,
        "POST",
        "/rooms/alpha/join",
        Some(json!({"player_id": "a", "display_name": "A"})),
    )
    .await;
    let w0 = joined["world"]["watermark"].as_u64().unwrap();

    let (status, placed) = send(
        &router,
        "POST",
        "/rooms/alpha/mutations",
        Some(json!({"player_id": "a", "x": 10, "y": 5, "tile": "stone"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let w1 = placed["watermark"].as_u64().unwrap();
    assert!(w1 > w0);

    let (status, cleared) = send(
        &router,
        "POST",
        "/rooms/alpha/mutations",
        Some(json!({"player_id": "a", "x": 10, "y": 5, "tile": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let w2 = cleared["watermark"].as_u64().unwrap();
    assert!(w2 > w1);

    // Client B pulls everything after W0
    let (status, delta) = send(
        &router,
        "GET",
        &format!("/rooms/alpha/deltas?since={}", w0),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delta["resync_required"], false);

    let changes = delta["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0]["tile"], "stone");
    assert_eq!(changes[1]["tile"], Value::Null);
    assert!(
        changes[0]["server_timestamp"].as_u64().unwrap()
            < changes[1]["server_timestamp"].as_u64().unwrap()
    );

    // A fresh join sees the cell empty after both mutations
    let (_, b_joined) = send(
        &router,
        "POST",
        "/rooms/alpha/join",
        Some(json!({"player_id": "b"})),
    )
    .await;
    assert_eq!(b_joined["world"]["grid"][10][5], Value::Null);

    // Out of bounds: width is 150
    let (status, err) = send(
        &router,
        "POST",
        "/rooms/alpha/mutations",
        Some(json!({"player_id": "b", "x": 200, "y": 5, "tile": "wood"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "out_of_bounds");
}

#[tokio::test]
async fn presence_report_lists_other_players_only() {
    let router = test_router();

    send(
        &router,
        "POST",
        "/rooms/beta/join",
        Some(json!({"player_id": "a", "display_name": "A"})),
    )
    .await;

    let (status, body) = send(
        &router,
        "POST",
        "/rooms/beta/presence",
        Some(json!({
            "player_id": "b",
            "display_name": "B",
            "x": 120.0,
            "y": 64.0,
            "health": 80.0,
            "equipment": {"block": "stone", "weapon": "bow", "armor": "iron"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let players = body["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["player_id"], "a");
    assert_eq!(body["player_count"], 2);

    // The other side sees B's reported state
    let (_, body) = send(
        &router,
        "POST",
        "/rooms/beta/presence",
        Some(json!({"player_id": "a", "x": 0.0, "y": 0.0})),
    )
    .await;
    let players = body["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["player_id"], "b");
    assert_eq!(players[0]["health"], 80.0);
    assert_eq!(players[0]["equipment"]["weapon"], "bow");
}

#[tokio::test]
async fn leave_removes_presence_immediately() {
    let router = test_router();

    send(
        &router,
        "POST",
        "/rooms/gamma/join",
        Some(json!({"player_id": "a"})),
    )
    .await;
    send(
        &router,
        "POST",
        "/rooms/gamma/join",
        Some(json!({"player_id": "b"})),
    )
    .await;

    let (status, body) = send(
        &router,
        "POST",
        "/rooms/gamma/leave",
        Some(json!({"player_id": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["left"], true);

    let (_, body) = send(
        &router,
        "POST",
        "/rooms/gamma/presence",
        Some(json!({"player_id": "b", "x": 0.0, "y": 0.0})),
    )
    .await;
    assert_eq!(body["players"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn stale_watermark_returns_full_snapshot() {
    let mut config = Config::for_tests();
    config.change_log_cap = 2;
    let router = build_router(AppState::new(config));

    for x in 0..3 {
        let (status, _) = send(
            &router,
            "POST",
            "/rooms/alpha/mutations",
            Some(json!({"player_id": "a", "x": x, "y": 0, "tile": "dirt"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // Watermark 0 predates the retained log: resync, not a partial delta
    let (status, body) = send(&router, "GET", "/rooms/alpha/deltas?since=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resync_required"], true);
    assert_eq!(body["changes"].as_array().unwrap().len(), 0);
    assert_eq!(body["snapshot"]["grid"][2][0], "dirt");
    assert!(body["watermark"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn mutation_submissions_are_rate_limited_per_player() {
    let mut config = Config::for_tests();
    config.mutation_rate_limit = 1;
    let router = build_router(AppState::new(config));

    let (status, _) = send(
        &router,
        "POST",
        "/rooms/alpha/mutations",
        Some(json!({"player_id": "spammer", "x": 0, "y": 0, "tile": "dirt"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &router,
        "POST",
        "/rooms/alpha/mutations",
        Some(json!({"player_id": "spammer", "x": 1, "y": 0, "tile": "dirt"})),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "rate_limited");

    // A different player is unaffected
    let (status, _) = send(
        &router,
        "POST",
        "/rooms/alpha/mutations",
        Some(json!({"player_id": "other", "x": 2, "y": 0, "tile": "dirt"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delta_pull_on_fresh_room_is_empty_not_stale() {
    let router = test_router();

    let (status, body) = send(&router, "GET", "/rooms/fresh/deltas?since=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resync_required"], false);
    assert_eq!(body["changes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn same_room_id_regenerates_identical_terrain() {
    // Terrain baseline is seeded from the room id, so two servers (or a
    // restarted one) produce the same starting world for the same room.
    let router_a = test_router();
    let router_b = test_router();

    let (_, a) = send(&router_a, "POST", "/rooms/alpha/join", Some(json!({}))).await;
    let (_, b) = send(&router_b, "POST", "/rooms/alpha/join", Some(json!({}))).await;
    assert_eq!(a["world"]["grid"], b["world"]["grid"]);
}
