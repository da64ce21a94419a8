//! HTTP route definitions - the sync protocol surface
//!
//! This is the externally observable contract: join, state report, mutation
//! submit, delta pull, leave. All endpoints are guest-friendly; a caller
//! without a player id is assigned an ephemeral one. Rooms are created on
//! first reference, so "room not found" never occurs.

use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, cors::{Any, CorsLayer}, trace::TraceLayer};
use tracing::info;

use crate::app::AppState;
use crate::util::identity::{resolve_display_name, resolve_player_id};
use crate::util::time::uptime_secs;
use crate::world::presence::{DEFAULT_HEALTH, DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y};
use crate::world::{ApplyError, Equipment, PresenceEntry, PullOutcome, TileMutation, TileType, WorldSnapshot};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = if state.config.client_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        // Support multiple origins (comma-separated in CLIENT_ORIGIN)
        let allowed_origins: Vec<header::HeaderValue> = state
            .config
            .client_origin
            .split(',')
            .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/rooms/:room_id/join", post(join_handler))
        .route("/rooms/:room_id/presence", post(report_state_handler))
        .route("/rooms/:room_id/mutations", post(submit_mutation_handler))
        .route("/rooms/:room_id/deltas", get(pull_deltas_handler))
        .route("/rooms/:room_id/leave", post(leave_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_rooms: usize,
    active_players: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_rooms: state.rooms.active_rooms(),
        active_players: state.rooms.total_players(),
    })
}

// ============================================================================
// Join
// ============================================================================

#[derive(Deserialize, Default)]
#[serde(default)]
struct JoinRequest {
    player_id: Option<String>,
    display_name: Option<String>,
    x: Option<f32>,
    y: Option<f32>,
}

#[derive(Serialize)]
struct JoinResponse {
    room_id: String,
    player_id: String,
    display_name: String,
    world: WorldSnapshot,
    players: Vec<PresenceEntry>,
    player_count: usize,
}

async fn join_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, AppError> {
    let player_id = resolve_player_id(req.player_id);
    let display_name = resolve_display_name(req.display_name, &player_id);

    let room = state.rooms.get_or_create(&room_id);
    let outcome = room.join(
        &player_id,
        display_name.clone(),
        req.x.unwrap_or(DEFAULT_SPAWN_X),
        req.y.unwrap_or(DEFAULT_SPAWN_Y),
    );

    info!(room_id = %room_id, player_id = %player_id, "Player joined room");

    let player_count = outcome.others.len() + 1;
    Ok(Json(JoinResponse {
        room_id,
        player_id,
        display_name,
        world: outcome.snapshot,
        players: outcome.others,
        player_count,
    }))
}

// ============================================================================
// State report
// ============================================================================

#[derive(Deserialize)]
struct ReportStateRequest {
    player_id: Option<String>,
    display_name: Option<String>,
    x: f32,
    y: f32,
    #[serde(default = "default_health")]
    health: f32,
    #[serde(default)]
    equipment: Equipment,
}

fn default_health() -> f32 {
    DEFAULT_HEALTH
}

#[derive(Serialize)]
struct ReportStateResponse {
    player_id: String,
    players: Vec<PresenceEntry>,
    player_count: usize,
}

async fn report_state_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<ReportStateRequest>,
) -> Result<Json<ReportStateResponse>, AppError> {
    let player_id = resolve_player_id(req.player_id);

    let room = state.rooms.get_or_create(&room_id);
    let players = room.report_state(
        &player_id,
        req.display_name,
        req.x,
        req.y,
        req.health,
        req.equipment,
    );

    let player_count = players.len() + 1;
    Ok(Json(ReportStateResponse {
        player_id,
        players,
        player_count,
    }))
}

// ============================================================================
// Mutation submit
// ============================================================================

#[derive(Deserialize)]
struct SubmitMutationRequest {
    player_id: Option<String>,
    x: i64,
    y: i64,
    /// `null` (or absent) clears the tile
    #[serde(default)]
    tile: Option<TileType>,
}

#[derive(Serialize)]
struct SubmitMutationResponse {
    mutation: TileMutation,
    watermark: u64,
}

async fn submit_mutation_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<SubmitMutationRequest>,
) -> Result<Json<SubmitMutationResponse>, AppError> {
    let player_id = resolve_player_id(req.player_id);

    if state.mutation_limiter.check_key(&player_id).is_err() {
        return Err(AppError::RateLimited);
    }

    let room = state.rooms.get_or_create(&room_id);
    let mutation = room
        .submit_mutation(req.x, req.y, req.tile, &player_id)
        .map_err(AppError::OutOfBounds)?;

    let watermark = mutation.server_timestamp;
    Ok(Json(SubmitMutationResponse {
        mutation,
        watermark,
    }))
}

// ============================================================================
// Delta pull
// ============================================================================

#[derive(Deserialize)]
struct DeltaQuery {
    /// Watermark of the last mutation the client has applied (0 = none)
    #[serde(default)]
    since: u64,
}

#[derive(Serialize)]
struct DeltasResponse {
    resync_required: bool,
    changes: Vec<TileMutation>,
    watermark: u64,
    /// Present only when a resync is required
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<WorldSnapshot>,
}

async fn pull_deltas_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(query): Query<DeltaQuery>,
) -> Result<Json<DeltasResponse>, AppError> {
    let room = state.rooms.get_or_create(&room_id);

    let response = match room.pull_deltas(query.since) {
        PullOutcome::Changes {
            mutations,
            watermark,
        } => DeltasResponse {
            resync_required: false,
            changes: mutations,
            watermark,
            snapshot: None,
        },
        PullOutcome::ResyncRequired { snapshot } => {
            info!(room_id = %room_id, since = query.since, "Stale watermark, full resync");
            DeltasResponse {
                resync_required: true,
                changes: Vec::new(),
                watermark: snapshot.watermark,
                snapshot: Some(snapshot),
            }
        }
    };

    Ok(Json(response))
}

// ============================================================================
// Leave
// ============================================================================

#[derive(Deserialize)]
struct LeaveRequest {
    player_id: String,
}

#[derive(Serialize)]
struct LeaveResponse {
    left: bool,
}

async fn leave_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<LeaveRequest>,
) -> Result<Json<LeaveResponse>, AppError> {
    // Leaving a room that was never created is a harmless no-op
    if let Some(room) = state.rooms.get(&room_id) {
        room.leave(&req.player_id);
        info!(room_id = %room_id, player_id = %req.player_id, "Player left room");
    }

    Ok(Json(LeaveResponse { left: true }))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    OutOfBounds(#[from] ApplyError),

    #[error("Too many mutation submissions")]
    RateLimited,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            AppError::OutOfBounds(err) => {
                (StatusCode::BAD_REQUEST, "out_of_bounds", err.to_string())
            }
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                self.to_string(),
            ),
        };

        let body = serde_json::json!({
            "error": message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
