use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::api::rest::auth::AuthSession;
use crate::api::rest::ws::live_map;
use crate::api::rest::FleetData;
use crate::error::AppError;
use crate::models::session::Session;
use crate::state::AppState;
use crate::views::map::{driver_trail, map_snapshot, DriverTrail, MapSnapshot, TrailQuery};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/map", get(snapshot))
        .route("/api/map/live", get(live_map))
        .route("/api/map/drivers/:id/trail", get(trail))
}

pub async fn load_snapshot(state: &AppState, session: &Session) -> Result<MapSnapshot, AppError> {
    let fleet = FleetData::load(state, session).await?;
    let roster = fleet.roster(state);
    Ok(map_snapshot(&fleet.drivers, &fleet.deliveries, &roster))
}

async fn snapshot(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> Result<Json<MapSnapshot>, AppError> {
    Ok(Json(load_snapshot(&state, &session).await?))
}

async fn trail(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
    Query(query): Query<TrailQuery>,
) -> Result<Json<DriverTrail>, AppError> {
    let limit = query.limit();
    let logs = state
        .backend
        .driver_locations(&session.backend_token, &id, limit)
        .await?;

    Ok(Json(driver_trail(&id, logs, limit)))
}
