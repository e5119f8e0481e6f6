pub mod assignments;
pub mod auth;
pub mod dashboard;
pub mod delivery_points;
pub mod delivery_status;
pub mod drivers;
pub mod map;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::models::delivery::Delivery;
use crate::models::driver::Driver;
use crate::models::location::LocationLog;
use crate::models::session::Session;
use crate::state::AppState;
use crate::views::status::Roster;

pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(drivers::router())
        .merge(delivery_points::router())
        .merge(assignments::router())
        .merge(delivery_status::router())
        .merge(map::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::expire_on_unauthorized,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir))
}

/// The three collections most pages are rendered from.
pub struct FleetData {
    pub drivers: Vec<Driver>,
    pub deliveries: Vec<Delivery>,
    pub locations: Vec<LocationLog>,
}

impl FleetData {
    pub async fn load(state: &AppState, session: &Session) -> Result<Self, AppError> {
        let token = session.backend_token.as_str();
        let (drivers, deliveries, locations) = tokio::try_join!(
            state.backend.list_drivers(token),
            state.backend.list_deliveries(token),
            state.backend.latest_locations(token),
        )?;

        Ok(Self {
            drivers,
            deliveries,
            locations,
        })
    }

    pub fn roster(&self, state: &AppState) -> Roster<'_> {
        Roster::new(
            &self.deliveries,
            &self.locations,
            Utc::now(),
            state.config.online_threshold,
        )
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: String,
    sessions: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.backend.base_url().to_string(),
        sessions: state.sessions.len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
