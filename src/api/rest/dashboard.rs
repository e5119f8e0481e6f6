use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::api::rest::auth::AuthSession;
use crate::api::rest::FleetData;
use crate::error::AppError;
use crate::state::AppState;
use crate::views::dashboard::{dashboard_page, DashboardPage};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard", get(dashboard))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> Result<Json<DashboardPage>, AppError> {
    let fleet = FleetData::load(&state, &session).await?;
    let roster = fleet.roster(&state);

    Ok(Json(dashboard_page(&fleet.drivers, &fleet.deliveries, &roster)))
}
