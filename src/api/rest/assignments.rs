use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use tracing::info;

use crate::api::rest::auth::AuthSession;
use crate::api::rest::FleetData;
use crate::error::AppError;
use crate::models::delivery::DeliveryStatus;
use crate::models::session::Session;
use crate::state::AppState;
use crate::views::assignments::{assignments_page, AssignmentRequest, AssignmentsPage};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/assignments", get(list_assignments).post(assign_delivery))
}

async fn load_page(state: &AppState, session: &Session) -> Result<AssignmentsPage, AppError> {
    let fleet = FleetData::load(state, session).await?;
    let roster = fleet.roster(state);
    Ok(assignments_page(&fleet.drivers, &fleet.deliveries, &roster))
}

async fn list_assignments(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> Result<Json<AssignmentsPage>, AppError> {
    Ok(Json(load_page(&state, &session).await?))
}

async fn assign_delivery(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(request): Json<AssignmentRequest>,
) -> Result<Json<AssignmentsPage>, AppError> {
    let delivery_id = request.delivery_id.trim();
    let driver_id = request.driver_id.trim();
    if delivery_id.is_empty() {
        return Err(AppError::BadRequest("deliveryId is required".to_string()));
    }
    if driver_id.is_empty() {
        return Err(AppError::BadRequest("driverId is required".to_string()));
    }

    let token = session.backend_token.as_str();
    let (drivers, deliveries) = tokio::try_join!(
        state.backend.list_drivers(token),
        state.backend.list_deliveries(token),
    )?;

    let delivery = deliveries
        .iter()
        .find(|delivery| delivery.id == delivery_id)
        .ok_or_else(|| AppError::NotFound(format!("delivery {delivery_id} not found")))?;
    if delivery.status != DeliveryStatus::Pending {
        return Err(AppError::Conflict(format!(
            "delivery {delivery_id} is {}; only pending deliveries can be assigned",
            delivery.status.as_str()
        )));
    }

    let driver = drivers
        .iter()
        .find(|driver| driver.id == driver_id)
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;

    state
        .backend
        .assign_delivery(token, delivery_id, driver_id)
        .await?;
    info!(
        delivery_id = %delivery_id,
        driver_id = %driver_id,
        driver = %driver.display_name(),
        "delivery assigned"
    );

    Ok(Json(load_page(&state, &session).await?))
}
