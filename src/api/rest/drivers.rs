use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use tracing::info;

use crate::api::rest::auth::AuthSession;
use crate::api::rest::FleetData;
use crate::error::AppError;
use crate::models::driver::{DriverUpdate, NewDriver};
use crate::models::session::Session;
use crate::state::AppState;
use crate::views::drivers::{driver_rows, drivers_page, DriverQuery, DriversPage};
use crate::views::forms::{validate_driver_update, validate_new_driver};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/drivers", get(list_drivers).post(create_driver))
        .route("/api/drivers/:id", put(update_driver).delete(delete_driver))
}

async fn load_page(
    state: &AppState,
    session: &Session,
    query: &DriverQuery,
) -> Result<DriversPage, AppError> {
    let fleet = FleetData::load(state, session).await?;
    let roster = fleet.roster(state);

    Ok(drivers_page(driver_rows(&fleet.drivers, &roster), query))
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Query(query): Query<DriverQuery>,
) -> Result<Json<DriversPage>, AppError> {
    Ok(Json(load_page(&state, &session, &query).await?))
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(payload): Json<NewDriver>,
) -> Result<(StatusCode, Json<DriversPage>), AppError> {
    validate_new_driver(&payload)?;

    state
        .backend
        .create_driver(&session.backend_token, &payload)
        .await?;
    info!(username = %payload.username, "driver created");

    let page = load_page(&state, &session, &DriverQuery::default()).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn update_driver(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
    Json(mut payload): Json<DriverUpdate>,
) -> Result<Json<DriversPage>, AppError> {
    validate_driver_update(&mut payload)?;

    state
        .backend
        .update_driver(&session.backend_token, &id, &payload)
        .await?;
    info!(driver_id = %id, "driver updated");

    Ok(Json(load_page(&state, &session, &DriverQuery::default()).await?))
}

async fn delete_driver(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<DriversPage>, AppError> {
    state
        .backend
        .delete_driver(&session.backend_token, &id)
        .await?;
    info!(driver_id = %id, "driver deleted");

    Ok(Json(load_page(&state, &session, &DriverQuery::default()).await?))
}
