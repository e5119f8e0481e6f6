use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Json;
use axum::Router;
use tracing::info;

use crate::api::rest::auth::AuthSession;
use crate::error::AppError;
use crate::models::delivery::{Delivery, DeliveryPayload};
use crate::models::session::Session;
use crate::state::AppState;
use crate::views::deliveries::{delivery_points_page, DeliveryPointsPage, DeliveryQuery};
use crate::views::forms::validate_delivery;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/delivery-points",
            get(list_delivery_points).post(create_delivery_point),
        )
        .route(
            "/api/delivery-points/:id",
            get(get_delivery_point)
                .put(update_delivery_point)
                .delete(delete_delivery_point),
        )
}

async fn load_page(
    state: &AppState,
    session: &Session,
    query: &DeliveryQuery,
) -> Result<DeliveryPointsPage, AppError> {
    let deliveries = state
        .backend
        .list_deliveries(&session.backend_token)
        .await?;
    Ok(delivery_points_page(deliveries, query))
}

async fn list_delivery_points(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Query(query): Query<DeliveryQuery>,
) -> Result<Json<DeliveryPointsPage>, AppError> {
    Ok(Json(load_page(&state, &session, &query).await?))
}

async fn get_delivery_point(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<Delivery>, AppError> {
    let delivery = state
        .backend
        .get_delivery(&session.backend_token, &id)
        .await?;
    Ok(Json(delivery))
}

async fn create_delivery_point(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(payload): Json<DeliveryPayload>,
) -> Result<(StatusCode, Json<DeliveryPointsPage>), AppError> {
    validate_delivery(&payload)?;

    state
        .backend
        .create_delivery(&session.backend_token, &payload)
        .await?;
    info!(title = %payload.title, "delivery point created");

    let page = load_page(&state, &session, &DeliveryQuery::default()).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn update_delivery_point(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
    Json(payload): Json<DeliveryPayload>,
) -> Result<Json<DeliveryPointsPage>, AppError> {
    validate_delivery(&payload)?;

    state
        .backend
        .update_delivery(&session.backend_token, &id, &payload)
        .await?;
    info!(delivery_id = %id, "delivery point updated");

    Ok(Json(load_page(&state, &session, &DeliveryQuery::default()).await?))
}

async fn delete_delivery_point(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<DeliveryPointsPage>, AppError> {
    state
        .backend
        .delete_delivery(&session.backend_token, &id)
        .await?;
    info!(delivery_id = %id, "delivery point deleted");

    Ok(Json(load_page(&state, &session, &DeliveryQuery::default()).await?))
}
