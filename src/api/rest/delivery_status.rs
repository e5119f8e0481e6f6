use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use tracing::info;

use crate::api::rest::auth::AuthSession;
use crate::error::AppError;
use crate::models::delivery::DeliveryStatus;
use crate::models::session::Session;
use crate::state::AppState;
use crate::views::deliveries::{delivery_status_page, DeliveryStatusPage, ReviewQuery};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/delivery-status", get(review_deliveries))
        .route("/api/delivery-status/:id/complete", post(complete_delivery))
        .route("/api/delivery-status/:id/approve", post(approve_delivery))
}

async fn load_page(
    state: &AppState,
    session: &Session,
    query: &ReviewQuery,
) -> Result<DeliveryStatusPage, AppError> {
    let deliveries = state
        .backend
        .list_deliveries(&session.backend_token)
        .await?;
    Ok(delivery_status_page(deliveries, query))
}

async fn review_deliveries(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<DeliveryStatusPage>, AppError> {
    Ok(Json(load_page(&state, &session, &query).await?))
}

async fn complete_delivery(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<DeliveryStatusPage>, AppError> {
    let token = session.backend_token.as_str();
    let delivery = state.backend.get_delivery(token, &id).await?;
    if delivery.status != DeliveryStatus::Assigned {
        return Err(AppError::Conflict(format!(
            "delivery {id} is {}; only assigned deliveries can be completed",
            delivery.status.as_str()
        )));
    }

    state.backend.complete_delivery(token, &id).await?;
    info!(delivery_id = %id, "delivery marked completed");

    Ok(Json(load_page(&state, &session, &ReviewQuery::default()).await?))
}

async fn approve_delivery(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<DeliveryStatusPage>, AppError> {
    let token = session.backend_token.as_str();
    let delivery = state.backend.get_delivery(token, &id).await?;
    if delivery.status != DeliveryStatus::Completed {
        return Err(AppError::Conflict(format!(
            "delivery {id} is {}; only completed deliveries can be approved",
            delivery.status.as_str()
        )));
    }
    if delivery.proof_of_delivery.is_empty() {
        return Err(AppError::Conflict(format!(
            "delivery {id} has no proof of delivery"
        )));
    }

    state.backend.approve_delivery(token, &id).await?;
    info!(
        delivery_id = %id,
        proofs = delivery.proof_of_delivery.len(),
        "delivery approved"
    );

    Ok(Json(load_page(&state, &session, &ReviewQuery::default()).await?))
}
