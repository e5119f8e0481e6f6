use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Query, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session::{Credentials, Session, SessionView};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/session", get(current_session).delete(logout))
}

/// A signed-in dashboard session, resolved from `Authorization: Bearer` or,
/// for websocket upgrades, a `token` query parameter.
pub struct AuthSession(pub Session);

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn session_id(headers: &HeaderMap, uri: &Uri) -> Option<Uuid> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    let token = from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(query)| query.token)
    })?;

    Uuid::parse_str(&token).ok()
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = session_id(&parts.headers, &parts.uri)
            .ok_or_else(|| AppError::Unauthorized("missing or malformed session token".to_string()))?;

        state
            .session(&id)
            .map(AuthSession)
            .ok_or_else(|| AppError::Unauthorized("session expired".to_string()))
    }
}

/// Drops the caller's session whenever a request ends in 401, which is how a
/// revoked or expired backend token surfaces.
pub async fn expire_on_unauthorized(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let id = session_id(request.headers(), request.uri());
    let response = next.run(request).await;

    if response.status() == StatusCode::UNAUTHORIZED {
        if let Some(id) = id {
            if state.close_session(&id) {
                info!(session = %id, "session dropped after backend rejected its token");
            }
        }
    }

    response
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionView>, AppError> {
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        return Err(AppError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    let response = state.backend.login(&credentials).await?;
    let session = state.open_session(response.token, response.user);

    info!(
        session = %session.id,
        username = %session.user.username,
        "dashboard user signed in"
    );

    Ok(Json(SessionView::from(&session)))
}

async fn current_session(AuthSession(session): AuthSession) -> Json<SessionView> {
    Json(SessionView::from(&session))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> StatusCode {
    state.close_session(&session.id);
    info!(session = %session.id, "dashboard user signed out");
    StatusCode::NO_CONTENT
}
