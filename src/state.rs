use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::client::BackendClient;
use crate::config::Config;
use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::session::Session;
use crate::observability::metrics::Metrics;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    pub sessions: DashMap<Uuid, Session>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let metrics = Metrics::new();
        let backend =
            BackendClient::new(&config.backend_url, config.request_timeout, metrics.clone())?;

        Ok(Self {
            config,
            backend,
            sessions: DashMap::new(),
            metrics,
        })
    }

    pub fn open_session(&self, backend_token: String, user: Driver) -> Session {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            backend_token,
            user,
            created_at: now,
            last_used_at: now,
        };

        self.sessions.insert(session.id, session.clone());
        self.refresh_session_gauge();
        session
    }

    /// Looks up a live session and marks it used. Sessions idle for longer
    /// than `session_idle_ttl` are dropped instead.
    pub fn session(&self, id: &Uuid) -> Option<Session> {
        let now = Utc::now();
        {
            let mut entry = self.sessions.get_mut(id)?;
            if !entry.is_idle(now, self.config.session_idle_ttl) {
                entry.last_used_at = now;
                return Some(entry.value().clone());
            }
        }

        let ttl = self.config.session_idle_ttl;
        if self
            .sessions
            .remove_if(id, |_, session| session.is_idle(now, ttl))
            .is_some()
        {
            self.refresh_session_gauge();
            info!(session = %id, "idle session expired");
        }
        None
    }

    pub fn close_session(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        self.refresh_session_gauge();
        removed
    }

    /// Drops every idle session and returns how many were removed.
    pub fn sweep_idle_sessions(&self) -> usize {
        let now = Utc::now();
        let ttl = self.config.session_idle_ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_idle(now, ttl));
        self.refresh_session_gauge();
        before.saturating_sub(self.sessions.len())
    }

    fn refresh_session_gauge(&self) {
        self.metrics.active_sessions.set(self.sessions.len() as i64);
    }
}

pub fn spawn_session_sweeper(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = SESSION_SWEEP_INTERVAL.min(state.config.session_idle_ttl);
        let mut ticks = tokio::time::interval(period);
        loop {
            ticks.tick().await;
            let expired = state.sweep_idle_sessions();
            if expired > 0 {
                info!(expired, remaining = state.sessions.len(), "idle sessions swept");
            }
        }
    })
}
