//! Health check endpoint

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serenity::prelude::TypeMapKey;
use tokio::sync::RwLock;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub bot_username: Option<String>,
    /// Guilds bound by the last ready event.
    pub bound_servers: usize,
    pub uptime_secs: u64,
}

/// Shared application state for health checks
#[derive(Clone)]
pub struct AppState {
    pub start_time: SystemTime,
    pub bot_username: Arc<RwLock<Option<String>>>,
    pub bound_servers: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            start_time: SystemTime::now(),
            bot_username: Arc::new(RwLock::new(None)),
            bound_servers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn set_bot_username(&self, username: String) {
        let mut guard = self.bot_username.write().await;
        *guard = Some(username);
    }

    pub fn set_bound_servers(&self, count: usize) {
        self.bound_servers.store(count, Ordering::Relaxed);
    }

    async fn snapshot(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            bot_username: self.bot_username.read().await.clone(),
            bound_servers: self.bound_servers.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().unwrap_or_default().as_secs(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeMapKey for AppState {
    type Value = AppState;
}

async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    (StatusCode::OK, Json(state.snapshot().await))
}

async fn live_handler() -> StatusCode {
    StatusCode::OK
}

/// Create the health check router
pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/live", get(live_handler))
        .with_state(state)
}

/// Start the health check server
pub async fn start_health_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_health_router(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Health check server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_new() {
        let state = AppState::new();
        assert!(state.bot_username.read().await.is_none());
        assert_eq!(state.bound_servers.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_snapshot_reflects_updates() {
        let state = AppState::new();
        state.set_bot_username("commandbot#1234".to_string()).await;
        state.set_bound_servers(3);

        let status = state.clone().snapshot().await;
        assert_eq!(status.status, "ok");
        assert_eq!(status.bot_username.as_deref(), Some("commandbot#1234"));
        assert_eq!(status.bound_servers, 3);
    }

    #[tokio::test]
    async fn test_health_handler_ok() {
        let state = AppState::new();
        state.set_bound_servers(1);
        let (code, Json(body)) = health_handler(State(state)).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.bound_servers, 1);
    }

    #[test]
    fn test_health_status_serde() {
        let status = HealthStatus {
            status: "ok".to_string(),
            bot_username: Some("testbot".to_string()),
            bound_servers: 2,
            uptime_secs: 100,
        };
        let json = serde_json::to_string(&status).unwrap();
        let back: HealthStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, "ok");
        assert_eq!(back.uptime_secs, 100);
        assert_eq!(back.bound_servers, 2);
        assert_eq!(back.bot_username, Some("testbot".to_string()));
    }
}
