//! HTTP surface of the identity service.

use crate::identity::{self, ConsoleUser, ProcessUser};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize)]
pub struct ListenInfo {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize)]
pub struct WhoamiPayload {
    pub process_user: ProcessUser,
    pub active_console_user: Option<ConsoleUser>,
    pub host: String,
    pub listen: ListenInfo,
    pub ts: u64,
}

#[derive(Debug, Serialize)]
pub struct ActiveUserPayload {
    pub active_console_user: Option<ConsoleUser>,
    pub host: String,
    pub ts: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthPayload {
    pub status: &'static str,
    pub ts: u64,
}

pub fn router(listen: ListenInfo) -> Router {
    Router::new()
        .route("/", get(whoami))
        .route("/whoami", get(whoami))
        .route("/active-user", get(active_user))
        .route("/healthz", get(healthz))
        .with_state(listen)
}

async fn whoami(State(listen): State<ListenInfo>) -> Json<WhoamiPayload> {
    Json(WhoamiPayload {
        process_user: identity::process_user().await,
        active_console_user: identity::console_user(),
        host: host_name(),
        listen,
        ts: unix_now(),
    })
}

async fn active_user() -> Json<ActiveUserPayload> {
    Json(ActiveUserPayload {
        active_console_user: identity::console_user(),
        host: host_name(),
        ts: unix_now(),
    })
}

async fn healthz() -> Json<HealthPayload> {
    Json(HealthPayload {
        status: "ok",
        ts: unix_now(),
    })
}

fn host_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
