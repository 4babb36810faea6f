//! HTTP control surface for the reminder scheduler.
//!
//! Every route requires `Authorization: Bearer <secret>`. Without a
//! configured secret all requests are refused.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::scheduler::ReminderScheduler;

#[derive(Clone)]
pub struct ControlState {
    scheduler: ReminderScheduler,
    secret: Option<Arc<str>>,
}

impl ControlState {
    pub fn new(scheduler: ReminderScheduler, secret: Option<String>) -> Self {
        Self {
            scheduler,
            secret: secret.map(Arc::from),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerAction {
    Start,
    Stop,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: SchedulerAction,
}

pub fn router(state: ControlState) -> Router {
    Router::new()
        .route(
            "/api/scheduler",
            get(scheduler_status).post(scheduler_action),
        )
        .route("/api/reminders/sweep", post(trigger_sweep))
        .with_state(state)
}

pub async fn serve(bind: &str, state: ControlState, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind control API on {bind}"))?;
    let local_addr = listener.local_addr()?;

    info!("Control API listening on http://{local_addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("control API server failed")
}

fn bearer_is_valid(headers: &HeaderMap, expected: &Option<Arc<str>>) -> bool {
    let Some(expected_token) = expected else {
        return false;
    };
    let candidate = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or_default();
    !expected_token.is_empty() && candidate == &**expected_token
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"error": "unauthorized"})),
    )
        .into_response()
}

async fn scheduler_status(State(state): State<ControlState>, headers: HeaderMap) -> Response {
    if !bearer_is_valid(&headers, &state.secret) {
        return unauthorized();
    }
    Json(state.scheduler.status().await).into_response()
}

async fn scheduler_action(
    State(state): State<ControlState>,
    headers: HeaderMap,
    Json(request): Json<ActionRequest>,
) -> Response {
    if !bearer_is_valid(&headers, &state.secret) {
        return unauthorized();
    }

    match request.action {
        SchedulerAction::Start => {
            state.scheduler.start().await;
        }
        SchedulerAction::Stop => {
            state.scheduler.stop().await;
        }
    }

    Json(state.scheduler.status().await).into_response()
}

async fn trigger_sweep(State(state): State<ControlState>, headers: HeaderMap) -> Response {
    if !bearer_is_valid(&headers, &state.secret) {
        return unauthorized();
    }

    match state.scheduler.run_now().await {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            error!("Externally triggered reminder sweep failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("{err:#}")})),
            )
                .into_response()
        }
    }
}
