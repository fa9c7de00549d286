// [apps/manager/src/control.rs]
/*!
 * =================================================================
 * APARATO: MANAGER CONTROL GUARD (V3.0 - FLOTA SOBERANA)
 * CLASIFICACIÓN: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: AUTENTICACIÓN DE MICROSERVICIO Y TELEGRAFÍA DE ESTADO
 *
 * VISION:
 * 1. SHARED SECRET: Exige 'authorization-microservice: Bearer <SECRET>' en
 *    cada ruta salvo '/health', idéntico al guardián del worker.
 * 2. TELEGRAFÍA MÍNIMA: Expone únicamente {running, last_response}.
 *    =================================================================
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::warn;

use crate::driver::ManagerStatus;

const MICROSERVICE_AUTH_HEADER: &str = "authorization-microservice";

#[derive(Clone)]
pub struct ControlState {
    pub status: Arc<RwLock<ManagerStatus>>,
    pub stop: Arc<AtomicBool>,
    pub auth_token: String,
}

pub fn build_router(state: ControlState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/stop", post(stop))
        .route("/start", post(start))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn status(State(state): State<ControlState>) -> Json<ManagerStatus> {
    Json(state.status.read().await.clone())
}

async fn stop(State(state): State<ControlState>) -> Json<serde_json::Value> {
    state.stop.store(true, Ordering::SeqCst);
    Json(json!({ "message": "AppManager stopping..." }))
}

async fn start(State(state): State<ControlState>) -> Json<serde_json::Value> {
    let was_stopped = state.stop.swap(false, Ordering::SeqCst);
    let message = if was_stopped { "AppManager started" } else { "AppManager already running" };
    Json(json!({ "message": message }))
}

async fn auth_guard(State(state): State<ControlState>, req: Request, next: Next) -> Result<Response, Response> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    let header_value = req.headers().get(MICROSERVICE_AUTH_HEADER).and_then(|h| h.to_str().ok());
    let token = match header_value {
        Some(value) if value.starts_with("Bearer ") => &value[7..],
        _ => {
            warn!("🔒 [CONTROL_GUARD]: Ausente 'authorization-microservice' o sin prefijo 'Bearer '");
            return Err(unauthorized("Отсутствует 'authorization-microservice' или начало не с 'Bearer '"));
        }
    };

    if token != state.auth_token {
        warn!("🔒 [CONTROL_GUARD]: Clave de microservicio inválida");
        return Err(unauthorized("Недействительный ключ микросервиса"));
    }

    Ok(next.run(req).await)
}

fn unauthorized(detail: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response()
}
