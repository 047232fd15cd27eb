use crate::infra::AppState;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use flexwork::session::token_from_headers;
use flexwork::workflows::arrangements::{
    arrangement_router, ArrangementService, ArrangementStore, DirectoryProvider, StaffId,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) staff_id: u64,
}

pub(crate) fn with_portal_routes<S, D>(service: Arc<ArrangementService<S, D>>) -> axum::Router
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    arrangement_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/auth/login", axum::routing::post(login_endpoint))
        .route("/api/v1/auth/me", axum::routing::get(me_endpoint))
        .route("/api/v1/auth/logout", axum::routing::post(logout_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Issue a session for a directory-listed staff member. Credential checks
/// live with the upstream identity provider; the portal only binds a token
/// to a known staff id.
pub(crate) async fn login_endpoint(
    Extension(state): Extension<AppState>,
    Json(request): Json<LoginRequest>,
) -> Response {
    let staff_id = StaffId(request.staff_id);
    match state.directory.employee(&staff_id) {
        Ok(Some(employee)) => {
            let token = state.sessions.login(staff_id, Utc::now());
            let cookie = state.sessions.session_cookie(&token);
            (
                StatusCode::OK,
                [(header::SET_COOKIE, cookie.to_string())],
                Json(json!({
                    "staff_id": employee.staff_id,
                    "name": employee.name,
                    "department": employee.department,
                    "team": employee.team,
                })),
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "staff member not found" })),
        )
            .into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn me_endpoint(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = token_from_headers(&headers) else {
        return unauthorized();
    };
    let Some(staff_id) = state.sessions.current_user(&token, Utc::now()) else {
        return unauthorized();
    };

    match state.directory.employee(&staff_id) {
        Ok(Some(employee)) => (StatusCode::OK, Json(employee)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "staff member not found" })),
        )
            .into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn logout_endpoint(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Response {
    if let Some(token) = token_from_headers(&headers) {
        state.sessions.logout(&token);
    }
    let removal = state.sessions.removal_cookie();
    (
        StatusCode::OK,
        [(header::SET_COOKIE, removal.to_string())],
        Json(json!({ "status": "logged_out" })),
    )
        .into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "no active session" })),
    )
        .into_response()
}
