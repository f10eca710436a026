// routes/login.rs
// POST /login { "email": "...", "code": "123456" } -> { "ok": true|false }

use axum::{
    extract::{Json, State},
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::session::SESSION_COOKIE_NAME;
use crate::state::{AppState, SESSION_TTL_SECONDS, create_session, find_user};
use crate::totp::build_totp;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub code: String,
}

/// Verifies the current TOTP code with a skew of one step either side.
pub async fn login(State(st): State<Arc<AppState>>, Json(body): Json<LoginRequest>) -> Response {
    let email = body.email.trim().to_lowercase();
    let user = match find_user(&st, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::info!(%email, "login for unknown user");
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "user not found" })),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "user lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("db error: {e}") })),
            )
                .into_response();
        }
    };

    let totp = match build_totp(&user.email, &user.secret) {
        Ok(totp) => totp,
        Err(e) => {
            tracing::error!(error = %e, email = %user.email, "stored TOTP secret is unusable");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };
    if !totp.check_current(body.code.trim()).unwrap_or(false) {
        tracing::info!(email = %user.email, "rejected TOTP code");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "ok": false })),
        )
            .into_response();
    }

    match create_session(&st, &user.email).await {
        Ok(token) => {
            tracing::info!(email = %user.email, role = user.role.as_str(), "login");
            let redirect = if user.role.can_view_reports() {
                "/reports"
            } else {
                "/"
            };
            let mut response = (
                StatusCode::OK,
                Json(serde_json::json!({ "ok": true, "redirect_url": redirect })),
            )
                .into_response();
            if let Ok(value) = HeaderValue::from_str(&session_cookie(&token, SESSION_TTL_SECONDS)) {
                response.headers_mut().append(SET_COOKIE, value);
            }
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("session error: {e}") })),
            )
                .into_response()
        }
    }
}

/// Host-only session cookie. A zero max-age clears it.
pub(crate) fn session_cookie(token: &str, max_age: u64) -> String {
    format!("{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}
