// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! Staff login/logout and kiosk token refresh.
//!
//! The session token returned by the booking service is stored in an
//! HttpOnly cookie; the kiosk frontend never sees it. Logout tears down the
//! kiosk binding: the cookie is cleared, the encrypted clinic record is
//! deleted, and the idle countdown is suspended until the next login.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    error::ApiError,
    models::{LoginRequest, LoginResponse, SessionData},
    state::AppState,
};

use super::{SessionToken, SESSION_COOKIE};

/// Cookie lifetime: 7 days.
const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

fn session_cookie_header(token: &str) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={SESSION_MAX_AGE_SECS}"
    )
}

fn clear_cookie_header() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0")
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let session = state.booking.login(&request.email, &request.password).await?;

    // The kiosk is authenticated: the idle countdown may run again.
    state.idle.resume();

    let body = Json(LoginResponse {
        success: true,
        session: session.clone(),
    });
    Ok((
        [(header::SET_COOKIE, session_cookie_header(&session.token))],
        body,
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Session and kiosk binding cleared"))
)]
pub async fn logout(State(state): State<AppState>) -> Result<Response, ApiError> {
    // The clinic record is bound to the session; destroy it on logout.
    state.store.clear_clinic_data()?;

    // Back at the login screen: the countdown must never arm pre-auth.
    state.idle.pause();

    Ok((
        [(header::SET_COOKIE, clear_cookie_header())],
        Json(serde_json::json!({ "success": true })),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    responses(
        (status = 200, body = SessionData),
        (status = 401, description = "Session expired")
    )
)]
pub async fn refresh_kiosk_token(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Response, ApiError> {
    let session = state.booking.refresh_kiosk_token(&token).await?;
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie_header(&session.token))],
        Json(session),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_headers_are_http_only_and_scoped() {
        let set = session_cookie_header("tok123");
        assert!(set.starts_with("session-token=tok123;"));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Path=/"));
        assert!(set.contains("Max-Age=604800"));

        let clear = clear_cookie_header();
        assert!(clear.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn login_rejects_missing_fields() {
        let (state, _dir) = AppState::for_tests();
        let request = LoginRequest {
            email: String::new(),
            password: "pw".into(),
        };
        let result = login(State(state), Json(request)).await;
        assert!(matches!(result, Err(e) if e.status == StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn logout_clears_clinic_data_and_pauses_idle() {
        let (state, _dir) = AppState::for_tests();
        state
            .store
            .save_clinic_data(&crate::models::test_fixtures::sample_clinic())
            .unwrap();
        state.idle.resume();

        let response = logout(State(state.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!state.store.is_data_available());
        assert!(state.idle.is_paused());
        assert!(!state.idle.is_armed());
    }
}
