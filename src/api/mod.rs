// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! Proxy routes in front of the external booking service.
//!
//! Thin passthrough layer: handlers forward to [`crate::booking`], attach
//! the session cookie, and read the selected clinic from the encrypted
//! store. Non-public routes are gated by a session-cookie middleware; the
//! check is presence-only, the booking service owns token validity.

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    models::{
        Booking, BookingQuery, BookingService, CheckInResult, Clinic, ClinicAccount, ClinicTiming,
        ExternalBooking, LoginRequest, LoginResponse, NfcCheckInRequest, Patient, SessionData,
    },
    state::AppState,
};

pub mod auth;
pub mod checkin;
pub mod clinics;
pub mod health;
pub mod hold;

/// Name of the HttpOnly session cookie set on login.
pub const SESSION_COOKIE: &str = "session-token";

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/clinics", get(clinics::list_clinics))
        .route(
            "/api/clinic",
            get(clinics::selected_clinic).put(clinics::select_clinic),
        )
        .route("/api/bookings", get(checkin::find_bookings))
        .route(
            "/api/check-in/{booking_reference}",
            post(checkin::check_in),
        )
        .route("/api/mobile/checkin/nfc", post(checkin::check_in_nfc))
        .route("/api/auth/refresh", post(auth::refresh_kiosk_token))
        .route(
            "/api/idle/hold",
            post(hold::start_hold).delete(hold::release_hold),
        )
        // Outermost layer last: the session gate runs before activity
        // tracking, so an unauthenticated probe never resets the countdown.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track_activity,
        ))
        .layer(middleware::from_fn(require_session));

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/health", get(health::health))
        .merge(protected)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Session Gating
// =============================================================================

/// Reject gated requests that carry no session cookie.
async fn require_session(request: Request, next: Next) -> Response {
    if session_cookie(request.headers()).is_none() {
        return ApiError::unauthorized("No session token found").into_response();
    }
    next.run(request).await
}

/// Treat every gated request as kiosk activity: restart the idle countdown.
///
/// Public routes (login, logout, health) deliberately do not reset — the
/// countdown must never arm pre-authentication.
async fn track_activity(
    axum::extract::State(state): axum::extract::State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    state.idle.reset();
    next.run(request).await
}

/// Extract the session token from the request's cookies.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Extractor for the session token carried by the `session-token` cookie.
pub struct SessionToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for SessionToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_cookie(&parts.headers)
            .map(SessionToken)
            .ok_or_else(|| ApiError::unauthorized("No session token found"))
    }
}

// =============================================================================
// OpenAPI
// =============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::logout,
        auth::refresh_kiosk_token,
        clinics::list_clinics,
        clinics::selected_clinic,
        clinics::select_clinic,
        checkin::find_bookings,
        checkin::check_in,
        checkin::check_in_nfc,
        hold::start_hold,
        hold::release_hold,
        health::health
    ),
    components(
        schemas(
            Clinic,
            ClinicAccount,
            ClinicTiming,
            Booking,
            BookingQuery,
            BookingService,
            CheckInResult,
            ExternalBooking,
            Patient,
            NfcCheckInRequest,
            LoginRequest,
            LoginResponse,
            SessionData,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Staff login and kiosk session"),
        (name = "Clinics", description = "Clinic listing and kiosk binding"),
        (name = "Check-In", description = "Booking lookup and patient check-in"),
        (name = "Idle", description = "Full-screen hold and keep-alive"),
        (name = "Health", description = "Liveness")
    )
)]
struct ApiDoc;
