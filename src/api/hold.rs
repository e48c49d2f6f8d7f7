// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! Full-screen hold with a keep-alive confirmation window.
//!
//! While the kiosk shows a full-screen surface the patient must act on (QR
//! code display), the idle countdown is paused and a keep-alive countdown
//! runs in its place. The frontend re-posts the hold each time the patient
//! confirms they are still present; releasing the hold, or letting the
//! keep-alive expire, hands control back to the idle coordinator.

use axum::{extract::State, http::StatusCode};

use crate::idle::KeepAliveCountdown;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/idle/hold",
    tag = "Idle",
    responses((status = 204, description = "Hold started or extended"))
)]
pub async fn start_hold(State(state): State<AppState>) -> StatusCode {
    state.idle.pause();

    let idle = state.idle.clone();
    let countdown = KeepAliveCountdown::start(state.keep_alive_timeout, move || {
        tracing::info!("keep-alive expired, kiosk returns to idle tracking");
        idle.resume();
    });

    // Replacing the previous hold cancels its countdown via Drop, so a
    // re-post restarts the window from the full duration.
    *state.hold() = Some(countdown);
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    delete,
    path = "/api/idle/hold",
    tag = "Idle",
    responses((status = 204, description = "Hold released"))
)]
pub async fn release_hold(State(state): State<AppState>) -> StatusCode {
    if let Some(countdown) = state.hold().take() {
        countdown.confirm();
    }
    state.idle.resume();
    StatusCode::NO_CONTENT
}
