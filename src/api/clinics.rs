// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! Clinic listing and kiosk binding.
//!
//! Selecting a clinic persists the full record through the encrypted store;
//! from then on every page operates as "this kiosk belongs to clinic X"
//! until logout or a corruption self-heal clears the record.

use axum::{extract::State, http::StatusCode, Json};

use crate::{error::ApiError, models::Clinic, state::AppState};

use super::SessionToken;

#[utoipa::path(
    get,
    path = "/api/clinics",
    tag = "Clinics",
    responses(
        (status = 200, body = [Clinic]),
        (status = 401, description = "Unauthorized - invalid session")
    )
)]
pub async fn list_clinics(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Json<Vec<Clinic>>, ApiError> {
    let clinics = state.booking.list_clinics(&token).await?;
    Ok(Json(clinics))
}

#[utoipa::path(
    get,
    path = "/api/clinic",
    tag = "Clinics",
    responses(
        (status = 200, body = Clinic),
        (status = 404, description = "No clinic selected")
    )
)]
pub async fn selected_clinic(State(state): State<AppState>) -> Result<Json<Clinic>, ApiError> {
    match state.store.get_clinic_data()? {
        Some(clinic) => Ok(Json(clinic)),
        // Also the self-heal path: a corrupted record reads as never set.
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "No clinic selected",
        )),
    }
}

#[utoipa::path(
    put,
    path = "/api/clinic",
    request_body = Clinic,
    tag = "Clinics",
    responses((status = 204, description = "Clinic selection persisted"))
)]
pub async fn select_clinic(
    State(state): State<AppState>,
    Json(clinic): Json<Clinic>,
) -> Result<StatusCode, ApiError> {
    state.store.save_clinic_data(&clinic)?;
    tracing::info!(clinic_id = %clinic.id, name = %clinic.name, "kiosk bound to clinic");
    Ok(StatusCode::NO_CONTENT)
}
