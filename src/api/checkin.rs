// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! Booking lookup and patient check-in.
//!
//! Lookups are always scoped by the selected clinic's nexus number read
//! from the encrypted store; a kiosk with no readable clinic record cannot
//! serve patients and answers 409 so the frontend re-enters provisioning.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::ApiError,
    models::{Booking, BookingQuery, CheckInResult, NfcCheckInRequest},
    state::AppState,
};

use super::SessionToken;

#[utoipa::path(
    get,
    path = "/api/bookings",
    params(BookingQuery),
    tag = "Check-In",
    responses(
        (status = 200, body = [Booking]),
        (status = 409, description = "No clinic selected on this kiosk")
    )
)]
pub async fn find_bookings(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Query(query): Query<BookingQuery>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let query = scope_to_clinic(query, &state.store)?;
    let bookings = state.booking.find_bookings(&token, &query).await?;
    tracing::debug!(results = bookings.len(), "booking lookup");
    Ok(Json(bookings))
}

/// Force the lookup onto the bound clinic's nexus number.
///
/// The binding owns the scope; a caller-supplied nexus number is discarded
/// so a kiosk can never query bookings of another clinic.
fn scope_to_clinic(
    mut query: BookingQuery,
    store: &crate::storage::ClinicStore,
) -> Result<BookingQuery, ApiError> {
    query.nexus_number = Some(
        store
            .nexus_number()?
            .ok_or_else(|| ApiError::conflict("No clinic selected"))?,
    );
    Ok(query)
}

#[utoipa::path(
    post,
    path = "/api/check-in/{booking_reference}",
    params(("booking_reference" = String, Path, description = "Reference code of the booking")),
    tag = "Check-In",
    responses((status = 200, body = CheckInResult))
)]
pub async fn check_in(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(booking_reference): Path<String>,
) -> Result<Json<CheckInResult>, ApiError> {
    let result = state.booking.check_in(&token, &booking_reference).await?;
    tracing::info!(booking_reference, success = result.success, "check-in");
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/mobile/checkin/nfc",
    request_body = NfcCheckInRequest,
    tag = "Check-In",
    responses((status = 200, body = CheckInResult))
)]
pub async fn check_in_nfc(
    State(state): State<AppState>,
    Json(request): Json<NfcCheckInRequest>,
) -> Result<Json<CheckInResult>, ApiError> {
    if request.token.is_empty() {
        return Err(ApiError::bad_request("NFC token is required"));
    }
    let result = state.booking.check_in_nfc(&request.token).await?;
    Ok(Json(result))
}
