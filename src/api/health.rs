// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Liveness response with kiosk provisioning status.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Whether an encrypted clinic record is currently readable.
    pub clinic_selected: bool,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        clinic_selected: state.store.is_data_available(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_fixtures::sample_clinic;

    #[tokio::test]
    async fn health_reflects_clinic_binding() {
        let (state, _dir) = AppState::for_tests();

        let Json(before) = health(State(state.clone())).await;
        assert_eq!(before.status, "ok");
        assert!(!before.clinic_selected);

        state.store.save_clinic_data(&sample_clinic()).unwrap();
        let Json(after) = health(State(state)).await;
        assert!(after.clinic_selected);
    }
}
