// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::booking::BookingError;
use crate::storage::StoreError;

/// Error surfaced by the proxy routes.
///
/// Messages are generic by design: storage and cryptographic detail stays in
/// the logs and never reaches the kiosk screen.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!(error = %e, "clinic store failure");
        Self::internal("failed to load clinic data")
    }
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::InvalidCredentials => Self::unauthorized("Invalid credentials"),
            BookingError::Unauthorized => Self::unauthorized("Unauthorized - invalid session"),
            BookingError::Upstream { status } => {
                tracing::warn!(%status, "booking API error");
                Self::new(StatusCode::BAD_GATEWAY, "booking service request failed")
            }
            other => {
                tracing::error!(error = %other, "booking API failure");
                Self::new(StatusCode::BAD_GATEWAY, "booking service unreachable")
            }
        }
    }
}
