// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! # API Data Models
//!
//! This module defines the data structures shared between the encrypted
//! clinic store, the booking API client, and the proxy routes. All types
//! derive `Serialize`/`Deserialize` with camelCase field names to stay
//! wire-compatible with the external booking service.
//!
//! ## Model Categories
//!
//! - **Clinic**: the configuration record this kiosk is bound to
//! - **Session**: login and kiosk token refresh payloads
//! - **Booking**: appointment lookup and check-in payloads

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// =============================================================================
// Clinic Models
// =============================================================================

/// The clinic configuration this kiosk is bound to.
///
/// Exactly one logical record exists at a time; selecting a new clinic
/// overwrites the previous one in full. Persisted only in encrypted form by
/// [`crate::storage::ClinicStore`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    /// Booking-service identifier for this clinic location, used to scope
    /// slot and booking lookups.
    pub nexus_number: String,
    pub fax_number: String,
    pub transfer_call_number: String,
    pub direction: String,
    pub email: String,
    pub timezone: String,
    pub timezone_offset: String,
    pub account_id: String,
    pub account: ClinicAccount,
    /// Weekly opening hours.
    pub timings: Vec<ClinicTiming>,
}

/// Billing/account linkage for a clinic.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicAccount {
    pub id: String,
    pub name: String,
    pub company_name: String,
}

/// One day/start/end triple of the weekly schedule.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicTiming {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

// =============================================================================
// Session Models
// =============================================================================

/// Staff login request forwarded to the booking service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session payload returned by the booking service on login or refresh.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Response body for a successful proxy login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub session: SessionData,
}

// =============================================================================
// Booking Models
// =============================================================================

/// An appointment returned by the booking lookup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: u64,
    pub booking_reference: String,
    pub patient: Patient,
    pub start_time_stamp: String,
    pub end_time_stamp: String,
    pub service: BookingService,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_booking: Option<ExternalBooking>,
}

/// Patient identity attached to a booking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub birth_date: String,
    #[serde(rename = "Healthcard", skip_serializing_if = "Option::is_none")]
    pub health_card: Option<String>,
}

/// The service a booking is for (e.g. "Ultrasound").
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingService {
    pub service: String,
}

/// Cross-system booking reference, when the appointment originated outside
/// the booking service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalBooking {
    pub external_booking_reference: String,
}

/// Query parameters for a booking lookup: either a reference code or
/// personal details, always scoped by the selected clinic's nexus number.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nexus_number: Option<String>,
}

/// Result of a check-in request, forwarded verbatim to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckInResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// NFC tap check-in request: the token read from the tag's text record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NfcCheckInRequest {
    pub token: String,
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    pub(crate) fn sample_clinic() -> Clinic {
        Clinic {
            id: "clinic-north".into(),
            name: "North".into(),
            address: "1 Main St".into(),
            phone: "5550123".into(),
            nexus_number: "123".into(),
            fax_number: "5550124".into(),
            transfer_call_number: "5550125".into(),
            direction: "Second floor, left of the elevators".into(),
            email: "north@example.com".into(),
            timezone: "America/Toronto".into(),
            timezone_offset: "-05:00".into(),
            account_id: "acct-1".into(),
            account: ClinicAccount {
                id: "acct-1".into(),
                name: "North Account".into(),
                company_name: "Hilum Diagnostics".into(),
            },
            timings: vec![ClinicTiming {
                day: "Monday".into(),
                start_time: "08:00".into(),
                end_time: "17:00".into(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_fixtures::sample_clinic;
    use super::*;

    #[test]
    fn clinic_serializes_camel_case() {
        let clinic = sample_clinic();
        let json = serde_json::to_value(&clinic).unwrap();
        assert_eq!(json["nexusNumber"], "123");
        assert_eq!(json["account"]["companyName"], "Hilum Diagnostics");
        assert_eq!(json["timings"][0]["startTime"], "08:00");
    }

    #[test]
    fn booking_query_skips_unset_fields() {
        let query = BookingQuery {
            booking_reference: Some("REF-1".into()),
            ..BookingQuery::default()
        };
        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(json, r#"{"bookingReference":"REF-1"}"#);
    }

    #[test]
    fn patient_health_card_keeps_legacy_casing() {
        let patient = Patient {
            first_name: "Ada".into(),
            last_name: "Li".into(),
            phone_number: "5550100".into(),
            birth_date: "1990-01-01".into(),
            health_card: Some("HC-9".into()),
        };
        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["Healthcard"], "HC-9");
    }
}
