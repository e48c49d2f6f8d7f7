// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! HTTP client for the external booking/auth service.
//!
//! Thin passthrough: endpoint shapes and payloads are owned by the booking
//! service, this client only adds session headers and idle instrumentation.
//! Every request holds an [`ApiCallGuard`](crate::idle::ApiCallGuard) for
//! its entire future, so the idle countdown stays suppressed while a call is
//! in flight and is released on success and failure alike.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::idle::IdleCoordinator;
use crate::models::{Booking, BookingQuery, CheckInResult, Clinic, SessionData};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("booking API base URL is invalid: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("session expired or invalid")]
    Unauthorized,

    #[error("booking API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("booking API returned {status}")]
    Upstream { status: StatusCode },
}

/// Client for the booking service, bound to one base URL.
#[derive(Clone)]
pub struct BookingClient {
    /// API root, e.g. `https://booking.example.com/api/`.
    base_url: Url,
    http: Client,
    idle: IdleCoordinator,
}

impl BookingClient {
    pub fn new(base_url: &str, idle: IdleCoordinator) -> Result<Self, BookingError> {
        // Url::join treats a path without a trailing slash as a file and
        // would drop its last segment.
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            base_url: Url::parse(&base)?,
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                // A redirect from the booking service means the session
                // expired. Surface it instead of chasing a login page.
                .redirect(reqwest::redirect::Policy::none())
                .build()?,
            idle,
        })
    }

    /// Join a path onto the API root.
    fn api_url(&self, path: &str) -> Result<Url, BookingError> {
        Ok(self.base_url.join(path)?)
    }

    /// Join a path onto the service root, one level above `/api/`.
    ///
    /// The auth and mobile endpoints live outside the `/api/` prefix.
    fn root_url(&self, path: &str) -> Result<Url, BookingError> {
        Ok(self.base_url.join("../")?.join(path)?)
    }

    /// Authenticate clinic staff. 401 maps to `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionData, BookingError> {
        let _guard = self.idle.track_api_call();
        let url = self.root_url("auth/api/login")?;
        debug!(%url, "booking login");

        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(BookingError::InvalidCredentials),
            status if !status.is_success() => Err(BookingError::Upstream { status }),
            _ => Ok(response.json().await?),
        }
    }

    /// Exchange the long-lived kiosk token for a fresh session token.
    pub async fn refresh_kiosk_token(&self, token: &str) -> Result<SessionData, BookingError> {
        let _guard = self.idle.track_api_call();
        let url = self.root_url("refreshKioskToken")?;
        let response = self.http.get(url).bearer_auth(token).send().await?;
        Self::json_or_error(response).await
    }

    /// Clinic locations visible to the authenticated account.
    pub async fn list_clinics(&self, session_token: &str) -> Result<Vec<Clinic>, BookingError> {
        let _guard = self.idle.track_api_call();
        let url = self.api_url("account/clinics")?;
        let response = self.session_get(url, session_token).send().await?;
        Self::json_or_error(response).await
    }

    /// Look up bookings by reference code or personal details, scoped by the
    /// clinic nexus number carried in `query`.
    pub async fn find_bookings(
        &self,
        session_token: &str,
        query: &BookingQuery,
    ) -> Result<Vec<Booking>, BookingError> {
        let _guard = self.idle.track_api_call();
        let url = self.api_url("slots/booking")?;
        let response = self
            .session_get(url, session_token)
            .query(query)
            .send()
            .await?;
        Self::json_or_error(response).await
    }

    /// Check a patient in by booking reference.
    pub async fn check_in(
        &self,
        session_token: &str,
        booking_reference: &str,
    ) -> Result<CheckInResult, BookingError> {
        let _guard = self.idle.track_api_call();
        let url = self.api_url(&format!("check-in/{booking_reference}"))?;
        debug!(booking_reference, "booking check-in");
        let response = self.session_get(url, session_token).send().await?;
        Self::json_or_error(response).await
    }

    /// Check a patient in from an NFC tap token.
    pub async fn check_in_nfc(&self, nfc_token: &str) -> Result<CheckInResult, BookingError> {
        let _guard = self.idle.track_api_call();
        let url = self.root_url("mobile/checkin/nfc")?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "token": nfc_token }))
            .send()
            .await?;
        Self::json_or_error(response).await
    }

    /// GET with the session token as both bearer header and upstream cookie,
    /// the header shape the booking service expects.
    fn session_get(&self, url: Url, session_token: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(session_token)
            .header(reqwest::header::COOKIE, format!("token={session_token}"))
    }

    async fn json_or_error<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BookingError> {
        match response.status() {
            StatusCode::UNAUTHORIZED => Err(BookingError::Unauthorized),
            // The upstream signals an expired session with a redirect.
            StatusCode::FOUND => Err(BookingError::Unauthorized),
            status if !status.is_success() => Err(BookingError::Upstream { status }),
            _ => Ok(response.json().await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BookingClient {
        BookingClient::new(
            "https://booking.example.com/api/",
            IdleCoordinator::default(),
        )
        .unwrap()
    }

    #[test]
    fn api_urls_join_under_the_api_prefix() {
        let client = client();
        assert_eq!(
            client.api_url("account/clinics").unwrap().as_str(),
            "https://booking.example.com/api/account/clinics"
        );
        assert_eq!(
            client.api_url("check-in/REF-1").unwrap().as_str(),
            "https://booking.example.com/api/check-in/REF-1"
        );
    }

    #[test]
    fn root_urls_escape_the_api_prefix() {
        let client = client();
        assert_eq!(
            client.root_url("auth/api/login").unwrap().as_str(),
            "https://booking.example.com/auth/api/login"
        );
        assert_eq!(
            client.root_url("mobile/checkin/nfc").unwrap().as_str(),
            "https://booking.example.com/mobile/checkin/nfc"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = BookingClient::new("not a url", IdleCoordinator::default());
        assert!(matches!(result, Err(BookingError::BaseUrl(_))));
    }

    #[tokio::test]
    async fn failed_request_still_releases_idle_suppression() {
        let idle = IdleCoordinator::default();
        // Unroutable address: the request fails fast at the connector.
        let client = BookingClient::new("http://127.0.0.1:9/api/", idle.clone()).unwrap();

        idle.reset();
        let before = idle.active_api_calls();
        let result = client.list_clinics("token").await;

        assert!(result.is_err());
        assert_eq!(idle.active_api_calls(), before);
        assert!(idle.is_armed(), "countdown must re-arm after the failure");
    }
}
