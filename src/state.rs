// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::booking::BookingClient;
use crate::idle::{IdleCoordinator, KeepAliveCountdown};
use crate::storage::ClinicStore;

/// Shared application state.
///
/// Constructed exactly once per kiosk process: the idle coordinator is the
/// process-wide singleton of the idle lifecycle, and the store owns the one
/// database handle. Handlers receive cheap clones.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ClinicStore>,
    pub idle: IdleCoordinator,
    pub booking: BookingClient,
    /// Keep-alive window of a full-screen hold.
    pub keep_alive_timeout: Duration,
    hold: Arc<Mutex<Option<KeepAliveCountdown>>>,
}

impl AppState {
    pub fn new(
        store: ClinicStore,
        idle: IdleCoordinator,
        booking: BookingClient,
        keep_alive_timeout: Duration,
    ) -> Self {
        Self {
            store: Arc::new(store),
            idle,
            booking,
            keep_alive_timeout,
            hold: Arc::new(Mutex::new(None)),
        }
    }

    /// The currently active full-screen hold, if any.
    pub fn hold(&self) -> MutexGuard<'_, Option<KeepAliveCountdown>> {
        self.hold
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
impl AppState {
    /// Fresh state over a temporary database, for handler tests.
    pub(crate) fn for_tests() -> (Self, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = ClinicStore::open(&dir.path().join("kiosk.redb")).unwrap();
        let idle = IdleCoordinator::default();
        let booking = BookingClient::new("http://127.0.0.1:9/api/", idle.clone()).unwrap();
        (
            Self::new(store, idle, booking, crate::idle::DEFAULT_KEEP_ALIVE_TIMEOUT),
            dir,
        )
    }
}
