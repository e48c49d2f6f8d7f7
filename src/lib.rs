// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! Hilum Kiosk - Clinic Check-In Kiosk Runtime
//!
//! This crate is the runtime service of one physical check-in terminal. It
//! owns the two stateful subsystems of the kiosk and the thin proxy layer in
//! front of the external booking service.
//!
//! ## Modules
//!
//! - `storage` - Encrypted local clinic-configuration store (redb + AES-GCM)
//! - `idle` - Idle/session lifecycle coordinator (timeout, suppression)
//! - `booking` - Booking service HTTP client, idle-instrumented
//! - `api` - Proxy routes (Axum), session-cookie gated

pub mod api;
pub mod booking;
pub mod config;
pub mod error;
pub mod idle;
pub mod models;
pub mod state;
pub mod storage;
