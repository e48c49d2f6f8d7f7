// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! # Encrypted Local Storage Module
//!
//! Durable, confidentiality-protected storage for the single clinic
//! configuration record this kiosk is bound to.
//!
//! ## Security Model
//!
//! - One random device passphrase per database, generated lazily on first
//!   access and stored in its own table, separate from the data it protects
//! - Every save derives a fresh working key (PBKDF2-HMAC-SHA256, 100 000
//!   iterations, random salt) and encrypts with AES-256-GCM under a random IV
//! - A record that fails authentication or parsing is deleted and reported
//!   as "no data" (self-healing); raw decrypt errors never reach callers
//!
//! ## Storage Layout
//!
//! ```text
//! kiosk.redb
//!   clinic_data      "selectedClinic" -> { id, encryptedData, timestamp }
//!   encryption_key   "key"            -> <random passphrase>
//! ```

pub mod clinic_store;
pub mod crypto;

pub use clinic_store::{ClinicStore, StoreError, StoreResult};
pub use crypto::{CryptoError, EncryptedBlob};
