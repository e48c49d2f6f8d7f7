// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! Encrypted clinic-configuration store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `clinic_data`: fixed id `"selectedClinic"` → serialized [`StoredClinicRecord`]
//! - `encryption_key`: fixed id `"key"` → device passphrase
//!
//! The device passphrase is generated once per database (256 bits of
//! entropy), persisted separately from the data it protects, and cached
//! in-process after the first read. It is never derived from device
//! fingerprint characteristics: fingerprints drift across OS and browser
//! updates and would permanently orphan the encrypted record.
//!
//! ## Failure Semantics
//!
//! A record that fails to decrypt or parse is unrecoverable: the store
//! deletes it and reports "no data" instead of propagating the raw error.
//! Callers must treat `None` as possibly meaning "was corrupted", not only
//! "was never set". Database open/write failures propagate normally.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use ring::rand::SystemRandom;
use serde::{Deserialize, Serialize};

use crate::models::Clinic;

use super::crypto::{self, CryptoError, EncryptedBlob};

// =============================================================================
// Table Definitions
// =============================================================================

/// Clinic record table: fixed id → serialized StoredClinicRecord (JSON bytes).
const CLINIC_DATA: TableDefinition<&str, &[u8]> = TableDefinition::new("clinic_data");

/// Device key table: fixed id → passphrase string.
const ENCRYPTION_KEY: TableDefinition<&str, &str> = TableDefinition::new("encryption_key");

/// Fixed primary key of the single clinic record.
const CLINIC_RECORD_ID: &str = "selectedClinic";

/// Fixed primary key of the device encryption key.
const KEY_RECORD_ID: &str = "key";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Stored Record
// =============================================================================

/// On-disk envelope of the clinic record.
///
/// `encrypted_data` is the JSON string of an [`EncryptedBlob`]; `timestamp`
/// records the write time in epoch milliseconds and is informational only
/// (never read back for expiry).
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredClinicRecord {
    id: String,
    encrypted_data: String,
    timestamp: i64,
}

// =============================================================================
// ClinicStore
// =============================================================================

/// Durable, confidentiality-protected storage of exactly one clinic record.
pub struct ClinicStore {
    db: Database,
    rng: SystemRandom,
    /// In-process passphrase cache; prevents duplicate key generation under
    /// concurrent first-time callers.
    passphrase: Mutex<Option<String>>,
}

impl ClinicStore {
    /// Open (or create) the store at the given path.
    ///
    /// Both tables are pre-created so later read transactions never fail;
    /// creating a missing table leaves existing tables untouched, which is
    /// how new stores are introduced across schema revisions.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CLINIC_DATA)?;
            let _ = write_txn.open_table(ENCRYPTION_KEY)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            rng: SystemRandom::new(),
            passphrase: Mutex::new(None),
        })
    }

    // =========================================================================
    // Device Key Lifecycle
    // =========================================================================

    /// Read the device passphrase, generating and persisting it on first use.
    ///
    /// Idempotent: after the first successful read or creation the value is
    /// served from the in-process cache, and the cache lock is held across
    /// the read-or-create so two first-time callers cannot both generate.
    fn get_or_create_key(&self) -> StoreResult<String> {
        let mut cache = self
            .passphrase
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(passphrase) = cache.as_ref() {
            return Ok(passphrase.clone());
        }

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENCRYPTION_KEY)?;
        if let Some(existing) = table.get(KEY_RECORD_ID)? {
            let passphrase = existing.value().to_string();
            *cache = Some(passphrase.clone());
            return Ok(passphrase);
        }
        drop(table);
        drop(read_txn);

        let passphrase = crypto::generate_passphrase(&self.rng)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENCRYPTION_KEY)?;
            table.insert(KEY_RECORD_ID, passphrase.as_str())?;
        }
        write_txn.commit()?;
        tracing::info!("generated new device encryption key");

        *cache = Some(passphrase.clone());
        Ok(passphrase)
    }

    // =========================================================================
    // Clinic Record Operations
    // =========================================================================

    /// Encrypt and persist the clinic record, replacing any previous one.
    pub fn save_clinic_data(&self, clinic: &Clinic) -> StoreResult<()> {
        let passphrase = self.get_or_create_key()?;
        let plaintext = serde_json::to_vec(clinic)?;
        let blob = crypto::seal(&plaintext, &passphrase, &self.rng)?;

        let record = StoredClinicRecord {
            id: CLINIC_RECORD_ID.to_string(),
            encrypted_data: serde_json::to_string(&blob)?,
            timestamp: Utc::now().timestamp_millis(),
        };
        let bytes = serde_json::to_vec(&record)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CLINIC_DATA)?;
            table.insert(CLINIC_RECORD_ID, bytes.as_slice())?;
        }
        write_txn.commit()?;

        tracing::debug!(clinic_id = %clinic.id, "clinic record saved");
        Ok(())
    }

    /// Read and decrypt the clinic record.
    ///
    /// Returns `Ok(None)` when no record exists. A record that fails to
    /// decrypt or parse is deleted and also reported as `Ok(None)`; only
    /// database errors propagate.
    pub fn get_clinic_data(&self) -> StoreResult<Option<Clinic>> {
        let bytes = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(CLINIC_DATA)?;
            match table.get(CLINIC_RECORD_ID)? {
                Some(value) => value.value().to_vec(),
                None => return Ok(None),
            }
        };

        let record: StoredClinicRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => return self.self_heal("record envelope unreadable", &e),
        };

        let blob: EncryptedBlob = match serde_json::from_str(&record.encrypted_data) {
            Ok(blob) => blob,
            Err(e) => return self.self_heal("encrypted blob unreadable", &e),
        };

        let passphrase = self.get_or_create_key()?;
        let plaintext = match crypto::open(&blob, &passphrase) {
            Ok(plaintext) => plaintext,
            Err(e) => return self.self_heal("decryption failed", &e),
        };

        match serde_json::from_slice::<Clinic>(&plaintext) {
            Ok(clinic) => Ok(Some(clinic)),
            Err(e) => self.self_heal("decrypted payload unreadable", &e),
        }
    }

    /// Delete the clinic record (logout, or re-provisioning the kiosk).
    pub fn clear_clinic_data(&self) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CLINIC_DATA)?;
            table.remove(CLINIC_RECORD_ID)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Whether a readable clinic record currently exists.
    ///
    /// `false` on any internal error, never panics.
    pub fn is_data_available(&self) -> bool {
        matches!(self.get_clinic_data(), Ok(Some(_)))
    }

    /// The selected clinic's nexus number, if a record is available.
    pub fn nexus_number(&self) -> StoreResult<Option<String>> {
        Ok(self.get_clinic_data()?.map(|clinic| clinic.nexus_number))
    }

    /// The selected clinic's phone number, if a record is available.
    pub fn phone_number(&self) -> StoreResult<Option<String>> {
        Ok(self.get_clinic_data()?.map(|clinic| clinic.phone))
    }

    /// Drop a record that can no longer be decrypted or parsed.
    ///
    /// Availability over durability: the kiosk re-enters clinic selection
    /// rather than being wedged on an unreadable record. The deletion error
    /// path is logged but not surfaced, matching the read contract.
    fn self_heal(
        &self,
        reason: &str,
        source: &dyn std::error::Error,
    ) -> StoreResult<Option<Clinic>> {
        tracing::warn!(reason, error = %source, "clinic record corrupted, deleting");
        if let Err(e) = self.clear_clinic_data() {
            tracing::error!(error = %e, "failed to delete corrupted clinic record");
        }
        Ok(None)
    }
}

// =============================================================================
// Tests
// =============================================================================
