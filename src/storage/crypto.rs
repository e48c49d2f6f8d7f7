// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! Authenticated encryption for the clinic record at rest.
//!
//! The stored device key acts as a passphrase: every seal derives a fresh
//! 256-bit working key from it with PBKDF2-HMAC-SHA256 (100 000 iterations)
//! over a random salt, then encrypts with AES-256-GCM under a random IV.
//! Salt and IV are regenerated on every call and never reused, so sealing
//! identical plaintext twice yields different blobs.
//!
//! ## Blob Layout
//!
//! The serialized form is a JSON object:
//!
//! ```json
//! { "encrypted": "<base64 ciphertext+tag>", "salt": [..16 bytes..], "iv": [..12 bytes..] }
//! ```

use std::num::NonZeroU32;

use base64ct::{Base64, Encoding};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

/// PBKDF2 salt length in bytes.
pub const SALT_LEN: usize = 16;

/// PBKDF2 iteration count for working-key derivation.
const PBKDF2_ITERATIONS: NonZeroU32 = NonZeroU32::new(100_000).unwrap();

/// Entropy of the generated device passphrase in bytes (256 bits).
const PASSPHRASE_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("random generator unavailable")]
    Rng,

    #[error("encryption failed")]
    Seal,

    #[error("decryption failed")]
    Open,

    #[error("malformed encrypted blob: {0}")]
    Malformed(String),
}

/// Serialized form of one sealed record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// Base64 of ciphertext with the GCM tag appended.
    pub encrypted: String,
    /// PBKDF2 salt, fresh per seal.
    pub salt: Vec<u8>,
    /// AES-GCM nonce, fresh per seal.
    pub iv: Vec<u8>,
}

/// Generate a random device passphrase (base64 of 32 random bytes).
pub fn generate_passphrase(rng: &SystemRandom) -> Result<String, CryptoError> {
    let mut bytes = [0u8; PASSPHRASE_LEN];
    rng.fill(&mut bytes).map_err(|_| CryptoError::Rng)?;
    Ok(Base64::encode_string(&bytes))
}

/// Derive the 256-bit working key from the passphrase and a salt.
fn derive_key(passphrase: &str, salt: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        PBKDF2_ITERATIONS,
        salt,
        passphrase.as_bytes(),
        &mut key,
    );
    key
}

/// Encrypt `plaintext` under a working key derived from `passphrase`.
///
/// A fresh salt and IV are drawn from `rng` on every call.
pub fn seal(
    plaintext: &[u8],
    passphrase: &str,
    rng: &SystemRandom,
) -> Result<EncryptedBlob, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| CryptoError::Rng)?;
    let mut iv = [0u8; NONCE_LEN];
    rng.fill(&mut iv).map_err(|_| CryptoError::Rng)?;

    let key = derive_key(passphrase, &salt);
    let unbound = UnboundKey::new(&AES_256_GCM, &key).map_err(|_| CryptoError::Seal)?;
    let sealing_key = LessSafeKey::new(unbound);

    let mut in_out = plaintext.to_vec();
    sealing_key
        .seal_in_place_append_tag(Nonce::assume_unique_for_key(iv), Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::Seal)?;

    Ok(EncryptedBlob {
        encrypted: Base64::encode_string(&in_out),
        salt: salt.to_vec(),
        iv: iv.to_vec(),
    })
}

/// Decrypt a blob with the working key re-derived from its stored salt.
///
/// Any tampering with the ciphertext, salt, or IV fails the GCM tag check
/// and surfaces as [`CryptoError::Open`].
pub fn open(blob: &EncryptedBlob, passphrase: &str) -> Result<Vec<u8>, CryptoError> {
    let mut ciphertext = Base64::decode_vec(&blob.encrypted)
        .map_err(|e| CryptoError::Malformed(format!("invalid base64: {e}")))?;

    let nonce = Nonce::try_assume_unique_for_key(&blob.iv)
        .map_err(|_| CryptoError::Malformed(format!("invalid iv length {}", blob.iv.len())))?;

    let key = derive_key(passphrase, &blob.salt);
    let unbound = UnboundKey::new(&AES_256_GCM, &key).map_err(|_| CryptoError::Open)?;
    let opening_key = LessSafeKey::new(unbound);

    let plaintext = opening_key
        .open_in_place(nonce, Aad::empty(), &mut ciphertext)
        .map_err(|_| CryptoError::Open)?;

    Ok(plaintext.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_round_trip() {
        let rng = SystemRandom::new();
        let passphrase = generate_passphrase(&rng).unwrap();

        let blob = seal(b"clinic payload", &passphrase, &rng).unwrap();
        let plaintext = open(&blob, &passphrase).unwrap();
        assert_eq!(plaintext, b"clinic payload");
    }

    #[test]
    fn sealing_identical_input_never_reuses_salt_or_iv() {
        let rng = SystemRandom::new();
        let passphrase = generate_passphrase(&rng).unwrap();

        let first = seal(b"same data", &passphrase, &rng).unwrap();
        let second = seal(b"same data", &passphrase, &rng).unwrap();

        assert_ne!(first.salt, second.salt);
        assert_ne!(first.iv, second.iv);
        assert_ne!(first.encrypted, second.encrypted);
    }

    #[test]
    fn wrong_passphrase_fails_to_open() {
        let rng = SystemRandom::new();
        let passphrase = generate_passphrase(&rng).unwrap();
        let other = generate_passphrase(&rng).unwrap();

        let blob = seal(b"secret", &passphrase, &rng).unwrap();
        assert!(matches!(open(&blob, &other), Err(CryptoError::Open)));
    }

    #[test]
    fn tampered_ciphertext_fails_tag_check() {
        let rng = SystemRandom::new();
        let passphrase = generate_passphrase(&rng).unwrap();

        let mut blob = seal(b"secret", &passphrase, &rng).unwrap();
        let mut bytes = Base64::decode_vec(&blob.encrypted).unwrap();
        bytes[0] ^= 0xFF;
        blob.encrypted = Base64::encode_string(&bytes);

        assert!(matches!(open(&blob, &passphrase), Err(CryptoError::Open)));
    }

    #[test]
    fn garbage_base64_is_malformed() {
        let blob = EncryptedBlob {
            encrypted: "not base64 at all!!!".into(),
            salt: vec![0; SALT_LEN],
            iv: vec![0; NONCE_LEN],
        };
        assert!(matches!(open(&blob, "p"), Err(CryptoError::Malformed(_))));
    }

    #[test]
    fn generated_passphrases_are_unique_and_high_entropy() {
        let rng = SystemRandom::new();
        let a = generate_passphrase(&rng).unwrap();
        let b = generate_passphrase(&rng).unwrap();
        assert_ne!(a, b);
        // 32 bytes of entropy encode to 44 base64 characters.
        assert_eq!(a.len(), 44);
    }
}
