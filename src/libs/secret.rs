//! Credential codec: an irreversible login hash plus a recoverable copy.
//!
//! Every generated password is stored twice. The PBKDF2 hash is the only
//! thing login verification looks at; the AES-256-CBC copy is the only thing
//! administrative password viewing looks at. Neither is ever derived from the
//! other.
//!
//! The recoverable copy is laid out as `base64url(iv || ciphertext)` where the
//! plaintext block is `sha256(password)[..8] || password`. The check bytes make
//! a wrong or rotated key fail loudly instead of decrypting to garbage.
//!
//! Losing or rotating the key makes every previously encrypted password
//! permanently unrecoverable; the hashes keep working.

use super::error::CodecError;
use aes::Aes256;
use base64::prelude::*;
use block_modes::block_padding::Pkcs7;
use block_modes::{BlockMode, Cbc};
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use rand::RngCore;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

type Aes256Cbc = Cbc<Aes256, Pkcs7>;

pub const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const CHECK_LEN: usize = 8;

/// Both stored forms of one password.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncodedPassword {
    pub hash: String,
    pub encrypted: String,
}

#[derive(Clone)]
pub struct CredentialCodec {
    key: [u8; KEY_LEN],
}

impl std::fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCodec").finish_non_exhaustive()
    }
}

impl CredentialCodec {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Builds a codec from a base64 (standard or URL-safe) encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, CodecError> {
        let encoded = encoded.trim();
        let bytes = BASE64_STANDARD
            .decode(encoded)
            .or_else(|_| BASE64_URL_SAFE.decode(encoded))
            .map_err(|_| CodecError::InvalidKey)?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CodecError::InvalidKey)?;
        Ok(Self::new(key))
    }

    /// A fresh random key, base64 encoded, suitable for the configuration file.
    pub fn generate_key() -> String {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        BASE64_STANDARD.encode(key)
    }

    pub fn encode(&self, plaintext: &str) -> Result<EncodedPassword, CodecError> {
        Ok(EncodedPassword {
            hash: hash_password(plaintext)?,
            encrypted: self.encrypt(plaintext)?,
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        let cipher = Aes256Cbc::new_from_slices(&self.key, &iv).map_err(|_| CodecError::InvalidKey)?;

        let mut payload = Vec::with_capacity(CHECK_LEN + plaintext.len());
        payload.extend_from_slice(&check_bytes(plaintext.as_bytes()));
        payload.extend_from_slice(plaintext.as_bytes());

        let mut blob = iv.to_vec();
        blob.extend(cipher.encrypt_vec(&payload));
        Ok(BASE64_URL_SAFE.encode(blob))
    }

    pub fn decode(&self, encrypted: &str) -> Result<String, CodecError> {
        let blob = BASE64_URL_SAFE.decode(encrypted.trim()).map_err(|_| CodecError::Unrecoverable)?;
        if blob.len() < IV_LEN * 2 || (blob.len() - IV_LEN) % IV_LEN != 0 {
            return Err(CodecError::Unrecoverable);
        }
        let (iv, ciphertext) = blob.split_at(IV_LEN);
        let cipher = Aes256Cbc::new_from_slices(&self.key, iv).map_err(|_| CodecError::InvalidKey)?;
        let payload = cipher.decrypt_vec(ciphertext).map_err(|_| CodecError::Unrecoverable)?;
        if payload.len() < CHECK_LEN {
            return Err(CodecError::Unrecoverable);
        }

        let (check, plaintext) = payload.split_at(CHECK_LEN);
        if check != check_bytes(plaintext) {
            return Err(CodecError::Unrecoverable);
        }
        String::from_utf8(plaintext.to_vec()).map_err(|_| CodecError::Unrecoverable)
    }

    /// Checks `plaintext` against the hash half of an [`EncodedPassword`].
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        verify_password(plaintext, hash)
    }
}

fn check_bytes(plaintext: &[u8]) -> [u8; CHECK_LEN] {
    let digest = Sha256::digest(plaintext);
    let mut check = [0u8; CHECK_LEN];
    check.copy_from_slice(&digest[..CHECK_LEN]);
    check
}

/// Salted PBKDF2-SHA256 PHC string.
pub fn hash_password(plaintext: &str) -> Result<String, CodecError> {
    let salt = SaltString::generate(&mut OsRng);
    Pbkdf2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CodecError::Hash(e.to_string()))
}

/// Login check. Only ever consults the hash.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Pbkdf2.verify_password(plaintext.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}
