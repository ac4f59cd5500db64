//! Field-level encryption and masking for PII columns
//!
//! NRIC/FIN and phone numbers are stored encrypted with AES-256-GCM.
//!
//! Format: base64(nonce_12bytes || ciphertext || tag_16bytes)
//!
//! Empty values are stored as the empty string so "not provided" stays
//! distinguishable without decrypting.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// AES-256-GCM key for PII columns
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; KEY_LEN],
}

impl Drop for FieldCipher {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl FieldCipher {
    /// Load the key from its base64 form (32 bytes once decoded)
    pub fn from_base64(b64: &str) -> Result<Self, BoxError> {
        let mut bytes = base64::engine::general_purpose::STANDARD.decode(b64.trim())?;
        if bytes.len() != KEY_LEN {
            let len = bytes.len();
            bytes.zeroize();
            return Err(format!("Field encryption key wrong length: {len} (expected {KEY_LEN})").into());
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self { key })
    }

    /// Derive a key from an arbitrary passphrase (development placeholder keys)
    pub fn derive(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Encrypt plaintext → base64(nonce || ciphertext || tag)
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, &'static str> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| "Invalid key")?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| "Encryption failed")?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(&result))
    }

    /// Decrypt base64(nonce || ciphertext || tag) → plaintext
    pub fn decrypt(&self, encrypted_b64: &str) -> Result<Vec<u8>, &'static str> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(encrypted_b64)
            .map_err(|_| "Invalid base64")?;

        if data.len() < NONCE_LEN + TAG_LEN {
            return Err("Ciphertext too short");
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| "Invalid key")?;
        let nonce = Nonce::from_slice(&data[..NONCE_LEN]);

        cipher
            .decrypt(nonce, &data[NONCE_LEN..])
            .map_err(|_| "Decryption failed (wrong key or tampered data)")
    }

    /// Encrypt a column value; the empty string stays empty
    pub fn encrypt_field(&self, plaintext: &str) -> Result<String, &'static str> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        self.encrypt(plaintext.as_bytes())
    }

    /// Decrypt a column value; the empty string stays empty
    pub fn decrypt_field(&self, encrypted_b64: &str) -> Result<String, &'static str> {
        if encrypted_b64.is_empty() {
            return Ok(String::new());
        }
        let bytes = self.decrypt(encrypted_b64)?;
        String::from_utf8(bytes).map_err(|_| "Decrypted data is not valid UTF-8")
    }
}

fn mask(value: &str, keep: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    let hidden = chars.len() - keep * 2;
    let mut out = String::with_capacity(chars.len());
    out.extend(&chars[..keep]);
    out.extend(std::iter::repeat_n('*', hidden));
    out.extend(&chars[chars.len() - keep..]);
    out
}

/// Keeps the first and last four digits of a phone number visible
pub fn mask_phone(phone: &str) -> String {
    match phone.chars().count() {
        n if n >= 8 => mask(phone, 4),
        n if n >= 6 => mask(phone, 3),
        _ => phone.to_string(),
    }
}

pub fn mask_nric(nric: &str) -> String {
    match nric.chars().count() {
        n if n >= 8 => mask(nric, 4),
        n if n >= 4 => mask(nric, 2),
        _ => nric.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        FieldCipher::from_base64(&base64::engine::general_purpose::STANDARD.encode([7u8; 32]))
            .unwrap()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let c = cipher();
        let blob = c.encrypt_field("S1234567D").unwrap();
        assert_ne!(blob, "S1234567D");
        assert_eq!(c.decrypt_field(&blob).unwrap(), "S1234567D");
    }

    #[test]
    fn nonce_makes_ciphertext_differ() {
        let c = cipher();
        assert_ne!(c.encrypt_field("91234567").unwrap(), c.encrypt_field("91234567").unwrap());
    }

    #[test]
    fn empty_stays_empty() {
        let c = cipher();
        assert_eq!(c.encrypt_field("").unwrap(), "");
        assert_eq!(c.decrypt_field("").unwrap(), "");
    }

    #[test]
    fn wrong_key_fails() {
        let blob = cipher().encrypt_field("S1234567D").unwrap();
        let other = FieldCipher::derive("another key");
        assert!(other.decrypt_field(&blob).is_err());
        assert!(cipher().decrypt_field("bm90IGVub3VnaA==").is_err());
    }

    #[test]
    fn key_length_checked() {
        let short = base64::engine::general_purpose::STANDARD.encode([1u8; 16]);
        assert!(FieldCipher::from_base64(&short).is_err());
        assert!(FieldCipher::from_base64("%%%").is_err());
    }

    #[test]
    fn phone_masking() {
        assert_eq!(mask_phone("91234567"), "91234567");
        assert_eq!(mask_phone("6591234567"), "6591**4567");
        assert_eq!(mask_phone("1234567"), "123*567");
        assert_eq!(mask_phone("12345"), "12345");
        assert_eq!(mask_phone(""), "");
    }

    #[test]
    fn nric_masking() {
        assert_eq!(mask_nric("S1234567D"), "S123*567D");
        assert_eq!(mask_nric("ABCDEFGHIJ"), "ABCD**GHIJ");
        assert_eq!(mask_nric("ABCDE"), "AB*DE");
        assert_eq!(mask_nric("ABC"), "ABC");
        assert_eq!(mask_nric(""), "");
    }
}
