//! Authenticated envelope
//!
//! Layout (base64, standard alphabet):
//!
//! ```text
//! hmac[32] | nonce[12] | gcm_tag[16] | ciphertext
//! ```
//!
//! The HMAC-SHA256 covers `nonce | gcm_tag | ciphertext` and is checked in
//! constant time before any decryption is attempted.

use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce, Tag};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{Result, StoreError};

type HmacSha256 = Hmac<Sha256>;

const MAC_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = MAC_LEN + NONCE_LEN + TAG_LEN;

/// Master secret shipped with the application
pub const DEFAULT_MASTER_SECRET: &str = "SYSDIAG_LOCAL_STORE_MASTER_V1";

/// Encryption and integrity sub-keys derived from one master secret
#[derive(Clone)]
pub struct Keys {
    enc: [u8; 32],
    mac: [u8; 32],
}

impl std::fmt::Debug for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Keys(..)")
    }
}

impl Keys {
    /// `enc = SHA-256(master + "_ENC")`, `mac = SHA-256(master + "_HMAC")`
    pub fn derive(master: &str) -> Self {
        let mut enc = [0u8; 32];
        let mut mac = [0u8; 32];
        enc.copy_from_slice(&Sha256::digest(format!("{master}_ENC")));
        mac.copy_from_slice(&Sha256::digest(format!("{master}_HMAC")));
        Self { enc, mac }
    }

    fn mac(&self) -> Result<HmacSha256> {
        <HmacSha256 as Mac>::new_from_slice(&self.mac).map_err(|_| StoreError::Key)
    }
}

impl Default for Keys {
    fn default() -> Self {
        Self::derive(DEFAULT_MASTER_SECRET)
    }
}

/// Encrypt and sign `plaintext` under a fresh random nonce
pub fn seal(keys: &Keys, plaintext: &[u8]) -> Result<String> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill(&mut nonce);

    let cipher = <Aes256Gcm as KeyInit>::new_from_slice(&keys.enc).map_err(|_| StoreError::Key)?;
    let mut ciphertext = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut ciphertext)
        .map_err(|_| StoreError::Encrypt)?;

    let mut body = Vec::with_capacity(NONCE_LEN + TAG_LEN + ciphertext.len());
    body.extend_from_slice(&nonce);
    body.extend_from_slice(tag.as_slice());
    body.extend_from_slice(&ciphertext);

    let mut mac = keys.mac()?;
    mac.update(&body);
    let signature = mac.finalize().into_bytes();

    let mut blob = Vec::with_capacity(MAC_LEN + body.len());
    blob.extend_from_slice(&signature);
    blob.extend_from_slice(&body);
    Ok(STANDARD.encode(blob))
}

/// Verify and decrypt an envelope produced by [`seal`]
pub fn open(keys: &Keys, encoded: &str) -> Result<Vec<u8>> {
    let blob = STANDARD.decode(encoded.trim())?;
    if blob.len() < HEADER_LEN {
        return Err(StoreError::Truncated(blob.len()));
    }

    let (signature, body) = blob.split_at(MAC_LEN);
    let mut mac = keys.mac()?;
    mac.update(body);
    mac.verify_slice(signature).map_err(|_| StoreError::Integrity)?;

    let (nonce, rest) = body.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let cipher = <Aes256Gcm as KeyInit>::new_from_slice(&keys.enc).map_err(|_| StoreError::Key)?;
    let mut plaintext = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            &mut plaintext,
            Tag::from_slice(tag),
        )
        .map_err(|_| StoreError::Decrypt)?;
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let keys = Keys::default();
        let sealed = seal(&keys, b"[1,2,3]").unwrap();
        assert_eq!(open(&keys, &sealed).unwrap(), b"[1,2,3]");
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let keys = Keys::default();
        let a = seal(&keys, b"same").unwrap();
        let b = seal(&keys, b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_any_flipped_byte_is_rejected() {
        let keys = Keys::default();
        let blob = STANDARD.decode(seal(&keys, b"{\"score\":12.5}").unwrap()).unwrap();
        for i in 0..blob.len() {
            let mut tampered = blob.clone();
            tampered[i] ^= 0x01;
            let err = open(&keys, &STANDARD.encode(&tampered)).unwrap_err();
            assert!(matches!(err, StoreError::Integrity), "byte {i}: {err}");
        }
    }

    #[test]
    fn test_wrong_secret_fails_integrity() {
        let sealed = seal(&Keys::derive("one"), b"data").unwrap();
        assert!(matches!(
            open(&Keys::derive("two"), &sealed),
            Err(StoreError::Integrity)
        ));
    }

    #[test]
    fn test_truncated_and_garbage_input() {
        let keys = Keys::default();
        assert!(matches!(
            open(&keys, &STANDARD.encode([0u8; 10])),
            Err(StoreError::Truncated(10))
        ));
        assert!(matches!(open(&keys, "not base64!!"), Err(StoreError::Encoding(_))));
    }
}
