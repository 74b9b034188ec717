//! AES-256-GCM helper for the on-disk fallback tier.
//!
//! The fallback file store already sits behind OS file permissions, but we
//! encrypt the secret column anyway so a bare copy of the database file
//! isn't directly readable. The nonce is generated per encryption and
//! prepended to the ciphertext.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;

#[derive(Debug, Clone, Copy)]
pub struct EncryptionKey(pub [u8; 32]);

pub struct Cipher {
    inner: Aes256Gcm,
}

impl Cipher {
    pub fn new(key: EncryptionKey) -> Self {
        let key = Key::<Aes256Gcm>::from(key.0);
        Self { inner: Aes256Gcm::new(&key) }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);
        let mut ciphertext = self
            .inner
            .encrypt(&nonce, plaintext)
            .expect("AES-GCM encryption of a bounded in-memory buffer cannot fail");
        let mut out = nonce_bytes.to_vec();
        out.append(&mut ciphertext);
        out
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, String> {
        if data.len() < 12 {
            return Err("ciphertext shorter than nonce".to_string());
        }
        let (nonce_bytes, ciphertext) = data.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.inner
            .decrypt(nonce, ciphertext)
            .map_err(|e| format!("decryption failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let cipher = Cipher::new(EncryptionKey([7u8; 32]));
        let ciphertext = cipher.encrypt(b"hello vault");
        let plaintext = cipher.decrypt(&ciphertext).unwrap();
        assert_eq!(plaintext, b"hello vault");
    }

    #[test]
    fn distinct_nonces_for_repeated_calls() {
        let cipher = Cipher::new(EncryptionKey([7u8; 32]));
        let a = cipher.encrypt(b"same input");
        let b = cipher.encrypt(b"same input");
        assert_ne!(a, b);
    }
}
