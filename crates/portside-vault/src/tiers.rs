//! The three storage tiers the vault cascades through.
//!
//! Each tier is a plain synchronous implementation; the async [`Vault`]
//! wraps every call in `spawn_blocking` since keychain access and SQLite
//! I/O both block the calling thread.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use rusqlite::Connection;

use crate::encryption::Cipher;

/// What happened to a key during a tier's `delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    NotPresent,
}

#[derive(Debug, Clone)]
pub struct TierFailure(pub String);

impl std::fmt::Display for TierFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type TierResult<T> = Result<T, TierFailure>;

/// A single link in the vault's storage cascade.
pub trait CredentialTier: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the key is absent in this tier, distinct from a
    /// tier failure.
    fn get(&self, key: &str) -> TierResult<Option<String>>;

    fn store(&self, key: &str, secret: &str) -> TierResult<()>;

    fn delete(&self, key: &str) -> TierResult<DeleteOutcome>;
}

const SERVICE_NAME: &str = "portside";

/// Tier 1: the OS-native credential store (Keychain, Credential Manager,
/// Secret Service).
pub struct OsKeyringTier;

impl CredentialTier for OsKeyringTier {
    fn name(&self) -> &'static str {
        "os-keyring"
    }

    fn get(&self, key: &str) -> TierResult<Option<String>> {
        let entry = keyring::Entry::new(SERVICE_NAME, key)
            .map_err(|e| TierFailure(e.to_string()))?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(TierFailure(e.to_string())),
        }
    }

    fn store(&self, key: &str, secret: &str) -> TierResult<()> {
        let entry = keyring::Entry::new(SERVICE_NAME, key)
            .map_err(|e| TierFailure(e.to_string()))?;
        entry.set_password(secret).map_err(|e| TierFailure(e.to_string()))
    }

    fn delete(&self, key: &str) -> TierResult<DeleteOutcome> {
        let entry = keyring::Entry::new(SERVICE_NAME, key)
            .map_err(|e| TierFailure(e.to_string()))?;
        match entry.delete_password() {
            Ok(()) => Ok(DeleteOutcome::Removed),
            Err(keyring::Error::NoEntry) => Ok(DeleteOutcome::NotPresent),
            Err(e) => Err(TierFailure(e.to_string())),
        }
    }
}

/// Tier 2: an encrypted SQLite file used when no OS keychain is
/// available (headless Linux, CI, sandboxed environments).
pub struct FileFallbackTier {
    conn: Mutex<Connection>,
    cipher: Cipher,
}

impl FileFallbackTier {
    pub fn open(db_path: &std::path::Path, cipher: Cipher) -> rusqlite::Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS credentials (
                key    TEXT PRIMARY KEY,
                secret BLOB NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn: Mutex::new(conn), cipher })
    }
}

impl CredentialTier for FileFallbackTier {
    fn name(&self) -> &'static str {
        "file-fallback"
    }

    fn get(&self, key: &str) -> TierResult<Option<String>> {
        let conn = self.conn.lock().expect("fallback tier connection mutex poisoned");
        let mut stmt = conn
            .prepare("SELECT secret FROM credentials WHERE key = ?1")
            .map_err(|e| TierFailure(e.to_string()))?;
        let mut rows = stmt.query([key]).map_err(|e| TierFailure(e.to_string()))?;
        match rows.next().map_err(|e| TierFailure(e.to_string()))? {
            Some(row) => {
                let ciphertext: Vec<u8> = row.get(0).map_err(|e| TierFailure(e.to_string()))?;
                let plaintext = self.cipher.decrypt(&ciphertext).map_err(TierFailure)?;
                let secret = String::from_utf8(plaintext)
                    .map_err(|e| TierFailure(format!("stored secret is not valid utf-8: {e}")))?;
                Ok(Some(secret))
            }
            None => Ok(None),
        }
    }

    fn store(&self, key: &str, secret: &str) -> TierResult<()> {
        let ciphertext = self.cipher.encrypt(secret.as_bytes());
        let conn = self.conn.lock().expect("fallback tier connection mutex poisoned");
        conn.execute(
            "INSERT INTO credentials (key, secret) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET secret = excluded.secret",
            rusqlite::params![key, ciphertext],
        )
        .map_err(|e| TierFailure(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> TierResult<DeleteOutcome> {
        let conn = self.conn.lock().expect("fallback tier connection mutex poisoned");
        let affected = conn
            .execute("DELETE FROM credentials WHERE key = ?1", [key])
            .map_err(|e| TierFailure(e.to_string()))?;
        Ok(if affected > 0 { DeleteOutcome::Removed } else { DeleteOutcome::NotPresent })
    }
}

/// Tier 3: process-local memory, the last resort so a credential write
/// never outright fails even with no disk and no keychain.
#[derive(Default)]
pub struct MemoryTier {
    entries: RwLock<HashMap<String, String>>,
}

impl CredentialTier for MemoryTier {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> TierResult<Option<String>> {
        let entries = self.entries.read().expect("memory tier lock poisoned");
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, secret: &str) -> TierResult<()> {
        let mut entries = self.entries.write().expect("memory tier lock poisoned");
        entries.insert(key.to_string(), secret.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> TierResult<DeleteOutcome> {
        let mut entries = self.entries.write().expect("memory tier lock poisoned");
        Ok(if entries.remove(key).is_some() { DeleteOutcome::Removed } else { DeleteOutcome::NotPresent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_tier_round_trip() {
        let tier = MemoryTier::default();
        assert_eq!(tier.get("k").unwrap(), None);
        tier.store("k", "secret").unwrap();
        assert_eq!(tier.get("k").unwrap(), Some("secret".to_string()));
        assert_eq!(tier.delete("k").unwrap(), DeleteOutcome::Removed);
        assert_eq!(tier.delete("k").unwrap(), DeleteOutcome::NotPresent);
    }

    #[test]
    fn file_fallback_tier_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = Cipher::new(crate::encryption::EncryptionKey([3u8; 32]));
        let tier = FileFallbackTier::open(&dir.path().join("vault.sqlite3"), cipher).unwrap();
        tier.store("db/prod", "s3cret").unwrap();
        assert_eq!(tier.get("db/prod").unwrap(), Some("s3cret".to_string()));
        tier.store("db/prod", "rotated").unwrap();
        assert_eq!(tier.get("db/prod").unwrap(), Some("rotated".to_string()));
        assert_eq!(tier.delete("db/prod").unwrap(), DeleteOutcome::Removed);
        assert_eq!(tier.get("db/prod").unwrap(), None);
    }
}
