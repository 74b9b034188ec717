//! Tiered credential storage.
//!
//! Secrets (connection passwords, API tokens) are written to the OS
//! keychain when one is available, an encrypted file otherwise, and
//! held in memory as a last resort so a write never outright fails.
//! Reads and deletes walk the same tier order.

mod encryption;
mod error;
mod keyfile;
mod tiers;
mod vault;

use std::path::Path;
use std::sync::Arc;

pub use error::VaultError;
pub use tiers::{CredentialTier, DeleteOutcome, TierFailure, TierResult};
pub use vault::Vault;

use encryption::Cipher;
use tiers::{FileFallbackTier, MemoryTier, OsKeyringTier};

const FALLBACK_DB_FILE: &str = "vault.sqlite3";

/// Builds the standard three-tier vault: OS keychain, then an encrypted
/// SQLite file under `app_data_dir`, then in-memory.
///
/// The fallback tier's database and the in-memory tier are always
/// constructed; the OS keyring tier is attempted first on every call
/// regardless of whether it's actually backed by a running keychain
/// daemon on this machine, since `keyring::Entry` creation is cheap and
/// errors surface per-operation rather than at construction time.
pub fn open(app_data_dir: &Path) -> Result<Vault, VaultError> {
    let key = keyfile::load_or_create(app_data_dir)
        .map_err(|e| VaultError::AllTiersFailed {
            operation: "initialize",
            key: "<fallback-tier-key>".to_string(),
            last_error: e.to_string(),
        })?;
    let cipher = Cipher::new(key);
    let fallback = FileFallbackTier::open(&app_data_dir.join(FALLBACK_DB_FILE), cipher)
        .map_err(|e| VaultError::AllTiersFailed {
            operation: "initialize",
            key: "<fallback-tier-db>".to_string(),
            last_error: e.to_string(),
        })?;

    let tiers: Vec<Arc<dyn CredentialTier>> = vec![
        Arc::new(OsKeyringTier),
        Arc::new(fallback),
        Arc::new(MemoryTier::default()),
    ];
    Ok(Vault::new(tiers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_builds_a_working_vault() {
        let dir = tempfile::tempdir().unwrap();
        let vault = open(dir.path()).unwrap();
        vault.store("integration/key", "value").await.unwrap();
        assert_eq!(vault.get("integration/key").await.unwrap(), "value");
    }
}
