//! Cascade orchestration across the configured tiers.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::VaultError;
use crate::tiers::{CredentialTier, DeleteOutcome};

/// Reads and writes go through the tiers in order. `get`/`store` stop at
/// the first tier that succeeds; `delete` is best-effort across every
/// tier so a credential can't survive in a lower tier after being
/// "removed".
pub struct Vault {
    tiers: Vec<Arc<dyn CredentialTier>>,
}

impl Vault {
    pub fn new(tiers: Vec<Arc<dyn CredentialTier>>) -> Self {
        assert!(!tiers.is_empty(), "vault requires at least one tier");
        Self { tiers }
    }

    pub async fn get(&self, key: &str) -> Result<String, VaultError> {
        let key = key.to_string();
        let mut last_error = None;
        for tier in &self.tiers {
            let tier_name = tier.name();
            let tier = Arc::clone(tier);
            let k = key.clone();
            let result = tokio::task::spawn_blocking(move || tier.get(&k))
                .await
                .expect("tier get task panicked");
            match result {
                Ok(Some(secret)) => return Ok(secret),
                Ok(None) => continue,
                Err(e) => {
                    warn!(tier = tier_name, "vault tier get failed, trying next tier");
                    last_error = Some(e.0);
                }
            }
        }
        match last_error {
            Some(last_error) => Err(VaultError::AllTiersFailed {
                operation: "read",
                key,
                last_error,
            }),
            None => Err(VaultError::NotFound(key)),
        }
    }

    pub async fn store(&self, key: &str, secret: &str) -> Result<(), VaultError> {
        let key_owned = key.to_string();
        let secret_owned = secret.to_string();
        let mut last_error = None;
        for tier in &self.tiers {
            let tier = Arc::clone(tier);
            let k = key_owned.clone();
            let s = secret_owned.clone();
            let result = tokio::task::spawn_blocking(move || tier.store(&k, &s))
                .await
                .expect("tier store task panicked");
            match result {
                Ok(()) => {
                    debug!(key = %key_owned, "credential stored");
                    return Ok(());
                }
                Err(e) => last_error = Some(e.0),
            }
        }
        Err(VaultError::AllTiersFailed {
            operation: "write",
            key: key_owned,
            last_error: last_error.unwrap_or_else(|| "no tiers configured".to_string()),
        })
    }

    /// Removes the key from every tier, not just the first one that has
    /// it. Succeeds as long as no tier that might have held the key
    /// errored out; a tier reporting the key absent is not a failure.
    pub async fn delete(&self, key: &str) -> Result<(), VaultError> {
        let key_owned = key.to_string();
        let mut any_removed = false;
        let mut last_error = None;
        for tier in &self.tiers {
            let tier = Arc::clone(tier);
            let k = key_owned.clone();
            let result = tokio::task::spawn_blocking(move || tier.delete(&k))
                .await
                .expect("tier delete task panicked");
            match result {
                Ok(DeleteOutcome::Removed) => any_removed = true,
                Ok(DeleteOutcome::NotPresent) => {}
                Err(e) => last_error = Some(e.0),
            }
        }
        match last_error {
            Some(last_error) if !any_removed => Err(VaultError::AllTiersFailed {
                operation: "delete",
                key: key_owned,
                last_error,
            }),
            Some(last_error) => {
                warn!(key = %key_owned, error = %last_error, "credential deleted from some tiers but not all");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::MemoryTier;

    fn memory_vault() -> Vault {
        Vault::new(vec![Arc::new(MemoryTier::default())])
    }

    #[tokio::test]
    async fn store_then_get() {
        let vault = memory_vault();
        vault.store("db/prod", "hunter2").await.unwrap();
        assert_eq!(vault.get("db/prod").await.unwrap(), "hunter2");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let vault = memory_vault();
        let err = vault.get("missing").await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let vault = memory_vault();
        vault.store("db/prod", "hunter2").await.unwrap();
        vault.delete("db/prod").await.unwrap();
        vault.delete("db/prod").await.unwrap();
        assert!(vault.get("db/prod").await.is_err());
    }

    #[tokio::test]
    async fn falls_through_to_second_tier() {
        struct AlwaysMissing;
        impl CredentialTier for AlwaysMissing {
            fn name(&self) -> &'static str {
                "always-missing"
            }
            fn get(&self, _key: &str) -> crate::tiers::TierResult<Option<String>> {
                Ok(None)
            }
            fn store(&self, _key: &str, _secret: &str) -> crate::tiers::TierResult<()> {
                Err(crate::tiers::TierFailure("tier 1 unavailable".to_string()))
            }
            fn delete(&self, _key: &str) -> crate::tiers::TierResult<DeleteOutcome> {
                Ok(DeleteOutcome::NotPresent)
            }
        }

        let vault = Vault::new(vec![Arc::new(AlwaysMissing), Arc::new(MemoryTier::default())]);
        vault.store("db/prod", "hunter2").await.unwrap();
        assert_eq!(vault.get("db/prod").await.unwrap(), "hunter2");
    }
}
