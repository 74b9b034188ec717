//! Durable connection metadata, with credential storage delegated to
//! the vault and lifecycle events delegated to the bus.

mod connection;
mod error;
mod store;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

pub use connection::Connection;
pub use error::RegistryError;

use connection::credential_key_for;
use portside_events::{Event, EventBus};
use portside_vault::Vault;
use store::Store;

pub struct Registry {
    store: Arc<Store>,
    vault: Arc<Vault>,
    events: EventBus,
}

impl Registry {
    /// Opens the metadata file at `db_path`, running the legacy-schema
    /// migration (embedded `secret` column moved into the vault) if
    /// needed.
    pub async fn open(
        db_path: &Path,
        vault: Arc<Vault>,
        events: EventBus,
    ) -> Result<Self, RegistryError> {
        let store = Arc::new(
            Store::open(db_path).map_err(|e| RegistryError::StorageUnavailable(e.to_string()))?,
        );

        let legacy = {
            let store = Arc::clone(&store);
            tokio::task::spawn_blocking(move || store.legacy_secrets_needing_migration())
                .await
                .expect("legacy scan task panicked")
                .map_err(|e| RegistryError::StorageUnavailable(e.to_string()))?
        };

        if !legacy.is_empty() {
            for (id, secret) in &legacy {
                vault.store(&credential_key_for(id), secret).await?;
            }
            let store = Arc::clone(&store);
            tokio::task::spawn_blocking(move || store.drop_legacy_secret_column())
                .await
                .expect("legacy column drop task panicked")
                .map_err(|e| RegistryError::StorageUnavailable(e.to_string()))?;
            events.log(
                portside_events::LogLevel::Info,
                format!("migrated {} legacy embedded credential(s) into the vault", legacy.len()),
            );
        }

        Ok(Self { store, vault, events })
    }

    pub async fn list(&self) -> Result<Vec<Connection>, RegistryError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.list())
            .await
            .expect("list task panicked")
            .map_err(|e| RegistryError::StorageUnavailable(e.to_string()))
    }

    pub async fn get(&self, id: &str) -> Result<Connection, RegistryError> {
        let store = Arc::clone(&self.store);
        let id_owned = id.to_string();
        let found = tokio::task::spawn_blocking(move || store.get(&id_owned))
            .await
            .expect("get task panicked")
            .map_err(|e| RegistryError::StorageUnavailable(e.to_string()))?;
        found.ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub async fn get_credential(&self, id: &str) -> Result<String, RegistryError> {
        let connection = self.get(id).await?;
        Ok(self.vault.get(&connection.credential_key).await?)
    }

    pub async fn create(
        &self,
        name: &str,
        driver_type: &str,
        credential: &str,
    ) -> Result<Connection, RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidArgument("name must not be empty".to_string()));
        }
        if driver_type.trim().is_empty() {
            return Err(RegistryError::InvalidArgument(
                "driver_type must not be empty".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let credential_key = credential_key_for(&id);

        // Vault-first: a failure here must leave no metadata row behind.
        self.vault.store(&credential_key, credential).await?;

        let now = Utc::now();
        let connection = Connection {
            id,
            name: name.to_string(),
            driver_type: driver_type.to_string(),
            credential_key,
            created_at: now,
            updated_at: now,
        };

        let store = Arc::clone(&self.store);
        let to_insert = connection.clone();
        tokio::task::spawn_blocking(move || store.insert(&to_insert))
            .await
            .expect("insert task panicked")
            .map_err(|e| RegistryError::StorageUnavailable(e.to_string()))?;

        let payload = serde_json::to_value(&connection)
            .expect("Connection always serializes to JSON");
        self.events.emit(Event::ConnectionCreated(payload));

        Ok(connection)
    }

    pub async fn delete(&self, id: &str) -> Result<(), RegistryError> {
        let connection = self.get(id).await?;

        if !connection.credential_key.is_empty() {
            if let Err(e) = self.vault.delete(&connection.credential_key).await {
                warn!(id = %id, error = %e, "credential deletion failed during connection delete");
            }
        }

        let store = Arc::clone(&self.store);
        let id_owned = id.to_string();
        let removed = tokio::task::spawn_blocking(move || store.delete(&id_owned))
            .await
            .expect("delete task panicked")
            .map_err(|e| RegistryError::StorageUnavailable(e.to_string()))?;

        if removed == 0 {
            return Err(RegistryError::NotFound(id.to_string()));
        }

        self.events.emit(Event::ConnectionDeleted { id: id.to_string() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_registry() -> (Registry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let vault = Arc::new(portside_vault::open(dir.path()).unwrap());
        let events = EventBus::new();
        let registry = Registry::open(&dir.path().join("connections.sqlite3"), vault, events)
            .await
            .unwrap();
        (registry, dir)
    }

    #[tokio::test]
    async fn create_list_delete_round_trip() {
        let (registry, _dir) = test_registry().await;
        let created = registry.create("db1", "mysql", "{\"u\":\"a\"}").await.unwrap();

        let listed = registry.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "db1");

        assert_eq!(registry.get_credential(&created.id).await.unwrap(), "{\"u\":\"a\"}");

        registry.delete(&created.id).await.unwrap();
        assert!(registry.list().await.unwrap().is_empty());
        assert!(registry.get_credential(&created.id).await.is_err());
    }

    #[tokio::test]
    async fn delete_missing_connection_is_not_found() {
        let (registry, _dir) = test_registry().await;
        let err = registry.delete("nonexistent").await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_rejects_empty_name() {
        let (registry, _dir) = test_registry().await;
        let err = registry.create("", "mysql", "secret").await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn created_event_carries_the_new_connection() {
        let (registry, _dir) = test_registry().await;
        let mut rx = registry.events.subscribe();
        let created = registry.create("db1", "mysql", "secret").await.unwrap();
        let event = rx.recv().await.unwrap();
        match event {
            Event::ConnectionCreated(value) => {
                assert_eq!(value["id"], serde_json::json!(created.id));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
