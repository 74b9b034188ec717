//! Wires the Plugin Host, Connection Registry, Credential Vault, and
//! Event Bus together behind the operations a UI actually calls.
//!
//! Neither the registry nor the plugin host calls into the other; this
//! module is where their results get composed for a caller (e.g. a
//! `connection_tree` request needs both a plugin invocation and the
//! connection's stored credential).

mod error;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use directories::ProjectDirs;
use tokio::sync::broadcast;

pub use error::CoreError;
pub use portside_events::{AppLog, Event, LogLevel};
pub use portside_plugin::PluginInfo;
pub use portside_registry::Connection;
pub use portside_wire::{ConnectionTreeResponse, ExecResponse, TestConnectionResponse};

use portside_events::EventBus;
use portside_plugin::PluginHost;
use portside_registry::Registry;
use portside_vault::Vault;

const CONNECTIONS_DB_FILE: &str = "connections.sqlite3";
const PLUGINS_SUBDIR: &str = "plugins";

pub struct PortsideHost {
    registry: Registry,
    plugins: PluginHost,
    events: EventBus,
}

impl PortsideHost {
    /// Resolves the per-user application data directory via the OS
    /// convention (`ProjectDirs`), opens the vault and registry inside
    /// it, and points the plugin host at `<data_dir>/plugins` (synced
    /// from `bundled_plugins_dir` on every scan).
    pub async fn open(
        qualifier: &str,
        organization: &str,
        application: &str,
        bundled_plugins_dir: PathBuf,
    ) -> Result<Self, CoreError> {
        let project_dirs = ProjectDirs::from(qualifier, organization, application)
            .ok_or(CoreError::NoDataDirectory)?;
        let data_dir = project_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| CoreError::StorageUnavailable(e.to_string()))?;

        let events = EventBus::new();
        let vault = Arc::new(
            portside_vault::open(&data_dir)
                .map_err(|e| CoreError::StorageUnavailable(e.to_string()))?,
        );
        let registry =
            Registry::open(&data_dir.join(CONNECTIONS_DB_FILE), vault, events.clone()).await?;
        let plugins = PluginHost::new(bundled_plugins_dir, data_dir.join(PLUGINS_SUBDIR));

        Ok(Self { registry, plugins, events })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn rescan_plugins(&self) -> Result<(), CoreError> {
        self.plugins.rescan().await?;
        Ok(())
    }

    pub async fn list_plugins(&self) -> Vec<PluginInfo> {
        self.plugins.list_plugins().await
    }

    pub async fn list_connections(&self) -> Result<Vec<Connection>, CoreError> {
        Ok(self.registry.list().await?)
    }

    pub async fn create_connection(
        &self,
        name: &str,
        driver_type: &str,
        credential: &str,
    ) -> Result<Connection, CoreError> {
        Ok(self.registry.create(name, driver_type, credential).await?)
    }

    pub async fn get_connection(&self, id: &str) -> Result<Connection, CoreError> {
        Ok(self.registry.get(id).await?)
    }

    pub async fn get_credential(&self, id: &str) -> Result<String, CoreError> {
        Ok(self.registry.get_credential(id).await?)
    }

    pub async fn delete_connection(&self, id: &str) -> Result<(), CoreError> {
        Ok(self.registry.delete(id).await?)
    }

    pub async fn exec_plugin(
        &self,
        name: &str,
        connection: HashMap<String, String>,
        query: String,
    ) -> Result<ExecResponse, CoreError> {
        Ok(self.plugins.exec_plugin(name, connection, query).await?)
    }

    pub async fn get_connection_tree(
        &self,
        name: &str,
        connection: HashMap<String, String>,
    ) -> Result<ConnectionTreeResponse, CoreError> {
        Ok(self.plugins.get_connection_tree(name, connection).await?)
    }

    /// A `new_tab=false` tree action still invokes the plugin and
    /// discards the structured result; the caller is expected to follow
    /// up with `get_connection_tree` to refresh the owning connection's
    /// tree rather than surfacing a result-available signal.
    pub async fn exec_tree_action(
        &self,
        name: &str,
        connection: HashMap<String, String>,
        action_query: String,
    ) -> Result<ExecResponse, CoreError> {
        Ok(self.plugins.exec_tree_action(name, connection, action_query).await?)
    }

    pub async fn test_connection(
        &self,
        name: &str,
        connection: HashMap<String, String>,
    ) -> Result<TestConnectionResponse, CoreError> {
        Ok(self.plugins.test_connection(name, connection).await?)
    }

    pub async fn get_plugin_auth_forms(
        &self,
        name: &str,
    ) -> Result<HashMap<String, portside_wire::AuthForm>, CoreError> {
        Ok(self.plugins.get_plugin_auth_forms(name).await?.forms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_an_empty_host() {
        let data_dir = tempfile::tempdir().unwrap();
        let plugins_dir = tempfile::tempdir().unwrap();
        std::env::set_var("XDG_DATA_HOME", data_dir.path());

        let host = PortsideHost::open(
            "dev",
            "portside-test",
            "portside-core-test",
            plugins_dir.path().to_path_buf(),
        )
        .await
        .unwrap();

        assert!(host.list_connections().await.unwrap().is_empty());
        assert!(host.list_plugins().await.is_empty());
        std::env::remove_var("XDG_DATA_HOME");
    }
}
