use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::warn;

use portside_wire::{
    AuthFormsResponse, ConnectionRequest, ConnectionTreeResponse, ExecRequest, ExecResponse,
    InfoResponse, TestConnectionResponse,
};

use crate::error::PluginHostError;
use crate::invocation::{self, DEADLINE_EXEC, DEADLINE_PROBE, DEADLINE_TEST_CONNECTION};
use crate::registry_entry::PluginInfo;
use crate::scan;

/// Owns the plugin registry and mediates every subprocess invocation.
/// `bundled_dir` ships next to the host executable; `user_dir` is
/// writable and wins discovery precedence after the startup mirror.
pub struct PluginHost {
    bundled_dir: PathBuf,
    user_dir: PathBuf,
    registry: Mutex<HashMap<String, PluginInfo>>,
}

impl PluginHost {
    pub fn new(bundled_dir: PathBuf, user_dir: PathBuf) -> Self {
        Self { bundled_dir, user_dir, registry: Mutex::new(HashMap::new()) }
    }

    /// Full scan: mirrors the bundled directory into the per-user one,
    /// then probes every executable found there. Safe to call again for
    /// an on-demand rescan.
    pub async fn scan(&self) -> Result<(), PluginHostError> {
        if let Err(e) = scan::mirror_bundled_into_user_dir(&self.bundled_dir, &self.user_dir) {
            warn!(error = %e, "failed to mirror bundled plugins into the per-user directory");
        }

        let paths = scan::discover_executables(&self.user_dir).map_err(|source| {
            PluginHostError::ScanFailed {
                path: self.user_dir.display().to_string(),
                source,
            }
        })?;

        let mut fresh = HashMap::new();
        for path in paths {
            let name = scan::plugin_name_from_path(&path);
            let entry = match self.probe(&name, &path).await {
                Ok(info) => PluginInfo::from_probe(name.clone(), path, info),
                Err(e) => PluginInfo::from_failed_probe(name.clone(), path, e.to_string()),
            };
            fresh.insert(name, entry);
        }

        let mut registry = self.registry.lock().await;
        *registry = fresh;
        Ok(())
    }

    async fn probe(&self, name: &str, path: &std::path::Path) -> Result<InfoResponse, PluginHostError> {
        let outcome = invocation::invoke(name, path, "info", None, DEADLINE_PROBE).await?;
        serde_json::from_slice(&outcome.stdout).map_err(|e| PluginHostError::ParseFailed {
            plugin: name.to_string(),
            command: "info",
            reason: e.to_string(),
        })
    }

    pub async fn list_plugins(&self) -> Vec<PluginInfo> {
        self.registry.lock().await.values().cloned().collect()
    }

    pub async fn rescan(&self) -> Result<(), PluginHostError> {
        self.scan().await
    }

    async fn resolve(&self, name: &str) -> Result<PathBuf, PluginHostError> {
        let registry = self.registry.lock().await;
        let entry = registry.get(name).ok_or_else(|| PluginHostError::NotFound(name.to_string()))?;
        if !crate::platform::is_executable(&entry.path) {
            return Err(PluginHostError::NotExecutable(name.to_string()));
        }
        Ok(entry.path.clone())
    }

    pub async fn exec_plugin(
        &self,
        name: &str,
        connection: HashMap<String, String>,
        query: String,
    ) -> Result<ExecResponse, PluginHostError> {
        let path = self.resolve(name).await?;
        let request = ExecRequest { connection, query, options: None };
        let payload = serde_json::to_vec(&request).expect("ExecRequest always serializes");
        let outcome = invocation::invoke(name, &path, "exec", Some(payload), DEADLINE_EXEC).await?;
        let response = ExecResponse::from_stdout(&outcome.stdout);
        if let Some(message) = response.error.clone() {
            return Err(PluginHostError::PluginReported { plugin: name.to_string(), message });
        }
        Ok(response)
    }

    pub async fn get_connection_tree(
        &self,
        name: &str,
        connection: HashMap<String, String>,
    ) -> Result<ConnectionTreeResponse, PluginHostError> {
        let path = self.resolve(name).await?;
        let request = ConnectionRequest { connection };
        let payload = serde_json::to_vec(&request).expect("ConnectionRequest always serializes");
        let outcome =
            invocation::invoke(name, &path, "connection-tree", Some(payload), DEADLINE_EXEC).await?;
        if outcome.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(ConnectionTreeResponse::default());
        }
        serde_json::from_slice(&outcome.stdout).map_err(|e| PluginHostError::ParseFailed {
            plugin: name.to_string(),
            command: "connection-tree",
            reason: e.to_string(),
        })
    }

    /// Thin convenience over `exec_plugin` for a tree node's action query.
    pub async fn exec_tree_action(
        &self,
        name: &str,
        connection: HashMap<String, String>,
        action_query: String,
    ) -> Result<ExecResponse, PluginHostError> {
        self.exec_plugin(name, connection, action_query).await
    }

    pub async fn test_connection(
        &self,
        name: &str,
        connection: HashMap<String, String>,
    ) -> Result<TestConnectionResponse, PluginHostError> {
        let path = self.resolve(name).await?;
        let request = ConnectionRequest { connection };
        let payload = serde_json::to_vec(&request).expect("ConnectionRequest always serializes");
        let outcome = invocation::invoke(
            name,
            &path,
            "test-connection",
            Some(payload),
            DEADLINE_TEST_CONNECTION,
        )
        .await?;
        serde_json::from_slice(&outcome.stdout).map_err(|e| PluginHostError::ParseFailed {
            plugin: name.to_string(),
            command: "test-connection",
            reason: e.to_string(),
        })
    }

    /// Absent or empty output is "not implemented", not an error.
    pub async fn get_plugin_auth_forms(
        &self,
        name: &str,
    ) -> Result<AuthFormsResponse, PluginHostError> {
        let path = self.resolve(name).await?;
        let outcome = match invocation::invoke(name, &path, "authforms", None, DEADLINE_PROBE).await
        {
            Ok(outcome) => outcome,
            Err(PluginHostError::NonZeroExit { .. }) => return Ok(AuthFormsResponse::default()),
            Err(e) => return Err(e),
        };
        if outcome.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(AuthFormsResponse::default());
        }
        serde_json::from_slice(&outcome.stdout).or_else(|_| Ok(AuthFormsResponse::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fake_plugin(dir: &std::path::Path, name: &str, script: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
        }
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn scan_probes_and_registers_a_plugin() {
        let bundled = tempfile::tempdir().unwrap();
        let user_dir = tempfile::tempdir().unwrap();
        write_fake_plugin(
            bundled.path(),
            "echo",
            "#!/bin/sh\necho '{\"name\":\"echo\",\"version\":\"1.0\",\"description\":\"\",\"type\":\"DRIVER\"}'\n",
        );

        let host = PluginHost::new(bundled.path().to_path_buf(), user_dir.path().to_path_buf());
        host.scan().await.unwrap();

        let plugins = host.list_plugins().await;
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name, "echo");
        assert!(plugins[0].last_error.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exec_plugin_returns_not_found_for_unknown_name() {
        let bundled = tempfile::tempdir().unwrap();
        let user_dir = tempfile::tempdir().unwrap();
        let host = PluginHost::new(bundled.path().to_path_buf(), user_dir.path().to_path_buf());
        host.scan().await.unwrap();

        let err = host
            .exec_plugin("missing", HashMap::new(), "SELECT 1".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, PluginHostError::NotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rescan_drops_entries_for_deleted_binaries() {
        let bundled = tempfile::tempdir().unwrap();
        let user_dir = tempfile::tempdir().unwrap();
        let path = write_fake_plugin(
            bundled.path(),
            "echo",
            "#!/bin/sh\necho '{\"name\":\"echo\",\"version\":\"1.0\",\"description\":\"\",\"type\":\"DRIVER\"}'\n",
        );
        let host = PluginHost::new(bundled.path().to_path_buf(), user_dir.path().to_path_buf());
        host.scan().await.unwrap();
        assert_eq!(host.list_plugins().await.len(), 1);

        std::fs::remove_file(&path).unwrap();
        std::fs::remove_file(user_dir.path().join("echo")).unwrap();
        host.rescan().await.unwrap();
        assert!(host.list_plugins().await.is_empty());
    }
}
