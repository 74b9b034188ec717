use std::path::PathBuf;

use portside_wire::{InfoResponse, PluginKind};

/// In-memory descriptor of a discovered plugin. Populated by a scan and
/// refreshed by the `info` probe; never persisted.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: String,
    pub path: PathBuf,
    pub kind: PluginKind,
    pub version: String,
    pub description: String,
    pub author: Option<String>,
    pub license: Option<String>,
    pub url: Option<String>,
    pub icon_url: Option<String>,
    pub tags: Vec<String>,
    pub capabilities: Vec<String>,
    /// Empty iff the last probe succeeded.
    pub last_error: String,
}

impl PluginInfo {
    pub fn from_probe(name: String, path: PathBuf, info: InfoResponse) -> Self {
        Self {
            name,
            path,
            kind: info.kind,
            version: info.version,
            description: info.description,
            author: info.author,
            license: info.license,
            url: info.url,
            icon_url: info.icon_url,
            tags: info.tags,
            capabilities: info.capabilities,
            last_error: String::new(),
        }
    }

    /// A placeholder entry for a plugin whose probe failed. It stays in
    /// the registry (rather than being dropped) so the UI can surface
    /// the failure.
    pub fn from_failed_probe(name: String, path: PathBuf, error: String) -> Self {
        Self {
            name,
            path,
            kind: PluginKind::Other("unknown".to_string()),
            version: String::new(),
            description: String::new(),
            author: None,
            license: None,
            url: None,
            icon_url: None,
            tags: Vec::new(),
            capabilities: Vec::new(),
            last_error: error,
        }
    }
}
