use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Registry(#[from] portside_registry::RegistryError),

    #[error(transparent)]
    Plugin(#[from] portside_plugin::PluginHostError),

    #[error("could not resolve an application data directory")]
    NoDataDirectory,

    #[error("failed to initialize the metadata store: {0}")]
    StorageUnavailable(String),
}
