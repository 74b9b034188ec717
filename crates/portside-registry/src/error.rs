use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("connection not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("credential store failed: {0}")]
    Vault(#[from] portside_vault::VaultError),

    #[error("metadata store unavailable: {0}")]
    StorageUnavailable(String),
}
