use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("credential not found: {0}")]
    NotFound(String),

    #[error("all vault tiers failed to {operation} key {key}: {last_error}")]
    AllTiersFailed {
        operation: &'static str,
        key: String,
        last_error: String,
    },
}
