use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named database endpoint's durable metadata. The secret it refers
/// to, if any, lives in the vault under `credential_key` and is never
/// embedded here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connection {
    pub id: String,
    pub name: String,
    pub driver_type: String,
    pub credential_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn credential_key_for(id: &str) -> String {
    format!("connection:{id}")
}
