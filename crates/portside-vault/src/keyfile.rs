//! Persistence for the fallback tier's encryption key.
//!
//! The key is resolved once per process: the `PORTSIDE_VAULT_KEY`
//! environment variable (64 hex characters) takes precedence for
//! deployments that manage secrets externally; otherwise a `vault.key`
//! file is read from the app's data directory, or created with a
//! freshly generated key on first run.

use std::fs;
use std::io;
use std::path::Path;

use crate::encryption::EncryptionKey;

const ENV_VAR: &str = "PORTSIDE_VAULT_KEY";
const KEY_FILE_NAME: &str = "vault.key";

pub fn load_or_create(app_data_dir: &Path) -> io::Result<EncryptionKey> {
    if let Ok(hex_key) = std::env::var(ENV_VAR) {
        return parse_hex_key(&hex_key)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));
    }

    fs::create_dir_all(app_data_dir)?;
    let path = app_data_dir.join(KEY_FILE_NAME);

    if path.exists() {
        let hex_key = fs::read_to_string(&path)?;
        return parse_hex_key(hex_key.trim())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));
    }

    let mut bytes = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    let hex_key = hex::encode(bytes);
    write_restricted(&path, &hex_key)?;
    Ok(EncryptionKey(bytes))
}

fn parse_hex_key(hex_key: &str) -> Result<EncryptionKey, String> {
    let bytes = hex::decode(hex_key).map_err(|e| format!("malformed vault key: {e}"))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| "vault key must decode to exactly 32 bytes".to_string())?;
    Ok(EncryptionKey(bytes))
}

#[cfg(unix)]
fn write_restricted(path: &Path, contents: &str) -> io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    io::Write::write_all(&mut file, contents.as_bytes())
}

#[cfg(not(unix))]
fn write_restricted(path: &Path, contents: &str) -> io::Result<()> {
    fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_and_reuses_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = load_or_create(dir.path()).unwrap();
        let second = load_or_create(dir.path()).unwrap();
        assert_eq!(first.0, second.0);
    }

    #[test]
    fn env_var_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let key = "11".repeat(32);
        std::env::set_var(ENV_VAR, &key);
        let loaded = load_or_create(dir.path()).unwrap();
        std::env::remove_var(ENV_VAR);
        assert_eq!(loaded.0, [0x11u8; 32]);
    }
}
