//! Plugin directory discovery: listing executables and mirroring the
//! bundled directory into the per-user one.

use std::path::{Path, PathBuf};

use crate::platform;

/// Copies every regular file from `bundled` into `user_dir`, overwriting
/// name collisions in favor of the bundled copy. Run once at startup so
/// a fresh install (or an updated bundle) always wins over a stale
/// per-user file with the same name.
pub fn mirror_bundled_into_user_dir(bundled: &Path, user_dir: &Path) -> std::io::Result<()> {
    if !bundled.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(user_dir)?;
    for entry in std::fs::read_dir(bundled)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let dest = user_dir.join(entry.file_name());
        std::fs::copy(entry.path(), dest)?;
    }
    Ok(())
}

/// Lists executable regular files directly inside `dir`. Non-existent
/// directories scan as empty rather than erroring, since a fresh
/// install may not have a per-user plugin directory yet.
pub fn discover_executables(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if platform::is_executable(&path) {
            found.push(path);
        }
    }
    Ok(found)
}

pub fn plugin_name_from_path(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_scans_as_empty() {
        let found = discover_executables(Path::new("/nonexistent/portside/plugins")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn mirror_overwrites_user_copy_with_bundled() {
        let bundled = tempfile::tempdir().unwrap();
        let user_dir = tempfile::tempdir().unwrap();
        std::fs::write(bundled.path().join("echo"), b"bundled-version").unwrap();
        std::fs::write(user_dir.path().join("echo"), b"stale-user-version").unwrap();

        mirror_bundled_into_user_dir(bundled.path(), user_dir.path()).unwrap();

        let contents = std::fs::read(user_dir.path().join("echo")).unwrap();
        assert_eq!(contents, b"bundled-version");
    }
}
