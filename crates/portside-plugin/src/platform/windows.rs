use std::os::windows::process::CommandExt;
use std::path::Path;

use windows_sys::Win32::System::Threading::CREATE_NO_WINDOW;

/// Windows has no executable permission bit; the `.exe` extension is the
/// convention this host relies on for discovery.
pub fn is_executable(path: &Path) -> bool {
    path.extension().map(|ext| ext.eq_ignore_ascii_case("exe")).unwrap_or(false)
}

pub fn prepare_command(command: &mut tokio::process::Command) {
    command.creation_flags(CREATE_NO_WINDOW);
}
