//! Platform-specific subprocess hygiene: executable-bit checks and,
//! on Windows, suppressing the console window a spawned plugin would
//! otherwise flash open.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{is_executable, prepare_command};
#[cfg(windows)]
pub use windows::{is_executable, prepare_command};
