//! Spawns a plugin as a one-shot child process and carries it through
//! the write-stdin / read-output / wait-with-deadline contract shared
//! by every subcommand.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::error::PluginHostError;
use crate::platform;

pub const DEADLINE_PROBE: Duration = Duration::from_secs(2);
pub const DEADLINE_TEST_CONNECTION: Duration = Duration::from_secs(15);
pub const DEADLINE_EXEC: Duration = Duration::from_secs(30);

pub struct InvocationOutcome {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs `path <subcommand>`, optionally writing `stdin_payload` to its
/// stdin, and enforces `deadline` on the whole round trip. On timeout
/// the child is killed before the error is returned.
pub async fn invoke(
    plugin_name: &str,
    path: &Path,
    subcommand: &'static str,
    stdin_payload: Option<Vec<u8>>,
    deadline: Duration,
) -> Result<InvocationOutcome, PluginHostError> {
    let mut command = Command::new(path);
    command
        .arg(subcommand)
        .env("PORTSIDE_PLUGIN_NAME", plugin_name)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);
    platform::prepare_command(&mut command);

    let mut child = command.spawn().map_err(|source| PluginHostError::SubprocessSpawn {
        plugin: plugin_name.to_string(),
        source,
    })?;

    let mut stdin = child.stdin.take().expect("stdin was requested as piped");
    let mut stdout = child.stdout.take().expect("stdout was requested as piped");
    let mut stderr = child.stderr.take().expect("stderr was requested as piped");

    let run = async {
        if let Some(payload) = stdin_payload {
            let _ = stdin.write_all(&payload).await;
        }
        drop(stdin);

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let (stdout_result, stderr_result) = tokio::join!(
            stdout.read_to_end(&mut stdout_buf),
            stderr.read_to_end(&mut stderr_buf),
        );
        stdout_result.ok();
        stderr_result.ok();
        let status = child.wait().await;
        (status, stdout_buf, stderr_buf)
    };

    match tokio::time::timeout(deadline, run).await {
        Ok((status, stdout_buf, stderr_buf)) => {
            let status = status.map_err(|source| PluginHostError::SubprocessSpawn {
                plugin: plugin_name.to_string(),
                source,
            })?;
            if !status.success() {
                return Err(PluginHostError::NonZeroExit {
                    plugin: plugin_name.to_string(),
                    status: status.code().unwrap_or(-1),
                    stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
                });
            }
            Ok(InvocationOutcome { stdout: stdout_buf, stderr: stderr_buf })
        }
        Err(_elapsed) => Err(PluginHostError::Timeout {
            plugin: plugin_name.to_string(),
            command: subcommand,
        }),
    }
}
