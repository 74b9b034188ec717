use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginHostError {
    #[error("plugin not found: {0}")]
    NotFound(String),

    #[error("plugin path is no longer executable: {0}")]
    NotExecutable(String),

    #[error("timed out waiting for plugin {plugin} to finish {command}")]
    Timeout { plugin: String, command: &'static str },

    #[error("failed to spawn plugin {plugin}: {source}")]
    SubprocessSpawn {
        plugin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("plugin {plugin} exited with status {status}: {stderr}")]
    NonZeroExit {
        plugin: String,
        status: i32,
        stderr: String,
    },

    #[error("plugin {plugin} returned an unparseable {command} response: {reason}")]
    ParseFailed {
        plugin: String,
        command: &'static str,
        reason: String,
    },

    #[error("plugin {plugin} reported an error: {message}")]
    PluginReported { plugin: String, message: String },

    #[error("failed to scan plugin directory {path}: {source}")]
    ScanFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
