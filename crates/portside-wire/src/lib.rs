//! # Portside Wire Schema
//!
//! Defines the JSON-over-stdio message shapes exchanged between the host
//! process and a database plugin executable. A plugin is invoked once per
//! request: the host spawns it with a single subcommand argument, writes at
//! most one JSON object to stdin, and reads exactly one JSON object from
//! stdout before the process exits.
//!
//! ## Overview
//!
//! Every subcommand has its own request/response pair:
//!
//! - `info` has no stdin payload and answers with [`InfoResponse`].
//! - `exec` takes an [`ExecRequest`] and answers with [`ExecResponse`].
//! - `authforms` has no stdin payload and answers with [`AuthFormsResponse`].
//! - `connection-tree` takes a [`ConnectionTreeRequest`] and answers with
//!   [`ConnectionTreeResponse`].
//! - `test-connection` takes a [`TestConnectionRequest`] and answers with
//!   [`TestConnectionResponse`].
//!
//! This crate only models the wire shapes and the normalization rules
//! required to parse them reliably; it knows nothing about spawning
//! processes or enforcing deadlines (see `portside-plugin` for that).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

mod legacy;
mod node_type;
mod plugin_kind;

pub use node_type::{NodeActionType, NodeType};
pub use plugin_kind::PluginKind;

/// Answer to the `info` probe. Required fields are `name`, `version`,
/// `description`, and `type`; everything else is optional metadata that a
/// plugin may or may not publish.
///
/// Unknown top-level fields are ignored during deserialization so that a
/// newer plugin talking to an older host doesn't fail the probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PluginKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub settings: HashMap<String, String>,
    /// Catches any other field a plugin sends so round-tripping `InfoResponse`
    /// (e.g. in tests) never silently drops data, without widening the
    /// struct's public surface for every new plugin-side field.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Stdin payload for `exec`. `connection` is an opaque string map; by
/// convention it carries a `credential_blob` key with the JSON credential
/// retrieved from the vault, but the host never interprets its contents.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecRequest {
    #[serde(default)]
    pub connection: HashMap<String, String>,
    pub query: String,
    #[serde(default)]
    pub options: Option<HashMap<String, String>>,
}

/// Stdout payload for `exec`. Carries either a structured [`ExecResult`] or
/// a plugin-supplied error message (or both: a plugin may return a partial
/// result alongside an error string).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecResponse {
    #[serde(default)]
    pub result: Option<ExecResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecResponse {
    /// Parses a plugin's raw `exec` stdout into a canonical response.
    ///
    /// This never fails: empty stdout becomes an empty successful response,
    /// a legacy `Payload`/PascalCase wrapper is normalized to the lowercase
    /// tagged-union form, and stdout that isn't valid JSON at all is wrapped
    /// as `{kv: {"_": <raw text>}}` so the caller always gets a structured
    /// result instead of an opaque parse error.
    pub fn from_stdout(stdout: &[u8]) -> Self {
        if stdout.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }
        match serde_json::from_slice::<legacy::RawExecResponse>(stdout) {
            Ok(raw) => raw.into_canonical(),
            Err(_) => {
                let mut data = HashMap::new();
                data.insert("_".to_string(), String::from_utf8_lossy(stdout).into_owned());
                Self {
                    result: Some(ExecResult::Kv(KvResult { data })),
                    error: None,
                }
            }
        }
    }
}

/// Tagged union of the three shapes a query result can take. Modeled as a
/// sum type with a discriminator (not an optional-field object) so exactly
/// one variant is ever populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ExecResult {
    Sql(SqlResult),
    Document(DocumentResult),
    Kv(KvResult),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SqlResult {
    pub columns: Vec<SqlColumn>,
    pub rows: Vec<SqlRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SqlColumn {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SqlRow {
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DocumentResult {
    pub documents: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KvResult {
    pub data: HashMap<String, String>,
}

/// Stdout payload for `authforms`. An absent or empty map means the plugin
/// doesn't offer a custom auth form; the host treats that as "not
/// implemented", not an error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthFormsResponse {
    #[serde(default)]
    pub forms: HashMap<String, AuthForm>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthForm {
    pub key: String,
    pub name: String,
    pub fields: Vec<AuthField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthField {
    #[serde(rename = "type")]
    pub field_type: AuthFieldType,
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthFieldType {
    Text,
    Number,
    Password,
    Checkbox,
    Select,
    FilePath,
}

/// Stdin payload shared by `connection-tree` and `test-connection`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionRequest {
    #[serde(default)]
    pub connection: HashMap<String, String>,
}

pub type ConnectionTreeRequest = ConnectionRequest;
pub type TestConnectionRequest = ConnectionRequest;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionTreeResponse {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// A node in a plugin's connection tree (database → schema → table → …).
/// Recursive: a node may own children and a list of context-menu actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub key: String,
    pub label: String,
    #[serde(rename = "node_type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub children: Option<Vec<Node>>,
    #[serde(default)]
    pub actions: Option<Vec<NodeAction>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAction {
    #[serde(rename = "type")]
    pub action_type: NodeActionType,
    pub title: String,
    pub query: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, rename = "new_tab")]
    pub new_tab: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConnectionResponse {
    pub ok: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_response_empty_stdout_is_empty_success() {
        let resp = ExecResponse::from_stdout(b"   \n");
        assert!(resp.result.is_none());
        assert!(resp.error.is_none());
    }

    #[test]
    fn exec_response_canonical_kv() {
        let raw = br#"{"result":{"kv":{"data":{"q":"SELECT 1"}}}}"#;
        let resp = ExecResponse::from_stdout(raw);
        match resp.result {
            Some(ExecResult::Kv(kv)) => assert_eq!(kv.data.get("q").unwrap(), "SELECT 1"),
            other => panic!("expected kv result, got {other:?}"),
        }
    }

    #[test]
    fn exec_response_legacy_payload_is_normalized() {
        let raw = br#"{"result":{"Payload":{"Sql":{"columns":[{"name":"c"}],"rows":[{"values":["1"]}]}}}}"#;
        let resp = ExecResponse::from_stdout(raw);
        match resp.result {
            Some(ExecResult::Sql(sql)) => {
                assert_eq!(sql.columns.len(), 1);
                assert_eq!(sql.columns[0].name, "c");
                assert_eq!(sql.rows[0].values, vec!["1".to_string()]);
            }
            other => panic!("expected sql result, got {other:?}"),
        }
    }

    #[test]
    fn exec_response_invalid_json_wraps_as_raw_kv() {
        let raw = b"not json at all";
        let resp = ExecResponse::from_stdout(raw);
        match resp.result {
            Some(ExecResult::Kv(kv)) => {
                assert_eq!(kv.data.get("_").unwrap(), "not json at all");
            }
            other => panic!("expected raw-wrapped kv, got {other:?}"),
        }
    }

    #[test]
    fn exec_response_carries_plugin_error() {
        let raw = br#"{"error":"connection refused"}"#;
        let resp = ExecResponse::from_stdout(raw);
        assert_eq!(resp.error.as_deref(), Some("connection refused"));
        assert!(resp.result.is_none());
    }

    #[test]
    fn info_response_accepts_unknown_fields() {
        let raw = br#"{"name":"echo","version":"1.0","description":"","type":"DRIVER","wat":"?"}"#;
        let info: InfoResponse = serde_json::from_slice(raw).unwrap();
        assert_eq!(info.name, "echo");
        assert_eq!(info.kind, PluginKind::Driver);
    }

    #[test]
    fn info_response_accepts_legacy_integer_type() {
        let raw = br#"{"name":"echo","version":"1.0","description":"","type":0}"#;
        let info: InfoResponse = serde_json::from_slice(raw).unwrap();
        assert_eq!(info.kind, PluginKind::Driver);
    }
}
