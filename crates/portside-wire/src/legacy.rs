//! Normalization of the legacy `exec` response shape.
//!
//! Some plugins wrap their result under an uppercase `Payload` field with
//! PascalCase variant keys (`Sql`, `Document`, `Kv`) instead of the
//! canonical lowercase tagged union. This module does a one-time textual
//! normalization before the typed [`ExecResponse`](crate::ExecResponse) is
//! handed to callers.

use serde::Deserialize;

use crate::{DocumentResult, ExecResponse, ExecResult, KvResult, SqlResult};

#[derive(Deserialize)]
pub(crate) struct RawExecResponse {
    #[serde(default)]
    result: Option<RawExecResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawExecResult {
    Canonical {
        #[serde(default)]
        sql: Option<SqlResult>,
        #[serde(default)]
        document: Option<DocumentResult>,
        #[serde(default)]
        kv: Option<KvResult>,
    },
    Legacy {
        #[serde(rename = "Payload")]
        payload: LegacyPayload,
    },
}

#[derive(Deserialize)]
pub(crate) struct LegacyPayload {
    #[serde(rename = "Sql", default)]
    sql: Option<SqlResult>,
    #[serde(rename = "Document", default)]
    document: Option<DocumentResult>,
    #[serde(rename = "Kv", default)]
    kv: Option<KvResult>,
}

impl RawExecResponse {
    pub(crate) fn into_canonical(self) -> ExecResponse {
        let result = self.result.map(RawExecResult::into_canonical);
        ExecResponse { result, error: self.error }
    }
}

impl RawExecResult {
    fn into_canonical(self) -> ExecResult {
        let (sql, document, kv) = match self {
            RawExecResult::Canonical { sql, document, kv } => (sql, document, kv),
            RawExecResult::Legacy { payload } => (payload.sql, payload.document, payload.kv),
        };
        if let Some(sql) = sql {
            ExecResult::Sql(sql)
        } else if let Some(document) = document {
            ExecResult::Document(document)
        } else {
            ExecResult::Kv(kv.unwrap_or_default())
        }
    }
}
