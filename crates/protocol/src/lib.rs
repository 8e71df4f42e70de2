//! Wire types shared by the identification engine and its frontends.

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One ranked candidate description file for an uploaded image.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct MatchResult {
    pub description_path: String,
    pub label: String,
    pub score: u32,
    pub reasons: Vec<String>,
    pub hits: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct IndexedCounts {
    pub descriptions: usize,
    pub binaries: usize,
}

/// Context attached to an identification that produced no candidates.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus_root: Option<String>,
    pub indexed: IndexedCounts,
    pub notes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct IdentifyReport {
    pub ok: bool,
    pub content_hash: String,
    pub received_bytes: usize,
    pub matches: Vec<MatchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

impl IdentifyReport {
    #[must_use]
    pub fn has_candidates(&self) -> bool {
        !self.matches.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub code: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            message: message.into(),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_without_diagnostics_omits_the_field() {
        let report = IdentifyReport {
            ok: true,
            content_hash: "abc".to_string(),
            received_bytes: 3,
            matches: vec![],
            diagnostics: None,
        };
        let raw = serialize_json(&report).unwrap();
        assert!(!raw.contains("diagnostics"));

        let back: IdentifyReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn error_envelope_is_never_ok() {
        let envelope = ErrorEnvelope::new("empty_upload", "No file provided").with_hint("pass a file");
        let value: serde_json::Value = serde_json::from_str(&serialize_json(&envelope).unwrap()).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["code"], "empty_upload");
        assert_eq!(value["hint"], "pass a file");
    }
}
