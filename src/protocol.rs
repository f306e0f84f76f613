//! Analyzer wire protocol
//!
//! A request envelope carries run metadata and the migrations to analyze. A
//! response envelope carries one report per migration that produced
//! diagnostics. Decoding is strict: unrecognized fields anywhere in an
//! envelope are rejected.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use strum_macros::Display;

use crate::input::Migration;
use crate::position::TextLocation;

/// Severity of a diagnostic.
///
/// Ordered so that `Fatal` compares greater than `Warning`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Level {
    Warning,
    Fatal,
}

/// A single finding, located in the text the analyzer was handed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Diagnostic {
    pub line_number: i64,
    pub line_position: i64,
    #[serde(rename = "text")]
    pub message: String,
    pub code: String,
    pub level: Level,
}

impl Diagnostic {
    pub fn new(
        code: impl Into<String>,
        level: Level,
        location: TextLocation,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line_number: location.line_number,
            line_position: location.line_position,
            message: message.into(),
            code: code.into(),
            level,
        }
    }

    /// A fatal diagnostic with no source location, used for internal failures
    /// such as unparseable input or bad configuration.
    pub fn unlocated_fatal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Level::Fatal, TextLocation::UNKNOWN, message)
    }

    pub fn location(&self) -> TextLocation {
        TextLocation::new(self.line_number, self.line_position)
    }

    pub fn is_fatal(&self) -> bool {
        self.level == Level::Fatal
    }
}

/// Immutable key/value configuration handed to every analyzer invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunConfig(BTreeMap<String, String>);

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Builder-style insert, used while assembling the config before a run.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RunConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Findings for one migration from one analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Report {
    pub migration: Migration,
    #[serde(default)]
    pub text: String,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "RunConfig::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub config: RunConfig,
}

impl Report {
    pub fn is_fatal(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_fatal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Metadata {
    #[serde(default = "default_tool_name")]
    pub name: String,
    #[serde(default)]
    pub connection_string: String,
    #[serde(
        default,
        skip_serializing_if = "RunConfig::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub config: RunConfig,
}

fn default_tool_name() -> String {
    "dbmate".to_string()
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: default_tool_name(),
            connection_string: String::new(),
            config: RunConfig::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub migrations: Vec<Migration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub reports: Vec<Report>,
}

impl AnalysisResponse {
    pub fn is_fatal(&self) -> bool {
        crate::analysis::is_fatal(&self.reports)
    }
}

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn decode_request(input: &[u8]) -> serde_json::Result<AnalysisRequest> {
    serde_json::from_slice(input)
}

pub fn decode_response(input: &[u8]) -> serde_json::Result<AnalysisResponse> {
    serde_json::from_slice(input)
}

/// Read the whole of `reader` and decode it as a request envelope.
pub fn read_request<R: Read>(mut reader: R) -> serde_json::Result<AnalysisRequest> {
    let mut input = Vec::new();
    reader
        .read_to_end(&mut input)
        .map_err(serde_json::Error::io)?;
    decode_request(&input)
}

/// Write `response` as a single JSON document followed by a newline.
pub fn write_response<W: Write>(
    mut writer: W,
    response: &AnalysisResponse,
) -> serde_json::Result<()> {
    serde_json::to_writer(&mut writer, response)?;
    writer.write_all(b"\n").map_err(serde_json::Error::io)?;
    writer.flush().map_err(serde_json::Error::io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MigrationOptions;

    fn sample_report() -> Report {
        Report {
            migration: Migration {
                file_name: "20240101_add_index.sql".to_string(),
                up_options: MigrationOptions::with_transaction(true),
                down_options: MigrationOptions::with_transaction(true),
                ..Migration::default()
            },
            text: "summary".to_string(),
            diagnostics: vec![Diagnostic::new(
                "IND-001",
                Level::Warning,
                TextLocation::new(3, 1),
                "CREATE INDEX statement missing CONCURRENTLY option",
            )],
            actions: vec![],
            config: RunConfig::new(),
        }
    }

    #[test]
    fn test_level_wire_format() {
        assert_eq!(serde_json::to_string(&Level::Fatal).unwrap(), r#""FATAL""#);
        assert_eq!(serde_json::to_string(&Level::Warning).unwrap(), r#""WARNING""#);
        assert_eq!(Level::Fatal.to_string(), "FATAL");
        assert!(Level::Fatal > Level::Warning);
    }

    #[test]
    fn test_diagnostic_wire_format() {
        let diag = &sample_report().diagnostics[0];
        insta::assert_json_snapshot!(diag, @r#"
        {
          "lineNumber": 3,
          "linePosition": 1,
          "text": "CREATE INDEX statement missing CONCURRENTLY option",
          "code": "IND-001",
          "level": "WARNING"
        }
        "#);
    }

    #[test]
    fn test_empty_diagnostics_and_config_are_omitted() {
        let mut report = sample_report();
        report.diagnostics.clear();
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("diagnostics").is_none());
        assert!(value.get("config").is_none());
        assert_eq!(value["actions"], serde_json::json!([]));
    }

    #[test]
    fn test_request_decodes_null_collections_as_empty() {
        let request = decode_request(
            br#"{"metadata": {"name": "dbmate", "connectionString": "", "config": null}, "migrations": null}"#,
        )
        .expect("null collections should decode");
        assert!(request.migrations.is_empty());
        assert!(request.metadata.config.is_empty());
    }

    #[test]
    fn test_missing_and_empty_metadata_agree() {
        let missing = decode_request(br#"{"migrations": []}"#).unwrap();
        let empty = decode_request(br#"{"metadata": {}, "migrations": []}"#).unwrap();
        assert_eq!(missing.metadata, empty.metadata);
        assert_eq!(empty.metadata.name, "dbmate");
        assert_eq!(empty.metadata, Metadata::default());
    }

    #[test]
    fn test_request_rejects_unknown_top_level_field() {
        let err = decode_request(br#"{"metadata": {}, "migrations": [], "extra": 1}"#).unwrap_err();
        assert!(err.to_string().contains("extra"), "got: {err}");
    }

    #[test]
    fn test_request_rejects_unknown_metadata_field() {
        let err = decode_request(br#"{"metadata": {"dsn": "postgres://"}}"#).unwrap_err();
        assert!(err.to_string().contains("dsn"), "got: {err}");
    }

    #[test]
    fn test_response_rejects_unknown_diagnostic_field() {
        let input = br#"{"reports": [{"migration": {}, "text": "", "diagnostics": [
            {"lineNumber": 1, "linePosition": 1, "text": "x", "code": "C", "level": "FATAL", "hint": "y"}
        ], "actions": []}]}"#;
        let err = decode_response(input).unwrap_err();
        assert!(err.to_string().contains("hint"), "got: {err}");
    }

    #[test]
    fn test_response_rejects_unknown_level() {
        let input = br#"{"reports": [{"migration": {}, "diagnostics": [
            {"lineNumber": 1, "linePosition": 1, "text": "x", "code": "C", "level": "INFO"}
        ]}]}"#;
        assert!(decode_response(input).is_err());
    }

    #[test]
    fn test_response_survives_encode_decode() {
        let response = AnalysisResponse {
            reports: vec![sample_report()],
        };
        let mut buf = Vec::new();
        write_response(&mut buf, &response).unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));
        assert_eq!(decode_response(&buf).unwrap(), response);
    }

    #[test]
    fn test_read_request_from_reader() {
        let input: &[u8] = br#"{"migrations": [{"fileName": "1_a.sql", "up": "SELECT 1;\n"}]}"#;
        let request = read_request(input).unwrap();
        assert_eq!(request.migrations.len(), 1);
        assert_eq!(request.metadata, Metadata::default());
    }

    #[test]
    fn test_report_is_fatal() {
        let mut report = sample_report();
        assert!(!report.is_fatal());
        report
            .diagnostics
            .push(Diagnostic::unlocated_fatal("NMC-000", "bad regex"));
        assert!(report.is_fatal());
        assert_eq!(report.diagnostics[1].location(), TextLocation::UNKNOWN);
    }
}
