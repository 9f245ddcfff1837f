//! RFC 822 style headers used by `METADATA`, `PKG-INFO` and `WHEEL`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("core metadata is missing the '{0}' field")]
    MissingField(&'static str),
}

/// Parse `Key: Value` headers up to the first blank line.
///
/// Continuation lines (leading whitespace) are appended to the previous value.
pub fn parse_headers(text: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            break;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = headers.last_mut() {
                value.push('\n');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}

/// First value for `key` (case-insensitive).
pub fn header<'a>(headers: &'a [(String, String)], key: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

/// Name and version of a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreMetadata {
    pub name: String,
    pub version: String,
}

impl CoreMetadata {
    pub fn parse(text: &str) -> Result<Self, MetadataError> {
        let headers = parse_headers(text);
        let name = header(&headers, "Name").ok_or(MetadataError::MissingField("Name"))?;
        let version = header(&headers, "Version").ok_or(MetadataError::MissingField("Version"))?;
        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_core_metadata_stops_at_body() {
        let text = "Metadata-Version: 2.1\nName: test-pkg\nVersion: 0.0.1\nSummary: first\n  second\n\nName: body-text\n";
        let headers = parse_headers(text);
        assert_eq!(header(&headers, "summary"), Some("first\nsecond"));
        let meta = CoreMetadata::parse(text).unwrap();
        assert_eq!(meta.name, "test-pkg");
        assert_eq!(meta.version, "0.0.1");
    }

    #[test]
    fn test_missing_version_is_an_error() {
        let err = CoreMetadata::parse("Name: x\n").unwrap_err();
        assert!(err.to_string().contains("Version"));
    }
}
