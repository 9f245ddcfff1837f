//! `RECORD` files: one CSV row per installed file, `path,algorithm=digest,size`.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::{InstallError, Result};

/// `algorithm=urlsafe-b64-nopad(digest)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHash {
    pub algorithm: String,
    pub value: String,
}

impl RecordHash {
    pub fn sha256(data: &[u8]) -> Self {
        Self {
            algorithm: "sha256".to_string(),
            value: URL_SAFE_NO_PAD.encode(Sha256::digest(data)),
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let (algorithm, value) = s
            .split_once('=')
            .filter(|(a, v)| !a.is_empty() && !v.is_empty())
            .ok_or_else(|| InstallError::InvalidRecord(format!("malformed hash '{}'", s)))?;
        Ok(Self {
            algorithm: algorithm.to_string(),
            value: value.to_string(),
        })
    }

    /// Whether `data` hashes to this value. `None` for unsupported algorithms.
    pub fn verify(&self, data: &[u8]) -> Option<bool> {
        let computed = match self.algorithm.as_str() {
            "sha256" => URL_SAFE_NO_PAD.encode(Sha256::digest(data)),
            "sha384" => URL_SAFE_NO_PAD.encode(Sha384::digest(data)),
            "sha512" => URL_SAFE_NO_PAD.encode(Sha512::digest(data)),
            _ => return None,
        };
        Some(computed == self.value)
    }
}

impl fmt::Display for RecordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.algorithm, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub path: String,
    pub hash: Option<RecordHash>,
    pub size: Option<u64>,
}

impl RecordEntry {
    /// Entry describing `data` written at `path`.
    pub fn for_data(path: impl Into<String>, data: &[u8]) -> Self {
        Self {
            path: path.into(),
            hash: Some(RecordHash::sha256(data)),
            size: Some(data.len() as u64),
        }
    }

    /// Check `data` against the recorded hash and size.
    pub fn validate(&self, data: &[u8]) -> Result<()> {
        let mismatch = |reason: String| InstallError::RecordMismatch {
            path: self.path.clone(),
            reason,
        };
        let hash = self
            .hash
            .as_ref()
            .ok_or_else(|| mismatch("no hash recorded".to_string()))?;
        match hash.verify(data) {
            Some(true) => {}
            Some(false) => return Err(mismatch(format!("{} digest differs", hash.algorithm))),
            None => return Err(mismatch(format!("unsupported hash algorithm '{}'", hash.algorithm))),
        }
        if let Some(size) = self.size {
            if size != data.len() as u64 {
                return Err(mismatch(format!("size {} recorded, {} found", size, data.len())));
            }
        }
        Ok(())
    }

    fn to_row(&self) -> String {
        let hash = self.hash.as_ref().map(ToString::to_string).unwrap_or_default();
        let size = self.size.map(|s| s.to_string()).unwrap_or_default();
        [quote(&self.path), quote(&hash), size].join(",")
    }
}

/// Parse the contents of a RECORD file.
pub fn parse_record(text: &str) -> Result<Vec<RecordEntry>> {
    let mut entries = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_row(line)
            .map_err(|e| InstallError::InvalidRecord(format!("line {}: {}", lineno + 1, e)))?;
        let [path, hash, size]: [String; 3] = fields.try_into().map_err(|f: Vec<String>| {
            InstallError::InvalidRecord(format!("line {}: expected 3 fields, got {}", lineno + 1, f.len()))
        })?;
        if path.is_empty() {
            return Err(InstallError::InvalidRecord(format!("line {}: empty path", lineno + 1)));
        }
        let hash = if hash.is_empty() {
            None
        } else {
            Some(RecordHash::parse(&hash)?)
        };
        let size = if size.is_empty() {
            None
        } else {
            Some(size.parse::<u64>().map_err(|_| {
                InstallError::InvalidRecord(format!("line {}: bad size '{}'", lineno + 1, size))
            })?)
        };
        entries.push(RecordEntry { path, hash, size });
    }
    Ok(entries)
}

/// Render entries as RECORD contents (trailing newline included).
pub fn write_record(entries: &[RecordEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.to_row());
        out.push('\n');
    }
    out
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn split_row(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            (c, _) => current.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_matches_known_digest() {
        // sha256(b"") in urlsafe base64 without padding
        assert_eq!(
            RecordHash::sha256(b"").value,
            "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
        );
    }

    #[test]
    fn test_parse_record_with_quoted_path() {
        let text = "pkg/__init__.py,sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU,0\n\"pkg/a,b.txt\",,\npkg-1.dist-info/RECORD,,\n";
        let entries = parse_record(text).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].path, "pkg/a,b.txt");
        assert_eq!(entries[1].hash, None);
        entries[0].validate(b"").unwrap();
        assert_eq!(write_record(&entries), text);
    }

    #[test]
    fn test_parse_record_rejects_bad_rows() {
        assert!(parse_record("a,b\n").is_err());
        assert!(parse_record("a,sha256=x,notanumber\n").is_err());
        assert!(parse_record("\"a,,\n").is_err());
        assert!(parse_record("a,nohash,1\n").is_err());
    }

    #[test]
    fn test_validate_detects_tampering() {
        let entry = RecordEntry::for_data("pkg/mod.py", b"print('hi')\n");
        entry.validate(b"print('hi')\n").unwrap();
        assert!(matches!(
            entry.validate(b"print('bye')\n").unwrap_err(),
            InstallError::RecordMismatch { .. }
        ));
        let unhashed = RecordEntry {
            path: "x".to_string(),
            hash: None,
            size: None,
        };
        assert!(unhashed.validate(b"").is_err());
    }
}
