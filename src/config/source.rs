//! Default sources, document I/O and provenance

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::error::ReadError;
use crate::value::decode_document;

/// Where the default configuration comes from
#[derive(Debug, Clone)]
pub enum DefaultSource {
    /// A JSON document on disk, typically shipped alongside the application
    File(PathBuf),
    /// Values supplied directly
    Values(Map<String, Value>),
}

impl From<PathBuf> for DefaultSource {
    fn from(path: PathBuf) -> Self {
        DefaultSource::File(path)
    }
}

impl From<&Path> for DefaultSource {
    fn from(path: &Path) -> Self {
        DefaultSource::File(path.to_path_buf())
    }
}

impl From<Map<String, Value>> for DefaultSource {
    fn from(values: Map<String, Value>) -> Self {
        DefaultSource::Values(values)
    }
}

/// Origin of a configuration source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Default,
    Config,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigSource {
    /// Which layer this source fed
    pub origin: ConfigOrigin,

    /// File path (None for in-memory defaults)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for in-memory defaults)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ConfigSource {
    pub(crate) fn file(origin: ConfigOrigin, path: &Path, digest: String) -> Self {
        Self {
            origin,
            path: Some(path.to_string_lossy().to_string()),
            digest: Some(digest),
        }
    }

    pub(crate) fn in_memory() -> Self {
        Self {
            origin: ConfigOrigin::Default,
            path: None,
            digest: None,
        }
    }
}

/// A parsed document plus the digest of the bytes it came from
#[derive(Debug)]
pub(crate) struct Document {
    pub values: Map<String, Value>,
    pub digest: String,
}

/// Read and decode a JSON document.
///
/// An empty file decodes to an empty mapping.
pub(crate) fn read_document(path: &Path) -> Result<Document, ReadError> {
    let bytes = fs::read(path)?;
    let digest = sha256_hex(&bytes);

    let values = if bytes.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        let raw: Value = serde_json::from_slice(&bytes)?;
        decode_document(raw).map_err(ReadError::NotAnObject)?
    };

    Ok(Document { values, digest })
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Serialize `values` pretty-printed (nulls kept) into a file that must not
/// exist yet. Returns the digest of the bytes written.
pub(crate) fn create_document(path: &Path, values: &Map<String, Value>) -> io::Result<String> {
    let json = serde_json::to_string_pretty(values).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("JSON serialization failed: {}", e),
        )
    })?;

    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    Ok(sha256_hex(json.as_bytes()))
}
