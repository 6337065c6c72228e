//! Config-file readers.
//!
//! Files are selected by extension: `.toml` is parsed with `toml`,
//! `.json` with `serde_json`. Anything else is rejected.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::result::{GenericResultExt, Result};

/// Parse a TOML document into `T`.
///
/// # Errors
///
/// Returns `TomlParseFailed` if the document is malformed or does not match `T`.
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::toml_parse_failed(e.to_string()))
}

/// Parse a JSON document into `T`.
///
/// # Errors
///
/// Returns `JsonParseFailed` if the document is malformed or does not match `T`.
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T> {
    serde_json::from_str(content).map_err(|e| Error::json_parse_failed(e.to_string()))
}

/// Read and parse a config file, picking the format from its extension.
///
/// # Errors
///
/// Returns error if:
/// - File cannot be read
/// - Extension is neither `toml` nor `json`
/// - Content is malformed
pub fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::file_read_failed(path, e.to_string()))
        .tap_ok(|content| {
            tracing::debug!(path = %path.display(), bytes = content.len(), "Read config file");
        })?;

    let parsed = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => parse_toml(&content),
        Some("json") => parse_json(&content),
        _ => Err(Error::unsupported_format(path)),
    };
    parsed.tap_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Failed to load config file");
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::io::Write;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        items: Vec<String>,
    }

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_toml_file() {
        let file = write_temp(".toml", "name = \"doc\"\nitems = [\"a\", \"b\"]\n");
        let sample: Sample = read_config(file.path()).unwrap();
        assert_eq!(sample.name, "doc");
        assert_eq!(sample.items, vec!["a", "b"]);
    }

    #[test]
    fn test_read_json_file() {
        let file = write_temp(".json", r#"{"name": "doc", "items": []}"#);
        let sample: Sample = read_config(file.path()).unwrap();
        assert_eq!(sample.name, "doc");
        assert!(sample.items.is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".yaml", "name: doc");
        let result: Result<Sample> = read_config(file.path());
        assert!(matches!(result, Err(Error::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result: Result<Sample> = read_config(Path::new("/nonexistent/history.toml"));
        assert!(matches!(result, Err(Error::FileReadFailed { .. })));
    }

    #[test]
    fn test_malformed_toml() {
        let result: Result<Sample> = parse_toml("name = ");
        assert!(matches!(result, Err(Error::TomlParseFailed { .. })));
    }
}
