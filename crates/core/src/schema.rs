//! Schema file loading.
//!
//! A schema file is either a JSON introspection result (`*.json`, the schema
//! lives under the top-level `data` field) or raw schema text (any other
//! extension). The content is not interpreted further; it is handed to the
//! transformer factory as is.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::SchemaError;

/// How a schema file's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// JSON document with a top-level `data` field.
    Introspection,
    /// Raw schema definition text.
    Sdl,
}

impl SchemaFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            SchemaFormat::Introspection
        } else {
            SchemaFormat::Sdl
        }
    }
}

/// Parsed schema content.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaContent {
    /// The `data` field of an introspection document.
    Introspection(Value),
    /// Schema definition text.
    Sdl(String),
}

/// A schema read from disk.
#[derive(Debug, Clone)]
pub struct Schema {
    path: PathBuf,
    content: SchemaContent,
}

impl Schema {
    /// Read and parse the schema file at `path`.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let bytes = fs::read(path)?;
        Self::parse(path, &bytes)
    }

    /// Parse raw file bytes, using `path` only to pick the format.
    pub fn parse(path: &Path, bytes: &[u8]) -> Result<Self, SchemaError> {
        let content = match SchemaFormat::from_path(path) {
            SchemaFormat::Introspection => {
                let mut doc: Value = serde_json::from_slice(bytes)?;
                match doc.get_mut("data").map(Value::take) {
                    None | Some(Value::Null) => return Err(SchemaError::MissingData),
                    Some(data) => SchemaContent::Introspection(data),
                }
            }
            SchemaFormat::Sdl => {
                let text = String::from_utf8(bytes.to_vec())?;
                if text.trim().is_empty() {
                    return Err(SchemaError::Empty);
                }
                SchemaContent::Sdl(text)
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &SchemaContent {
        &self.content
    }

    pub fn format(&self) -> SchemaFormat {
        match self.content {
            SchemaContent::Introspection(_) => SchemaFormat::Introspection,
            SchemaContent::Sdl(_) => SchemaFormat::Sdl,
        }
    }

    /// The introspection `data` value, if this is a JSON schema.
    pub fn introspection(&self) -> Option<&Value> {
        match &self.content {
            SchemaContent::Introspection(data) => Some(data),
            SchemaContent::Sdl(_) => None,
        }
    }

    /// The schema text, if this is a raw schema file.
    pub fn sdl(&self) -> Option<&str> {
        match &self.content {
            SchemaContent::Sdl(text) => Some(text),
            SchemaContent::Introspection(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(SchemaFormat::from_path(Path::new("schema.json")), SchemaFormat::Introspection);
        assert_eq!(SchemaFormat::from_path(Path::new("SCHEMA.JSON")), SchemaFormat::Introspection);
        assert_eq!(SchemaFormat::from_path(Path::new("schema.graphql")), SchemaFormat::Sdl);
        assert_eq!(SchemaFormat::from_path(Path::new("schema")), SchemaFormat::Sdl);
    }

    #[test]
    fn introspection_keeps_only_data_field() {
        let bytes = br#"{ "data": { "__schema": { "types": [] } }, "extensions": {} }"#;
        let schema = Schema::parse(Path::new("schema.json"), bytes).unwrap();

        assert_eq!(schema.format(), SchemaFormat::Introspection);
        assert_eq!(schema.introspection(), Some(&json!({ "__schema": { "types": [] } })));
        assert!(schema.sdl().is_none());
    }

    #[test]
    fn introspection_without_data_is_rejected() {
        let cases: [&[u8]; 3] = [br#"{ "errors": [] }"#, br#"{ "data": null }"#, b"[1, 2]"];
        for bytes in cases {
            let err = Schema::parse(Path::new("schema.json"), bytes).unwrap_err();
            assert!(matches!(err, SchemaError::MissingData), "got {err}");
        }
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Schema::parse(Path::new("schema.json"), b"{ \"data\": ").unwrap_err();
        assert!(matches!(err, SchemaError::Json(_)));
    }

    #[test]
    fn sdl_text_is_kept_verbatim() {
        let text = "type Query { viewer: User }\n";
        let schema = Schema::parse(Path::new("schema.graphql"), text.as_bytes()).unwrap();

        assert_eq!(schema.sdl(), Some(text));
        assert_eq!(schema.path(), Path::new("schema.graphql"));
    }

    #[test]
    fn blank_or_binary_sdl_is_rejected() {
        let err = Schema::parse(Path::new("schema.graphql"), b" \n\t ").unwrap_err();
        assert!(matches!(err, SchemaError::Empty));

        let err = Schema::parse(Path::new("schema.graphql"), &[0xff, 0xfe, 0x00][..]).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidUtf8(_)));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = TempDir::new().expect("create tempdir");
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{ "data": { "ok": true } }"#).unwrap();

        let schema = Schema::load(&path).unwrap();
        assert_eq!(schema.introspection(), Some(&json!({ "ok": true })));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = TempDir::new().expect("create tempdir");
        let err = Schema::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SchemaError::Io(_)));
    }
}
