use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::domain::error::DomainError;
use crate::domain::parser::InlistBackend;
use crate::domain::value::{DocumentBuilder, InlistDocument, InlistMap, InlistSource, InlistValue};

/// Parser for TOML-format inlists, where an empty table `{}` means None
pub struct TomlInlistHandler;

impl TomlInlistHandler {
    pub fn new() -> Self {
        Self
    }

    /// Parse TOML text into inlist values
    pub fn parse_str(&self, text: &str) -> Result<InlistMap, DomainError> {
        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| DomainError::parse_error(format!("Invalid TOML: {}", e)))?;
        Ok(convert_table(table))
    }

    /// Read and parse a TOML inlist file
    pub fn get_inlist_values(&self, path: &Path) -> Result<InlistMap, DomainError> {
        let text = std::fs::read_to_string(path).map_err(|e| DomainError::from_io(path, &e))?;
        self.parse_str(&text)
    }
}

impl Default for TomlInlistHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Entries of a table: `{}` values become None, nested tables are adjusted too
fn convert_table(table: toml::Table) -> InlistMap {
    table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::Table(t) if t.is_empty() => {
                    debug!(key = key.as_str(), "empty table read as None");
                    InlistValue::None
                }
                toml::Value::Table(t) => InlistValue::Table(convert_table(t)),
                other => convert_plain(other),
            };
            (key, value)
        })
        .collect()
}

/// Values inside arrays keep empty tables as they are
fn convert_plain(value: toml::Value) -> InlistValue {
    match value {
        toml::Value::String(s) => InlistValue::Str(s),
        toml::Value::Integer(i) => InlistValue::Int(i),
        toml::Value::Float(f) => InlistValue::Float(f),
        toml::Value::Boolean(b) => InlistValue::Bool(b),
        toml::Value::Datetime(dt) => InlistValue::Str(dt.to_string()),
        toml::Value::Array(items) => InlistValue::List(items.into_iter().map(convert_plain).collect()),
        toml::Value::Table(t) => InlistValue::Table(
            t.into_iter()
                .map(|(k, v)| (k, convert_plain(v)))
                .collect(),
        ),
    }
}

#[async_trait]
impl InlistBackend for TomlInlistHandler {
    fn id(&self) -> &'static str {
        "toml"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["toml"]
    }

    async fn parse_local_path(&self, path: &Path) -> Result<InlistDocument, DomainError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DomainError::from_io(path, &e))?;

        let values = self.parse_str(&text)?;

        Ok(
            DocumentBuilder::new(InlistSource::LocalPath(path.display().to_string()), self.id())
                .values(values)
                .build(),
        )
    }

    async fn parse_bytes(
        &self,
        filename_hint: Option<&str>,
        bytes: bytes::Bytes,
    ) -> Result<InlistDocument, DomainError> {
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| DomainError::parse_error(format!("Failed to decode UTF-8: {}", e)))?;

        let values = self.parse_str(&text)?;

        let source = InlistSource::Uploaded {
            original_name: filename_hint.unwrap_or("unknown.toml").to_string(),
        };
        Ok(DocumentBuilder::new(source, self.id()).values(values).build())
    }
}
