use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::error::DomainError;
use crate::domain::lexer::{self, TokenKind};
use crate::domain::parser::InlistBackend;
use crate::domain::typer;
use crate::domain::value::{DocumentBuilder, InlistDocument, InlistMap, InlistSource};

/// Conventional layout: `<base>/<dir>/<name>.<ext>` has its defaults in
/// `<base>/<defaults_dir>/<name>.<defaults_extension>`.
const DEFAULTS_PATTERN: &str = r"^(.*)/.*/(.*)\..*";

/// Parser for custom-style `key = value` inlists layered over a defaults inlist
pub struct InlistHandler {
    defaults_dir: String,
    defaults_extension: String,
    require_defaults: bool,
    defaults_regex: Regex,
}

impl InlistHandler {
    pub fn new() -> Self {
        Self::with_layout("defaults", "defaults", true)
    }

    /// Use a custom defaults directory name and extension
    pub fn with_layout(defaults_dir: &str, defaults_extension: &str, require_defaults: bool) -> Self {
        Self {
            defaults_dir: defaults_dir.to_string(),
            defaults_extension: defaults_extension.to_string(),
            require_defaults,
            defaults_regex: Regex::new(DEFAULTS_PATTERN).expect("valid defaults regex"),
        }
    }

    /// Parse inlist text on top of `base`, later keys replacing earlier ones
    pub fn parse_str(&self, text: &str, base: Option<InlistMap>) -> Result<InlistMap, DomainError> {
        let mut values = base.unwrap_or_default();
        let mut tokens = lexer::tokenize(text)?.into_iter();

        while let Some(key) = tokens.next() {
            if key.kind != TokenKind::Word {
                return Err(DomainError::invalid_syntax(
                    key.line,
                    format!("expected a parameter name, found '{}'", key.text),
                ));
            }
            match tokens.next() {
                Some(sep) if sep.text == "=" => {}
                Some(other) => {
                    return Err(DomainError::invalid_syntax(
                        other.line,
                        format!("expected '=' after '{}', found '{}'", key.text, other.text),
                    ))
                }
                None => {
                    return Err(DomainError::invalid_syntax(
                        key.line,
                        format!("'{}' is missing '= value'", key.text),
                    ))
                }
            }
            let raw = tokens.next().ok_or_else(|| {
                DomainError::invalid_syntax(key.line, format!("'{}' is missing a value", key.text))
            })?;
            let value = typer::type_value(&key.text, &raw.text)?;
            values.insert(key.text, value);
        }

        Ok(values)
    }

    /// Read and parse one inlist file on top of `base`
    pub fn parse_inlist(&self, path: &Path, base: Option<InlistMap>) -> Result<InlistMap, DomainError> {
        let text = std::fs::read_to_string(path).map_err(|e| DomainError::from_io(path, &e))?;
        self.parse_str(&text, base)
    }

    /// Location of the defaults inlist belonging to `inlist_path`
    pub fn defaults_path_for(&self, inlist_path: &Path) -> Result<PathBuf, DomainError> {
        let text = inlist_path.to_string_lossy();
        let caps = self
            .defaults_regex
            .captures(&text)
            .ok_or_else(|| DomainError::defaults_path_unresolved(text.to_string()))?;
        Ok(PathBuf::from(format!(
            "{}/{}/{}.{}",
            &caps[1], self.defaults_dir, &caps[2], self.defaults_extension
        )))
    }

    /// Values of the defaults inlist; empty when it is absent and not required
    pub fn get_default_inlist_values(&self, inlist_path: &Path) -> Result<InlistMap, DomainError> {
        let defaults_path = self.defaults_path_for(inlist_path)?;
        let read = std::fs::read_to_string(&defaults_path);
        Ok(self.load_defaults(&defaults_path, read)?.unwrap_or_default())
    }

    /// Parse the outcome of reading a defaults file. `None` means the file is
    /// missing and defaults are optional.
    fn load_defaults(
        &self,
        defaults_path: &Path,
        read: std::io::Result<String>,
    ) -> Result<Option<InlistMap>, DomainError> {
        match read {
            Ok(text) => {
                let values = self.parse_str(&text, None)?;
                debug!(count = values.len(), defaults = %defaults_path.display(), "loaded default inlist values");
                Ok(Some(values))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.require_defaults => {
                warn!(defaults = %defaults_path.display(), "defaults inlist not found, continuing without defaults");
                Ok(None)
            }
            Err(e) => Err(DomainError::from_io(defaults_path, &e)),
        }
    }

    /// Defaults overlaid with the values of the inlist at `inlist_path`
    pub fn get_inlist_values(&self, inlist_path: &Path) -> Result<InlistMap, DomainError> {
        let defaults = self.get_default_inlist_values(inlist_path)?;
        self.parse_inlist(inlist_path, Some(defaults))
    }
}

impl Default for InlistHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InlistBackend for InlistHandler {
    fn id(&self) -> &'static str {
        "inlist"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["in", "inlist", "defaults", "dat"]
    }

    async fn parse_local_path(&self, path: &Path) -> Result<InlistDocument, DomainError> {
        let path = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| DomainError::from_io(path, &e))?;

        let defaults_path = self.defaults_path_for(&path)?;
        let read = tokio::fs::read_to_string(&defaults_path).await;
        let base = self.load_defaults(&defaults_path, read)?;
        let applied_defaults = base.is_some();

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DomainError::from_io(&path, &e))?;
        let values = self.parse_str(&text, base)?;

        let mut builder =
            DocumentBuilder::new(InlistSource::LocalPath(path.display().to_string()), self.id())
                .values(values);
        if applied_defaults {
            builder = builder.defaults_path(defaults_path.display().to_string());
        }
        Ok(builder.build())
    }

    async fn parse_bytes(
        &self,
        filename_hint: Option<&str>,
        bytes: bytes::Bytes,
    ) -> Result<InlistDocument, DomainError> {
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| DomainError::parse_error(format!("Failed to decode UTF-8: {}", e)))?;

        let values = self.parse_str(&text, None)?;

        let source = InlistSource::Uploaded {
            original_name: filename_hint.unwrap_or("unknown.in").to_string(),
        };
        Ok(DocumentBuilder::new(source, self.id()).values(values).build())
    }
}
