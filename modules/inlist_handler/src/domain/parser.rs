use async_trait::async_trait;
use std::path::Path;

use crate::domain::error::DomainError;
use crate::domain::value::InlistDocument;

/// Trait for inlist format backends that can handle specific file types
#[async_trait]
pub trait InlistBackend: Send + Sync {
    /// Unique identifier for this backend
    fn id(&self) -> &'static str;

    /// File extensions this backend supports (without the dot)
    fn supported_extensions(&self) -> &'static [&'static str];

    /// Load an inlist from a local path
    async fn parse_local_path(&self, path: &Path) -> Result<InlistDocument, DomainError>;

    /// Load an inlist from bytes
    async fn parse_bytes(
        &self,
        filename_hint: Option<&str>,
        bytes: bytes::Bytes,
    ) -> Result<InlistDocument, DomainError>;
}
