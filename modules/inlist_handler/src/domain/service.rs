use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::parser::InlistBackend;
use crate::domain::value::InlistDocument;

/// Inlist service that routes files to the matching format backend
#[derive(Clone)]
pub struct InlistService {
    backends: Vec<Arc<dyn InlistBackend>>,
    config: ServiceConfig,
}

/// Configuration for the inlist service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_file_size_bytes: usize,
    /// Backend used when no backend claims the file extension
    pub fallback_backend: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 1024 * 1024, // 1 MB
            fallback_backend: Some("inlist".to_string()),
        }
    }
}

/// Information about available backends
#[derive(Debug, Clone)]
pub struct InlistServiceInfo {
    pub supported_extensions: HashMap<String, Vec<String>>,
}

impl InlistService {
    /// Create a new service with the given backends
    pub fn new(backends: Vec<Arc<dyn InlistBackend>>, config: ServiceConfig) -> Self {
        Self { backends, config }
    }

    /// Get information about available backends
    #[instrument(name = "inlist_handler.service.info", skip(self))]
    pub fn info(&self) -> InlistServiceInfo {
        debug!("Getting backend info");

        let supported_extensions = self
            .backends
            .iter()
            .map(|backend| {
                let extensions = backend
                    .supported_extensions()
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                (backend.id().to_string(), extensions)
            })
            .collect();

        InlistServiceInfo {
            supported_extensions,
        }
    }

    /// Load an inlist from a local path, choosing the backend by extension
    #[instrument(name = "inlist_handler.service.parse_local", skip(self), fields(path = %path.display()))]
    pub async fn parse_local(&self, path: &Path) -> Result<InlistDocument, DomainError> {
        info!("Loading inlist from local path");

        self.check_local_file(path).await?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let backend = self.resolve_backend(extension).map_err(|e| {
            tracing::error!(?e, extension, "InlistService: no backend for local file");
            e
        })?;
        self.load_local(backend, path).await
    }

    /// Load an inlist from a local path with an explicitly chosen backend
    #[instrument(name = "inlist_handler.service.parse_local_as", skip(self), fields(path = %path.display()))]
    pub async fn parse_local_as(
        &self,
        backend_id: &str,
        path: &Path,
    ) -> Result<InlistDocument, DomainError> {
        info!("Loading inlist from local path with forced backend");

        let backend = self.find_backend_by_id(backend_id).ok_or_else(|| {
            let e = DomainError::no_parser_available(backend_id);
            tracing::error!(?e, backend_id, "InlistService: unknown backend");
            e
        })?;
        self.check_local_file(path).await?;
        self.load_local(backend, path).await
    }

    /// Load an inlist from bytes, choosing the backend by the filename hint
    #[instrument(
        name = "inlist_handler.service.parse_bytes",
        skip(self, bytes),
        fields(filename_hint = ?filename_hint, size = bytes.len())
    )]
    pub async fn parse_bytes(
        &self,
        filename_hint: Option<&str>,
        bytes: Bytes,
    ) -> Result<InlistDocument, DomainError> {
        info!("Loading uploaded inlist");

        self.check_size(bytes.len() as u64).map_err(|e| {
            tracing::error!(?e, "InlistService: upload rejected");
            e
        })?;

        let extension = filename_hint
            .and_then(|name| Path::new(name).extension())
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let backend = self.resolve_backend(extension).map_err(|e| {
            tracing::error!(?e, extension, "InlistService: no backend for upload");
            e
        })?;

        let document = backend
            .parse_bytes(filename_hint, bytes)
            .await
            .map_err(|e| {
                tracing::error!(?e, "InlistService: parse_bytes failed");
                e
            })?;

        debug!(keys = document.values.len(), "Successfully loaded uploaded inlist");
        Ok(document)
    }

    /// Existence, file type and size, checked before any routing
    async fn check_local_file(&self, path: &Path) -> Result<(), DomainError> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            tracing::error!(error = %e, "InlistService: cannot stat inlist");
            DomainError::from_io(path, &e)
        })?;
        if !metadata.is_file() {
            let e = DomainError::invalid_request(format!(
                "{} is not a regular file",
                path.display()
            ));
            tracing::error!(?e, "InlistService: not a regular file");
            return Err(e);
        }
        self.check_size(metadata.len()).map_err(|e| {
            tracing::error!(?e, "InlistService: inlist too large");
            e
        })
    }

    async fn load_local(
        &self,
        backend: Arc<dyn InlistBackend>,
        path: &Path,
    ) -> Result<InlistDocument, DomainError> {
        let document = backend.parse_local_path(path).await.map_err(|e| {
            tracing::error!(?e, backend = backend.id(), "InlistService: parse_local failed");
            e
        })?;

        debug!(
            keys = document.values.len(),
            backend = backend.id(),
            "Successfully loaded inlist from local path"
        );
        Ok(document)
    }

    fn check_size(&self, size: u64) -> Result<(), DomainError> {
        if size > self.config.max_file_size_bytes as u64 {
            return Err(DomainError::invalid_request(format!(
                "File size {} exceeds maximum of {} bytes",
                size, self.config.max_file_size_bytes
            )));
        }
        Ok(())
    }

    /// Backend claiming `extension`, else the configured fallback
    fn resolve_backend(&self, extension: &str) -> Result<Arc<dyn InlistBackend>, DomainError> {
        if let Some(backend) = self.find_backend_by_extension(extension) {
            return Ok(backend);
        }
        match &self.config.fallback_backend {
            Some(id) => {
                debug!(extension, fallback = %id, "No backend claims extension, using fallback");
                self.find_backend_by_id(id)
                    .ok_or_else(|| DomainError::no_parser_available(extension))
            }
            None if extension.is_empty() => Err(DomainError::unsupported_file_type("no extension")),
            None => Err(DomainError::no_parser_available(extension)),
        }
    }

    fn find_backend_by_id(&self, id: &str) -> Option<Arc<dyn InlistBackend>> {
        self.backends.iter().find(|b| b.id() == id).cloned()
    }

    /// Find a backend by file extension
    fn find_backend_by_extension(&self, ext: &str) -> Option<Arc<dyn InlistBackend>> {
        if ext.is_empty() {
            return None;
        }
        let ext_lower = ext.to_lowercase();
        self.backends
            .iter()
            .find(|b| {
                b.supported_extensions()
                    .iter()
                    .any(|e| e.to_lowercase() == ext_lower)
            })
            .cloned()
    }
}
