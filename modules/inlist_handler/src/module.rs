use std::sync::Arc;

use tracing::{debug, info};

use crate::config::InlistHandlerConfig;
use crate::domain::parser::InlistBackend;
use crate::domain::parsers::{InlistHandler, TomlInlistHandler};
use crate::domain::service::{InlistService, ServiceConfig};

/// Owns the configured inlist service
pub struct InlistHandlerModule {
    // Keep the service behind ArcSwap so a re-init swaps it for readers.
    service: arc_swap::ArcSwapOption<InlistService>,
}

impl Default for InlistHandlerModule {
    fn default() -> Self {
        Self {
            service: arc_swap::ArcSwapOption::from(None),
        }
    }
}

impl Clone for InlistHandlerModule {
    fn clone(&self) -> Self {
        Self {
            service: arc_swap::ArcSwapOption::new(self.service.load_full()),
        }
    }
}

impl InlistHandlerModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the backends and the service from module configuration
    pub fn init(&self, cfg: &InlistHandlerConfig) -> anyhow::Result<()> {
        info!("Initializing inlist_handler module");
        debug!(
            "Loaded inlist_handler config: max_file_size_kb={}, defaults_dir={}, defaults_extension={}, require_defaults={}",
            cfg.max_file_size_kb, cfg.defaults_dir, cfg.defaults_extension, cfg.require_defaults
        );

        if cfg.defaults_dir.trim().is_empty() || cfg.defaults_dir.contains('/') {
            anyhow::bail!(
                "defaults_dir must be a single directory name, got '{}'",
                cfg.defaults_dir
            );
        }

        let backends: Vec<Arc<dyn InlistBackend>> = vec![
            Arc::new(InlistHandler::with_layout(
                &cfg.defaults_dir,
                &cfg.defaults_extension,
                cfg.require_defaults,
            )),
            Arc::new(TomlInlistHandler::new()),
        ];

        if let Some(fallback) = &cfg.fallback_backend {
            if !backends.iter().any(|b| b.id() == fallback) {
                anyhow::bail!("fallback_backend '{}' is not a known backend", fallback);
            }
        }

        info!("Registered {} inlist backends", backends.len());

        let service_config = ServiceConfig {
            max_file_size_bytes: usize::try_from(cfg.max_file_size_kb.saturating_mul(1024))
                .unwrap_or(usize::MAX),
            fallback_backend: cfg.fallback_backend.clone(),
        };

        self.service
            .store(Some(Arc::new(InlistService::new(backends, service_config))));

        info!("InlistService initialized successfully");
        Ok(())
    }

    /// The initialized service
    pub fn service(&self) -> anyhow::Result<Arc<InlistService>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }
}
