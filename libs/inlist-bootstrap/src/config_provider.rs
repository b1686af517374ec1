use crate::config::AppConfig;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Configuration provider trait for modules
pub trait ConfigProvider: Send + Sync {
    /// Get the raw configuration for a specific module
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;

    /// Typed module configuration; a missing section yields `T::default()`
    fn module_config<T>(&self, module_name: &str) -> anyhow::Result<T>
    where
        T: DeserializeOwned + Default,
        Self: Sized,
    {
        match self.get_module_config(module_name) {
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| {
                anyhow::anyhow!("Invalid configuration for module '{}': {}", module_name, e)
            }),
            None => Ok(T::default()),
        }
    }
}

/// Implementation of ConfigProvider that uses AppConfig
pub struct AppConfigProvider(Arc<AppConfig>);

impl AppConfigProvider {
    pub fn new(config: AppConfig) -> Self {
        Self(Arc::new(config))
    }

    pub fn from_arc(config: Arc<AppConfig>) -> Self {
        Self(config)
    }

    pub fn inner(&self) -> &AppConfig {
        &self.0
    }
}

impl ConfigProvider for AppConfigProvider {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.modules.get(module_name)
    }
}
