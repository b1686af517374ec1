use serde::{Deserialize, Serialize};

/// Configuration for the inlist_handler module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InlistHandlerConfig {
    #[serde(default = "default_max_file_size_kb")]
    pub max_file_size_kb: u64,
    /// Directory name, next to the inlist's own directory, holding defaults files
    #[serde(default = "default_defaults_dir")]
    pub defaults_dir: String,
    #[serde(default = "default_defaults_extension")]
    pub defaults_extension: String,
    /// Fail when a custom inlist has no defaults file
    #[serde(default = "default_require_defaults")]
    pub require_defaults: bool,
    /// Backend id used for unknown extensions; `None` rejects them
    #[serde(default = "default_fallback_backend")]
    pub fallback_backend: Option<String>,
}

impl Default for InlistHandlerConfig {
    fn default() -> Self {
        Self {
            max_file_size_kb: default_max_file_size_kb(),
            defaults_dir: default_defaults_dir(),
            defaults_extension: default_defaults_extension(),
            require_defaults: default_require_defaults(),
            fallback_backend: default_fallback_backend(),
        }
    }
}

fn default_max_file_size_kb() -> u64 {
    1024
}

fn default_defaults_dir() -> String {
    "defaults".to_string()
}

fn default_defaults_extension() -> String {
    "defaults".to_string()
}

fn default_require_defaults() -> bool {
    true
}

fn default_fallback_backend() -> Option<String> {
    Some("inlist".to_string())
}
