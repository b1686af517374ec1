//! Loads inlists (parameter files of `key = value` assignments) into typed
//! key/value maps. Two formats are supported: the custom `%`-commented style,
//! layered over a conventional defaults file, and TOML.

// === MODULE DEFINITION ===
pub mod module;
pub use module::InlistHandlerModule;

pub mod config;
pub mod domain;

pub use config::InlistHandlerConfig;
pub use domain::{
    DomainError, InlistBackend, InlistDocument, InlistHandler, InlistMap, InlistRenderer,
    InlistService, InlistValue, ServiceConfig, TomlInlistHandler,
};
