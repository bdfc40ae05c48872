//! Shared building blocks for the schema hot-reload plugin.
//!
//! This crate provides:
//! - Plugin options as passed by the host build tool, with legacy key remapping
//!   and `RELAY_HOT_*` environment fallback
//! - Schema file loading (JSON introspection documents or raw schema text)
//! - Error types shared by the plugin crate

pub mod config;
pub mod error;
pub mod schema;

pub use config::{ConfigWarning, PluginOptions, DEFAULT_WATCH_INTERVAL_MS};
pub use error::*;
pub use schema::{Schema, SchemaContent, SchemaFormat};
