//! Error types for the plugin host.

use std::path::PathBuf;

use relay_hot_core::SchemaError;

/// Reasons the host could not install a working transformer.
///
/// None of these escape a hook call: the host logs them and falls back to the
/// inert transformer.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// No schema path was configured.
    #[error("no schema path configured")]
    MissingSchemaPath,

    /// The schema file could not be read or parsed.
    #[error("cannot load schema from {path:?}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    /// The transformer factory rejected the schema.
    #[error("transformer factory failed: {0}")]
    Factory(String),

    /// The dedicated polling thread or its runtime could not be started.
    #[error("cannot start schema watch thread: {0}")]
    WatchThread(#[source] std::io::Error),
}

/// Result alias for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;
