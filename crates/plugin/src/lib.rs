//! Schema hot-reload for tagged-template transformation plugins.
//!
//! This crate provides:
//! - The capability contract between the host build tool and a transformer
//!   ([`HostAst`], [`Transformer`], [`TransformerFactory`])
//! - An always-available [`InertTransformer`] fallback
//! - A [`TransformerSlot`] holding the live transformer behind a swappable reference
//! - A polling [`SchemaWatcher`] that reports schema file modification
//! - [`PluginHost`], which rebuilds the transformer when the schema changes,
//!   and [`PluginProxy`], which activates it lazily on first use

pub mod error;
pub mod host;
pub mod slot;
pub mod transformer;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{PluginError, Result};
pub use host::{PluginHost, PluginProxy, ReloadOutcome};
pub use slot::TransformerSlot;
pub use transformer::{HostAst, InertTransformer, Transformer, TransformerFactory};
pub use watcher::{PollOutcome, SchemaWatcher, WatchHandle, WatchState};

pub use relay_hot_core::{ConfigWarning, PluginOptions, Schema, SchemaContent, SchemaFormat};
