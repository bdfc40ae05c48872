//! Plugin activation and schema hot-reload.
//!
//! [`PluginHost`] builds the transformer from the schema file, installs it in
//! a [`TransformerSlot`](crate::TransformerSlot) and, when configured, rebuilds
//! it every time the schema watcher reports a change. A broken or missing
//! schema degrades the plugin to the inert transformer instead of failing the
//! build. [`PluginProxy`] memoizes activation for hosts that only hand out
//! plugin options together with the first compiled file.

mod core;
mod proxy;


pub use self::core::{PluginHost, ReloadOutcome};
pub use self::proxy::PluginProxy;
