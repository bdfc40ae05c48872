//! [`PluginProxy`]: activates a [`PluginHost`] on the first program-start call.

use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tracing::debug;

use crate::transformer::{HostAst, TransformerFactory};

use super::core::PluginHost;

/// Registration-time stand-in for a plugin whose options arrive with the
/// first compiled file.
///
/// The first program-start call activates the host with the options found in
/// the host state; every later call reuses that activation.
pub struct PluginProxy<A: HostAst> {
    factory: Arc<dyn TransformerFactory<A>>,
    host: OnceLock<PluginHost<A>>,
}

impl<A: HostAst> PluginProxy<A> {
    pub fn new<F>(factory: F) -> Self
    where
        F: TransformerFactory<A> + 'static,
    {
        Self {
            factory: Arc::new(factory),
            host: OnceLock::new(),
        }
    }

    pub fn on_program_start(&self, program: &mut A::Program, state: &mut A::State) {
        let host = self.host.get_or_init(|| {
            let options = A::plugin_options(state).cloned().unwrap_or(Value::Null);
            PluginHost::activate_from_value_shared(&options, Arc::clone(&self.factory))
        });
        host.on_program_start(program, state);
    }

    /// Forward to the active host. Before the first program start there is
    /// nothing to forward to and the call does nothing.
    pub fn on_tagged_template(&self, template: &mut A::TaggedTemplate, state: &mut A::State) {
        match self.host.get() {
            Some(host) => host.on_tagged_template(template, state),
            None => debug!("tagged template seen before program start, skipping"),
        }
    }

    /// The activated host, once a program start has been seen.
    pub fn host(&self) -> Option<&PluginHost<A>> {
        self.host.get()
    }

    pub fn is_active(&self) -> bool {
        self.host.get().is_some()
    }
}
