//! [`PluginHost`]: owns the transformer slot and rebuilds it when the schema changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use relay_hot_core::{ConfigWarning, PluginOptions, Schema};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{PluginError, Result};
use crate::slot::TransformerSlot;
use crate::transformer::{HostAst, Transformer, TransformerFactory};
use crate::watcher::{SchemaWatcher, WatchHandle};

/// Result of one reload.
#[derive(Debug)]
pub enum ReloadOutcome {
    /// A freshly built transformer is now live.
    Installed { generation: u64 },
    /// The inert transformer is now live.
    Degraded { generation: u64, reason: PluginError },
}

impl ReloadOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            ReloadOutcome::Installed { generation } | ReloadOutcome::Degraded { generation, .. } => {
                *generation
            }
        }
    }

    pub fn is_installed(&self) -> bool {
        matches!(self, ReloadOutcome::Installed { .. })
    }
}

/// State shared between the host, its stable hooks and the watcher callback.
struct HostInner<A: HostAst> {
    options: PluginOptions,
    factory: Arc<dyn TransformerFactory<A>>,
    slot: TransformerSlot<A>,
    reloads: AtomicU64,
}

impl<A: HostAst> HostInner<A> {
    /// Rebuild the transformer from the schema file and install it.
    ///
    /// Any failure installs the inert transformer, replacing a working one.
    fn reload(&self) -> ReloadOutcome {
        self.reloads.fetch_add(1, Ordering::SeqCst);

        match self.build() {
            Ok(transformer) => {
                let generation = self.slot.install(Arc::from(transformer));
                ReloadOutcome::Installed { generation }
            }
            Err(reason) => {
                match &reason {
                    // Already reported as a configuration warning at activation.
                    PluginError::MissingSchemaPath => {
                        debug!("no schema path, installing inert transformer")
                    }
                    _ => warn!(
                        error = %reason,
                        "tagged templates will not be transformed until the schema loads"
                    ),
                }
                let generation = self.slot.install_inert();
                ReloadOutcome::Degraded { generation, reason }
            }
        }
    }

    fn build(&self) -> Result<Box<dyn Transformer<A>>> {
        let path = self
            .options
            .schema_path()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(PluginError::MissingSchemaPath)?;

        let schema = Schema::load(path).map_err(|source| PluginError::Schema {
            path: path.to_path_buf(),
            source,
        })?;

        let transformer = self
            .factory
            .build(&schema, &self.options)
            .map_err(|e| PluginError::Factory(format!("{e:#}")))?;

        if self.options.verbose {
            info!(path = %path.display(), "schema loaded");
        } else {
            debug!(path = %path.display(), "schema loaded");
        }
        Ok(transformer)
    }
}

/// Live plugin activation.
///
/// Hooks always forward to whatever transformer is in the slot at call time.
/// The host owns the schema watcher; dropping the host stops it.
pub struct PluginHost<A: HostAst> {
    inner: Arc<HostInner<A>>,
    watch: Option<WatchHandle>,
}

impl<A: HostAst> PluginHost<A> {
    /// Activate with resolved options.
    ///
    /// Loads the schema once before returning, so the hooks are usable
    /// immediately, then starts watching the schema file if the options ask
    /// for it. Without a tokio runtime the watcher polls on its own thread.
    pub fn activate<F>(options: PluginOptions, factory: F) -> Self
    where
        F: TransformerFactory<A> + 'static,
    {
        let warnings = if options.schema_path.is_none() {
            vec![ConfigWarning::MissingSchemaPath]
        } else {
            Vec::new()
        };
        Self::activate_shared(options, warnings, Arc::new(factory))
    }

    /// Activate from the host's raw option object.
    ///
    /// An invalid object is reported and treated as empty, which leaves the
    /// plugin inert.
    pub fn activate_from_value<F>(value: &Value, factory: F) -> Self
    where
        F: TransformerFactory<A> + 'static,
    {
        Self::activate_from_value_shared(value, Arc::new(factory))
    }

    pub(crate) fn activate_from_value_shared(
        value: &Value,
        factory: Arc<dyn TransformerFactory<A>>,
    ) -> Self {
        let (options, warnings) = match PluginOptions::from_value(value) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(error = %e, "ignoring invalid plugin options");
                (PluginOptions::default(), Vec::new())
            }
        };
        Self::activate_shared(options, warnings, factory)
    }

    fn activate_shared(
        options: PluginOptions,
        warnings: Vec<ConfigWarning>,
        factory: Arc<dyn TransformerFactory<A>>,
    ) -> Self {
        for warning in &warnings {
            warning.log();
        }

        let inner = Arc::new(HostInner {
            options,
            factory,
            slot: TransformerSlot::new(),
            reloads: AtomicU64::new(0),
        });
        inner.reload();

        let watch = Self::start_watch(&inner);
        Self { inner, watch }
    }

    fn start_watch(inner: &Arc<HostInner<A>>) -> Option<WatchHandle> {
        let path = inner
            .options
            .schema_path()
            .filter(|p| !p.as_os_str().is_empty())?;
        let watcher = SchemaWatcher::new(path, inner.options.watch_interval_ms)?;

        // Weak, so the polling task does not keep the host state alive.
        let weak = Arc::downgrade(inner);
        match watcher.start(move || {
            if let Some(inner) = weak.upgrade() {
                inner.reload();
            }
        }) {
            Ok(handle) => {
                if inner.options.verbose {
                    info!(
                        path = %path.display(),
                        interval_ms = inner.options.watch_interval_ms,
                        "watching schema file for changes"
                    );
                }
                Some(handle)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "schema hot-reload disabled");
                None
            }
        }
    }

    /// Rebuild the transformer from the current schema file contents.
    pub fn reload(&self) -> ReloadOutcome {
        self.inner.reload()
    }

    pub fn on_program_start(&self, program: &mut A::Program, state: &mut A::State) {
        self.inner.slot.current().on_program_start(program, state);
    }

    pub fn on_tagged_template(&self, template: &mut A::TaggedTemplate, state: &mut A::State) {
        self.inner.slot.current().on_tagged_template(template, state);
    }

    /// Program-start hook that stays valid across reloads.
    pub fn program_hook(&self) -> impl Fn(&mut A::Program, &mut A::State) + Send + Sync + 'static {
        let inner = Arc::clone(&self.inner);
        move |program, state| inner.slot.current().on_program_start(program, state)
    }

    /// Tagged-template hook that stays valid across reloads.
    pub fn expression_hook(
        &self,
    ) -> impl Fn(&mut A::TaggedTemplate, &mut A::State) + Send + Sync + 'static {
        let inner = Arc::clone(&self.inner);
        move |template, state| inner.slot.current().on_tagged_template(template, state)
    }

    /// The transformer installed right now.
    pub fn current(&self) -> Arc<dyn Transformer<A>> {
        self.inner.slot.current()
    }

    pub fn is_inert(&self) -> bool {
        self.inner.slot.is_inert()
    }

    /// Number of transformers installed so far, inert ones included.
    pub fn generation(&self) -> u64 {
        self.inner.slot.generation()
    }

    /// Number of reloads run, the one at activation included.
    pub fn reload_count(&self) -> u64 {
        self.inner.reloads.load(Ordering::SeqCst)
    }

    pub fn is_watching(&self) -> bool {
        self.watch.as_ref().is_some_and(WatchHandle::is_running)
    }

    /// Poll steps completed by the schema watcher, if one is running.
    pub fn watch_polls(&self) -> Option<u64> {
        self.watch.as_ref().map(WatchHandle::polls)
    }

    pub fn options(&self) -> &PluginOptions {
        &self.inner.options
    }
}
