//! Test doubles shared by the unit tests.

use std::fs::{self, File};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, bail};
use relay_hot_core::{PluginOptions, Schema, SchemaContent};
use serde_json::Value;

use crate::transformer::{HostAst, Transformer, TransformerFactory};

/// Syntax tree where a program is a list of emitted lines and a tagged
/// template is its raw text.
pub(crate) struct TestAst;

#[derive(Debug, Default)]
pub(crate) struct TestState {
    pub opts: Option<Value>,
    /// Labels of the transformers that handled a program start.
    pub seen: Vec<String>,
}

impl HostAst for TestAst {
    type Program = Vec<String>;
    type TaggedTemplate = String;
    type State = TestState;

    fn plugin_options(state: &TestState) -> Option<&Value> {
        state.opts.as_ref()
    }
}

/// Transformer that stamps its label on everything it touches.
pub(crate) struct LabelTransformer {
    label: String,
}

impl LabelTransformer {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

impl Transformer<TestAst> for LabelTransformer {
    fn on_program_start(&self, program: &mut Vec<String>, state: &mut TestState) {
        program.push(format!("{}:program", self.label));
        state.seen.push(self.label.clone());
    }

    fn on_tagged_template(&self, template: &mut String, _state: &mut TestState) {
        *template = format!("{}({})", self.label, template);
    }
}

/// Factory reading the label from the schema (`data.label` or the first SDL
/// line). A label of `explode` makes the build fail.
#[derive(Clone, Default)]
pub(crate) struct LabelFactory {
    builds: Arc<AtomicUsize>,
}

impl LabelFactory {
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl TransformerFactory<TestAst> for LabelFactory {
    fn build(
        &self,
        schema: &Schema,
        _options: &PluginOptions,
    ) -> anyhow::Result<Box<dyn Transformer<TestAst>>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let label = match schema.content() {
            SchemaContent::Introspection(data) => data
                .get("label")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("introspection data has no label"))?
                .to_string(),
            SchemaContent::Sdl(text) => text.lines().next().unwrap_or_default().trim().to_string(),
        };
        if label == "explode" {
            bail!("refusing to build from schema {}", schema.path().display());
        }
        Ok(Box::new(LabelTransformer::new(&label)))
    }
}

/// Write a JSON schema carrying `label`, stamped with an explicit mtime.
pub(crate) fn write_schema(path: &Path, label: &str, mtime_secs: u64) {
    fs::write(path, format!(r#"{{ "data": {{ "label": "{}" }} }}"#, label)).unwrap();
    set_mtime(path, mtime_secs);
}

pub(crate) fn set_mtime(path: &Path, secs: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(mtime(secs)).unwrap();
}

pub(crate) fn mtime(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
}

/// Run a program-start hook on a fresh program and return the emitted lines.
pub(crate) fn run_program<F>(hook: F) -> Vec<String>
where
    F: FnOnce(&mut Vec<String>, &mut TestState),
{
    let mut program = Vec::new();
    let mut state = TestState::default();
    hook(&mut program, &mut state);
    program
}

const WAIT_LIMIT: Duration = Duration::from_secs(5);
const WAIT_STEP: Duration = Duration::from_millis(5);

/// Block the current thread until `cond` holds or a few seconds pass.
/// Returns whether `cond` held.
pub(crate) fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_LIMIT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(WAIT_STEP);
    }
    cond()
}

/// Like [`wait_until`], yielding to the runtime between checks.
pub(crate) async fn wait_until_async(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_LIMIT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(WAIT_STEP).await;
    }
    cond()
}
