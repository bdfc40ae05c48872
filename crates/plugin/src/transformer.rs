//! Capability contract between the host build tool and a schema-driven transformer.

use relay_hot_core::{PluginOptions, Schema};
use serde_json::Value;

/// Syntax-tree types of the host build tool.
///
/// The plugin never looks inside these; it only routes them to the live
/// transformer.
pub trait HostAst: 'static {
    /// Root node handed to the program-start hook, once per source file.
    type Program;
    /// Node handed to the tagged-template hook, once per matching construct.
    type TaggedTemplate;
    /// Per-file state the host threads through both hooks.
    type State;

    /// Plugin options attached to the state, if the host exposes them.
    fn plugin_options(_state: &Self::State) -> Option<&Value> {
        None
    }
}

/// A transformer built from one schema.
pub trait Transformer<A: HostAst>: Send + Sync {
    fn on_program_start(&self, program: &mut A::Program, state: &mut A::State);

    fn on_tagged_template(&self, template: &mut A::TaggedTemplate, state: &mut A::State);

    /// Whether this transformer does nothing.
    fn is_inert(&self) -> bool {
        false
    }
}

/// Transformer with no-op hooks, installed whenever no usable schema exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct InertTransformer;

impl<A: HostAst> Transformer<A> for InertTransformer {
    fn on_program_start(&self, _program: &mut A::Program, _state: &mut A::State) {}

    fn on_tagged_template(&self, _template: &mut A::TaggedTemplate, _state: &mut A::State) {}

    fn is_inert(&self) -> bool {
        true
    }
}

/// Builds a fresh transformer from schema content.
///
/// Called once at activation and again on every reload; the previous
/// transformer is dropped once no in-flight call holds it.
pub trait TransformerFactory<A: HostAst>: Send + Sync {
    fn build(&self, schema: &Schema, options: &PluginOptions)
        -> anyhow::Result<Box<dyn Transformer<A>>>;
}

impl<A, F> TransformerFactory<A> for F
where
    A: HostAst,
    F: Fn(&Schema, &PluginOptions) -> anyhow::Result<Box<dyn Transformer<A>>> + Send + Sync,
{
    fn build(
        &self,
        schema: &Schema,
        options: &PluginOptions,
    ) -> anyhow::Result<Box<dyn Transformer<A>>> {
        self(schema, options)
    }
}
