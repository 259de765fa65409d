//! Rule-set execution against a (sub-)model, optionally narrowed to one
//! field.
//!
//! The runner is deliberately thin: it assembles the per-invocation strategy
//! and context data, then awaits the rule set to completion. Absence of a
//! rule set is handled upstream — the runner is never called without one, and
//! an empty outcome is the correct response when the registry yields nothing.

use crate::context::FormContext;
use crate::reflect::ModelNode;
use crate::types::{
    EvaluationContext, FieldIdentifier, RuleSet, ValidationOutcome, ValidationStrategy,
};

/// Per-invocation strategy customizer: include/exclude fields or rule groups
/// before a run starts.
pub type StrategyHook = dyn Fn(&mut ValidationStrategy) + Send + Sync;

/// Executes one rule set for the form it is constructed over.
pub struct ValidationRunner<'a> {
    form: &'a FormContext,
    customize: Option<&'a StrategyHook>,
}

impl<'a> ValidationRunner<'a> {
    pub fn new(form: &'a FormContext) -> Self {
        ValidationRunner {
            form,
            customize: None,
        }
    }

    pub fn with_strategy_hook(mut self, hook: Option<&'a StrategyHook>) -> Self {
        self.customize = hook;
        self
    }

    /// Run `rule_set` against `model`.
    ///
    /// When `changed_field` is set the run is narrowed: the strategy gains an
    /// inclusion filter for that field name, so only rules attached to it are
    /// evaluated — unrelated fields are neither evaluated nor reported on.
    /// The customizer hook runs first, then the narrowing filter is applied
    /// on top of whatever it configured.
    ///
    /// Inherently asynchronous rules are awaited to completion before the
    /// outcome is returned.
    pub async fn run(
        &self,
        model: &dyn ModelNode,
        rule_set: &dyn RuleSet,
        changed_field: Option<&FieldIdentifier>,
    ) -> ValidationOutcome {
        let mut strategy = ValidationStrategy::default();
        if let Some(customize) = self.customize {
            customize(&mut strategy);
        }
        if let Some(field) = changed_field {
            strategy.include_field(field.field_name());
        }

        let ctx = EvaluationContext {
            form: self.form,
            changed_field,
            strategy,
        };
        rule_set.evaluate(model, &ctx).await
    }
}
