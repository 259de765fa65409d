//! Core data model: severities, failure records, outcomes, field identity,
//! and the opaque rule-set capability the engine invokes.

use crate::context::FormContext;
use crate::reflect::ModelNode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure severity, ordered least to most severe.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Error => write!(f, "Error"),
        }
    }
}

/// A single rule failure, immutable once produced.
///
/// `path` is the dotted/indexed property path the rule reported against,
/// e.g. `orders[3].address.town`, relative to the model the rule set was
/// evaluated on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub path: String,
    pub severity: Severity,
    pub message: String,
}

impl FailureRecord {
    /// An error-severity failure.
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        FailureRecord {
            path: path.into(),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// A failure at an explicit severity.
    pub fn with_severity(
        path: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        FailureRecord {
            path: path.into(),
            severity,
            message: message.into(),
        }
    }
}

/// Ordered failures from one rule-set run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub failures: Vec<FailureRecord>,
}

impl ValidationOutcome {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// True iff any failure is at or above `threshold`. The comparison is
    /// inclusive: a record exactly at the threshold blocks.
    pub fn has_blocking(&self, threshold: Severity) -> bool {
        self.failures.iter().any(|f| f.severity >= threshold)
    }
}

impl FromIterator<FailureRecord> for ValidationOutcome {
    fn from_iter<I: IntoIterator<Item = FailureRecord>>(iter: I) -> Self {
        ValidationOutcome {
            failures: iter.into_iter().collect(),
        }
    }
}

/// Identity token for one node in the model graph.
///
/// Two tokens are equal iff they were taken from the same live object. A
/// token outlives the borrow it was taken from and is never dereferenced, so
/// identifiers for a since-mutated graph are tolerated — they simply stop
/// matching anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn of(node: &dyn ModelNode) -> Self {
        ObjectId(node as *const dyn ModelNode as *const () as usize)
    }
}

/// (owning object, field name) pair: the unit of "what changed" and the key
/// for message storage.
///
/// Equality is structural: same owning-object identity and same field name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldIdentifier {
    owner: ObjectId,
    field_name: String,
}

impl FieldIdentifier {
    pub fn new(owner: &dyn ModelNode, field_name: impl Into<String>) -> Self {
        FieldIdentifier {
            owner: ObjectId::of(owner),
            field_name: field_name.into(),
        }
    }

    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }
}

impl fmt::Display for FieldIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field_name)
    }
}

/// Field and rule-group selection for one rule-set invocation.
///
/// Narrowed (single-field) validation is expressed as an inclusion filter:
/// the controller adds the changed field name here before invoking the rule
/// set, and a conforming rule set evaluates only rules attached to included
/// fields.
#[derive(Clone, Debug, Default)]
pub struct ValidationStrategy {
    include_fields: Vec<String>,
    exclude_fields: Vec<String>,
    include_groups: Vec<String>,
}

impl ValidationStrategy {
    /// Restrict evaluation to the named field (additive).
    pub fn include_field(&mut self, name: impl Into<String>) -> &mut Self {
        self.include_fields.push(name.into());
        self
    }

    /// Skip rules attached to the named field. Exclusion beats inclusion.
    pub fn exclude_field(&mut self, name: impl Into<String>) -> &mut Self {
        self.exclude_fields.push(name.into());
        self
    }

    /// Also run rules in the named group. Without any included group only
    /// ungrouped rules run.
    pub fn include_group(&mut self, name: impl Into<String>) -> &mut Self {
        self.include_groups.push(name.into());
        self
    }

    /// Whether rules attached to `name` should be evaluated.
    pub fn should_evaluate_field(&self, name: &str) -> bool {
        if self.exclude_fields.iter().any(|f| f == name) {
            return false;
        }
        self.include_fields.is_empty() || self.include_fields.iter().any(|f| f == name)
    }

    /// Whether rules in `group` (`None` for ungrouped rules) should run.
    pub fn should_evaluate_group(&self, group: Option<&str>) -> bool {
        match group {
            None => true,
            Some(g) => self.include_groups.iter().any(|name| name == g),
        }
    }
}

/// Context data attached to one rule-set evaluation.
///
/// Exposed to rule predicates for cases needing environmental correlation,
/// e.g. a rule that depends on companion form state published in the form
/// context's property bag.
pub struct EvaluationContext<'a> {
    /// The form the originating controller is attached to.
    pub form: &'a FormContext,
    /// The live field change that triggered a narrowed run, if any.
    pub changed_field: Option<&'a FieldIdentifier>,
    /// Field and group selection for this invocation.
    pub strategy: ValidationStrategy,
}

impl EvaluationContext<'_> {
    pub fn should_evaluate_field(&self, name: &str) -> bool {
        self.strategy.should_evaluate_field(name)
    }

    pub fn should_evaluate_group(&self, group: Option<&str>) -> bool {
        self.strategy.should_evaluate_group(group)
    }
}

/// Opaque rule-set capability.
///
/// Variants are supplied externally (hand-written, generated from a DSL,
/// backed by remote lookups); the engine only invokes this one operation.
/// Evaluation may suspend internally — remote-lookup-backed predicates are
/// awaited to completion before the outcome is considered final.
#[async_trait]
pub trait RuleSet: Send + Sync {
    /// Evaluate the rule set against `model`, honoring the field and group
    /// selection in `ctx`.
    async fn evaluate(
        &self,
        model: &dyn ModelNode,
        ctx: &EvaluationContext<'_>,
    ) -> ValidationOutcome;
}
