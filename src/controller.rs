//! The orchestrator bound to a form's lifecycle.
//!
//! A [`ValidationController`] reacts to the form's two triggers:
//!
//! - whole-model validation requested (e.g. on submit): resolve the rule set
//!   for the root model, run it unfiltered, clear the entire message store,
//!   and republish every at-or-above-threshold failure against the field its
//!   path resolves to;
//! - one field changed: resolve the rule set for the field's *owning* object
//!   (not necessarily the root), run it narrowed to that field, and replace
//!   only that field's messages.
//!
//! Overlapping runs are not serialized and not cancelled: the last completion
//! to write wins, a deliberate simplicity-over-ordering tradeoff under rapid
//! field edits.

use crate::context::{FormContext, VALIDATION_OUTCOME_PROPERTY};
use crate::error::AttachError;
use crate::path;
use crate::reflect::ModelNode;
use crate::registry::{
    DefaultValidatorResolver, ResolverContext, ValidatorRegistry, ValidatorResolver,
};
use crate::runner::{StrategyHook, ValidationRunner};
use crate::types::{
    FailureRecord, FieldIdentifier, RuleSet, Severity, ValidationOutcome, ValidationStrategy,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// Formats one failure record into a display string.
pub type MessageFormatter = dyn Fn(&FailureRecord) -> String + Send + Sync;

/// Default display formatting: error-severity messages render bare, anything
/// softer gets a bracketed severity prefix, e.g. `[Warning] Enter a county`.
pub fn default_message_format(failure: &FailureRecord) -> String {
    match failure.severity {
        Severity::Error => failure.message.clone(),
        severity => format!("[{}] {}", severity, failure.message),
    }
}

/// Builder for [`ValidationController`]. A form context is mandatory;
/// everything else has a default.
pub struct ValidationControllerBuilder {
    context: Option<Arc<FormContext>>,
    registry: Option<Arc<ValidatorRegistry>>,
    resolver: Option<Arc<dyn ValidatorResolver>>,
    threshold: Severity,
    format_message: Option<Box<MessageFormatter>>,
    strategy_hook: Option<Box<StrategyHook>>,
}

impl ValidationControllerBuilder {
    fn new() -> Self {
        ValidationControllerBuilder {
            context: None,
            registry: None,
            resolver: None,
            threshold: Severity::Error,
            format_message: None,
            strategy_hook: None,
        }
    }

    /// The form to attach to. Mandatory.
    pub fn context(mut self, context: Arc<FormContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Registry backing the default two-tier resolution. Defaults to an
    /// empty registry (every lookup misses, every model is trivially valid).
    pub fn registry(mut self, registry: Arc<ValidatorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Resolution override. Takes precedence over the default two-tier
    /// strategy entirely; the registry is not consulted.
    pub fn resolver(mut self, resolver: Arc<dyn ValidatorResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Minimum severity that is displayed and treated as blocking.
    /// Defaults to [`Severity::Error`]; set to [`Severity::Warning`] to treat
    /// warnings as blocking, or [`Severity::Info`] to surface everything.
    pub fn severity_threshold(mut self, threshold: Severity) -> Self {
        self.threshold = threshold;
        self
    }

    /// Replace [`default_message_format`].
    pub fn message_format(
        mut self,
        format: impl Fn(&FailureRecord) -> String + Send + Sync + 'static,
    ) -> Self {
        self.format_message = Some(Box::new(format));
        self
    }

    /// Customize the validation strategy of every run, e.g. to exclude
    /// fields or include rule groups.
    pub fn strategy(
        mut self,
        customize: impl Fn(&mut ValidationStrategy) + Send + Sync + 'static,
    ) -> Self {
        self.strategy_hook = Some(Box::new(customize));
        self
    }

    /// Attach to the form context and publish the controller's outcome
    /// channel into its property bag.
    ///
    /// # Errors
    ///
    /// [`AttachError::MissingFormContext`] when no context was supplied.
    pub fn attach(self) -> Result<ValidationController, AttachError> {
        let context = self.context.ok_or(AttachError::MissingFormContext)?;
        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => {
                let registry = self
                    .registry
                    .unwrap_or_else(|| Arc::new(ValidatorRegistry::new()));
                Arc::new(DefaultValidatorResolver::new(registry))
            }
        };

        let (outcome_tx, outcome_rx) = watch::channel(None);
        context.set_property(VALIDATION_OUTCOME_PROPERTY, Box::new(outcome_rx));

        Ok(ValidationController {
            context,
            resolver,
            threshold: self.threshold,
            format_message: self
                .format_message
                .unwrap_or_else(|| Box::new(default_message_format)),
            strategy_hook: self.strategy_hook,
            outcome_tx,
        })
    }
}

/// Incremental validation orchestrator for one form.
///
/// # Example
///
/// ```rust
/// use fieldwise::{
///     EvaluationContext, FailureRecord, FieldValue, FormContext, ModelNode, RuleSet,
///     ValidationController, ValidationOutcome, ValidatorRegistry,
/// };
/// use std::sync::Arc;
///
/// struct Signup {
///     email: String,
/// }
///
/// impl ModelNode for Signup {
///     fn type_name(&self) -> &str {
///         "demo::Signup"
///     }
///     fn get_field(&self, name: &str) -> Option<FieldValue<'_>> {
///         match name {
///             "email" => Some(FieldValue::scalar(self.email.clone())),
///             _ => None,
///         }
///     }
/// }
///
/// struct SignupRules;
///
/// #[async_trait::async_trait]
/// impl RuleSet for SignupRules {
///     async fn evaluate(
///         &self,
///         model: &dyn ModelNode,
///         ctx: &EvaluationContext<'_>,
///     ) -> ValidationOutcome {
///         let mut failures = Vec::new();
///         if ctx.should_evaluate_field("email") {
///             if let Some(FieldValue::Scalar(v)) = model.get_field("email") {
///                 if v.as_str().is_some_and(str::is_empty) {
///                     failures.push(FailureRecord::error("email", "You must enter an email"));
///                 }
///             }
///         }
///         ValidationOutcome { failures }
///     }
/// }
///
/// tokio_test::block_on(async {
///     let form = Arc::new(FormContext::new());
///     let registry = Arc::new(ValidatorRegistry::new());
///     registry.register("demo::Signup", Arc::new(SignupRules));
///
///     let controller = ValidationController::builder()
///         .context(form.clone())
///         .registry(registry)
///         .attach()
///         .unwrap();
///
///     let model = Signup { email: String::new() };
///     assert!(!controller.validate(&model).await);
///     assert_eq!(form.validation_messages(), vec!["You must enter an email"]);
/// });
/// ```
pub struct ValidationController {
    context: Arc<FormContext>,
    resolver: Arc<dyn ValidatorResolver>,
    threshold: Severity,
    format_message: Box<MessageFormatter>,
    strategy_hook: Option<Box<StrategyHook>>,
    outcome_tx: watch::Sender<Option<ValidationOutcome>>,
}

impl ValidationController {
    pub fn builder() -> ValidationControllerBuilder {
        ValidationControllerBuilder::new()
    }

    pub fn context(&self) -> &FormContext {
        &self.context
    }

    pub fn severity_threshold(&self) -> Severity {
        self.threshold
    }

    /// Full validation pass, run to completion.
    ///
    /// True iff the pass left no blocking message in the store.
    pub async fn validate(&self, root: &dyn ModelNode) -> bool {
        self.validate_model(root, true).await;
        self.context.with_messages(|store| store.is_empty())
    }

    /// Whole-model validation: the reaction to the form's
    /// "validation requested" trigger.
    ///
    /// With `update_state` set, the run is published to the form context
    /// before rule evaluation is awaited (so a second caller reacting to the
    /// same trigger can await the same run), the message store is cleared and
    /// repopulated from the outcome, and the form is notified. With it unset,
    /// the outcome is returned without touching any shared state.
    pub async fn validate_model(
        &self,
        root: &dyn ModelNode,
        update_state: bool,
    ) -> ValidationOutcome {
        let Some(rule_set) = self.resolve_validator(root, None) else {
            // No rules apply: trivially valid.
            let empty = ValidationOutcome::default();
            if update_state {
                self.outcome_tx.send_replace(Some(empty.clone()));
            }
            return empty;
        };

        if update_state {
            // Mark a run as in flight; awaiting callers block until it lands.
            self.outcome_tx.send_replace(None);
        }

        let outcome = self.runner().run(root, rule_set.as_ref(), None).await;

        if update_state {
            self.outcome_tx.send_replace(Some(outcome.clone()));
            self.republish_all(root, &outcome);
            self.context.notify_validation_state_changed();
        }
        outcome
    }

    /// Narrowed single-field validation: the reaction to the form's
    /// "field changed" trigger.
    ///
    /// Resolves the rule set for the field's owning object, runs only the
    /// rules attached to that field, and (with `update_state`) replaces that
    /// field's messages, leaving every other field untouched.
    pub async fn validate_field(
        &self,
        owner: &dyn ModelNode,
        field_name: &str,
        update_state: bool,
    ) -> ValidationOutcome {
        let field = FieldIdentifier::new(owner, field_name);
        let Some(rule_set) = self.resolve_validator(owner, Some(&field)) else {
            return ValidationOutcome::default();
        };

        let outcome = self
            .runner()
            .run(owner, rule_set.as_ref(), Some(&field))
            .await;

        if update_state {
            let messages: Vec<String> = outcome
                .failures
                .iter()
                .filter(|f| f.severity >= self.threshold)
                .map(|f| (self.format_message)(f))
                .collect();
            self.context.with_messages_mut(|store| {
                store.clear(&field);
                store.add_all(field.clone(), messages);
            });
            self.context.notify_validation_state_changed();
        }
        outcome
    }

    /// Resolve the applicable rule set for `model` (the root, or the owning
    /// object of `field` for narrowed validation). `None` means no rules
    /// apply. Exposed for introspection and testing.
    pub fn resolve_validator(
        &self,
        model: &dyn ModelNode,
        field: Option<&FieldIdentifier>,
    ) -> Option<Arc<dyn RuleSet>> {
        let ctx = ResolverContext {
            target_type: model.type_name(),
            form: &self.context,
            model,
            field,
        };
        self.resolver.resolve(&ctx)
    }

    /// Synchronously empty the message store and the last-known outcome, and
    /// notify the form. Does not cancel in-flight validations; their eventual
    /// writes will reintroduce messages.
    pub fn clear_messages(&self) {
        self.context.with_messages_mut(|store| store.clear_all());
        self.outcome_tx.send_replace(None);
        self.context.notify_validation_state_changed();
    }

    fn runner(&self) -> ValidationRunner<'_> {
        ValidationRunner::new(&self.context).with_strategy_hook(self.strategy_hook.as_deref())
    }

    /// Clear the whole store and repopulate it from `outcome`.
    ///
    /// A record whose path does not resolve is logged and skipped — one
    /// malformed property name must not abort publishing the rest.
    fn republish_all(&self, root: &dyn ModelNode, outcome: &ValidationOutcome) {
        self.context.with_messages_mut(|store| {
            store.clear_all();
            for failure in outcome
                .failures
                .iter()
                .filter(|f| f.severity >= self.threshold)
            {
                match path::resolve(root, &failure.path) {
                    Ok(resolved) => {
                        store.add(resolved.identifier(), (self.format_message)(failure));
                    }
                    Err(error) => {
                        warn!(path = %failure.path, %error, "skipping failure record whose path did not resolve");
                    }
                }
            }
        });
    }
}

impl Drop for ValidationController {
    fn drop(&mut self) {
        // Withdraw the published outcome channel so awaiting callers error
        // out instead of hanging on a torn-down controller.
        self.context.remove_property(VALIDATION_OUTCOME_PROPERTY);
    }
}
