use super::common::*;
use async_trait::async_trait;
use fieldwise::{
    EvaluationContext, FailureRecord, FieldIdentifier, FormContext, ModelNode, RuleSet,
    ValidationOutcome, ValidationRunner, ValidationStrategy,
};

/// An unfiltered run evaluates every rule.
#[tokio::test]
async fn unfiltered_run_reports_every_failing_rule() {
    let person = Person {
        first_name: String::new(),
        age: None,
        ..valid_person()
    };
    let form = FormContext::new();

    let outcome = ValidationRunner::new(&form)
        .run(&person, &PersonRules, None)
        .await;

    let paths: Vec<&str> = outcome.failures.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, ["first_name", "age"]);
}

/// A narrowed run evaluates only rules attached to the changed field.
#[tokio::test]
async fn narrowed_run_reports_only_the_changed_field() {
    let person = Person {
        first_name: String::new(),
        age: None,
        ..valid_person()
    };
    let form = FormContext::new();
    let changed = FieldIdentifier::new(&person, "age");

    let outcome = ValidationRunner::new(&form)
        .run(&person, &PersonRules, Some(&changed))
        .await;

    let paths: Vec<&str> = outcome.failures.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, ["age"]);
}

/// An exclusion configured by the strategy hook beats the narrowing
/// inclusion for the same field.
#[tokio::test]
async fn hook_exclusion_beats_narrow_inclusion() {
    let person = Person {
        age: None,
        ..valid_person()
    };
    let form = FormContext::new();
    let changed = FieldIdentifier::new(&person, "age");
    let exclude_age = |strategy: &mut ValidationStrategy| {
        strategy.exclude_field("age");
    };

    let outcome = ValidationRunner::new(&form)
        .with_strategy_hook(Some(&exclude_age))
        .run(&person, &PersonRules, Some(&changed))
        .await;

    assert!(outcome.is_empty());
}

/// Grouped rules only run when the hook includes their group.
#[tokio::test]
async fn grouped_rules_require_group_inclusion() {
    let person = Person {
        last_name: String::new(),
        ..valid_person()
    };
    let form = FormContext::new();

    let outcome = ValidationRunner::new(&form)
        .run(&person, &PersonRules, None)
        .await;
    assert!(outcome.is_empty());

    let with_names = |strategy: &mut ValidationStrategy| {
        strategy.include_group("names");
    };
    let outcome = ValidationRunner::new(&form)
        .with_strategy_hook(Some(&with_names))
        .run(&person, &PersonRules, None)
        .await;
    let paths: Vec<&str> = outcome.failures.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, ["last_name"]);
}

/// A rule can correlate against companion form state published in the
/// property bag.
struct MinimumAgeRules;

#[async_trait]
impl RuleSet for MinimumAgeRules {
    async fn evaluate(
        &self,
        model: &dyn ModelNode,
        ctx: &EvaluationContext<'_>,
    ) -> ValidationOutcome {
        let mut failures = Vec::new();
        if ctx.should_evaluate_field("age") {
            let minimum = ctx
                .form
                .with_property::<i64, _>("minimum_age", |v| *v)
                .unwrap_or(0);
            if scalar_i64(model, "age").is_some_and(|age| age < minimum) {
                failures.push(FailureRecord::error(
                    "age",
                    format!("You must be at least {minimum}"),
                ));
            }
        }
        ValidationOutcome { failures }
    }
}

#[tokio::test]
async fn rules_can_read_form_context_properties() {
    let person = Person {
        age: Some(16),
        ..valid_person()
    };
    let form = FormContext::new();
    form.set_property("minimum_age", Box::new(18i64));

    let outcome = ValidationRunner::new(&form)
        .run(&person, &MinimumAgeRules, None)
        .await;
    assert_eq!(outcome.failures[0].message, "You must be at least 18");
}

/// Inherently asynchronous rules are awaited to completion before the
/// outcome is returned.
#[tokio::test(start_paused = true)]
async fn async_rules_are_awaited_to_completion() {
    let model = EmailModel {
        email_address: "ann@example.com".to_string(),
    };
    let form = FormContext::new();

    let outcome = ValidationRunner::new(&form)
        .run(&model, &EmailRules, None)
        .await;

    assert_eq!(
        outcome.failures[0].message,
        "Email address must end with @hotmail.com"
    );
}
