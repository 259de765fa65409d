//! Shared fixtures: a small person/address model family, hand-written rule
//! sets over it (sync, grouped, and async), and a fake discovery source.

use async_trait::async_trait;
use fieldwise::{
    DiscoveredRuleSet, DiscoveryError, DiscoverySource, EvaluationContext, FailureRecord,
    FieldValue, FormContext, ModelNode, RuleSet, Severity, ValidationController,
    ValidationOutcome, ValidatorRegistry,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// ─── Models ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Address {
    pub line1: String,
    pub town: String,
    pub county: String,
    pub postcode: String,
}

impl ModelNode for Address {
    fn type_name(&self) -> &str {
        "demo::models::Address"
    }

    fn get_field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "line1" => Some(FieldValue::scalar(self.line1.clone())),
            "town" => Some(FieldValue::scalar(self.town.clone())),
            "county" => Some(FieldValue::scalar(self.county.clone())),
            "postcode" => Some(FieldValue::scalar(self.postcode.clone())),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i64>,
    pub address: Option<Address>,
}

impl ModelNode for Person {
    fn type_name(&self) -> &str {
        "demo::models::Person"
    }

    fn get_field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "first_name" => Some(FieldValue::scalar(self.first_name.clone())),
            "last_name" => Some(FieldValue::scalar(self.last_name.clone())),
            "age" => Some(FieldValue::opt_scalar(self.age)),
            "address" => Some(FieldValue::opt_node(
                self.address.as_ref().map(|a| a as &dyn ModelNode),
            )),
            _ => None,
        }
    }
}

pub struct Item {
    pub name: String,
}

impl ModelNode for Item {
    fn type_name(&self) -> &str {
        "demo::models::Item"
    }

    fn get_field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "name" => Some(FieldValue::scalar(self.name.clone())),
            _ => None,
        }
    }
}

pub struct Inventory {
    pub items: Vec<Item>,
}

impl ModelNode for Inventory {
    fn type_name(&self) -> &str {
        "demo::models::Inventory"
    }

    fn get_field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "items" => Some(FieldValue::Node(&self.items)),
            _ => None,
        }
    }
}

pub fn valid_address() -> Address {
    Address {
        line1: "1 High Street".to_string(),
        town: "Leeds".to_string(),
        county: "West Yorkshire".to_string(),
        postcode: "LS1 1AA".to_string(),
    }
}

pub fn valid_person() -> Person {
    Person {
        first_name: "Ann".to_string(),
        last_name: "Smith".to_string(),
        age: Some(30),
        address: Some(valid_address()),
    }
}

pub fn inventory(names: &[&str]) -> Inventory {
    Inventory {
        items: names
            .iter()
            .map(|n| Item {
                name: n.to_string(),
            })
            .collect(),
    }
}

// ─── Field-read helpers for rule sets ───────────────────────────────────────

pub fn scalar_str(model: &dyn ModelNode, name: &str) -> String {
    match model.get_field(name) {
        Some(FieldValue::Scalar(v)) => v.as_str().unwrap_or_default().to_string(),
        _ => String::new(),
    }
}

pub fn scalar_i64(model: &dyn ModelNode, name: &str) -> Option<i64> {
    match model.get_field(name) {
        Some(FieldValue::Scalar(v)) => v.as_i64(),
        _ => None,
    }
}

// ─── Rule sets ──────────────────────────────────────────────────────────────

/// Rules for [`Person`]: ungrouped first-name and age rules, a "names"-group
/// last-name rule, and nested address rules reported with `address.`-prefixed
/// paths (including a warning-severity county rule).
pub struct PersonRules;

#[async_trait]
impl RuleSet for PersonRules {
    async fn evaluate(
        &self,
        model: &dyn ModelNode,
        ctx: &EvaluationContext<'_>,
    ) -> ValidationOutcome {
        let mut failures = Vec::new();

        if ctx.should_evaluate_field("first_name") {
            let first_name = scalar_str(model, "first_name");
            if first_name.is_empty() {
                failures.push(FailureRecord::error(
                    "first_name",
                    "You must enter your first name",
                ));
            } else if first_name.len() > 50 {
                failures.push(FailureRecord::error(
                    "first_name",
                    "First name cannot be longer than 50 characters",
                ));
            }
        }

        if ctx.should_evaluate_field("last_name")
            && ctx.should_evaluate_group(Some("names"))
            && scalar_str(model, "last_name").is_empty()
        {
            failures.push(FailureRecord::error(
                "last_name",
                "You must enter your last name",
            ));
        }

        if ctx.should_evaluate_field("age") {
            match scalar_i64(model, "age") {
                None => failures.push(FailureRecord::error("age", "You must enter your age")),
                Some(age) if age < 0 => {
                    failures.push(FailureRecord::error("age", "Age must be greater than 0"));
                }
                Some(age) if age >= 150 => {
                    failures.push(FailureRecord::error(
                        "age",
                        "Age cannot be greater than 150",
                    ));
                }
                Some(_) => {}
            }
        }

        if ctx.should_evaluate_field("address") {
            match model.get_field("address") {
                Some(FieldValue::Node(address)) => {
                    if scalar_str(address, "postcode").is_empty() {
                        failures.push(FailureRecord::error(
                            "address.postcode",
                            "You must enter a postcode",
                        ));
                    }
                    let county = scalar_str(address, "county");
                    if !county.is_empty() && county.len() < 3 {
                        failures.push(FailureRecord::with_severity(
                            "address.county",
                            Severity::Warning,
                            "Enter the full county name",
                        ));
                    }
                }
                _ => {
                    // The address object itself is missing; the postcode rule
                    // still fires and its path exercises the early-stop policy.
                    failures.push(FailureRecord::error(
                        "address.postcode",
                        "You must enter a postcode",
                    ));
                }
            }
        }

        ValidationOutcome { failures }
    }
}

/// Rules for [`Address`] as a standalone sub-model.
pub struct AddressRules;

#[async_trait]
impl RuleSet for AddressRules {
    async fn evaluate(
        &self,
        model: &dyn ModelNode,
        ctx: &EvaluationContext<'_>,
    ) -> ValidationOutcome {
        let mut failures = Vec::new();
        for (field, message) in [
            ("line1", "You must enter Line 1"),
            ("town", "You must enter a town"),
            ("postcode", "You must enter a postcode"),
        ] {
            if ctx.should_evaluate_field(field) && scalar_str(model, field).is_empty() {
                failures.push(FailureRecord::error(field, message));
            }
        }
        if ctx.should_evaluate_field("county") {
            let county = scalar_str(model, "county");
            if !county.is_empty() && county.len() < 3 {
                failures.push(FailureRecord::with_severity(
                    "county",
                    Severity::Warning,
                    "Enter the full county name",
                ));
            }
        }
        ValidationOutcome { failures }
    }
}

// ─── Async rule set ─────────────────────────────────────────────────────────

pub struct EmailModel {
    pub email_address: String,
}

impl ModelNode for EmailModel {
    fn type_name(&self) -> &str {
        "demo::models::EmailModel"
    }

    fn get_field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "email_address" => Some(FieldValue::scalar(self.email_address.clone())),
            _ => None,
        }
    }
}

/// An inherently asynchronous rule set: the suffix check stands in for a
/// remote lookup and must be awaited to completion.
pub struct EmailRules;

#[async_trait]
impl RuleSet for EmailRules {
    async fn evaluate(
        &self,
        model: &dyn ModelNode,
        ctx: &EvaluationContext<'_>,
    ) -> ValidationOutcome {
        let mut failures = Vec::new();
        if ctx.should_evaluate_field("email_address") {
            let email = scalar_str(model, "email_address");
            if email.is_empty() {
                failures.push(FailureRecord::error(
                    "email_address",
                    "You must enter an email address",
                ));
            } else {
                tokio::time::sleep(std::time::Duration::from_millis(25)).await;
                if !email.to_lowercase().ends_with("@hotmail.com") {
                    failures.push(FailureRecord::error(
                        "email_address",
                        "Email address must end with @hotmail.com",
                    ));
                }
            }
        }
        ValidationOutcome { failures }
    }
}

// ─── Registry fixtures ──────────────────────────────────────────────────────

/// A rule set identified by a marker failure, so tests can tell which
/// candidate a resolution produced.
pub struct TaggedRuleSet {
    pub tag: &'static str,
}

#[async_trait]
impl RuleSet for TaggedRuleSet {
    async fn evaluate(
        &self,
        _model: &dyn ModelNode,
        _ctx: &EvaluationContext<'_>,
    ) -> ValidationOutcome {
        ValidationOutcome {
            failures: vec![FailureRecord::with_severity("", Severity::Info, self.tag)],
        }
    }
}

/// Evaluate a resolved rule set against an empty model and return its marker.
pub async fn tag_of(rule_set: &dyn RuleSet) -> String {
    let form = FormContext::new();
    let ctx = EvaluationContext {
        form: &form,
        changed_field: None,
        strategy: Default::default(),
    };
    let model = serde_json::json!({});
    rule_set
        .evaluate(&model, &ctx)
        .await
        .failures
        .first()
        .map(|f| f.message.clone())
        .unwrap_or_default()
}

/// In-memory discovery source: a list of (target type, rule-set type, tag)
/// declarations, an invocation counter, and an optional induced failure.
pub struct FakeSource {
    id: String,
    declarations: Vec<(String, String, &'static str)>,
    fail: bool,
    pub scans: AtomicUsize,
}

impl FakeSource {
    pub fn new(id: &str, declarations: &[(&str, &str, &'static str)]) -> Self {
        FakeSource {
            id: id.to_string(),
            declarations: declarations
                .iter()
                .map(|(target, rs, tag)| (target.to_string(), rs.to_string(), *tag))
                .collect(),
            fail: false,
            scans: AtomicUsize::new(0),
        }
    }

    pub fn failing(id: &str) -> Self {
        FakeSource {
            id: id.to_string(),
            declarations: Vec::new(),
            fail: true,
            scans: AtomicUsize::new(0),
        }
    }
}

impl DiscoverySource for FakeSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn rule_sets(&self) -> Result<Vec<DiscoveredRuleSet>, DiscoveryError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DiscoveryError {
                source: self.id.clone(),
                message: "scan blew up".to_string(),
            });
        }
        Ok(self
            .declarations
            .iter()
            .map(|(target, rule_set_type, tag)| {
                let tag = *tag;
                DiscoveredRuleSet {
                    target_type: target.clone(),
                    rule_set_type: rule_set_type.clone(),
                    factory: Arc::new(move || {
                        let rule_set: Arc<dyn RuleSet> = Arc::new(TaggedRuleSet { tag });
                        rule_set
                    }),
                }
            })
            .collect())
    }
}

// ─── Controller wiring ──────────────────────────────────────────────────────

pub fn person_registry() -> Arc<ValidatorRegistry> {
    let registry = Arc::new(ValidatorRegistry::new());
    registry.register("demo::models::Person", Arc::new(PersonRules));
    registry.register("demo::models::Address", Arc::new(AddressRules));
    registry.register("demo::models::EmailModel", Arc::new(EmailRules));
    registry
}

pub fn attach_controller(form: &Arc<FormContext>) -> ValidationController {
    ValidationController::builder()
        .context(form.clone())
        .registry(person_registry())
        .attach()
        .expect("attach with a context cannot fail")
}
