//! Validator resolution: which rule set applies to which model type.
//!
//! Two tiers, tried in order, first hit wins:
//!
//! 1. **Direct registration** — exact type-name match against explicitly
//!    registered rule sets.
//! 2. **Discovery fallback** — scan pluggable [`DiscoverySource`]s once per
//!    source, then rank the candidates declared for the target type by
//!    namespace affinity, shared name prefix, and namespace length.
//!
//! A miss is not an error: it signals "no rules apply", which callers treat
//! as trivially-valid. The scan cache is append-only for the registry's
//! lifetime; registrations do not change at runtime.

use crate::context::FormContext;
use crate::error::DiscoveryError;
use crate::reflect::ModelNode;
use crate::types::{FieldIdentifier, RuleSet};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// A rule set surfaced by a discovery source.
pub struct DiscoveredRuleSet {
    /// Fully-qualified name of the type the rule set validates, e.g.
    /// `demo::models::Person`.
    pub target_type: String,
    /// Fully-qualified name of the rule-set type itself; drives ranking.
    pub rule_set_type: String,
    /// Constructs a fresh instance per resolution, so stateful rule sets do
    /// not leak state across forms.
    pub factory: Arc<dyn Fn() -> Arc<dyn RuleSet> + Send + Sync>,
}

/// A scannable source of rule sets: a crate, a plugin, a generated module.
pub trait DiscoverySource: Send + Sync {
    /// Stable identity. Sources already scanned are skipped on later lookups.
    fn id(&self) -> &str;

    /// Enumerate the rule sets this source declares.
    fn rule_sets(&self) -> Result<Vec<DiscoveredRuleSet>, DiscoveryError>;
}

/// Explicit registrations plus lazily-scanned discovery sources.
#[derive(Default)]
pub struct ValidatorRegistry {
    direct: Mutex<HashMap<String, Arc<dyn RuleSet>>>,
    sources: Mutex<Vec<Arc<dyn DiscoverySource>>>,
    scanned: Mutex<HashSet<String>>,
    discovered: Mutex<Vec<DiscoveredRuleSet>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        ValidatorRegistry::default()
    }

    /// Register a rule set for an exact type name. An explicit registration
    /// always beats discovery, whatever the ranking would prefer.
    pub fn register(&self, target_type: impl Into<String>, rule_set: Arc<dyn RuleSet>) {
        self.direct
            .lock()
            .unwrap()
            .insert(target_type.into(), rule_set);
    }

    /// Add a discovery source. It is scanned lazily on the first lookup miss
    /// after it was added.
    pub fn add_source(&self, source: Arc<dyn DiscoverySource>) {
        self.sources.lock().unwrap().push(source);
    }

    /// Tier 1: exact-match lookup among explicit registrations.
    pub fn lookup(&self, target_type: &str) -> Option<Arc<dyn RuleSet>> {
        self.direct.lock().unwrap().get(target_type).cloned()
    }

    /// Tier 2: scan pending sources, then return the top-ranked candidate
    /// declared for `target_type`, or `None` if no candidate qualifies.
    pub fn discover(&self, target_type: &str) -> Option<Arc<dyn RuleSet>> {
        self.scan_pending();

        let discovered = self.discovered.lock().unwrap();
        let mut candidates: Vec<&DiscoveredRuleSet> = discovered
            .iter()
            .filter(|c| c.target_type == target_type)
            .collect();
        candidates.sort_by(|a, b| rank(a, b, target_type));
        candidates.first().map(|c| (c.factory)())
    }

    /// Scan every source not yet in the cache. Per-source failures are
    /// logged and swallowed; a failed source is still marked scanned, so one
    /// broken source cannot block or re-fail later lookups.
    ///
    /// Concurrent lookups may redundantly scan the same source; re-scans are
    /// idempotent appends and tolerated rather than prevented.
    fn scan_pending(&self) {
        let sources: Vec<Arc<dyn DiscoverySource>> = self.sources.lock().unwrap().clone();
        for source in sources {
            if self.scanned.lock().unwrap().contains(source.id()) {
                continue;
            }
            match source.rule_sets() {
                Ok(found) => self.discovered.lock().unwrap().extend(found),
                Err(error) => {
                    warn!(source = source.id(), %error, "skipping rule-set source that failed to scan");
                }
            }
            self.scanned.lock().unwrap().insert(source.id().to_string());
        }
    }
}

/// Candidate ranking, best first:
/// 1. prefer a candidate declared in the target type's namespace;
/// 2. prefer the longest common prefix between the candidate's and the
///    target's fully-qualified names;
/// 3. tie-break by shortest candidate namespace.
fn rank(a: &DiscoveredRuleSet, b: &DiscoveredRuleSet, target_type: &str) -> Ordering {
    let target_ns = namespace_of(target_type);
    let a_ns = namespace_of(&a.rule_set_type);
    let b_ns = namespace_of(&b.rule_set_type);

    (b_ns == target_ns)
        .cmp(&(a_ns == target_ns))
        .then_with(|| {
            common_prefix_len(&b.rule_set_type, target_type)
                .cmp(&common_prefix_len(&a.rule_set_type, target_type))
        })
        .then_with(|| a_ns.len().cmp(&b_ns.len()))
}

/// Everything before the last `::`, or empty for a bare name.
fn namespace_of(type_name: &str) -> &str {
    type_name.rsplit_once("::").map(|(ns, _)| ns).unwrap_or("")
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

/// Everything a resolver may consult when picking a rule set.
pub struct ResolverContext<'a> {
    /// Fully-qualified name of the model type a rule set is wanted for.
    pub target_type: &'a str,
    /// The form the requesting controller is attached to.
    pub form: &'a FormContext,
    /// The model instance itself (the root, or a sub-object for narrowed
    /// validation).
    pub model: &'a dyn ModelNode,
    /// The changed field, when resolution was triggered by a field change.
    pub field: Option<&'a FieldIdentifier>,
}

/// Pluggable resolution strategy. A custom resolver supplied to the
/// controller takes precedence over [`DefaultValidatorResolver`] entirely.
pub trait ValidatorResolver: Send + Sync {
    fn resolve(&self, ctx: &ResolverContext<'_>) -> Option<Arc<dyn RuleSet>>;
}

/// The default two-tier strategy: direct registration lookup, then discovery.
/// Either tier can be disabled.
pub struct DefaultValidatorResolver {
    registry: Arc<ValidatorRegistry>,
    disable_direct: bool,
    disable_discovery: bool,
}

impl DefaultValidatorResolver {
    pub fn new(registry: Arc<ValidatorRegistry>) -> Self {
        DefaultValidatorResolver {
            registry,
            disable_direct: false,
            disable_discovery: false,
        }
    }

    /// Skip tier 1 (explicit registrations).
    pub fn disable_direct(mut self, disable: bool) -> Self {
        self.disable_direct = disable;
        self
    }

    /// Skip tier 2 (discovery scanning).
    pub fn disable_discovery(mut self, disable: bool) -> Self {
        self.disable_discovery = disable;
        self
    }
}

impl ValidatorResolver for DefaultValidatorResolver {
    fn resolve(&self, ctx: &ResolverContext<'_>) -> Option<Arc<dyn RuleSet>> {
        let mut result = None;
        if !self.disable_direct {
            result = self.registry.lookup(ctx.target_type);
        }
        if result.is_none() && !self.disable_discovery {
            result = self.registry.discover(ctx.target_type);
        }
        result
    }
}
