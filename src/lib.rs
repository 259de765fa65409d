//! Incremental form validation for Rust: bind declarative per-type rule sets
//! to a reactive form's field tracking, and project failures onto individual
//! fields for a UI layer to render.
//!
//! ```text
//! field changed ──► ValidationController ──► ValidatorRegistry (which rules?)
//!                          │                        │
//!                          ▼                        ▼
//!                   ValidationRunner ──────► RuleSet::evaluate (async)
//!                          │
//!                          ▼
//!              path::resolve(root, "orders[3].town") ──► (container, field)
//!                          │
//!                          ▼
//!                    MessageStore ──► FormContext ──► UI re-render
//! ```
//!
//! Three decisions do the heavy lifting:
//!
//! - **field-path resolution** maps a failure's dotted/indexed property path
//!   back to a live (containing object, field name) pair, degrading to the
//!   deepest reachable ancestor when a nested object is null;
//! - **validator resolution** picks the rule set for a model type — explicit
//!   registration first, then discovery ranked by namespace affinity;
//! - **incremental validation** decides between a whole-model pass (clear
//!   everything, republish) and a narrowed single-field pass (replace one
//!   field's messages), merging results without stale entries.
//!
//! # Quick start
//!
//! ```rust
//! use serde_json::json;
//!
//! let model = json!({
//!     "first_name": "Ann",
//!     "address": { "town": "Leeds", "postcode": null },
//!     "orders": [ { "total": 12 }, { "total": 30 } ],
//! });
//!
//! let resolved = fieldwise::path::resolve(&model, "orders[1].total").unwrap();
//! assert_eq!(resolved.field_name, "total");
//!
//! // A null intermediate is not an error: resolution stops at the deepest
//! // reachable ancestor so the failure still lands on an existing field.
//! let resolved = fieldwise::path::resolve(&model, "address.postcode.district").unwrap();
//! assert_eq!(resolved.field_name, "postcode");
//! ```
//!
//! Attaching a controller to a form is async end to end; see
//! [`controller::ValidationController`] for a complete example.

pub mod context;
pub mod controller;
pub mod error;
pub mod path;
pub mod reflect;
pub mod registry;
pub mod runner;
pub mod store;
pub mod types;

pub use error::*;
pub use types::*;

// Re-export the main surface at the crate root for convenience.
pub use context::{FormContext, SubscriptionHandle};
pub use controller::{ValidationController, ValidationControllerBuilder};
pub use path::{resolve, ResolvedField};
pub use reflect::{FieldValue, IndexAccess, ModelNode};
pub use registry::{
    DefaultValidatorResolver, DiscoveredRuleSet, DiscoverySource, ResolverContext,
    ValidatorRegistry, ValidatorResolver,
};
pub use runner::ValidationRunner;
pub use store::MessageStore;
