use serde::{Deserialize, Serialize};
use std::fmt;

/// Produced by [`crate::path::resolve`] when a failure path does not match the
/// shape of the model graph.
///
/// Every variant indicates a mismatch between a rule's declared property path
/// and the actual model — a configuration bug, not a runtime data error. A
/// null value partway through a path is *not* an error; resolution stops early
/// at the deepest reachable ancestor instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathError {
    /// The path is empty or contains an empty segment (e.g. `a..b`).
    MalformedPath { path: String },
    /// A plain token named a field the containing type does not have.
    FieldNotFound { field: String, type_name: String },
    /// An indexer token was applied to a type with neither a keyed indexer
    /// nor positional element access.
    NoIndexer { type_name: String },
    /// The index text could not be converted to the key type the container
    /// expects.
    IndexConversion {
        key: String,
        type_name: String,
        detail: String,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::MalformedPath { path } => {
                write!(f, "malformed field path {:?}", path)
            }
            PathError::FieldNotFound { field, type_name } => {
                write!(f, "could not find field {:?} on type {}", field, type_name)
            }
            PathError::NoIndexer { type_name } => {
                write!(f, "could not find an indexer on type {}", type_name)
            }
            PathError::IndexConversion {
                key,
                type_name,
                detail,
            } => {
                write!(
                    f,
                    "could not convert index {:?} for type {}: {}",
                    key, type_name, detail
                )
            }
        }
    }
}

impl std::error::Error for PathError {}

/// Produced by a [`crate::registry::DiscoverySource`] that failed to scan.
///
/// Discovery errors are swallowed per source: the registry logs them and
/// continues with the remaining sources, so one broken source cannot block
/// lookups for rule sets defined elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryError {
    pub source: String,
    pub message: String,
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "discovery source {:?} failed: {}", self.source, self.message)
    }
}

impl std::error::Error for DiscoveryError {}

/// Produced when a [`crate::controller::ValidationController`] is built
/// without the pieces it cannot run without. Fails fast at construction
/// rather than deferring to first use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachError {
    /// No form context was supplied to the builder.
    MissingFormContext,
}

impl fmt::Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachError::MissingFormContext => write!(
                f,
                "ValidationController requires a FormContext; supply one with \
                 ValidationControllerBuilder::context before attaching"
            ),
        }
    }
}

impl std::error::Error for AttachError {}

/// Produced when a validation outcome is requested from a form context that
/// has never been validated, or that has no controller attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutcomeError;

impl fmt::Display for OutcomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation outcome not found: either the form has not been \
             validated or no ValidationController is attached to it"
        )
    }
}

impl std::error::Error for OutcomeError {}
