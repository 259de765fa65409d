//! Field-path resolution: map a failure's dotted/indexed property path back
//! to a concrete (containing object, field name) pair inside a live model
//! graph.
//!
//! Paths are restricted to dot-separated field names and single-level bracket
//! indices, e.g. `orders[3].address.town`. Resolution walks left to right and
//! never mutates the graph. When a non-final token resolves to a null value,
//! the walk stops early and reports against the deepest reachable ancestor:
//! `address.postcode` with a null `address` resolves to (model, "address"),
//! so the failure still lands on an existing field.

use crate::error::PathError;
use crate::reflect::{json_type_name, FieldValue, IndexAccess, ModelNode};
use crate::types::FieldIdentifier;

const SEPARATORS: [char; 2] = ['.', '['];

/// A resolved (container, field name) pair.
pub struct ResolvedField<'a> {
    /// The object owning the field. Reachable from the root the path was
    /// resolved against.
    pub container: &'a dyn ModelNode,
    /// The leaf field name: the path's final token, or the token at which an
    /// early stop occurred.
    pub field_name: String,
}

impl core::fmt::Debug for ResolvedField<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResolvedField")
            .field("container", &self.container.type_name())
            .field("field_name", &self.field_name)
            .finish()
    }
}

impl ResolvedField<'_> {
    /// The stable identity key for this field, used for message storage.
    pub fn identifier(&self) -> FieldIdentifier {
        FieldIdentifier::new(self.container, &self.field_name)
    }
}

/// Resolve `path` against `root`.
///
/// # Errors
///
/// [`PathError`] when the path does not match the model shape; see the module
/// docs for the early-stop policy, which is not an error.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
///
/// let model = json!({ "orders": [ {}, {}, { "town": "Leeds" } ] });
/// let resolved = fieldwise::path::resolve(&model, "orders[2].town").unwrap();
/// assert_eq!(resolved.field_name, "town");
/// ```
pub fn resolve<'a>(
    root: &'a dyn ModelNode,
    path: &str,
) -> Result<ResolvedField<'a>, PathError> {
    if path.is_empty() {
        return Err(PathError::MalformedPath {
            path: path.to_string(),
        });
    }

    let mut current = root;
    let mut remaining = path;

    loop {
        let Some(sep) = remaining.find(SEPARATORS) else {
            // No separator left: the remaining text is the leaf field name.
            // Its value is deliberately not read.
            return Ok(ResolvedField {
                container: current,
                field_name: remaining.to_string(),
            });
        };

        let token = &remaining[..sep];
        remaining = &remaining[sep + 1..];

        if token.is_empty() || remaining.is_empty() {
            return Err(PathError::MalformedPath {
                path: path.to_string(),
            });
        }

        let value = match token.strip_suffix(']') {
            Some(key) => apply_index(current, key)?,
            None => read_field(current, token)?,
        };

        match value {
            FieldValue::Node(next) => current = next,
            FieldValue::Null => {
                // This is as far as we can go.
                let name = token.strip_suffix(']').unwrap_or(token);
                return Ok(ResolvedField {
                    container: current,
                    field_name: name.to_string(),
                });
            }
            FieldValue::Scalar(scalar) => {
                // A scalar cannot own the rest of the path.
                let next = next_token(remaining);
                return Err(PathError::FieldNotFound {
                    field: next.to_string(),
                    type_name: json_type_name(&scalar).to_string(),
                });
            }
        }
    }
}

/// Read a plain field token's value.
fn read_field<'a>(
    container: &'a dyn ModelNode,
    name: &str,
) -> Result<FieldValue<'a>, PathError> {
    container
        .get_field(name)
        .ok_or_else(|| PathError::FieldNotFound {
            field: name.to_string(),
            type_name: container.type_name().to_string(),
        })
}

/// Apply an indexer token (trailing `]` already stripped).
///
/// Resolution order: keyed indexer first, positional element access second,
/// `NoIndexer` otherwise.
fn apply_index<'a>(
    container: &'a dyn ModelNode,
    key: &str,
) -> Result<FieldValue<'a>, PathError> {
    match container.get_index(key) {
        IndexAccess::Value(value) => Ok(value),
        IndexAccess::BadKey(detail) => Err(PathError::IndexConversion {
            key: key.to_string(),
            type_name: container.type_name().to_string(),
            detail,
        }),
        IndexAccess::Unsupported => {
            if !container.is_enumerable() {
                return Err(PathError::NoIndexer {
                    type_name: container.type_name().to_string(),
                });
            }
            let index: usize =
                key.trim()
                    .parse()
                    .map_err(|_| PathError::IndexConversion {
                        key: key.to_string(),
                        type_name: container.type_name().to_string(),
                        detail: "expected an integer element index".to_string(),
                    })?;
            container
                .get_element(index)
                .ok_or_else(|| PathError::FieldNotFound {
                    field: key.to_string(),
                    type_name: container.type_name().to_string(),
                })
        }
    }
}

/// First token of the remaining path, for error reporting.
fn next_token(remaining: &str) -> &str {
    let end = remaining.find(SEPARATORS).unwrap_or(remaining.len());
    remaining[..end].trim_end_matches(']')
}
