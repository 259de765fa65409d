//! Runtime introspection over mutable model graphs.
//!
//! Rules report failures against string property paths, so the engine needs a
//! "look up a field by name" capability on arbitrary host models. [`ModelNode`]
//! is that capability: a per-type accessor surface the host implements (by
//! hand or by table) instead of relying on language reflection. A ready-made
//! implementation is provided for [`serde_json::Value`] so loosely-typed
//! models work out of the box, and for `Vec<T>` so collections are traversable
//! through indexer tokens.

use serde_json::Value;
use std::fmt;

/// A value read from a model field.
pub enum FieldValue<'a> {
    /// A nested object (or collection) that can itself be traversed.
    Node(&'a dyn ModelNode),
    /// A scalar leaf, snapshot as JSON. Scalars have no addressable fields.
    Scalar(Value),
    /// The field exists but currently holds no value.
    Null,
}

impl<'a> FieldValue<'a> {
    /// Wrap a scalar. Accepts anything `serde_json` can represent directly
    /// (`&str`, `String`, integers, floats, bools).
    pub fn scalar(value: impl Into<Value>) -> Self {
        FieldValue::Scalar(value.into())
    }

    /// Wrap an optional nested object, mapping `None` to [`FieldValue::Null`].
    pub fn opt_node(node: Option<&'a dyn ModelNode>) -> Self {
        match node {
            Some(n) => FieldValue::Node(n),
            None => FieldValue::Null,
        }
    }

    /// Wrap an optional scalar, mapping `None` to [`FieldValue::Null`].
    pub fn opt_scalar(value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => FieldValue::Scalar(v.into()),
            None => FieldValue::Null,
        }
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Node(n) => write!(f, "Node({})", n.type_name()),
            FieldValue::Scalar(v) => write!(f, "Scalar({})", v),
            FieldValue::Null => write!(f, "Null"),
        }
    }
}

/// Outcome of a keyed-indexer access.
pub enum IndexAccess<'a> {
    /// The type has no single-key indexer. Path resolution falls through to
    /// positional element access.
    Unsupported,
    /// The key was converted and applied. [`FieldValue::Null`] covers absent
    /// entries.
    Value(FieldValue<'a>),
    /// The key text could not be converted to the indexer's parameter type.
    /// Carries a human-readable reason.
    BadKey(String),
}

/// Introspection capability over one model type.
///
/// The engine never mutates through this trait; all accessors take `&self`
/// and reads reflect the live state of the graph at call time.
pub trait ModelNode: Send + Sync {
    /// Fully-qualified type name, e.g. `demo::models::Person`.
    ///
    /// Drives rule-set resolution: explicit registrations are keyed by this
    /// name, and discovery ranks candidates by namespace affinity and shared
    /// name prefix against it.
    fn type_name(&self) -> &str;

    /// Read a named field. `None` means the type has no such field.
    fn get_field(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Keyed indexer capability (maps, dictionaries). The default has none.
    fn get_index(&self, _key: &str) -> IndexAccess<'_> {
        IndexAccess::Unsupported
    }

    /// Positional element access for enumerable types. `None` when the index
    /// is out of range. Only consulted when [`ModelNode::is_enumerable`]
    /// returns true.
    fn get_element(&self, _index: usize) -> Option<FieldValue<'_>> {
        None
    }

    /// Whether positional element access is supported at all.
    fn is_enumerable(&self) -> bool {
        false
    }
}

/// Classify a borrowed JSON value as a field read.
fn classify(value: &Value) -> FieldValue<'_> {
    match value {
        Value::Null => FieldValue::Null,
        Value::Object(_) | Value::Array(_) => FieldValue::Node(value),
        scalar => FieldValue::Scalar(scalar.clone()),
    }
}

/// JSON type name used in path errors for scalar leaves.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Loosely-typed models: objects expose their keys as fields and as a keyed
/// indexer, arrays are enumerable, scalars expose nothing.
impl ModelNode for Value {
    fn type_name(&self) -> &str {
        "serde_json::Value"
    }

    fn get_field(&self, name: &str) -> Option<FieldValue<'_>> {
        self.as_object().and_then(|obj| obj.get(name)).map(classify)
    }

    fn get_index(&self, key: &str) -> IndexAccess<'_> {
        match self.as_object() {
            // String-keyed map: no conversion can fail, absent keys are null.
            Some(obj) => match obj.get(key) {
                Some(v) => IndexAccess::Value(classify(v)),
                None => IndexAccess::Value(FieldValue::Null),
            },
            None => IndexAccess::Unsupported,
        }
    }

    fn get_element(&self, index: usize) -> Option<FieldValue<'_>> {
        self.as_array().and_then(|arr| arr.get(index)).map(classify)
    }

    fn is_enumerable(&self) -> bool {
        self.is_array()
    }
}

impl<T: ModelNode> ModelNode for Vec<T> {
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn get_field(&self, _name: &str) -> Option<FieldValue<'_>> {
        None
    }

    fn get_element(&self, index: usize) -> Option<FieldValue<'_>> {
        self.get(index).map(|item| FieldValue::Node(item))
    }

    fn is_enumerable(&self) -> bool {
        true
    }
}
