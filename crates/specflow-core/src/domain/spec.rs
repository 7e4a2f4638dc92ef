//! Infrastructure spec documents.
//!
//! A [`Spec`] is an immutable tree parsed from YAML (JSON is accepted as a
//! YAML subset). [`Spec::parse`] enforces the minimal shape every submitted
//! document must have; [`Spec::new`] wraps any tree without checks so that
//! previously committed documents can always be compared.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::SpecError;

/// Immutable spec tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Spec {
    root: Value,
}

impl Default for Spec {
    fn default() -> Self {
        Self::empty()
    }
}

impl Spec {
    /// Largest accepted document, in bytes.
    pub const MAX_BYTES: usize = 1024 * 1024;

    /// Wrap an arbitrary tree. No validation.
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// An empty mapping.
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }

    /// Parse and validate a submitted document.
    pub fn parse(raw: &str) -> Result<Self, SpecError> {
        let spec = Self::from_yaml(raw)?;
        if spec.kind().is_none() {
            return Err(SpecError::MissingField { field: "kind" });
        }
        if spec.name().is_none() {
            return Err(SpecError::MissingField {
                field: "metadata.name",
            });
        }
        Ok(spec)
    }

    /// Parse a document that must be a YAML mapping, without field checks.
    pub fn from_yaml(raw: &str) -> Result<Self, SpecError> {
        if raw.len() > Self::MAX_BYTES {
            return Err(SpecError::TooLarge {
                size: raw.len(),
                limit: Self::MAX_BYTES,
            });
        }
        if raw.trim().is_empty() {
            return Err(SpecError::Empty);
        }

        let root: Value = serde_yaml::from_str(raw).map_err(|e| SpecError::Syntax {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })?;

        match root {
            Value::Null => return Err(SpecError::Empty),
            Value::Object(_) => {}
            _ => return Err(SpecError::NotAMapping),
        }

        Ok(Self::new(root))
    }

    /// Look up a dotted path such as `spec.security.waf.enabled`.
    ///
    /// Only mapping keys are traversed; list indices are not addressable.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.root, path)
    }

    /// `kind`, when it is a non-blank string.
    pub fn kind(&self) -> Option<&str> {
        non_blank(self.get("kind"))
    }

    /// `metadata.name`, when it is a non-blank string.
    pub fn name(&self) -> Option<&str> {
        non_blank(self.get("metadata.name"))
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }
}

impl From<Value> for Spec {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

pub(crate) fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, key| node.as_object()?.get(key))
}

fn non_blank(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
