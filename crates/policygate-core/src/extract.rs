//! Type-tolerant reader over the engine's `{"result": {...}}` envelope.
//!
//! Accessors never fail: an absent or mistyped field yields `false`, `""` or
//! `0`. Callers that care whether a default was substituted ask
//! [`EngineResult::missing`].

use serde_json::{Map, Value};

use crate::error::{PolicyError, Result};

/// Expected JSON type of a result field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    String,
    /// Integer or floating-point number on the wire.
    Integer,
}

/// The object found under `result`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineResult {
    fields: Map<String, Value>,
}

impl EngineResult {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Decode a raw response body.
    ///
    /// Only a body that is not a JSON object is an error. A missing or
    /// non-object `result` (the engine's answer for an undefined path) reads
    /// as an empty result.
    pub fn from_envelope(body: &[u8]) -> Result<Self> {
        let v: Value =
            serde_json::from_slice(body).map_err(|e| PolicyError::Decode(e.to_string()))?;
        let Value::Object(mut envelope) = v else {
            return Err(PolicyError::Decode("envelope is not a JSON object".into()));
        };
        match envelope.remove("result") {
            Some(Value::Object(fields)) => Ok(Self { fields }),
            _ => Ok(Self::default()),
        }
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.lookup_bool(key).unwrap_or(false)
    }

    pub fn get_str(&self, key: &str) -> &str {
        self.lookup_str(key).unwrap_or("")
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.lookup_int(key).unwrap_or(0)
    }

    pub fn lookup_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    pub fn lookup_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Whole numbers only. A fractional float or one outside the `i64` range
    /// counts as mistyped.
    pub fn lookup_int(&self, key: &str) -> Option<i64> {
        let n = match self.fields.get(key) {
            Some(Value::Number(n)) => n,
            _ => return None,
        };
        if let Some(i) = n.as_i64() {
            return Some(i);
        }
        let f = n.as_f64()?;
        // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            Some(f as i64)
        } else {
            None
        }
    }

    /// Fields from `expected` that are absent or carry the wrong type.
    pub fn missing<'k>(&self, expected: &[(&'k str, FieldKind)]) -> Vec<&'k str> {
        expected
            .iter()
            .filter(|(key, kind)| match kind {
                FieldKind::Bool => self.lookup_bool(key).is_none(),
                FieldKind::String => self.lookup_str(key).is_none(),
                FieldKind::Integer => self.lookup_int(key).is_none(),
            })
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
