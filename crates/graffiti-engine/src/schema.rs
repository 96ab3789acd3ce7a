//! JSON-Schema compilation for reads and discovery.
//!
//! A [`CompiledSchema`] is two things at once: a predicate over candidate
//! objects (never erroring at evaluation time) and a scan window over
//! `lastModified` derived from the schema's numeric bounds, used to narrow
//! index range scans before any object is materialized.

use jsonschema::Validator;
use serde_json::Value;

use graffiti_types::GraffitiObject;

use crate::error::{EngineError, EngineResult};
use crate::index::{pad15, END_SENTINEL};

/// A schema compiled once and evaluated many times.
pub struct CompiledSchema {
    validator: Validator,
    start_suffix: String,
    end_suffix: String,
}

impl CompiledSchema {
    /// Compile a JSON-Schema value.
    ///
    /// Fails with [`EngineError::InvalidSchema`] when the schema itself is
    /// malformed; a successfully compiled schema never fails at
    /// evaluation time.
    pub fn compile(schema: &Value) -> EngineResult<Self> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| EngineError::InvalidSchema(e.to_string()))?;
        let (start_suffix, end_suffix) = seq_window(schema);
        Ok(Self {
            validator,
            start_suffix,
            end_suffix,
        })
    }

    /// Evaluate the predicate against an object.
    pub fn matches(&self, object: &GraffitiObject) -> bool {
        match serde_json::to_value(object) {
            Ok(json) => self.validator.is_valid(&json),
            Err(_) => false,
        }
    }

    /// Lower scan suffix: `pad15` of the smallest admissible
    /// `lastModified`, or `""` when unbounded below.
    pub fn start_suffix(&self) -> &str {
        &self.start_suffix
    }

    /// Upper scan suffix: `pad15` of the largest admissible
    /// `lastModified`, or the sentinel when unbounded above.
    pub fn end_suffix(&self) -> &str {
        &self.end_suffix
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("start_suffix", &self.start_suffix)
            .field("end_suffix", &self.end_suffix)
            .finish()
    }
}

/// Derive the `lastModified` scan window from
/// `properties.lastModified.{minimum, exclusiveMinimum, maximum,
/// exclusiveMaximum}`.
///
/// `exclusiveMinimum` admits the smallest integer strictly greater;
/// `exclusiveMaximum` the largest integer strictly less. Non-numeric
/// bounds are treated as absent; the predicate still enforces whatever
/// the validator makes of them.
fn seq_window(schema: &Value) -> (String, String) {
    let bounds = schema
        .get("properties")
        .and_then(|p| p.get("lastModified"));

    let mut start: Option<u64> = None;
    let mut end: Option<u64> = None;

    if let Some(bounds) = bounds {
        if let Some(min) = bounds.get("minimum").and_then(Value::as_f64) {
            start = Some(clamp_u64(min.ceil()));
        }
        if let Some(xmin) = bounds.get("exclusiveMinimum").and_then(Value::as_f64) {
            let above = clamp_u64(xmin.floor() + 1.0);
            start = Some(start.map_or(above, |s| s.max(above)));
        }
        if let Some(max) = bounds.get("maximum").and_then(Value::as_f64) {
            end = Some(clamp_u64(max.floor()));
        }
        if let Some(xmax) = bounds.get("exclusiveMaximum").and_then(Value::as_f64) {
            let below = clamp_u64(xmax.ceil() - 1.0);
            end = Some(end.map_or(below, |e| e.min(below)));
        }
    }

    (
        start.map(pad15).unwrap_or_default(),
        end.map(pad15).unwrap_or_else(|| END_SENTINEL.to_string()),
    )
}

fn clamp_u64(v: f64) -> u64 {
    if v <= 0.0 {
        0
    } else if v >= u64::MAX as f64 {
        u64::MAX
    } else {
        v as u64
    }
}
