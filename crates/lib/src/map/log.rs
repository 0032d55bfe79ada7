//! Structured-log emission for field maps.
//!
//! A [`Map`] knows how to emit itself to a generic structured-log encoder,
//! field by field, recursing into nested maps as nested log objects. Keys
//! are visited in sorted order so the emitted form is deterministic.
//!
//! Redaction is an external collaborator: [`MaskedEmitter`] owns an injected
//! masking function and applies it to a cloned copy of the map before
//! emission, so sensitive values never reach the log sink and the original
//! map is never altered.

use std::{fmt, sync::Arc};

use super::{Map, Value};

/// A generic structured-log object encoder.
///
/// [`Map::encode_fields`] drives an implementation of this trait once per
/// field. Implementations recurse into [`ObjectEncoder::add_object`] values
/// by calling [`Map::encode_fields`] on the nested map.
pub trait ObjectEncoder {
    fn add_null(&mut self, key: &str);
    fn add_bool(&mut self, key: &str, value: bool);
    fn add_int(&mut self, key: &str, value: i64);
    fn add_float(&mut self, key: &str, value: f64);
    fn add_str(&mut self, key: &str, value: &str);
    fn add_array(&mut self, key: &str, values: &[Value]);
    fn add_object(&mut self, key: &str, object: &Map);
}

impl Map {
    /// Emits every field of this map to `enc`, keys in sorted order,
    /// recursing into nested maps as nested log objects.
    pub fn encode_fields(&self, enc: &mut dyn ObjectEncoder) {
        let mut pairs: Vec<(&String, &Value)> = self.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));

        for (key, value) in pairs {
            match value {
                Value::Null => enc.add_null(key),
                Value::Bool(b) => enc.add_bool(key, *b),
                Value::Int(n) => enc.add_int(key, *n),
                Value::Float(x) => enc.add_float(key, *x),
                Value::Str(s) => enc.add_str(key, s),
                Value::Array(items) => enc.add_array(key, items),
                Value::Map(m) => enc.add_object(key, m),
            }
        }
    }
}

/// A value-masking transform applied to a map before it is logged.
pub type MaskFn = Arc<dyn Fn(&mut Map) + Send + Sync>;

/// Emits maps to structured-log encoders with a masking transform applied
/// to a cloned copy first.
///
/// The masking policy is supplied by the caller (typically a configuration
/// subsystem); the emitter itself has no opinion about which values are
/// sensitive.
#[derive(Clone, Default)]
pub struct MaskedEmitter {
    mask: Option<MaskFn>,
}

impl MaskedEmitter {
    /// Creates an emitter applying `mask` before every emission
    pub fn new(mask: MaskFn) -> Self {
        Self { mask: Some(mask) }
    }

    /// Creates an emitter that emits fields unchanged
    pub fn unmasked() -> Self {
        Self { mask: None }
    }

    /// Clones `fields`, applies the masking transform to the clone, and
    /// emits the result to `enc`. The original map is left untouched.
    pub fn encode(&self, fields: &Map, enc: &mut dyn ObjectEncoder) {
        let mut copy = fields.clone();
        if let Some(mask) = &self.mask {
            mask(&mut copy);
        }
        copy.encode_fields(enc);
    }

    /// Renders `fields` as a deterministic JSON object string, masked.
    ///
    /// Useful for attaching field maps to `tracing` events where output
    /// stability matters (keys are emitted in sorted order).
    pub fn to_json(&self, fields: &Map) -> String {
        let mut enc = JsonObjectEncoder::new();
        self.encode(fields, &mut enc);
        enc.finish()
    }
}

impl fmt::Debug for MaskedEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskedEmitter")
            .field("masked", &self.mask.is_some())
            .finish()
    }
}

/// An [`ObjectEncoder`] rendering fields as a JSON object string.
#[derive(Debug)]
pub struct JsonObjectEncoder {
    buf: String,
    first: bool,
}

impl Default for JsonObjectEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonObjectEncoder {
    pub fn new() -> Self {
        Self {
            buf: String::from("{"),
            first: true,
        }
    }

    /// Closes the object and returns the rendered JSON
    pub fn finish(mut self) -> String {
        self.buf.push('}');
        self.buf
    }

    fn begin_field(&mut self, key: &str) {
        if !self.first {
            self.buf.push(',');
        }
        self.first = false;
        push_json_string(&mut self.buf, key);
        self.buf.push(':');
    }
}

fn push_json_string(buf: &mut String, s: &str) {
    match serde_json::to_string(s) {
        Ok(quoted) => buf.push_str(&quoted),
        Err(_) => buf.push_str("\"\""),
    }
}

impl ObjectEncoder for JsonObjectEncoder {
    fn add_null(&mut self, key: &str) {
        self.begin_field(key);
        self.buf.push_str("null");
    }

    fn add_bool(&mut self, key: &str, value: bool) {
        self.begin_field(key);
        self.buf.push_str(if value { "true" } else { "false" });
    }

    fn add_int(&mut self, key: &str, value: i64) {
        self.begin_field(key);
        self.buf.push_str(&value.to_string());
    }

    fn add_float(&mut self, key: &str, value: f64) {
        self.begin_field(key);
        match serde_json::to_string(&value) {
            Ok(json) => self.buf.push_str(&json),
            Err(_) => self.buf.push_str("null"),
        }
    }

    fn add_str(&mut self, key: &str, value: &str) {
        self.begin_field(key);
        push_json_string(&mut self.buf, value);
    }

    fn add_array(&mut self, key: &str, values: &[Value]) {
        self.begin_field(key);
        match serde_json::to_string(values) {
            Ok(json) => self.buf.push_str(&json),
            Err(_) => self.buf.push_str("null"),
        }
    }

    fn add_object(&mut self, key: &str, object: &Map) {
        self.begin_field(key);
        self.buf.push('{');
        self.first = true;
        object.encode_fields(self);
        self.buf.push('}');
        self.first = false;
    }
}
