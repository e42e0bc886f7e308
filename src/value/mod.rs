//! JSON values and typed conversion
//!
//! A [`JsonValue`] wraps one decoded JSON unit, or the "absent" marker used
//! when a lookup finds nothing. Typed access goes through [`convert`]:
//! - probe form: [`JsonValue::to_typed`] picks the decoder from the fallback's type
//! - explicit form: [`JsonValue::to_typed_with`] uses a caller-supplied [`Converter`]

pub mod convert;
pub mod registry;

pub use convert::{
    convert_probe, convert_with_fallback, BooleanConverter, Converter, DoubleConverter, FromJson,
    IntegerConverter, StringConverter, ValueListConverter, ValueMapConverter, BOOLEAN, DOUBLE,
    INTEGER, STRING, VALUE_LIST, VALUE_MAP,
};
pub use registry::ConverterRegistry;

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// One level of wrapped values keyed by string, as produced by [`VALUE_MAP`]
pub type ValueMap = BTreeMap<String, JsonValue>;

/// Runtime shape of a JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// No value at all (lookup miss)
    Absent,
    Null,
    Bool,
    Number,
    String,
    List,
    Map,
}

impl Shape {
    /// Shape of a raw decoded value
    pub fn of(raw: &Value) -> Self {
        match raw {
            Value::Null => Shape::Null,
            Value::Bool(_) => Shape::Bool,
            Value::Number(_) => Shape::Number,
            Value::String(_) => Shape::String,
            Value::Array(_) => Shape::List,
            Value::Object(_) => Shape::Map,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Absent => "absent",
            Shape::Null => "null",
            Shape::Bool => "boolean",
            Shape::Number => "number",
            Shape::String => "string",
            Shape::List => "list",
            Shape::Map => "map",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wrapper around one decoded JSON unit.
///
/// Equality is structural: two values are equal iff their shapes and
/// contents are recursively equal. An absent value serializes as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct JsonValue(Option<Value>);

impl JsonValue {
    /// Wrap a present value
    pub fn new(raw: Value) -> Self {
        Self(Some(raw))
    }

    /// The "absent" wrapper returned by lookups that find nothing
    pub fn absent() -> Self {
        Self(None)
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    /// The wrapped raw value, if present
    pub fn raw(&self) -> Option<&Value> {
        self.0.as_ref()
    }

    pub fn into_raw(self) -> Option<Value> {
        self.0
    }

    pub fn shape(&self) -> Shape {
        self.0.as_ref().map_or(Shape::Absent, Shape::of)
    }

    /// Decode as `T`, choosing the decoder from the fallback's type.
    ///
    /// Returns `fallback` unchanged when the value is absent or has the
    /// wrong shape.
    pub fn to_typed<T: FromJson>(&self, fallback: T) -> T {
        convert_probe(self.raw(), fallback)
    }

    /// Decode with an explicit converter; `None` when the value does not match
    pub fn to_typed_with<C: Converter>(&self, converter: &C) -> Option<C::Target> {
        converter.try_convert(self.raw())
    }
}

impl From<Value> for JsonValue {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

impl From<Option<Value>> for JsonValue {
    fn from(raw: Option<Value>) -> Self {
        Self(raw)
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        value.0.unwrap_or(Value::Null)
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(raw) => write!(f, "{}", raw),
            None => write!(f, "<absent>"),
        }
    }
}

/// Wrap each element of a list (one level)
pub fn wrap_list(values: &[Value]) -> Vec<JsonValue> {
    values.iter().cloned().map(JsonValue::new).collect()
}

/// Wrap each value of a map (one level)
pub fn wrap_map(values: &Map<String, Value>) -> ValueMap {
    values
        .iter()
        .map(|(key, raw)| (key.clone(), JsonValue::new(raw.clone())))
        .collect()
}

/// Decode a whole parsed document into a top-level key/value mapping.
///
/// Nested objects and arrays are kept whole, so every level stays reachable
/// as a [`JsonValue`]. A `null` document decodes to an empty mapping; any other
/// non-object top level is rejected with its shape.
pub fn decode_document(raw: Value) -> Result<Map<String, Value>, Shape> {
    match raw {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(Shape::of(&other)),
    }
}
