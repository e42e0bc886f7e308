//! Converters from raw JSON to typed values
//!
//! Every conversion has a safe exit: a value of the wrong shape degrades to
//! the caller's fallback, never to an error or a panic.
//!
//! | converter | accepts | rule |
//! |---|---|---|
//! | [`STRING`] | string | identity |
//! | [`DOUBLE`] | number | as `f64` |
//! | [`INTEGER`] | number | via [`DOUBLE`], truncated toward zero |
//! | [`BOOLEAN`] | boolean | identity |
//! | [`VALUE_LIST`] | list | wrap each element (one level) |
//! | [`VALUE_MAP`] | map | wrap each value (one level) |

use serde_json::Value;
use tracing::debug;

use super::{wrap_list, wrap_map, JsonValue, Shape, ValueMap};

/// Decodes raw JSON into one target type.
pub trait Converter {
    type Target;

    /// Whether `raw` already has this converter's target shape
    fn accepts(&self, raw: &Value) -> bool;

    /// Decode `raw`, or `None` if its shape does not match
    fn decode(&self, raw: &Value) -> Option<Self::Target>;

    /// Decode an optional raw value, reporting the attempt at debug level
    fn try_convert(&self, raw: Option<&Value>) -> Option<Self::Target> {
        let type_name = std::any::type_name::<Self::Target>();
        let Some(raw) = raw else {
            debug!(target_type = type_name, "nothing to convert");
            return None;
        };

        let decoded = self.decode(raw);
        if decoded.is_some() {
            debug!(target_type = type_name, value = %raw, "converted value");
        } else {
            debug!(
                target_type = type_name,
                value = %raw,
                shape = %Shape::of(raw),
                "unable to convert value, shape does not match"
            );
        }
        decoded
    }

    /// Decode `raw`, returning `fallback` unchanged if it cannot be decoded
    fn convert(&self, raw: Option<&Value>, fallback: Self::Target) -> Self::Target {
        self.try_convert(raw).unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringConverter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubleConverter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerConverter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BooleanConverter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueListConverter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueMapConverter;

pub const STRING: StringConverter = StringConverter;
pub const DOUBLE: DoubleConverter = DoubleConverter;
pub const INTEGER: IntegerConverter = IntegerConverter;
pub const BOOLEAN: BooleanConverter = BooleanConverter;
pub const VALUE_LIST: ValueListConverter = ValueListConverter;
pub const VALUE_MAP: ValueMapConverter = ValueMapConverter;

impl Converter for StringConverter {
    type Target = String;

    fn accepts(&self, raw: &Value) -> bool {
        raw.is_string()
    }

    fn decode(&self, raw: &Value) -> Option<String> {
        raw.as_str().map(str::to_string)
    }
}

impl Converter for DoubleConverter {
    type Target = f64;

    fn accepts(&self, raw: &Value) -> bool {
        raw.is_number()
    }

    fn decode(&self, raw: &Value) -> Option<f64> {
        raw.as_f64()
    }
}

impl Converter for IntegerConverter {
    type Target = i64;

    fn accepts(&self, raw: &Value) -> bool {
        raw.is_number()
    }

    fn decode(&self, raw: &Value) -> Option<i64> {
        // Exact for integral literals; `as` truncates toward zero and saturates.
        raw.as_i64()
            .or_else(|| DOUBLE.decode(raw).map(|d| d.trunc() as i64))
    }
}

impl Converter for BooleanConverter {
    type Target = bool;

    fn accepts(&self, raw: &Value) -> bool {
        raw.is_boolean()
    }

    fn decode(&self, raw: &Value) -> Option<bool> {
        raw.as_bool()
    }
}

impl Converter for ValueListConverter {
    type Target = Vec<JsonValue>;

    fn accepts(&self, raw: &Value) -> bool {
        raw.is_array()
    }

    fn decode(&self, raw: &Value) -> Option<Vec<JsonValue>> {
        raw.as_array().map(|items| wrap_list(items))
    }
}

impl Converter for ValueMapConverter {
    type Target = ValueMap;

    fn accepts(&self, raw: &Value) -> bool {
        raw.is_object()
    }

    fn decode(&self, raw: &Value) -> Option<ValueMap> {
        raw.as_object().map(wrap_map)
    }
}

/// Types whose decoder can be chosen from the type alone.
///
/// This is the probe form of conversion: given a fallback of type `T`, the
/// decoder for `T` is resolved at compile time.
pub trait FromJson: Sized {
    fn from_json(raw: &Value) -> Option<Self>;
}

impl FromJson for String {
    fn from_json(raw: &Value) -> Option<Self> {
        STRING.decode(raw)
    }
}

impl FromJson for f64 {
    fn from_json(raw: &Value) -> Option<Self> {
        DOUBLE.decode(raw)
    }
}

impl FromJson for i64 {
    fn from_json(raw: &Value) -> Option<Self> {
        INTEGER.decode(raw)
    }
}

impl FromJson for i32 {
    fn from_json(raw: &Value) -> Option<Self> {
        INTEGER
            .decode(raw)
            .map(|n| n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
    }
}

impl FromJson for bool {
    fn from_json(raw: &Value) -> Option<Self> {
        BOOLEAN.decode(raw)
    }
}

impl FromJson for Vec<JsonValue> {
    fn from_json(raw: &Value) -> Option<Self> {
        VALUE_LIST.decode(raw)
    }
}

impl FromJson for ValueMap {
    fn from_json(raw: &Value) -> Option<Self> {
        VALUE_MAP.decode(raw)
    }
}

/// Probe-form conversion: decode `raw` as the type of `fallback`.
pub fn convert_probe<T: FromJson>(raw: Option<&Value>, fallback: T) -> T {
    match raw.and_then(T::from_json) {
        Some(value) => value,
        None => {
            debug!(
                target_type = std::any::type_name::<T>(),
                shape = %raw.map_or(Shape::Absent, Shape::of),
                "falling back to default value"
            );
            fallback
        }
    }
}

/// Explicit-form conversion with an explicit fallback
pub fn convert_with_fallback<C: Converter>(
    raw: Option<&Value>,
    fallback: C::Target,
    converter: &C,
) -> C::Target {
    converter.convert(raw, fallback)
}
