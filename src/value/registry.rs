//! Named converter registry
//!
//! An explicit, caller-owned table of converters. Lookups are deterministic:
//! entries keep registration order, re-registering a name replaces the entry
//! in place, and probing returns the first converter whose target type
//! matches the fallback.

use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use tracing::debug;

use super::convert::{
    Converter, BOOLEAN, DOUBLE, INTEGER, STRING, VALUE_LIST, VALUE_MAP,
};
use super::Shape;

/// Object-safe view of a [`Converter`] with its target type erased
trait ErasedConverter: Send + Sync {
    fn target_type(&self) -> TypeId;
    fn target_name(&self) -> &'static str;
    fn accepts(&self, raw: &Value) -> bool;
    fn decode_any(&self, raw: &Value) -> Option<Box<dyn Any>>;
    fn as_any(&self) -> &dyn Any;
}

impl<C> ErasedConverter for C
where
    C: Converter + Send + Sync + 'static,
    C::Target: 'static,
{
    fn target_type(&self) -> TypeId {
        TypeId::of::<C::Target>()
    }

    fn target_name(&self) -> &'static str {
        std::any::type_name::<C::Target>()
    }

    fn accepts(&self, raw: &Value) -> bool {
        Converter::accepts(self, raw)
    }

    fn decode_any(&self, raw: &Value) -> Option<Box<dyn Any>> {
        self.try_convert(Some(raw))
            .map(|value| Box::new(value) as Box<dyn Any>)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Entry {
    name: String,
    converter: Box<dyn ErasedConverter>,
}

/// Name → converter table
#[derive(Default)]
pub struct ConverterRegistry {
    entries: Vec<Entry>,
}

impl ConverterRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in converters under their canonical names
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("STRING", STRING);
        registry.register("DOUBLE", DOUBLE);
        registry.register("INTEGER", INTEGER);
        registry.register("BOOLEAN", BOOLEAN);
        registry.register("VALUE_LIST", VALUE_LIST);
        registry.register("VALUE_MAP", VALUE_MAP);
        registry
    }

    /// Store `converter` under `name` and hand it back.
    ///
    /// The last registration for a name wins; it keeps the position of the
    /// entry it replaces.
    pub fn register<C>(&mut self, name: impl Into<String>, converter: C) -> C
    where
        C: Converter + Clone + Send + Sync + 'static,
        C::Target: 'static,
    {
        let name = name.into();
        let boxed: Box<dyn ErasedConverter> = Box::new(converter.clone());

        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                debug!(name = %name, "replacing registered converter");
                entry.converter = boxed;
            }
            None => self.entries.push(Entry {
                name,
                converter: boxed,
            }),
        }
        converter
    }

    /// The converter registered under `name`, if it has type `C`
    pub fn get<C: 'static>(&self, name: &str) -> Option<&C> {
        self.entry(name)
            .and_then(|entry| entry.converter.as_any().downcast_ref::<C>())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the converters that accept the shape of `raw`
    pub fn accepting(&self, raw: &Value) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.converter.accepts(raw))
            .map(|entry| entry.name.as_str())
            .collect()
    }

    /// Decode `raw` with the converter registered under `name`.
    ///
    /// Falls back when the name is unknown, the converter targets a different
    /// type, or the value does not decode.
    pub fn convert_named<T: 'static>(&self, name: &str, raw: Option<&Value>, fallback: T) -> T {
        match self.entry(name) {
            Some(entry) if entry.converter.target_type() == TypeId::of::<T>() => {
                Self::apply(entry, raw, fallback)
            }
            Some(entry) => {
                debug!(
                    name,
                    registered = entry.converter.target_name(),
                    requested = std::any::type_name::<T>(),
                    "converter targets a different type"
                );
                fallback
            }
            None => {
                debug!(name, "no converter registered under this name");
                fallback
            }
        }
    }

    /// Probe-form conversion: find the first converter producing the
    /// fallback's type and decode `raw` with it.
    pub fn convert_probe<T: 'static>(&self, raw: Option<&Value>, fallback: T) -> T {
        let wanted = TypeId::of::<T>();
        match self
            .entries
            .iter()
            .find(|entry| entry.converter.target_type() == wanted)
        {
            Some(entry) => Self::apply(entry, raw, fallback),
            None => {
                debug!(
                    target_type = std::any::type_name::<T>(),
                    shape = %raw.map_or(Shape::Absent, Shape::of),
                    "no converter registered for this type"
                );
                fallback
            }
        }
    }

    fn apply<T: 'static>(entry: &Entry, raw: Option<&Value>, fallback: T) -> T {
        raw.and_then(|raw| entry.converter.decode_any(raw))
            .and_then(|decoded| decoded.downcast::<T>().ok())
            .map_or(fallback, |boxed| *boxed)
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|entry| (entry.name.as_str(), entry.converter.target_name())),
            )
            .finish()
    }
}
