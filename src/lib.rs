//! JSON Overlay - typed JSON configuration files over shipped defaults
//!
//! This crate keeps one JSON configuration file per application component,
//! generates it from defaults on first run, survives missing or corrupt
//! files by falling back to those defaults, and decodes values into Rust
//! types with a guaranteed fallback.

pub mod config;
pub mod diagnostics;
pub mod value;

pub use config::{ConfigError, ConfigOverlay, DefaultSource, LoadOutcome};
pub use value::{Converter, ConverterRegistry, FromJson, JsonValue, Shape};
