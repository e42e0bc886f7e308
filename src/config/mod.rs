//! Configuration overlay
//!
//! A mutable "current" configuration layered over immutable defaults:
//! 1. Defaults (a shipped JSON file or in-memory values)
//! 2. The backing JSON file, generated from the defaults on first run
//!
//! Lookups fall back from layer 2 to layer 1; writes only touch layer 2 and
//! reach disk on an explicit save.

mod error;
mod overlay;
mod source;

pub use error::{ConfigError, LoadOutcome, ReadError};
pub use overlay::ConfigOverlay;
pub use source::{ConfigOrigin, ConfigSource, DefaultSource};
