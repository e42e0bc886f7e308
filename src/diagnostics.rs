//! Diagnostic reporting
//!
//! All messages go through `tracing`. The library never installs a global
//! subscriber by itself; applications either bring their own or call [`init`].

use tracing::subscriber::NoSubscriber;
use tracing_subscriber::EnvFilter;

/// Run `f` with diagnostic reporting muted on the current thread.
///
/// Reporting resumes when `f` returns, including on unwind.
pub fn suppressed<R>(f: impl FnOnce() -> R) -> R {
    tracing::subscriber::with_default(NoSubscriber::default(), f)
}

/// Install a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"info"` or `"json_overlay=debug"`).
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
