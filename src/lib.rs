//! Root crate has no orchestration code of its own — `summarizer-shared`,
//! `summarizer-orchestrator`, and `summarizer-worker` are independent,
//! composable workspace members. This crate exists only to host
//! end-to-end tests (`tests/`) that exercise those three crates wired
//! together, plus the small tracing setup shared by them.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber reading `RUST_LOG` (default `info`),
/// idempotent so every test in a suite can call it without panicking on
/// a second `set_global_default`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
