//! # Observability & Tracing
//!
//! The engine logs through the `tracing` crate. Applications call [`setup_tracing`]
//! once at startup to install a compact `tracing-subscriber` formatter.
//!
//! ## What Gets Traced
//!
//! - **Scans**: one `debug` event per scan with present / captured / failed counts,
//!   and a `warn` for each field that failed to decode.
//! - **Injection**: `trace` events for fields a patch resource omitted.
//! - **Lifecycle**: `trace` events for allocation, free and injected allocation failures.
//! - **Lists**: a `debug` event with element type and length after each load.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run      # Command hand-offs and failures only
//! RUST_LOG=debug cargo run     # Payloads and scan summaries
//! RUST_LOG=resource_marshal=trace cargo run   # Every field the engine touches
//! ```

/// Installs the global subscriber, filtered by `RUST_LOG`.
///
/// Panics if a global subscriber is already set; use [`try_setup_tracing`] where that
/// can happen (tests).
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

/// Like [`setup_tracing`], but returns `false` instead of panicking when a subscriber
/// is already installed.
pub fn try_setup_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_test_writer()
        .try_init()
        .is_ok()
}
