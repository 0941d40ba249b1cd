//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the process-wide `tracing` subscriber.
//!
//! ## Configuration
//!
//! The filter is read from `RUST_LOG`; when that is unset or unparsable the
//! `default_level` passed in (usually the `[logging] level` config value) is
//! used instead. Output is compact and hides module paths (`with_target(false)`),
//! since every worker span already carries `correlation_id` and `kind`.
//!
//! ## What Gets Traced
//!
//! - **Coordinator Lifecycle**: start, cancellation, and the processed/abandoned tally
//! - **Actions**: one `action` span per dequeued envelope
//! - **Broker**: late or unknown results being discarded
//! - **Clients**: callers giving up at their deadline
//!
//! ## Usage Examples
//!
//! ```bash
//! # Default from config
//! ordaa demo
//!
//! # Show full action payloads
//! RUST_LOG=debug ordaa demo
//!
//! # Only the coordinator crate
//! RUST_LOG=ordaa_actor=debug ordaa serve
//! ```
//!
//! With `RUST_LOG=debug` the worker logs each payload once when it is dequeued:
//!
//! ```text
//! DEBUG action{correlation_id=5f0c.. kind="add_order_item"}: Dequeued action=AddOrderItem { .. }
//! INFO action{correlation_id=5f0c.. kind="add_order_item"}: Action ok
//! ```

use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber. Calling it twice is harmless; the second
/// call is ignored so tests can call it freely.
pub fn setup_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
