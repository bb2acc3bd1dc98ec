//! Opt-in tracing subscriber for standalone use.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a formatting subscriber filtered by `RUST_LOG`, defaulting to
/// info-level output for this crate. Build systems embedding the bridge
/// usually install their own subscriber instead.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sassbridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
