//! Structured logging configuration.
//!
//! Installs a `tracing` subscriber that also receives the `log` records
//! emitted by the scheduling library.

use team_battles::remote::{CreatedTournament, SlotFailure};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn,hyper_util=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Log a created battle with structured fields
pub fn log_slot_created(created: &CreatedTournament) {
    tracing::info!(
        sequence = created.sequence_number,
        kind = created.kind.label(),
        url = created.url.as_str(),
        dry_run = created.dry_run,
        "Battle created"
    );
}

/// Log a failed battle with structured fields
pub fn log_slot_failed(failure: &SlotFailure) {
    tracing::error!(
        sequence = failure.sequence_number,
        kind = failure.kind.label(),
        name = failure.display_name.as_str(),
        error = %failure.error,
        "Battle creation failed"
    );
}
