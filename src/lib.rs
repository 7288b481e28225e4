pub mod config;
pub mod models;
pub mod db;
pub mod booking; // Booking engine: validated appointments, analysis injection
pub mod lifecycle; // Appointment state machine
pub mod billing; // Invoice drafts, payment finalization
pub mod stock_alert; // Low-stock notifications
pub mod receipt; // Receipt PDF export

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. Host applications call this once at
/// startup; RUST_LOG overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} engine v{}", config::APP_NAME, config::APP_VERSION);
}
