//! Logging initialisation.

use tracing::Level;

/// Initialises the global tracing subscriber at the given level.
///
/// Call once, early in the host binary. Panics if a subscriber is
/// already installed.
pub fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Initialises logging at a sensible default level.
pub fn init_default_logging() {
    init_logging(Level::INFO);
}
