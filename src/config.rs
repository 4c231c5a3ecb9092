//! Tuning constants shared across modules.

/// Delay (seconds) between the second click on an already-active row and the
/// rename field opening. Filters accidental double-activation out of
/// deliberate rename clicks; the host arms its rename editor with this.
pub const RENAME_CLICK_DELAY: f32 = 0.3;

/// Base name for nodes created via "Create Empty". The actual name gets a
/// unique numeric suffix per template (see `Template::unique_child_name`).
pub const DEFAULT_NODE_NAME: &str = "Node";

/// Maximum events held in the deferred queue before oldest are evicted.
pub const EVENT_QUEUE_MAX: usize = 1000;
