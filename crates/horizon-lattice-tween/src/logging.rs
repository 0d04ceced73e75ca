//! Logging facilities for the tween engine.
//!
//! The crate is instrumented with the `tracing` crate. Nothing is printed
//! unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_lattice_tween=debug")
//!     .init();
//! ```
//!
//! Engine commands and session rebuilds log at `debug`, per-frame driver work
//! at `trace`, and misuse of a discarded engine at `warn`.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Crate-wide target.
    pub const TWEEN: &str = "horizon_lattice_tween";
    /// Engine commands and completion.
    pub const ENGINE: &str = "horizon_lattice_tween::engine";
    /// Frame driver stepping.
    pub const DRIVER: &str = "horizon_lattice_tween::driver";
    /// Session rebuilds and resets.
    pub const SESSION: &str = "horizon_lattice_tween::session";
    /// Signal emission.
    pub const SIGNAL: &str = "horizon_lattice_tween::signal";
}

