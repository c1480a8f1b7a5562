//! Logging facilities for Lattice Shell.
//!
//! Lattice Shell uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("lattice_shell::cascade=debug")
//!     .init();
//! ```
//!
//! The constants below name the targets and spans emitted by each subsystem,
//! so filters can be written without hard-coding strings.

/// Span names used throughout Lattice Shell for tracing.
pub mod span_names {
    /// Signal emission span.
    pub const SIGNAL: &str = "lattice_shell::signal";
    /// Backing-sequence mutation span.
    pub const MUTATION: &str = "lattice_shell::mutation";
    /// Batched delivery (pause/resume) span.
    pub const BATCH: &str = "lattice_shell::batch";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "lattice_shell_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "lattice_shell_core::signal";
    /// Element identity and parent links.
    pub const ELEMENT: &str = "lattice_shell::element";
    /// Collection mutation and visibility target.
    pub const COLLECTION: &str = "lattice_shell::collection";
    /// Cascading group visibility and parent fixups.
    pub const CASCADE: &str = "lattice_shell::cascade";

    /// Every target, in hierarchy order.
    pub const ALL: &[&str] = &[CORE, SIGNAL, ELEMENT, COLLECTION, CASCADE];
}

/// Build an `EnvFilter`-style directive string enabling `level` for every
/// Lattice Shell target.
///
/// ```
/// use lattice_shell_core::logging::directive_for_all;
///
/// let directive = directive_for_all("debug");
/// assert!(directive.contains("lattice_shell::cascade=debug"));
/// ```
pub fn directive_for_all(level: &str) -> String {
    targets::ALL
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
