//! Engine-wide constants and defaults.

/// Default upper bound on the number of nested constructor frames a single
/// resolution may open.
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 128;

/// Separator used when rendering a dependency path.
pub const PATH_SEPARATOR: &str = " -> ";
