//! Common type aliases used throughout the Keelung workspace.

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A security identifier.
///
/// Identifiers are opaque strings; ordering between them is the lexicographic
/// ordering used for deterministic tie-breaking in rankings.
pub type Symbol = String;
