//! Error types for the Keelung engine.
//!
//! The taxonomy distinguishes contract violations that abort a single
//! factor's computation (`MissingInputPanel`, `InvalidPanelIndex`) from
//! conditions that decision rules recover from on their own
//! (`InsufficientCalendarData`, `DegenerateCrossSection`).

use thiserror::Error;

/// The main error type for Keelung operations.
#[derive(Debug, Error)]
pub enum KeelungError {
    /// A required input panel was not supplied by the caller.
    ///
    /// Fatal for the factor that requested the panel; never silently
    /// defaulted.
    #[error("missing input panel: {0}")]
    MissingInputPanel(String),

    /// A panel index could not be interpreted as dates or periods.
    ///
    /// Fatal for every consumer of that panel.
    #[error("panel index not interpretable as date or period: {0}")]
    InvalidPanelIndex(String),

    /// The trading calendar has no date inside an expected month.
    ///
    /// Recoverable: calendar lookups expose this as an absent value and
    /// callers skip the affected period instead of substituting a date.
    #[error("no trading day in {0}")]
    InsufficientCalendarData(String),

    /// A cross-section collapsed (empty, or zero variance) after filtering.
    ///
    /// Recoverable: the affected period yields no qualifying identifiers.
    #[error("degenerate cross-section: {0}")]
    DegenerateCrossSection(String),

    /// Invalid or malformed data at a panel boundary.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Error from Polars operations during panel ingestion.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl From<String> for KeelungError {
    fn from(s: String) -> Self {
        Self::InvalidData(s)
    }
}

impl From<&str> for KeelungError {
    fn from(s: &str) -> Self {
        Self::InvalidData(s.to_string())
    }
}

/// A specialized Result type for Keelung operations.
pub type Result<T> = std::result::Result<T, KeelungError>;
