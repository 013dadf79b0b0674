#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keelung/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Foundational types for the Keelung factor signal engine.
//!
//! This crate provides the building blocks shared by every other Keelung
//! crate: the error taxonomy, month/quarter period arithmetic, and the
//! cross-sectional statistics used by decision rules.

/// The version of the keelung-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod period;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{KeelungError, Result};
pub use period::{Month, Quarter};
pub use types::{Date, Symbol};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
