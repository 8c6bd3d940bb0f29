//! Error types for fallible map operations.
//!
//! Most operations report absence through their return value (`Option`,
//! `bool`, or a count); only the checked accessors [`at`] and [`at_mut`]
//! surface a typed error.
//!
//! [`at`]: crate::BpTreeMap::at
//! [`at_mut`]: crate::BpTreeMap::at_mut

use thiserror::Error as ThisError;

/// Convenience alias for results produced by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by checked map accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum Error {
    /// The requested key is not present in the map.
    #[error("key not found")]
    KeyNotFound,
}

// ============================================================================
//  Tests
// ============================================================================
