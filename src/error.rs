//! Errors surfaced when preparing for processing.
//!
//! Steady state processing never fails: degenerate configurations
//! simply produce no detections.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrepareError {
    /// A buffer could not be allocated. The detector is left in a
    /// non-detecting state.
    #[error("failed to allocate {what} of {len} samples")]
    Allocation { what: &'static str, len: usize },
}

pub type Result<T> = std::result::Result<T, PrepareError>;
