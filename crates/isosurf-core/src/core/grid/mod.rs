//! Regular cartesian grids holding sampled scalar fields.
//!
//! A grid is described by a [`GridSize`] (inclusive integer bounds plus a uniform step
//! size), tagged with a [`DataType`] describing what the values mean, and stores its
//! values in a [`ScalarGrid`].

mod data_type;
pub(crate) mod interpolation;
mod scalar_grid;
mod size;

pub use data_type::DataType;
pub use scalar_grid::{GridSummary, ScalarGrid};
pub use size::{GridSize, QUALITY_STEP_SIZES};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Degenerate grid bounds: min {min:?} exceeds max {max:?}")]
    DegenerateBounds { min: [i32; 3], max: [i32; 3] },

    #[error("Grid step size must be positive and finite (got {0})")]
    InvalidStepSize(f64),

    #[error("Unknown grid quality level {0} (expected 0-6)")]
    InvalidQuality(u8),

    #[error("Grid of {dimensions:?} points is too large to allocate")]
    TooLarge { dimensions: [u64; 3] },

    #[error("Grid axis {axis} has no points")]
    EmptyAxis { axis: usize },

    #[error("Expected {expected} grid values, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("Cannot combine grids of different sizes: {left} vs {right}")]
    SizeMismatch { left: String, right: String },

    #[error("Cannot combine grids with different origins: {left:?} vs {right:?}")]
    OriginMismatch { left: [f64; 3], right: [f64; 3] },

    #[error("Combining '{left}' with '{right}' does not produce a defined data type")]
    IncompatibleTypes { left: String, right: String },
}

/// Result of a cooperative, cancellable grid computation.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Completed,
    /// The caller's cancellation check returned `true`. The grid is only partially
    /// populated and must be discarded.
    Cancelled,
}

impl Generation {
    pub fn is_completed(self) -> bool {
        self == Generation::Completed
    }
}
