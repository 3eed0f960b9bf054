//! # Workflows Module
//!
//! High-level procedures that tie the grid model and the extraction engine together.
//! Workflows report their phases through a [`ProgressReporter`](crate::engine::progress::ProgressReporter)
//! and treat cancellation as a regular outcome rather than an error.
//!
//! - **Grid Workflow** ([`grid`]) - Evaluating a field onto a grid and upsampling grids
//! - **Surface Workflow** ([`surface`]) - Extracting one or both lobes of a field,
//!   optionally from an upsampled grid

pub mod grid;
pub mod surface;
