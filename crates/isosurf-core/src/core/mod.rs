//! # Core Module
//!
//! This module provides the fundamental data structures for isosurface generation:
//! the scalar grid that stores a sampled field, the triangle list produced from it,
//! and the file formats used to move both in and out of the library.
//!
//! ## Architecture
//!
//! - **Scalar Grids** ([`grid`]) - Grid bounds and step size, semantic data type tags,
//!   dense storage with tri-cubic sampling, gradients, arithmetic and field evaluation
//! - **Surfaces** ([`surface`]) - Interleaved vertex/normal triangle lists
//! - **File I/O** ([`io`]) - Gaussian cube grids and Wavefront OBJ surface export
//!
//! ## Key Capabilities
//!
//! - **Cooperative field evaluation** with per-slice progress and per-row cancellation
//! - **Tri-cubic Catmull-Rom interpolation** with overshoot protection
//! - **Grid arithmetic** such as alpha minus beta density for spin densities
//! - **Upsampling** to half the step size for smoother surfaces

pub mod grid;
pub mod io;
pub mod surface;
