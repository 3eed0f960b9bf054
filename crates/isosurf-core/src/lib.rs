//! # isosurf Core Library
//!
//! A high-performance library for sampling scalar fields on regular 3D grids and
//! extracting triangulated isosurfaces from them with the Marching Cubes algorithm.
//! Typical inputs are electron densities, molecular orbital amplitudes, electrostatic
//! potentials and promolecule densities evaluated on a cartesian grid.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models: the [`ScalarGrid`](core::grid::ScalarGrid)
//!   with its interpolation and arithmetic, the [`Isosurface`](core::surface::Isosurface)
//!   triangle list, and file I/O for volumetric grids and surface meshes.
//!
//! - **[`engine`]: The Logic Core.** The Marching Cubes extractor and its case tables,
//!   progress reporting with cooperative cancellation, configuration and error types.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that tie `core` and `engine`
//!   together, such as evaluating a field onto a grid or producing the positive and
//!   negative lobes of a signed field in one call.

pub mod core;
pub mod engine;
pub mod workflows;
