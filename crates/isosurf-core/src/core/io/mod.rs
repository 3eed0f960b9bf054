//! Provides input/output functionality for volumetric grids and surface meshes.
//!
//! Grids are persisted as Gaussian cube files through the [`VolumetricFile`](traits::VolumetricFile)
//! trait, and extracted surfaces can be exported as Wavefront OBJ meshes.

pub mod cube;
pub mod obj;
pub mod traits;
