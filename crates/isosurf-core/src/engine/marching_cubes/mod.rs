//! Marching Cubes isosurface extraction over a [`ScalarGrid`].
//!
//! The extractor walks every cube of the grid interior, classifies its eight corners
//! against the isovalue, places a vertex on each crossed edge by linear interpolation
//! and emits the triangles listed for that classification. Vertex normals come from
//! the interpolated field gradient and point away from higher values; for negative
//! isovalues they are flipped so both lobes of a signed field face outwards.
//!
//! Cubes are visited with the x index outermost. Two grid points are kept clear of the
//! lower bound and three of the upper bound on every axis so that the central
//! differences behind the normals never leave the grid, which means grids with fewer
//! than six points along an axis produce no surface.

pub mod tables;

use crate::core::grid::ScalarGrid;
use crate::core::surface::{Isosurface, SurfaceVertex};
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::{Point3, Vector3};
use std::ops::RangeInclusive;
use tables::{
    CUBE_EDGE_FLAGS, EDGE_CONNECTION, EDGE_DIRECTION, TRIANGLE_CONNECTION_TABLE, VERTEX_INDEX_OFFSET,
    VERTEX_OFFSET,
};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const LOWER_MARGIN: i32 = 2;
const UPPER_MARGIN: i32 = 3;

pub struct MarchingCubes<'g> {
    grid: &'g ScalarGrid,
}

impl<'g> MarchingCubes<'g> {
    pub fn new(grid: &'g ScalarGrid) -> Self {
        Self { grid }
    }

    /// Number of x-slices visited by an extraction, i.e. the task steps it reports.
    pub fn slice_count(&self) -> usize {
        self.interior().map_or(0, |[xs, _, _]| xs.count())
    }

    pub fn generate_surface(&self, isovalue: f64) -> Isosurface {
        self.generate_surface_with_progress(isovalue, &ProgressReporter::new())
    }

    /// Extracts the surface, reporting one task step per completed x-slice.
    ///
    /// With the `parallel` feature slices are processed concurrently into private
    /// buffers that are joined in ascending x order, so the triangle sequence is the
    /// same as for a serial run.
    pub fn generate_surface_with_progress(
        &self,
        isovalue: f64,
        reporter: &ProgressReporter,
    ) -> Isosurface {
        let Some([xs, ys, zs]) = self.interior() else {
            debug!(size = %self.grid.size(), "Grid interior is empty; no surface generated.");
            return Isosurface::new();
        };

        reporter.report(Progress::TaskStart {
            total_steps: self.slice_count() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = xs.into_iter();

        #[cfg(feature = "parallel")]
        let iterator = xs.into_par_iter();

        let slices: Vec<Vec<SurfaceVertex>> = iterator
            .map(|ix| {
                let slice = self.march_slice(ix, &ys, &zs, isovalue);
                reporter.report(Progress::TaskIncrement);
                slice
            })
            .collect();

        reporter.report(Progress::TaskFinish);

        let surface = Isosurface::from_vertices(slices.concat());
        debug!(
            isovalue,
            triangles = surface.triangle_count(),
            "Surface extraction finished."
        );
        surface
    }

    /// Index ranges of the cube origins visited along each axis, or `None` if any of
    /// them is empty.
    fn interior(&self) -> Option<[RangeInclusive<i32>; 3]> {
        let min = self.grid.size().min();
        let max = self.grid.size().max();
        let ranges = [0, 1, 2].map(|axis| (min[axis] + LOWER_MARGIN)..=(max[axis] - UPPER_MARGIN));
        ranges.iter().all(|r| !r.is_empty()).then_some(ranges)
    }

    fn march_slice(
        &self,
        ix: i32,
        ys: &RangeInclusive<i32>,
        zs: &RangeInclusive<i32>,
        isovalue: f64,
    ) -> Vec<SurfaceVertex> {
        let mut vertices = Vec::new();
        for iy in ys.clone() {
            for iz in zs.clone() {
                self.march_cube([ix, iy, iz], isovalue, &mut vertices);
            }
        }
        vertices
    }

    fn march_cube(&self, cube: [i32; 3], isovalue: f64, out: &mut Vec<SurfaceVertex>) {
        let h = self.grid.step_size();
        let [ix, iy, iz] = cube;

        let corner_values = VERTEX_INDEX_OFFSET
            .map(|[dx, dy, dz]| self.grid.value(ix + dx, iy + dy, iz + dz));

        let flag_index = corner_values
            .iter()
            .enumerate()
            .filter(|&(_, &value)| value <= isovalue)
            .fold(0usize, |index, (corner, _)| index | (1 << corner));

        let edge_flags = CUBE_EDGE_FLAGS[flag_index];
        if edge_flags == 0 {
            return;
        }

        let cube_origin = Vector3::new(ix as f64 * h, iy as f64 * h, iz as f64 * h);
        let mut edge_vertices = [SurfaceVertex::new(Vector3::zeros(), Point3::origin()); 12];

        for (edge, &[c0, c1]) in EDGE_CONNECTION.iter().enumerate() {
            if edge_flags & (1 << edge) == 0 {
                continue;
            }
            let t = edge_offset(corner_values[c0], corner_values[c1], isovalue);
            let local = cube_origin
                + (Vector3::from(VERTEX_OFFSET[c0]) + Vector3::from(EDGE_DIRECTION[edge]) * t) * h;

            let mut normal = self.surface_normal(&local);
            if isovalue < 0.0 {
                normal = -normal;
            }
            edge_vertices[edge] = SurfaceVertex::new(normal, Point3::from(local + self.grid.origin()));
        }

        for triangle in TRIANGLE_CONNECTION_TABLE[flag_index]
            .chunks(3)
            .take_while(|triangle| triangle[0] >= 0)
        {
            out.extend(triangle.iter().map(|&edge| edge_vertices[edge as usize]));
        }
    }

    /// Unit vector against the field gradient at a point given relative to the grid
    /// origin. A vanishing gradient yields the zero vector.
    fn surface_normal(&self, local: &Vector3<f64>) -> Vector3<f64> {
        let normal = -self.grid.local_gradient(local);
        let length = normal.norm();
        if length == 0.0 { normal } else { normal / length }
    }
}

/// Fraction along an edge from the first corner at which the field reaches the
/// isovalue. Flat edges are split in the middle.
#[inline]
fn edge_offset(v0: f64, v1: f64, isovalue: f64) -> f64 {
    let delta = v1 - v0;
    if delta == 0.0 {
        return 0.5;
    }
    (isovalue - v0) / delta
}
