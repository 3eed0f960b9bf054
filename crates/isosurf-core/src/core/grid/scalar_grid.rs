use super::interpolation::tricubic;
use super::{DataType, Generation, GridError, GridSize};
use itertools::{Itertools, MinMaxResult};
use nalgebra::{Point3, Vector3};
use ndarray::{Array3, Zip};
use serde::Serialize;
use std::ops::Mul;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Largest origin offset, as a fraction of the step, at which two grids still share points.
const ORIGIN_TOLERANCE: f64 = 1e-3;

/// A scalar field sampled on a regular cartesian grid.
///
/// Values are addressed in grid-index space: index `i` along an axis runs over the
/// inclusive bounds of the grid's [`GridSize`] and sits at the world coordinate
/// `origin + i * step_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    data_type: DataType,
    size: GridSize,
    origin: Vector3<f64>,
    values: Array3<f64>,
}

/// Serialisable overview of a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GridSummary {
    pub data_type: String,
    pub min: [i32; 3],
    pub max: [i32; 3],
    pub dimensions: [usize; 3],
    pub step_size: f64,
    pub origin: [f64; 3],
    pub point_count: usize,
    pub minimum_value: f64,
    pub maximum_value: f64,
    pub data_size_kb: f64,
}

impl ScalarGrid {
    /// Creates a zero-filled grid.
    pub fn new(data_type: DataType, size: GridSize) -> Self {
        debug!(%size, points = size.point_count(), "Allocating grid.");
        Self {
            data_type,
            size,
            origin: Vector3::zeros(),
            values: Array3::zeros(size.dimensions()),
        }
    }

    /// Wraps externally computed values laid out with z varying fastest, then y, then x.
    pub fn from_values(
        data_type: DataType,
        size: GridSize,
        origin: Vector3<f64>,
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        let expected = size.point_count();
        if values.len() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                found: values.len(),
            });
        }
        let values = Array3::from_shape_vec(size.dimensions(), values).map_err(|_| {
            GridError::ShapeMismatch {
                expected,
                found: expected,
            }
        })?;
        Ok(Self {
            data_type,
            size,
            origin,
            values,
        })
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    #[inline]
    pub fn size(&self) -> &GridSize {
        &self.size
    }

    #[inline]
    pub fn step_size(&self) -> f64 {
        self.size.step_size()
    }

    /// World position of grid index `(0, 0, 0)`.
    #[inline]
    pub fn origin(&self) -> &Vector3<f64> {
        &self.origin
    }

    #[inline]
    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    pub fn world_position(&self, ix: i32, iy: i32, iz: i32) -> Point3<f64> {
        let h = self.step_size();
        Point3::new(ix as f64 * h, iy as f64 * h, iz as f64 * h) + self.origin
    }

    #[inline]
    fn offset(&self, ix: i32, iy: i32, iz: i32) -> [usize; 3] {
        let min = self.size.min();
        [
            (ix - min[0]) as usize,
            (iy - min[1]) as usize,
            (iz - min[2]) as usize,
        ]
    }

    /// # Panics
    ///
    /// Panics if the index lies outside the grid bounds.
    #[inline]
    pub fn value(&self, ix: i32, iy: i32, iz: i32) -> f64 {
        self.values[self.offset(ix, iy, iz)]
    }

    /// # Panics
    ///
    /// Panics if the index lies outside the grid bounds.
    #[inline]
    pub fn value_mut(&mut self, ix: i32, iy: i32, iz: i32) -> &mut f64 {
        let offset = self.offset(ix, iy, iz);
        &mut self.values[offset]
    }

    /// # Panics
    ///
    /// Panics if the index lies outside the grid bounds.
    #[inline]
    pub fn set_value(&mut self, ix: i32, iy: i32, iz: i32, value: f64) {
        *self.value_mut(ix, iy, iz) = value;
    }

    #[inline]
    fn clamped_value(&self, ix: i32, iy: i32, iz: i32) -> f64 {
        let min = self.size.min();
        let max = self.size.max();
        self.value(
            ix.clamp(min[0], max[0]),
            iy.clamp(min[1], max[1]),
            iz.clamp(min[2], max[2]),
        )
    }

    /// Splits a position relative to the origin into the base index of the enclosing
    /// cell and the fractional offset inside it. Positions outside the box are clamped
    /// onto its surface.
    fn locate(&self, local: &Vector3<f64>) -> ([i32; 3], [f64; 3]) {
        let h = self.step_size();
        let min = self.size.min();
        let max = self.size.max();
        let mut base = [0; 3];
        let mut frac = [0.0; 3];
        for axis in 0..3 {
            let g = (local[axis] / h).clamp(min[axis] as f64, max[axis] as f64);
            base[axis] = (g.floor() as i32).min(max[axis] - 1).max(min[axis]);
            frac[axis] = g - base[axis] as f64;
        }
        (base, frac)
    }

    /// The 4x4x4 neighbourhood starting one point below `base`, clamped to the bounds.
    fn stencil(&self, base: [i32; 3]) -> [[[f64; 4]; 4]; 4] {
        let mut stencil = [[[0.0; 4]; 4]; 4];
        for (di, plane) in stencil.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, value) in row.iter_mut().enumerate() {
                    *value = self.clamped_value(
                        base[0] + di as i32 - 1,
                        base[1] + dj as i32 - 1,
                        base[2] + dk as i32 - 1,
                    );
                }
            }
        }
        stencil
    }

    /// Tri-cubic interpolation of the field at a world position.
    ///
    /// Stencil points beyond the bounds repeat the nearest edge value and positions
    /// outside the grid box are projected onto it.
    pub fn sample(&self, position: &Point3<f64>) -> f64 {
        let (base, [fx, fy, fz]) = self.locate(&(position.coords - self.origin));
        tricubic(&self.stencil(base), fx, fy, fz)
    }

    /// Tri-linear interpolation of the eight points around a world position, or `0.0`
    /// if that cell is not entirely inside the grid.
    pub fn sample_linear(&self, position: &Point3<f64>) -> f64 {
        let g = (position.coords - self.origin) / self.step_size();
        let min = self.size.min();
        let max = self.size.max();

        let base = [0, 1, 2].map(|axis| g[axis].floor() as i32);
        if (0..3).any(|axis| base[axis] < min[axis] || base[axis] + 1 > max[axis]) {
            return 0.0;
        }

        let p0 = [0, 1, 2].map(|axis| g[axis] - base[axis] as f64);
        trilinear(base, p0, |ix, iy, iz| self.value(ix, iy, iz))
    }

    /// Gradient of the field at a world position.
    ///
    /// Central differences are taken at the eight corners of the enclosing cell and
    /// interpolated tri-linearly. Differences reaching past the bounds reuse the edge
    /// value. The result is not normalised.
    pub fn gradient(&self, position: &Point3<f64>) -> Vector3<f64> {
        self.local_gradient(&(position.coords - self.origin))
    }

    /// Same as [`gradient`](Self::gradient) for a position relative to the grid origin.
    pub(crate) fn local_gradient(&self, local: &Vector3<f64>) -> Vector3<f64> {
        let (base, frac) = self.locate(local);
        let scale = 1.0 / (2.0 * self.step_size());
        let central = |i: i32, j: i32, k: i32| {
            Vector3::new(
                self.clamped_value(i + 1, j, k) - self.clamped_value(i - 1, j, k),
                self.clamped_value(i, j + 1, k) - self.clamped_value(i, j - 1, k),
                self.clamped_value(i, j, k + 1) - self.clamped_value(i, j, k - 1),
            ) * scale
        };
        trilinear(base, frac, central)
    }

    /// Returns `scale_self * self + scale_other * other`, keeping this grid's data type.
    ///
    /// Both grids must cover the same points: equal sizes and origins that agree to a
    /// small fraction of the step.
    pub fn combine(
        &self,
        other: &ScalarGrid,
        scale_self: f64,
        scale_other: f64,
    ) -> Result<ScalarGrid, GridError> {
        if self.size != other.size {
            return Err(GridError::SizeMismatch {
                left: self.size.to_string(),
                right: other.size.to_string(),
            });
        }
        let tolerance = ORIGIN_TOLERANCE * self.step_size();
        if (self.origin - other.origin).amax() > tolerance {
            return Err(GridError::OriginMismatch {
                left: [self.origin.x, self.origin.y, self.origin.z],
                right: [other.origin.x, other.origin.y, other.origin.z],
            });
        }

        let mut values = self.values.clone();
        Zip::from(&mut values)
            .and(&other.values)
            .for_each(|a, &b| *a = scale_self * *a + scale_other * b);

        Ok(ScalarGrid {
            data_type: self.data_type,
            size: self.size,
            origin: self.origin,
            values,
        })
    }

    pub fn try_add(&self, other: &ScalarGrid) -> Result<ScalarGrid, GridError> {
        self.combine_typed(other, self.data_type + other.data_type, 1.0)
    }

    pub fn try_sub(&self, other: &ScalarGrid) -> Result<ScalarGrid, GridError> {
        self.combine_typed(other, self.data_type - other.data_type, -1.0)
    }

    fn combine_typed(
        &self,
        other: &ScalarGrid,
        data_type: DataType,
        scale_other: f64,
    ) -> Result<ScalarGrid, GridError> {
        if !data_type.is_defined() {
            return Err(GridError::IncompatibleTypes {
                left: self.data_type.to_string(),
                right: other.data_type.to_string(),
            });
        }
        let mut result = self.combine(other, 1.0, scale_other)?;
        result.data_type = data_type;
        Ok(result)
    }

    pub fn scaled(&self, factor: f64) -> ScalarGrid {
        let mut result = self.clone();
        result.values.mapv_inplace(|v| v * factor);
        result
    }

    /// Fills the grid by evaluating `field` at the world coordinates of every point.
    ///
    /// The x index is the outermost loop and z the innermost. `progress` receives the
    /// completed fraction after each x-slice and `should_cancel` is polled before every
    /// y-row; once it returns `true` the remaining points are left untouched.
    pub fn generate<F, P, C>(
        &mut self,
        mut field: F,
        mut progress: P,
        mut should_cancel: C,
    ) -> Generation
    where
        F: FnMut(f64, f64, f64) -> f64,
        P: FnMut(f64),
        C: FnMut() -> bool,
    {
        let start = Instant::now();
        let h = self.step_size();
        let min = self.size.min();
        let [nx, ny, nz] = self.size.dimensions();
        info!(
            size = %self.size,
            points = self.size.point_count(),
            "Evaluating field on grid."
        );

        for x in 0..nx {
            let px = self.origin.x + (min[0] + x as i32) as f64 * h;
            for y in 0..ny {
                if should_cancel() {
                    info!(slice = x, "Grid evaluation cancelled.");
                    return Generation::Cancelled;
                }
                let py = self.origin.y + (min[1] + y as i32) as f64 * h;
                for z in 0..nz {
                    let pz = self.origin.z + (min[2] + z as i32) as f64 * h;
                    self.values[[x, y, z]] = field(px, py, pz);
                }
            }
            progress((x + 1) as f64 / nx as f64);
        }

        info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Grid evaluation finished."
        );
        Generation::Completed
    }

    /// Minimum and maximum over all grid values.
    pub fn range(&self) -> (f64, f64) {
        match self.values.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::MinMax(min, max) => (min, max),
            MinMaxResult::OneElement(value) => (value, value),
            MinMaxResult::NoElements => (0.0, 0.0),
        }
    }

    /// Builds a grid with half the step size covering the same box.
    ///
    /// Points shared with this grid are copied; the points in between are tri-cubic
    /// interpolations of the surrounding 4x4x4 neighbourhood. Progress and cancellation
    /// behave as in [`generate`](Self::generate). Returns `None` when cancelled.
    pub fn upsample<P, C>(&self, mut progress: P, mut should_cancel: C) -> Option<ScalarGrid>
    where
        P: FnMut(f64),
        C: FnMut() -> bool,
    {
        let start = Instant::now();
        let min = self.size.min();
        let max = self.size.max();
        let fine_size = GridSize::new(
            min.map(|m| 2 * m),
            max.map(|m| 2 * m),
            0.5 * self.step_size(),
        )
        .ok()?;
        debug!(from = %self.size, to = %fine_size, "Upsampling grid.");

        let mut fine = ScalarGrid {
            data_type: self.data_type,
            size: fine_size,
            origin: self.origin,
            values: Array3::zeros(fine_size.dimensions()),
        };

        let nx = self.size.dimensions()[0];
        for i in min[0]..=max[0] {
            for j in min[1]..=max[1] {
                if should_cancel() {
                    info!("Upsampling cancelled.");
                    return None;
                }
                for k in min[2]..=max[2] {
                    let stencil = self.stencil([i, j, k]);
                    for (di, dj, dk) in itertools::iproduct!(0..2, 0..2, 0..2) {
                        let (fi, fj, fk) = (2 * i + di, 2 * j + dj, 2 * k + dk);
                        if fi > 2 * max[0] || fj > 2 * max[1] || fk > 2 * max[2] {
                            continue;
                        }
                        let value = if (di, dj, dk) == (0, 0, 0) {
                            self.value(i, j, k)
                        } else {
                            tricubic(
                                &stencil,
                                0.5 * di as f64,
                                0.5 * dj as f64,
                                0.5 * dk as f64,
                            )
                        };
                        fine.set_value(fi, fj, fk, value);
                    }
                }
            }
            progress((i - min[0] + 1) as f64 / nx as f64);
        }

        trace!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Upsampling finished."
        );
        Some(fine)
    }

    pub fn summary(&self) -> GridSummary {
        let (minimum_value, maximum_value) = self.range();
        GridSummary {
            data_type: self.data_type.to_string(),
            min: self.size.min(),
            max: self.size.max(),
            dimensions: self.size.dimensions(),
            step_size: self.step_size(),
            origin: [self.origin.x, self.origin.y, self.origin.z],
            point_count: self.size.point_count(),
            minimum_value,
            maximum_value,
            data_size_kb: self.size.data_size_kb(),
        }
    }
}

impl Mul<f64> for ScalarGrid {
    type Output = ScalarGrid;

    fn mul(mut self, factor: f64) -> ScalarGrid {
        self.values.mapv_inplace(|v| v * factor);
        self
    }
}

/// Tri-linear blend of the values at the eight corners of the cell at `base`, where
/// `p0` is the fractional offset inside the cell.
fn trilinear<T, F>(base: [i32; 3], p0: [f64; 3], corner: F) -> T
where
    T: Mul<f64, Output = T> + std::ops::Add<Output = T>,
    F: Fn(i32, i32, i32) -> T,
{
    let [x0, y0, z0] = base;
    let p1 = [1.0 - p0[0], 1.0 - p0[1], 1.0 - p0[2]];
    corner(x0, y0, z0) * (p1[0] * p1[1] * p1[2])
        + corner(x0, y0, z0 + 1) * (p1[0] * p1[1] * p0[2])
        + corner(x0, y0 + 1, z0) * (p1[0] * p0[1] * p1[2])
        + corner(x0, y0 + 1, z0 + 1) * (p1[0] * p0[1] * p0[2])
        + corner(x0 + 1, y0, z0) * (p0[0] * p1[1] * p1[2])
        + corner(x0 + 1, y0, z0 + 1) * (p0[0] * p1[1] * p0[2])
        + corner(x0 + 1, y0 + 1, z0) * (p0[0] * p0[1] * p1[2])
        + corner(x0 + 1, y0 + 1, z0 + 1) * (p0[0] * p0[1] * p0[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-10;

    fn cube_size(lo: i32, hi: i32, step: f64) -> GridSize {
        GridSize::new([lo; 3], [hi; 3], step).unwrap()
    }

    fn filled(size: GridSize, data_type: DataType, f: impl Fn(f64, f64, f64) -> f64) -> ScalarGrid {
        let mut grid = ScalarGrid::new(data_type, size);
        let outcome = grid.generate(f, |_| {}, || false);
        assert!(outcome.is_completed());
        grid
    }

    fn linear(x: f64, y: f64, z: f64) -> f64 {
        2.0 * x - y + 3.0 * z + 1.0
    }

    #[test]
    fn new_grid_is_zero_filled_with_matching_shape() {
        let grid = ScalarGrid::new(DataType::TotalDensity, GridSize::new([-2, 0, 1], [2, 3, 1], 0.5).unwrap());
        assert_eq!(grid.values().shape(), &[5, 4, 1]);
        assert_eq!(grid.range(), (0.0, 0.0));
    }

    #[test]
    fn values_are_addressed_in_grid_index_space() {
        let mut grid = ScalarGrid::new(DataType::CubeData, cube_size(-3, 3, 1.0));
        grid.set_value(-3, 0, 3, 4.5);
        *grid.value_mut(3, -3, -3) += 1.25;
        assert_eq!(grid.value(-3, 0, 3), 4.5);
        assert_eq!(grid.value(3, -3, -3), 1.25);
        assert_eq!(grid.values()[[0, 3, 6]], 4.5);
    }

    #[test]
    #[should_panic]
    fn out_of_bounds_access_panics() {
        let grid = ScalarGrid::new(DataType::CubeData, cube_size(0, 2, 1.0));
        let _ = grid.value(0, 3, 0);
    }

    #[test]
    #[should_panic]
    fn index_below_minimum_panics() {
        let grid = ScalarGrid::new(DataType::CubeData, cube_size(0, 2, 1.0));
        let _ = grid.value(-1, 0, 0);
    }

    #[test]
    fn from_values_rejects_wrong_length() {
        let size = cube_size(0, 1, 1.0);
        let result = ScalarGrid::from_values(DataType::CubeData, size, Vector3::zeros(), vec![0.0; 7]);
        assert_eq!(
            result,
            Err(GridError::ShapeMismatch {
                expected: 8,
                found: 7
            })
        );
    }

    #[test]
    fn from_values_uses_z_fastest_layout() {
        let size = GridSize::new([0, 0, 0], [1, 1, 2], 1.0).unwrap();
        let values: Vec<f64> = (0..12).map(f64::from).collect();
        let grid = ScalarGrid::from_values(DataType::CubeData, size, Vector3::zeros(), values).unwrap();
        assert_eq!(grid.value(0, 0, 2), 2.0);
        assert_eq!(grid.value(0, 1, 0), 3.0);
        assert_eq!(grid.value(1, 0, 0), 6.0);
    }

    #[test]
    fn generate_visits_points_with_x_outermost() {
        let mut grid = ScalarGrid::new(DataType::Undefined, cube_size(0, 1, 0.5));
        let mut visited = Vec::new();
        let outcome = grid.generate(
            |x, y, z| {
                visited.push((x, y, z));
                0.0
            },
            |_| {},
            || false,
        );
        assert_eq!(outcome, Generation::Completed);
        assert_eq!(
            visited,
            vec![
                (0.0, 0.0, 0.0),
                (0.0, 0.0, 0.5),
                (0.0, 0.5, 0.0),
                (0.0, 0.5, 0.5),
                (0.5, 0.0, 0.0),
                (0.5, 0.0, 0.5),
                (0.5, 0.5, 0.0),
                (0.5, 0.5, 0.5),
            ]
        );
    }

    #[test]
    fn generate_passes_world_coordinates() {
        let grid = filled(GridSize::new([-2, 1, 0], [2, 3, 2], 0.25).unwrap(), DataType::Promolecule, |x, y, z| {
            x + 10.0 * y + 100.0 * z
        });
        assert!((grid.value(-2, 3, 2) - (-0.5 + 7.5 + 50.0)).abs() < EPS);
    }

    #[test]
    fn generate_reports_progress_once_per_slice() {
        let mut grid = ScalarGrid::new(DataType::Undefined, GridSize::new([0, 0, 0], [3, 2, 2], 1.0).unwrap());
        let mut fractions = Vec::new();
        let _ = grid.generate(|_, _, _| 1.0, |f| fractions.push(f), || false);
        assert_eq!(fractions, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn generate_stops_at_the_first_cancelled_row() {
        let mut grid = ScalarGrid::new(DataType::Undefined, cube_size(0, 3, 1.0));
        let mut polls = 0;
        let outcome = grid.generate(
            |_, _, _| 1.0,
            |_| {},
            || {
                polls += 1;
                polls > 5
            },
        );
        assert_eq!(outcome, Generation::Cancelled);
        // Four full rows of slice 0 and the first row of slice 1 were written.
        assert_eq!(grid.value(1, 0, 3), 1.0);
        assert_eq!(grid.value(1, 1, 0), 0.0);
        assert_eq!(grid.value(3, 3, 3), 0.0);
    }

    #[test]
    fn combine_computes_weighted_sum() {
        let size = cube_size(0, 2, 1.0);
        let a = filled(size, DataType::AlphaDensity, |x, _, _| x);
        let b = filled(size, DataType::BetaDensity, |_, y, _| y);
        let c = a.combine(&b, 2.0, -0.5).unwrap();
        assert_eq!(c.value(2, 1, 0), 2.0 * 2.0 - 0.5 * 1.0);
        assert_eq!(c.data_type(), DataType::AlphaDensity);
    }

    #[test]
    fn combine_rejects_different_sizes() {
        let a = ScalarGrid::new(DataType::CubeData, cube_size(0, 2, 1.0));
        let b = ScalarGrid::new(DataType::CubeData, cube_size(0, 3, 1.0));
        assert!(matches!(a.combine(&b, 1.0, 1.0), Err(GridError::SizeMismatch { .. })));

        let c = ScalarGrid::new(DataType::CubeData, cube_size(0, 2, 0.5));
        assert!(matches!(a.try_add(&c), Err(GridError::SizeMismatch { .. })));
    }

    #[test]
    fn combine_rejects_shifted_origins() {
        let size = cube_size(0, 3, 1.0);
        let at = |x: f64| {
            ScalarGrid::from_values(
                DataType::AlphaDensity,
                size,
                Vector3::new(x, 0.0, 0.0),
                vec![1.0; size.point_count()],
            )
            .unwrap()
        };
        let a = at(0.0);

        match a.combine(&at(0.4), 1.0, 1.0) {
            Err(GridError::OriginMismatch { left, right }) => {
                assert_eq!(left, [0.0; 3]);
                assert_eq!(right, [0.4, 0.0, 0.0]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        let mut beta = at(-0.4);
        beta.set_data_type(DataType::BetaDensity);
        assert!(matches!(a.try_add(&beta), Err(GridError::OriginMismatch { .. })));

        let nearly = a.combine(&at(1e-9), 1.0, 1.0).unwrap();
        assert_eq!(nearly.origin(), a.origin());
        assert_eq!(nearly.value(3, 3, 3), 2.0);
    }

    #[test]
    fn grid_minus_itself_is_zero() {
        let g = filled(cube_size(-2, 2, 0.5), DataType::CubeData, |x, y, z| (x * y - z).sin());
        let diff = g.try_sub(&g).unwrap();
        assert!(diff.values().iter().all(|&v| v == 0.0));
        assert_eq!(diff.data_type(), DataType::CubeData);
    }

    #[test]
    fn alpha_minus_beta_gives_spin_density() {
        let size = cube_size(0, 2, 1.0);
        let alpha = filled(size, DataType::AlphaDensity, |_, _, _| 3.0);
        let beta = filled(size, DataType::BetaDensity, |_, _, _| 1.0);

        let spin = alpha.try_sub(&beta).unwrap();
        assert_eq!(spin.data_type(), DataType::SpinDensity);
        assert_eq!(spin.value(1, 1, 1), 2.0);

        let total = alpha.try_add(&beta).unwrap();
        assert_eq!(total.data_type(), DataType::TotalDensity);
        assert_eq!(total.value(1, 1, 1), 4.0);
    }

    #[test]
    fn combining_unrelated_types_fails() {
        let size = cube_size(0, 2, 1.0);
        let orbital = ScalarGrid::new(DataType::AlphaOrbital(4), size);
        let density = ScalarGrid::new(DataType::TotalDensity, size);
        assert!(matches!(
            orbital.try_add(&density),
            Err(GridError::IncompatibleTypes { .. })
        ));
    }

    #[test]
    fn scaling_multiplies_every_value() {
        let g = filled(cube_size(0, 2, 1.0), DataType::CubeData, |x, y, z| x + y + z);
        let doubled = g.scaled(2.0);
        let negated = g.clone() * -1.0;
        assert_eq!(doubled.value(2, 2, 2), 12.0);
        assert_eq!(negated.value(1, 0, 2), -3.0);
    }

    #[test]
    fn range_reports_extremes() {
        let g = filled(cube_size(-2, 2, 1.0), DataType::CubeData, |x, y, z| x * y * z);
        assert_eq!(g.range(), (-8.0, 8.0));
    }

    #[test]
    fn sample_matches_grid_values_at_grid_points() {
        let g = filled(cube_size(-3, 3, 0.5), DataType::CubeData, |x, y, z| (x - y * z).cos());
        for &(i, j, k) in &[(-3, -3, -3), (0, 1, -2), (3, 3, 3), (2, -1, 0)] {
            let p = g.world_position(i, j, k);
            assert!((g.sample(&p) - g.value(i, j, k)).abs() < EPS);
        }
    }

    #[test]
    fn sample_reproduces_linear_field_in_the_interior() {
        let g = filled(cube_size(-4, 4, 0.5), DataType::CubeData, linear);
        let p = Point3::new(0.3, -0.7, 0.45);
        assert!((g.sample(&p) - linear(p.x, p.y, p.z)).abs() < EPS);
    }

    #[test]
    fn sample_outside_the_box_uses_the_nearest_boundary_point() {
        let g = filled(cube_size(0, 4, 1.0), DataType::CubeData, linear);
        let inside = g.sample(&Point3::new(4.0, 0.0, 2.0));
        let outside = g.sample(&Point3::new(9.0, -3.0, 2.0));
        assert!((inside - outside).abs() < EPS);
    }

    #[test]
    fn sample_linear_is_zero_outside_the_grid() {
        let g = filled(cube_size(0, 4, 1.0), DataType::CubeData, |_, _, _| 5.0);
        assert_eq!(g.sample_linear(&Point3::new(2.5, 2.5, 2.5)), 5.0);
        assert_eq!(g.sample_linear(&Point3::new(4.5, 2.0, 2.0)), 0.0);
        assert_eq!(g.sample_linear(&Point3::new(-0.1, 2.0, 2.0)), 0.0);
    }

    #[test]
    fn sample_linear_respects_the_origin_offset() {
        let size = cube_size(0, 1, 1.0);
        let values = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let g = ScalarGrid::from_values(DataType::CubeData, size, Vector3::new(10.0, 0.0, 0.0), values).unwrap();
        assert!((g.sample_linear(&Point3::new(10.5, 0.5, 0.25)) - 0.25).abs() < EPS);
        assert_eq!(g.sample_linear(&Point3::new(0.5, 0.5, 0.25)), 0.0);
    }

    #[test]
    fn gradient_of_linear_field_is_constant_in_the_interior() {
        let g = filled(cube_size(-4, 4, 0.5), DataType::CubeData, linear);
        let grad = g.gradient(&Point3::new(0.2, -0.3, 0.6));
        assert!((grad - Vector3::new(2.0, -1.0, 3.0)).norm() < 1e-9);
    }

    #[test]
    fn gradient_of_flat_field_is_zero() {
        let g = filled(cube_size(0, 3, 1.0), DataType::CubeData, |_, _, _| 0.7);
        assert_eq!(g.gradient(&Point3::new(0.0, 3.0, 1.5)), Vector3::zeros());
    }

    #[test]
    fn upsample_halves_the_step_and_keeps_the_box() {
        let g = filled(GridSize::new([-2, 0, 1], [2, 3, 4], 0.4).unwrap(), DataType::TotalDensity, linear);
        let fine = g.upsample(|_| {}, || false).unwrap();
        assert_eq!(fine.size().dimensions(), [9, 7, 7]);
        assert!((fine.step_size() - 0.2).abs() < EPS);
        assert_eq!(fine.size().min(), [-4, 0, 2]);
        assert_eq!(fine.data_type(), DataType::TotalDensity);
        assert_eq!(fine.size().bounding_box(), g.size().bounding_box());
    }

    #[test]
    fn upsample_copies_shared_points_and_interpolates_between() {
        let g = filled(cube_size(0, 6, 1.0), DataType::CubeData, linear);
        let fine = g.upsample(|_| {}, || false).unwrap();

        for (i, j, k) in itertools::iproduct!(0..=6, 0..=6, 0..=6) {
            assert_eq!(fine.value(2 * i, 2 * j, 2 * k), g.value(i, j, k));
        }
        for (i, j, k) in itertools::iproduct!(1..=4, 1..=4, 1..=4) {
            let (x, y, z) = (i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5);
            assert!((fine.value(2 * i + 1, 2 * j + 1, 2 * k + 1) - linear(x, y, z)).abs() < EPS);
        }
    }

    #[test]
    fn upsample_can_be_cancelled() {
        let g = ScalarGrid::new(DataType::CubeData, cube_size(0, 4, 1.0));
        let mut fractions = Vec::new();
        let mut polls = 0;
        let result = g.upsample(
            |f| fractions.push(f),
            || {
                polls += 1;
                polls > 7
            },
        );
        assert!(result.is_none());
        assert_eq!(fractions, vec![0.2]);
    }

    #[test]
    fn summary_describes_the_grid() {
        let g = filled(GridSize::new([0, 0, 0], [7, 7, 1], 0.5).unwrap(), DataType::SpinDensity, |x, _, _| x);
        let summary = g.summary();
        assert_eq!(summary.data_type, "Spin Density");
        assert_eq!(summary.dimensions, [8, 8, 2]);
        assert_eq!(summary.point_count, 128);
        assert_eq!(summary.minimum_value, 0.0);
        assert_eq!(summary.maximum_value, 3.5);
        assert_eq!(summary.data_size_kb, 1.0);
    }
}
