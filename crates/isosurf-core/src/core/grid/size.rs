use super::GridError;
use nalgebra::Point3;
use std::fmt;

/// Step sizes (Angstrom) for the quality levels 0-6. Each level uses roughly four
/// times as many points as the previous one.
pub const QUALITY_STEP_SIZES: [f64; 7] = [1.0, 0.63, 0.3969, 0.25, 0.1575, 0.0992, 0.0625];

/// Inclusive integer bounds of a grid together with its uniform step size.
///
/// Index `i` along an axis corresponds to the physical coordinate `i * step_size`
/// relative to the owning grid's origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSize {
    min: [i32; 3],
    max: [i32; 3],
    step_size: f64,
}

impl GridSize {
    pub fn new(min: [i32; 3], max: [i32; 3], step_size: f64) -> Result<Self, GridError> {
        if !(step_size.is_finite() && step_size > 0.0) {
            return Err(GridError::InvalidStepSize(step_size));
        }
        if (0..3).any(|axis| max[axis] < min[axis]) {
            return Err(GridError::DegenerateBounds { min, max });
        }
        let dimensions =
            [0, 1, 2].map(|axis| (i64::from(max[axis]) - i64::from(min[axis]) + 1) as u64);
        checked_point_count(dimensions).ok_or(GridError::TooLarge { dimensions })?;
        Ok(Self {
            min,
            max,
            step_size,
        })
    }

    /// Builds the smallest grid at the given quality level that covers the box spanned
    /// by the two corners.
    pub fn from_box(
        corner_a: &Point3<f64>,
        corner_b: &Point3<f64>,
        quality: u8,
    ) -> Result<Self, GridError> {
        let step_size = *QUALITY_STEP_SIZES
            .get(quality as usize)
            .ok_or(GridError::InvalidQuality(quality))?;

        let mut min = [0; 3];
        let mut max = [0; 3];
        for axis in 0..3 {
            let lo = corner_a[axis].min(corner_b[axis]);
            let hi = corner_a[axis].max(corner_b[axis]);
            min[axis] = (lo / step_size).floor() as i32;
            max[axis] = (hi / step_size).ceil() as i32;
        }
        Self::new(min, max, step_size)
    }

    /// Builds a grid with `counts` points per axis whose first point lies as close as
    /// possible to `origin`.
    pub fn from_origin(
        origin: &Point3<f64>,
        step_size: f64,
        counts: [usize; 3],
    ) -> Result<Self, GridError> {
        if !(step_size.is_finite() && step_size > 0.0) {
            return Err(GridError::InvalidStepSize(step_size));
        }
        if let Some(axis) = counts.iter().position(|&n| n == 0) {
            return Err(GridError::EmptyAxis { axis });
        }

        let too_large = GridError::TooLarge {
            dimensions: counts.map(|n| n as u64),
        };
        let mut min = [0; 3];
        let mut max = [0; 3];
        for axis in 0..3 {
            min[axis] = (origin[axis] / step_size).round() as i32;
            max[axis] = i32::try_from(counts[axis] - 1)
                .ok()
                .and_then(|extent| min[axis].checked_add(extent))
                .ok_or_else(|| too_large.clone())?;
        }
        Self::new(min, max, step_size)
    }

    #[inline]
    pub fn min(&self) -> [i32; 3] {
        self.min
    }

    #[inline]
    pub fn max(&self) -> [i32; 3] {
        self.max
    }

    #[inline]
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn dimensions(&self) -> [usize; 3] {
        [0, 1, 2].map(|axis| (i64::from(self.max[axis]) - i64::from(self.min[axis]) + 1) as usize)
    }

    pub fn point_count(&self) -> usize {
        self.dimensions().iter().product()
    }

    pub fn data_size_kb(&self) -> f64 {
        (self.point_count() * std::mem::size_of::<f64>()) as f64 / 1024.0
    }

    /// Corners of the grid box relative to the grid origin.
    pub fn bounding_box(&self) -> (Point3<f64>, Point3<f64>) {
        let h = self.step_size;
        (
            Point3::new(
                self.min[0] as f64 * h,
                self.min[1] as f64 * h,
                self.min[2] as f64 * h,
            ),
            Point3::new(
                self.max[0] as f64 * h,
                self.max[1] as f64 * h,
                self.max[2] as f64 * h,
            ),
        )
    }

    /// Returns `true` if this grid is no finer than `other` and its box lies inside
    /// `other`'s box, i.e. `other` can stand in for this grid.
    pub fn fits_within(&self, other: &GridSize) -> bool {
        let s = self.step_size;
        let t = other.step_size;
        s >= t
            && (0..3).all(|axis| {
                self.min[axis] as f64 * s >= other.min[axis] as f64 * t
                    && self.max[axis] as f64 * s <= other.max[axis] as f64 * t
            })
    }
}

fn checked_point_count(dimensions: [u64; 3]) -> Option<usize> {
    dimensions
        .iter()
        .try_fold(1u64, |acc, &n| acc.checked_mul(n))
        .and_then(|total| usize::try_from(total).ok())
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{}]x[{}..{}]x[{}..{}] @ {}",
            self.min[0],
            self.max[0],
            self.min[1],
            self.max[1],
            self.min[2],
            self.max[2],
            self.step_size
        )
    }
}
