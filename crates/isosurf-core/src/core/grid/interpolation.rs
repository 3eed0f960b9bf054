//! Catmull-Rom cubic interpolation on uniformly spaced samples.
//!
//! All routines take the four samples `p[0..4]` at positions `-1, 0, 1, 2` and a
//! fractional offset `x` in `[0, 1]` measured from `p[1]`.

/// One-dimensional Catmull-Rom spline between `p[1]` and `p[2]`.
///
/// When the spline overshoots both bracketing samples (ringing next to a sharp
/// feature) the result falls back to plain linear interpolation.
#[inline]
pub fn cubic(p: [f64; 4], x: f64) -> f64 {
    let [p0, p1, p2, p3] = p;
    let c = p1
        + 0.5
            * x
            * (p2 - p0
                + x * (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3
                    + x * (3.0 * (p1 - p2) + p3 - p0)));

    let overshoots = (c > p1 && c > p2) || (c < p1 && c < p2);
    if overshoots {
        p1 * (1.0 - x) + p2 * x
    } else {
        c
    }
}

/// Interpolates each row along its last index first, then across the rows.
#[inline]
pub fn bicubic(p: &[[f64; 4]; 4], x: f64, y: f64) -> f64 {
    cubic(p.map(|row| cubic(row, y)), x)
}

/// Tri-cubic interpolation of a 4x4x4 stencil indexed `[x][y][z]`.
///
/// The innermost (z) direction is reduced first, then y, then x.
#[inline]
pub fn tricubic(p: &[[[f64; 4]; 4]; 4], x: f64, y: f64, z: f64) -> f64 {
    cubic(p.map(|plane| bicubic(&plane, y, z)), x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn cubic_hits_the_bracketing_samples_at_the_ends() {
        let p = [0.3, 1.0, 2.5, 2.0];
        assert!((cubic(p, 0.0) - 1.0).abs() < EPS);
        assert!((cubic(p, 1.0) - 2.5).abs() < EPS);
    }

    #[test]
    fn cubic_reproduces_linear_data() {
        let p = [-1.0, 0.0, 1.0, 2.0];
        for step in 0..=10 {
            let x = step as f64 / 10.0;
            assert!((cubic(p, x) - x).abs() < EPS);
        }
    }

    #[test]
    fn cubic_falls_back_to_linear_on_overshoot() {
        // A step next to flat plateaus makes the spline ring above both samples.
        let p = [0.0, 1.0, 1.0, 0.0];
        let value = cubic(p, 0.5);
        assert!((value - 1.0).abs() < EPS);
    }

    #[test]
    fn cubic_stays_between_samples_for_monotone_data() {
        let p = [0.0, 0.0, 1.0, 1.0];
        for step in 0..=10 {
            let value = cubic(p, step as f64 / 10.0);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn tricubic_reproduces_a_linear_field() {
        let field = |i: usize, j: usize, k: usize| {
            let (x, y, z) = (i as f64 - 1.0, j as f64 - 1.0, k as f64 - 1.0);
            2.0 * x - y + 0.5 * z + 3.0
        };
        let mut stencil = [[[0.0; 4]; 4]; 4];
        for (i, plane) in stencil.iter_mut().enumerate() {
            for (j, row) in plane.iter_mut().enumerate() {
                for (k, value) in row.iter_mut().enumerate() {
                    *value = field(i, j, k);
                }
            }
        }

        let (x, y, z) = (0.25, 0.5, 0.75);
        let expected = 2.0 * x - y + 0.5 * z + 3.0;
        assert!((tricubic(&stencil, x, y, z) - expected).abs() < 1e-10);
    }

    #[test]
    fn bicubic_at_zero_offsets_returns_the_centre_sample() {
        let mut p = [[0.0; 4]; 4];
        p[1][1] = 7.0;
        assert!((bicubic(&p, 0.0, 0.0) - 7.0).abs() < EPS);
    }
}
