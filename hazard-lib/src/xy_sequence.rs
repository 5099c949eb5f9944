//! Immutable/mutable numeric XY curves (C9).
//!
//! `xs` are shared by reference across instances so that curves which share
//! the same IML grid can be added without re-checking equality element by
//! element; the guard is an equality check on the `Arc`'s pointer identity
//! or, failing that, a structural comparison.

use crate::error::{HazardError, HazardResult};
use std::sync::Arc;

/// An immutable, strictly-increasing x-grid shared across curves in a run.
/// Cloning an [`XySequence`] is O(1) for `xs` (an `Arc` clone).
#[derive(Debug, Clone)]
pub struct XySequence {
    xs: Arc<Vec<f64>>,
    ys: Vec<f64>,
}

impl XySequence {
    /// Build a sequence from explicit xs/ys. `xs` must be strictly
    /// increasing and the same length as `ys`.
    pub fn try_new(xs: Vec<f64>, ys: Vec<f64>) -> HazardResult<Self> {
        if xs.len() != ys.len() {
            return Err(HazardError::InputValidation(format!(
                "xs/ys length mismatch: {} vs {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(HazardError::InputValidation(
                "xs must be strictly increasing".to_string(),
            ));
        }
        Ok(Self {
            xs: Arc::new(xs),
            ys,
        })
    }

    /// Build a sequence on an already-shared x-grid, all ys initialized to
    /// zero. Used to allocate per-(site, SourceSet, Gmm, IMT) accumulators
    /// against the model's IML grid.
    pub fn zeros_on(xs: Arc<Vec<f64>>) -> Self {
        let ys = vec![0.0; xs.len()];
        Self { xs, ys }
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn ys_mut(&mut self) -> &mut [f64] {
        &mut self.ys
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Shared handle to this sequence's x-grid, for constructing aligned
    /// sequences elsewhere in the pipeline.
    pub fn xs_handle(&self) -> Arc<Vec<f64>> {
        Arc::clone(&self.xs)
    }

    /// `true` if `other` shares this sequence's exact x-grid (by pointer
    /// identity first, falling back to value equality for grids built
    /// independently from the same literal array).
    pub fn same_grid(&self, other: &XySequence) -> bool {
        Arc::ptr_eq(&self.xs, &other.xs) || *self.xs == *other.xs
    }

    /// Add `other`'s ys into this sequence's ys, element-wise. Errors if
    /// the x-grids don't match (§7 `INTERNAL`: "xs-hash mismatch in curve
    /// addition").
    pub fn add_assign(&mut self, other: &XySequence) -> HazardResult<()> {
        if !self.same_grid(other) {
            return Err(HazardError::Internal(
                "attempted to add XySequences on different x-grids".to_string(),
            ));
        }
        for (y, oy) in self.ys.iter_mut().zip(other.ys.iter()) {
            *y += oy;
        }
        Ok(())
    }

    /// Multiply this sequence's ys by `other`'s ys, element-wise.
    pub fn mul_assign(&mut self, other: &XySequence) -> HazardResult<()> {
        if !self.same_grid(other) {
            return Err(HazardError::Internal(
                "attempted to multiply XySequences on different x-grids".to_string(),
            ));
        }
        for (y, oy) in self.ys.iter_mut().zip(other.ys.iter()) {
            *y *= oy;
        }
        Ok(())
    }

    /// Add a scalar to every y value.
    pub fn add_scalar(&mut self, scalar: f64) {
        for y in self.ys.iter_mut() {
            *y += scalar;
        }
    }

    /// Multiply every y value by a scalar.
    pub fn mul_scalar(&mut self, scalar: f64) {
        for y in self.ys.iter_mut() {
            *y *= scalar;
        }
    }

    /// Log-log interpolate the y value at `x`. Both xs and ys must be
    /// positive for the log transform; `x` outside the grid is clamped to
    /// the nearest endpoint's y value (no extrapolation).
    pub fn interpolate_log_log(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 || x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }
        let idx = match self
            .xs
            .binary_search_by(|probe| probe.partial_cmp(&x).unwrap())
        {
            Ok(i) => return self.ys[i],
            Err(i) => i,
        };
        let (x0, x1) = (self.xs[idx - 1], self.xs[idx]);
        let (y0, y1) = (self.ys[idx - 1], self.ys[idx]);
        if y0 <= 0.0 || y1 <= 0.0 {
            // Fall back to linear interpolation when a y endpoint is
            // non-positive (log is undefined); this happens at the tail of
            // a hazard curve where the rate rounds to exactly zero.
            let t = (x - x0) / (x1 - x0);
            return y0 + t * (y1 - y0);
        }
        let (lx0, lx1, lx) = (x0.ln(), x1.ln(), x.ln());
        let (ly0, ly1) = (y0.ln(), y1.ln());
        let t = (lx - lx0) / (lx1 - lx0);
        (ly0 + t * (ly1 - ly0)).exp()
    }

    /// Log-log interpolate the x value at which y first reaches `target`,
    /// assuming y is monotonically decreasing in x (as a hazard curve is).
    /// Returns `None` if `target` lies outside the curve's y-range.
    pub fn interpolate_x_for_y(&self, target: f64) -> Option<f64> {
        let n = self.xs.len();
        if n < 2 {
            return None;
        }
        let y_max = self.ys[0];
        let y_min = self.ys[n - 1];
        if target > y_max || target < y_min {
            return None;
        }
        for i in 1..n {
            let (y0, y1) = (self.ys[i - 1], self.ys[i]);
            if (y0 >= target && target >= y1) || (y0 <= target && target <= y1) {
                if y0 == y1 {
                    return Some(self.xs[i - 1]);
                }
                let (x0, x1) = (self.xs[i - 1], self.xs[i]);
                if x0 <= 0.0 || x1 <= 0.0 || y0 <= 0.0 || y1 <= 0.0 || target <= 0.0 {
                    let t = (target - y0) / (y1 - y0);
                    return Some(x0 + t * (x1 - x0));
                }
                let (lx0, lx1) = (x0.ln(), x1.ln());
                let (ly0, ly1, lt) = (y0.ln(), y1.ln(), target.ln());
                let t = (lt - ly0) / (ly1 - ly0);
                return Some((lx0 + t * (lx1 - lx0)).exp());
            }
        }
        None
    }

    /// `true` if ys is non-increasing — the invariant every hazard curve
    /// must satisfy (§8, universal invariant 2).
    pub fn is_non_increasing(&self) -> bool {
        self.ys.windows(2).all(|w| w[1] <= w[0] + 1e-12)
    }
}

/// A hazard curve is simply an [`XySequence`] whose y is annual exceedance
/// rate; aggregation is point-wise sum.
pub type HazardCurve = XySequence;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_increasing_xs() {
        assert!(XySequence::try_new(vec![1.0, 1.0], vec![0.0, 0.0]).is_err());
        assert!(XySequence::try_new(vec![2.0, 1.0], vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn add_assign_requires_same_grid() {
        let a = XySequence::try_new(vec![1.0, 2.0], vec![1.0, 1.0]).unwrap();
        let b = XySequence::try_new(vec![1.0, 3.0], vec![1.0, 1.0]).unwrap();
        let mut a2 = a.clone();
        assert!(a2.add_assign(&b).is_err());
    }

    #[test]
    fn add_assign_sums_elementwise() {
        let a = XySequence::try_new(vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]).unwrap();
        let mut acc = a.clone();
        acc.add_assign(&a).unwrap();
        assert_eq!(acc.ys(), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn log_log_interpolate_midpoint() {
        let seq = XySequence::try_new(vec![1.0, 100.0], vec![1.0, 0.01]).unwrap();
        // geometric midpoint of x is 10; y should be geometric midpoint too.
        let y = seq.interpolate_log_log(10.0);
        assert!((y - 0.1).abs() < 1e-9);
    }

    #[test]
    fn interpolate_x_for_y_inverts_log_log() {
        let seq = XySequence::try_new(vec![1.0, 100.0], vec![1.0, 0.01]).unwrap();
        let x = seq.interpolate_x_for_y(0.1).unwrap();
        assert!((x - 10.0).abs() < 1e-6);
    }

    #[test]
    fn interpolate_x_for_y_out_of_range_is_none() {
        let seq = XySequence::try_new(vec![1.0, 100.0], vec![1.0, 0.01]).unwrap();
        assert!(seq.interpolate_x_for_y(10.0).is_none());
        assert!(seq.interpolate_x_for_y(0.0001).is_none());
    }

    #[test]
    fn non_increasing_check() {
        let good = XySequence::try_new(vec![1.0, 2.0], vec![2.0, 1.0]).unwrap();
        let bad = XySequence::try_new(vec![1.0, 2.0], vec![1.0, 2.0]).unwrap();
        assert!(good.is_non_increasing());
        assert!(!bad.is_non_increasing());
    }
}
