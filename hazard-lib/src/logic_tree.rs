//! Weighted epistemic alternatives (C6).
//!
//! A [`LogicTree`] is a frozen, validated ordered list of (id, weight,
//! value) branches. The degenerate single-branch case gets its own fast
//! path per §4.6.

use crate::auxilary::WEIGHT_SUM_TOLERANCE;
use crate::error::{HazardError, HazardResult};

/// One branch of a logic tree.
#[derive(Debug, Clone)]
pub struct Branch<T> {
    pub id: String,
    pub weight: f64,
    pub value: T,
}

/// Builder for a [`LogicTree`]; accumulates branches before validating and
/// freezing them with [`LogicTreeBuilder::build`].
#[derive(Debug, Default)]
pub struct LogicTreeBuilder<T> {
    branches: Vec<Branch<T>>,
}

impl<T> LogicTreeBuilder<T> {
    pub fn new() -> Self {
        Self {
            branches: Vec::new(),
        }
    }

    pub fn add(mut self, id: impl Into<String>, weight: f64, value: T) -> Self {
        self.branches.push(Branch {
            id: id.into(),
            weight,
            value,
        });
        self
    }

    /// Validate and freeze. Errors (`MODEL_INTEGRITY`-class, surfaced here
    /// as `InputValidation` because it is caught at tree-construction time,
    /// a public contract boundary) if any weight is non-positive, or if the
    /// weights don't sum to 1 within [`WEIGHT_SUM_TOLERANCE`].
    pub fn build(self) -> HazardResult<LogicTree<T>> {
        if self.branches.is_empty() {
            return Err(HazardError::InputValidation(
                "logic tree must have at least one branch".to_string(),
            ));
        }
        for b in &self.branches {
            if !(b.weight > 0.0) {
                return Err(HazardError::InputValidation(format!(
                    "branch '{}' has non-positive weight {}",
                    b.id, b.weight
                )));
            }
        }
        let sum: f64 = self.branches.iter().map(|b| b.weight).sum();
        if (sum - 1.0).abs() >= WEIGHT_SUM_TOLERANCE {
            return Err(HazardError::InputValidation(format!(
                "logic tree weights sum to {sum}, expected 1.0 +/- {WEIGHT_SUM_TOLERANCE}"
            )));
        }

        let mut cumulative = Vec::with_capacity(self.branches.len());
        let mut running = 0.0;
        for b in &self.branches {
            running += b.weight;
            cumulative.push(running);
        }
        // Guard against floating error pushing the final cumulative weight
        // fractionally below 1.0, which would make sample(p) miss the tail
        // branch for p very close to 1.
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }

        Ok(LogicTree {
            branches: self.branches,
            cumulative,
        })
    }
}

/// A validated, frozen logic tree: weighted alternatives that always sum to
/// one.
#[derive(Debug, Clone)]
pub struct LogicTree<T> {
    branches: Vec<Branch<T>>,
    cumulative: Vec<f64>,
}

impl<T> LogicTree<T> {
    /// Build a single-branch ("degenerate") tree whose sole branch is
    /// returned by `sample` for any `p`. Distinct construction path from
    /// [`LogicTreeBuilder`] per §4.6, since it skips weight validation
    /// entirely (a lone branch is weight 1.0 by definition).
    pub fn single(id: impl Into<String>, value: T) -> Self {
        Self {
            branches: vec![Branch {
                id: id.into(),
                weight: 1.0,
                value,
            }],
            cumulative: vec![1.0],
        }
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn is_degenerate(&self) -> bool {
        self.branches.len() == 1
    }

    /// Iterate branches in insertion order.
    pub fn branches(&self) -> impl Iterator<Item = &Branch<T>> {
        self.branches.iter()
    }

    pub fn weight_of(&self, index: usize) -> f64 {
        self.branches[index].weight
    }

    /// Sample the branch whose cumulative-weight upper edge first exceeds
    /// `p` (`p` should be in `[0, 1)`); ties break to the lower index.
    /// `p >= 1` returns the last branch.
    pub fn sample(&self, p: f64) -> &Branch<T> {
        if self.branches.len() == 1 {
            return &self.branches[0];
        }
        if p >= 1.0 {
            return self.branches.last().unwrap();
        }
        for (i, cum) in self.cumulative.iter().enumerate() {
            if p < *cum {
                return &self.branches[i];
            }
        }
        self.branches.last().unwrap()
    }

    /// Batch-sample, index-aligned with `ps`.
    pub fn sample_many(&self, ps: &[f64]) -> Vec<&Branch<T>> {
        ps.iter().map(|&p| self.sample(p)).collect()
    }

    /// `true` iff cumulative weights are strictly non-decreasing and the
    /// final one is (within tolerance) 1.0 — re-derivable at any time as a
    /// sanity check, even though `build()` already enforces it.
    pub fn invariant_holds(&self) -> bool {
        let monotonic = self.cumulative.windows(2).all(|w| w[1] >= w[0]);
        let sums_to_one = (self.cumulative.last().copied().unwrap_or(0.0) - 1.0).abs()
            < WEIGHT_SUM_TOLERANCE;
        monotonic && sums_to_one
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> LogicTree<&'static str> {
        LogicTreeBuilder::new()
            .add("A", 0.4, "a")
            .add("B", 0.3, "b")
            .add("C", 0.2, "c")
            .add("D", 0.1, "d")
            .build()
            .unwrap()
    }

    #[test]
    fn rejects_nonpositive_weight() {
        let result = LogicTreeBuilder::new().add("A", 0.0, 1).build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let result = LogicTreeBuilder::new().add("A", 0.5, 1).build();
        assert!(result.is_err());
    }

    #[test]
    fn sample_boundaries() {
        let tree = sample_tree();
        assert_eq!(tree.sample(0.0).id, "A");
        assert_eq!(tree.sample(0.39).id, "A");
        assert_eq!(tree.sample(0.4).id, "B");
        assert_eq!(tree.sample(0.69).id, "B");
        assert_eq!(tree.sample(0.7).id, "C");
        assert_eq!(tree.sample(0.9).id, "D");
        assert_eq!(tree.sample(1.0).id, "D");
    }

    #[test]
    fn scenario_b_and_d_ranges() {
        let tree = sample_tree();
        for p in [0.40, 0.5, 0.6, 0.69999] {
            assert_eq!(tree.sample(p).id, "B", "p={p}");
        }
        for p in [0.90, 0.95, 1.0] {
            assert_eq!(tree.sample(p).id, "D", "p={p}");
        }
    }

    #[test]
    fn single_branch_tree_always_returns_the_branch() {
        let tree = LogicTree::single("only", 42);
        assert_eq!(tree.sample(0.0).value, 42);
        assert_eq!(tree.sample(0.999).value, 42);
        assert_eq!(tree.sample(1.0).value, 42);
        assert!(tree.is_degenerate());
    }

    #[test]
    fn invariant_holds_after_build() {
        let tree = sample_tree();
        assert!(tree.invariant_holds());
    }
}
