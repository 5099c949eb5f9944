//! Ground motion prediction equations (C5).
//!
//! The contract is pure: same [`GmmInput`](crate::site::GmmInput) and
//! [`Imt`] always produce the same [`ScalarGroundMotion`]; no I/O, no
//! shared mutable state. A [`Gmm`] instance is bound to one IMT;
//! [`GmmSet`] groups the per-IMT instances — or per-IMT logic trees of
//! instances — that a [`crate::source::SourceSet`] dispatches a rupture
//! through.

pub mod basin;
pub mod point_source;
pub mod presets;
pub mod subduction;

use crate::logic_tree::LogicTree;
use crate::site::{GmmInput, ScalarGroundMotion};
use std::sync::Arc;

/// Intensity measure type: PGA, PGV, or SA at a period (seconds).
///
/// `Sa` compares/hashes on the period's bit pattern rather than ordinary
/// float equality, since periods are always literal constants (0.2, 1.0,
/// ...) rather than computed values that could differ by an ULP.
#[derive(Debug, Clone, Copy)]
pub enum Imt {
    Pga,
    Pgv,
    Sa(f64),
}

impl Imt {
    /// Spectral period in seconds; 0.0 for PGA (by convention, not used for
    /// comparison) and `f64::NAN` for PGV (no defined period).
    pub fn period(&self) -> f64 {
        match self {
            Imt::Pga => 0.0,
            Imt::Pgv => f64::NAN,
            Imt::Sa(t) => *t,
        }
    }
}

impl PartialEq for Imt {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Imt::Pga, Imt::Pga) | (Imt::Pgv, Imt::Pgv) => true,
            (Imt::Sa(a), Imt::Sa(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}
impl Eq for Imt {}

impl std::hash::Hash for Imt {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Imt::Pga => 0u8.hash(state),
            Imt::Pgv => 1u8.hash(state),
            Imt::Sa(t) => {
                2u8.hash(state);
                t.to_bits().hash(state);
            }
        }
    }
}

impl std::fmt::Display for Imt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Imt::Pga => write!(f, "PGA"),
            Imt::Pgv => write!(f, "PGV"),
            Imt::Sa(t) => write!(f, "SA({t})"),
        }
    }
}

/// Declared valid domain for one `GmmInput` field, used only for the
/// optional out-of-range warning (§3, §7 `INPUT_OUT_OF_RANGE`).
#[derive(Debug, Clone, Copy)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_nan() || (value >= self.min && value <= self.max)
    }
}

/// Named per-field valid ranges a [`Gmm`] declares for its `GmmInput`.
#[derive(Debug, Clone, Default)]
pub struct FieldRanges {
    pub magnitude: Option<FieldRange>,
    pub r_rup: Option<FieldRange>,
    pub vs30: Option<FieldRange>,
}

impl FieldRanges {
    /// Field names whose value in `input` falls outside the declared range.
    pub fn violations(&self, input: &GmmInput) -> Vec<&'static str> {
        let mut out = Vec::new();
        if let Some(r) = self.magnitude {
            if !r.contains(input.m) {
                out.push("magnitude");
            }
        }
        if let Some(r) = self.r_rup {
            if !r.contains(input.r_rup) {
                out.push("r_rup");
            }
        }
        if let Some(r) = self.vs30 {
            if !r.contains(input.vs30) {
                out.push("vs30");
            }
        }
        out
    }
}

/// The capability-set contract every ground motion model implements.
pub trait Gmm: Send + Sync {
    /// The single IMT this instance is bound to.
    fn imt(&self) -> Imt;

    /// Compute `(ln median, log-std-dev)` for `input`. Pure: the same
    /// input always yields a bit-identical output (§8 universal invariant
    /// 6).
    fn calc(&self, input: &GmmInput) -> ScalarGroundMotion;

    /// Declared valid parameter domain, used only for warnings.
    fn constraints(&self) -> FieldRanges {
        FieldRanges::default()
    }
}

/// A named, weighted alternative GMM for a given IMT — the unit a
/// [`crate::source::SourceSet`]'s GMM assignment actually holds, possibly
/// as a single-branch degenerate [`LogicTree`].
pub type GmmTree = LogicTree<Arc<dyn Gmm>>;

/// Per-IMT GMM assignment for a [`crate::source::SourceSet`]: each IMT maps
/// to a (possibly single-branch) logic tree of alternative GMMs.
#[derive(Clone, Default)]
pub struct GmmSet {
    entries: Vec<(Imt, GmmTree)>,
}

impl GmmSet {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, imt: Imt, tree: GmmTree) {
        self.entries.retain(|(k, _)| *k != imt);
        self.entries.push((imt, tree));
    }

    pub fn get(&self, imt: &Imt) -> Option<&GmmTree> {
        self.entries.iter().find(|(k, _)| k == imt).map(|(_, v)| v)
    }

    pub fn imts(&self) -> impl Iterator<Item = &Imt> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Build a `GmmSet` where each IMT maps to a single, non-tree GMM.
    pub fn single_model(entries: Vec<(Imt, Arc<dyn Gmm>)>) -> Self {
        let mut set = Self::new();
        for (imt, gmm) in entries {
            set.insert(imt, LogicTree::single("only", gmm));
        }
        set
    }
}

/// A response spectrum: parallel arrays of period, ln-mean, and sigma.
#[derive(Debug, Clone)]
pub struct Spectrum {
    pub periods: Vec<f64>,
    pub means: Vec<f64>,
    pub sigmas: Vec<f64>,
}

/// Evaluate `gmms` (each bound to a distinct SA period) at `input`,
/// returning parallel arrays sorted by period. Non-SA entries are ignored.
pub fn spectrum(gmms: &[Arc<dyn Gmm>], input: &GmmInput) -> Spectrum {
    let mut pairs: Vec<(f64, ScalarGroundMotion)> = gmms
        .iter()
        .filter_map(|g| match g.imt() {
            Imt::Sa(t) => Some((t, g.calc(input))),
            _ => None,
        })
        .collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    Spectrum {
        periods: pairs.iter().map(|(t, _)| *t).collect(),
        means: pairs.iter().map(|(_, gm)| gm.mean).collect(),
        sigmas: pairs.iter().map(|(_, gm)| gm.sigma).collect(),
    }
}

/// Intersect the supported SA periods across several models' spectra,
/// keeping only periods present (within float tolerance) in every set —
/// the "multi-model spectra intersect the supported IMTs" rule of §4.5.
pub fn intersect_periods(spectra: &[Vec<f64>]) -> Vec<f64> {
    if spectra.is_empty() {
        return Vec::new();
    }
    let mut common = spectra[0].clone();
    for other in &spectra[1..] {
        common.retain(|p| other.iter().any(|q| (p - q).abs() < 1e-9));
    }
    common.sort_by(|a, b| a.partial_cmp(b).unwrap());
    common
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imt_equality_by_period_bits() {
        assert_eq!(Imt::Sa(0.2), Imt::Sa(0.2));
        assert_ne!(Imt::Sa(0.2), Imt::Sa(0.3));
        assert_ne!(Imt::Pga, Imt::Pgv);
    }

    #[test]
    fn field_range_allows_nan() {
        let r = FieldRange::new(0.0, 10.0);
        assert!(r.contains(f64::NAN));
        assert!(r.contains(5.0));
        assert!(!r.contains(11.0));
    }

    #[test]
    fn intersect_periods_keeps_common_only() {
        let a = vec![0.1, 0.2, 1.0];
        let b = vec![0.2, 1.0, 2.0];
        let common = intersect_periods(&[a, b]);
        assert_eq!(common, vec![0.2, 1.0]);
    }
}
