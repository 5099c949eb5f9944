//! Hazard pipeline (C7): the spine that turns a source model plus a site
//! into mean hazard curves (§4.7).
//!
//! Stages S1-S6 are modeled as a two-tier task graph (§9 design notes): the
//! outer loop is a parallel map over sources (rayon), each task is a
//! synchronous S2∘S3∘S4 pipeline, and a single-owner reducer on a
//! [`crossbeam_channel`] folds completed per-source curves into the
//! SourceSet accumulator. All run-scoped state is threaded explicitly
//! through [`RunContext`] rather than held in statics.

use crate::auxilary::DEFAULT_TRUNCATION_SIGMA;
use crate::config::Config;
use crate::error::{HazardError, HazardResult};
use crate::geo::Distances;
use crate::gmm::{Gmm, GmmTree, Imt};
use crate::rupture::Rupture;
use crate::site::{GmmInput, ScalarGroundMotion, Site};
use crate::source::{ClusterAlternative, Source, SourceSet};
use crate::xy_sequence::HazardCurve;
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Per-site lifecycle state, per §4.7.6:
/// `INIT -> FILTERING -> DISPATCHING <-> REDUCING -> DONE`, with `FAILED`
/// (or `TimedOut`) reachable from any in-flight state.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Init,
    Filtering,
    Dispatching,
    Reducing,
    Done,
    Failed(String),
    TimedOut,
}

impl RunState {
    fn allows(&self, next: &RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (_, Failed(_)) | (_, TimedOut) => true,
            (Init, Filtering) => true,
            (Filtering, Dispatching) => true,
            (Dispatching, Reducing) | (Reducing, Dispatching) => true,
            (Dispatching, Done) | (Reducing, Done) => true,
            _ => false,
        }
    }
}

fn transition(current: RunState, next: RunState) -> HazardResult<RunState> {
    if current.allows(&next) {
        Ok(next)
    } else {
        Err(HazardError::Internal(format!(
            "invalid state transition {current:?} -> {next:?}"
        )))
    }
}

/// Explicit context threaded through the pipeline instead of module-level
/// singletons (§9): the resolved IML grid per IMT and the run-wide knobs
/// that affect curve construction.
pub struct RunContext {
    pub truncation: f64,
    pub timeout_seconds: Option<u64>,
    iml_grids: HashMap<Imt, Arc<Vec<f64>>>,
}

impl RunContext {
    pub fn new(iml_grids: HashMap<Imt, Vec<f64>>, truncation: f64, timeout_seconds: Option<u64>) -> Self {
        Self {
            truncation,
            timeout_seconds,
            iml_grids: iml_grids.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
        }
    }

    /// Build a context from a resolved [`Config`], parsing `imts`/`iml_grids`
    /// string keys into [`Imt`] values.
    pub fn from_config(config: &Config) -> HazardResult<Self> {
        let mut grids = HashMap::new();
        for name in &config.imts {
            let imt = Config::parse_imt(name).ok_or_else(|| {
                HazardError::ModelIntegrity(format!("unrecognized IMT '{name}' in hazard.imts"))
            })?;
            let grid = config.iml_grids.get(name).cloned().ok_or_else(|| {
                HazardError::ModelIntegrity(format!("missing hazard.iml.{name} grid"))
            })?;
            grids.insert(imt, grid);
        }
        Ok(Self::new(grids, config.truncation, config.timeout_seconds))
    }

    pub fn iml_grid(&self, imt: &Imt) -> Option<Arc<Vec<f64>>> {
        self.iml_grids.get(imt).cloned()
    }

    pub fn imts(&self) -> impl Iterator<Item = &Imt> {
        self.iml_grids.keys()
    }
}

/// `Contribution(x) = rate * P(ln IML >= ln x | mu, sigma)`, truncated at
/// `+/- truncation` sigma and renormalised so P ranges over exactly [0, 1]
/// (§4.7.3). `truncation <= 0` disables truncation entirely, not "zero
/// probability" (§8 boundary behaviour).
pub(crate) fn exceedance_prob(ln_x: f64, mu: f64, sigma: f64, truncation: f64) -> f64 {
    if !sigma.is_finite() || sigma <= 0.0 || !mu.is_finite() {
        return 0.0;
    }
    let normal = match Normal::new(mu, sigma) {
        Ok(n) => n,
        Err(_) => return 0.0,
    };
    if truncation <= 0.0 {
        return (1.0 - normal.cdf(ln_x)).clamp(0.0, 1.0);
    }
    let lo = mu - truncation * sigma;
    let hi = mu + truncation * sigma;
    if ln_x <= lo {
        return 1.0;
    }
    if ln_x >= hi {
        return 0.0;
    }
    let cdf_lo = normal.cdf(lo);
    let cdf_hi = normal.cdf(hi);
    let cdf_z = normal.cdf(ln_x);
    let denom = cdf_hi - cdf_lo;
    if denom <= 0.0 {
        return 0.0;
    }
    ((cdf_hi - cdf_z) / denom).clamp(0.0, 1.0)
}

/// S2: build the GmmInput record for one rupture against a site.
pub(crate) fn build_input(rupture: &Rupture, distances: &Distances, site: &Site) -> GmmInput {
    let surface = &rupture.surface;
    GmmInput::new(
        rupture.magnitude,
        distances.r_jb,
        distances.r_rup,
        distances.r_x,
        surface.dip,
        surface.width,
        surface.z_top,
        surface.z_hyp(),
        rupture.rake,
        site.vs30,
        site.vs_inferred,
        site.z1p0,
        site.z2p5,
    )
}

/// S3: evaluate every branch of a GMM logic tree at `input`, dropping
/// degenerate outputs (§4.7.7: logged and skipped, not fatal) and warning on
/// out-of-range inputs (recoverable per §7 `INPUT_OUT_OF_RANGE`).
pub(crate) fn evaluate_gmm_tree(tree: &GmmTree, input: &GmmInput) -> Vec<(f64, ScalarGroundMotion)> {
    let mut out = Vec::new();
    for branch in tree.branches() {
        let gmm: &Arc<dyn Gmm> = &branch.value;
        let violations = gmm.constraints().violations(input);
        if !violations.is_empty() {
            log::warn!(
                "branch '{}': input field(s) {:?} outside declared GMM domain",
                branch.id,
                violations
            );
        }
        let gm = gmm.calc(input);
        if gm.is_degenerate() {
            log::warn!(
                "branch '{}': degenerate ground motion, dropping rupture contribution",
                branch.id
            );
            continue;
        }
        out.push((branch.weight, gm));
    }
    out
}

/// Weighted exceedance probability for one rupture at `ln_x`, averaging over
/// the GMM logic tree's branches.
pub(crate) fn rupture_exceedance_prob(
    rupture: &Rupture,
    site: &Site,
    gmm_tree: &GmmTree,
    ln_x: f64,
    truncation: f64,
    cutoff_km: f64,
) -> f64 {
    let distances = rupture.surface.distance_to(&site.location);
    if distances.r_jb > cutoff_km {
        return 0.0;
    }
    let input = build_input(rupture, &distances, site);
    evaluate_gmm_tree(gmm_tree, &input)
        .iter()
        .map(|(w, gm)| w * exceedance_prob(ln_x, gm.mean, gm.sigma, truncation))
        .sum()
}

/// S2∘S3∘S4 for one source: its exceedance-rate contribution on `grid`.
/// `None` if the source contributes nothing (empty rupture list, or every
/// rupture skipped by the distance cutoff or GMM degeneracy).
fn compute_source_curve(
    source: &dyn Source,
    site: &Site,
    gmm_tree: &GmmTree,
    grid: &Arc<Vec<f64>>,
    truncation: f64,
    cutoff_km: f64,
) -> Option<HazardCurve> {
    let mut curve = HazardCurve::zeros_on(Arc::clone(grid));

    if let Some(alternatives) = source.cluster_alternatives() {
        compute_cluster_curve(alternatives, site, gmm_tree, &mut curve, truncation, cutoff_km);
        return Some(curve);
    }

    let mut touched = false;
    for rupture in source.ruptures() {
        if rupture.rate <= 0.0 {
            continue;
        }
        let distances = rupture.surface.distance_to(&site.location);
        if distances.r_jb > cutoff_km {
            continue;
        }
        let input = build_input(&rupture, &distances, site);
        let branches = evaluate_gmm_tree(gmm_tree, &input);
        if branches.is_empty() {
            continue;
        }
        touched = true;
        for (i, x) in grid.iter().enumerate() {
            let ln_x = x.ln();
            let contribution: f64 = branches
                .iter()
                .map(|(w, gm)| w * exceedance_prob(ln_x, gm.mean, gm.sigma, truncation))
                .sum();
            curve.ys_mut()[i] += rupture.rate * contribution;
        }
    }
    if touched {
        Some(curve)
    } else {
        None
    }
}

/// §4.7.4: cluster-source combinatorics — multiplicative within an
/// alternative, weighted-additive across alternatives, scaled by the
/// cluster's total rate Λ.
fn compute_cluster_curve(
    alternatives: &[ClusterAlternative],
    site: &Site,
    gmm_tree: &GmmTree,
    curve: &mut HazardCurve,
    truncation: f64,
    cutoff_km: f64,
) {
    let total_rate: f64 = alternatives
        .iter()
        .map(|alt| alt.weight * alt.ruptures.iter().map(|r| r.rate).sum::<f64>())
        .sum();
    if total_rate <= 0.0 {
        return;
    }

    let xs: Vec<f64> = curve.xs().to_vec();
    for (i, x) in xs.iter().enumerate() {
        let ln_x = x.ln();
        let mut nonexceedance = 0.0;
        for alt in alternatives {
            let mut product = 1.0;
            for rupture in &alt.ruptures {
                let p = rupture_exceedance_prob(rupture, site, gmm_tree, ln_x, truncation, cutoff_km);
                product *= 1.0 - p;
            }
            nonexceedance += alt.weight * product;
        }
        let exceedance = (1.0 - nonexceedance).clamp(0.0, 1.0);
        curve.ys_mut()[i] += total_rate * exceedance;
    }
}

/// S1-S6: the full per-site hazard calculation across one or more
/// SourceSets, returning the aggregated `Map<IMT, HazardCurve>` of S6.
///
/// Failure semantics (§4.7.7): a mismatched x-grid during reduction is
/// `INTERNAL` and aborts the site; a wall-clock timeout aborts with
/// `TIMED_OUT` and discards partial results, matching §5's cancellation
/// policy.
pub fn compute_site(
    ctx: &RunContext,
    site: &Site,
    source_sets: &[SourceSet],
) -> HazardResult<HashMap<Imt, HazardCurve>> {
    let start = Instant::now();
    let mut state = RunState::Init;
    state = transition(state, RunState::Filtering)?;

    let mut totals: HashMap<Imt, HazardCurve> = ctx
        .imts()
        .filter_map(|imt| ctx.iml_grid(imt).map(|grid| (*imt, HazardCurve::zeros_on(grid))))
        .collect();

    state = transition(state, RunState::Dispatching)?;

    for source_set in source_sets {
        if let Some(timeout) = ctx.timeout_seconds {
            if start.elapsed().as_secs() > timeout {
                transition(state, RunState::TimedOut)?;
                return Err(HazardError::TimedOut(format!(
                    "site calculation exceeded {timeout}s wall-clock bound"
                )));
            }
        }

        let filtered = source_set.filter(&site.location);

        for imt in source_set.gmms.imts() {
            let grid = match ctx.iml_grid(imt) {
                Some(g) => g,
                None => continue,
            };
            let gmm_tree = source_set.gmms.get(imt).expect("imt came from gmms.imts()");

            let (tx, rx) = crossbeam_channel::unbounded();
            filtered.par_iter().for_each_with(tx.clone(), |tx, source| {
                let curve = compute_source_curve(
                    *source,
                    site,
                    gmm_tree,
                    &grid,
                    ctx.truncation,
                    source_set.distance_cutoff_km,
                );
                let _ = tx.send(curve);
            });
            drop(tx);

            state = transition(state, RunState::Reducing)?;
            let mut set_curve = HazardCurve::zeros_on(Arc::clone(&grid));
            for result in rx.iter() {
                if let Some(source_curve) = result {
                    set_curve.add_assign(&source_curve)?;
                }
            }
            set_curve.mul_scalar(source_set.weight);

            let total = totals
                .get_mut(imt)
                .ok_or_else(|| HazardError::Internal(format!("no IML grid configured for {imt}")))?;
            total.add_assign(&set_curve)?;
            state = transition(state, RunState::Dispatching)?;
        }
    }

    transition(state, RunState::Done)?;
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmm::GmmSet;
    use crate::gmm::presets::crustal_pga;
    use crate::mfd::CharacteristicMfd;
    use crate::rupture::{FloatingMode, LogLinearScaling, Rupture, RuptureSurface};
    use crate::site::Location;
    use crate::source::FaultSource;

    fn flat_trace() -> Vec<Location> {
        vec![
            Location::new(49.9, 142.0, 0.0),
            Location::new(50.1, 142.0, 0.0),
        ]
    }

    fn simple_fault_set(rate: f64) -> SourceSet {
        let surface = RuptureSurface::from_trace(&flat_trace(), 90.0, 10.0, 0.0, 2.0).unwrap();
        let mfd = Box::new(CharacteristicMfd {
            magnitude: 6.5,
            rate,
        });
        let source = Box::new(FaultSource::new(
            surface,
            mfd,
            90.0,
            Box::new(LogLinearScaling::wells_coppersmith_1994()),
            FloatingMode::Off,
        ));
        let gmms = GmmSet::single_model(vec![(Imt::Pga, Arc::new(crustal_pga()))]);
        SourceSet::new("fault", vec![source], 1.0, gmms, 300.0)
    }

    fn grid() -> Vec<f64> {
        vec![0.001, 0.01, 0.05, 0.1, 0.3, 0.5, 1.0]
    }

    fn ctx() -> RunContext {
        let mut grids = HashMap::new();
        grids.insert(Imt::Pga, grid());
        RunContext::new(grids, DEFAULT_TRUNCATION_SIGMA, None)
    }

    fn on_site() -> Site {
        Site::with_vs30(Location::new(50.0, 142.0, 0.0), 350.0, false)
    }

    #[test]
    fn curve_is_non_increasing() {
        let context = ctx();
        let site = on_site();
        let totals = compute_site(&context, &site, &[simple_fault_set(0.01)]).unwrap();
        let curve = totals.get(&Imt::Pga).unwrap();
        assert!(curve.is_non_increasing());
    }

    #[test]
    fn two_source_sets_sum_to_total() {
        let context = ctx();
        let site = on_site();
        let a = simple_fault_set(0.01);
        let b = simple_fault_set(0.02);
        let combined = compute_site(&context, &site, &[a, b]).unwrap();

        let c = simple_fault_set(0.01);
        let d = simple_fault_set(0.02);
        let alone_c = compute_site(&context, &site, std::slice::from_ref(&c)).unwrap();
        let alone_d = compute_site(&context, &site, std::slice::from_ref(&d)).unwrap();

        let combined_curve = combined.get(&Imt::Pga).unwrap();
        for i in 0..grid().len() {
            let expected = alone_c.get(&Imt::Pga).unwrap().ys()[i] + alone_d.get(&Imt::Pga).unwrap().ys()[i];
            assert!((combined_curve.ys()[i] - expected).abs() < 1e-9 * expected.max(1.0));
        }
    }

    #[test]
    fn no_iml_grid_configured_yields_empty_totals() {
        let grids = HashMap::new();
        let context = RunContext::new(grids, DEFAULT_TRUNCATION_SIGMA, None);
        let site = on_site();
        let totals = compute_site(&context, &site, &[simple_fault_set(0.01)]).unwrap();
        assert!(totals.is_empty());
    }

    #[test]
    fn zero_truncation_disables_tail_cut() {
        let p_truncated = exceedance_prob(10.0, -1.0, 0.5, 3.0);
        let p_untruncated = exceedance_prob(10.0, -1.0, 0.5, 0.0);
        assert_eq!(p_truncated, 0.0);
        assert!(p_untruncated >= 0.0);
    }

    #[test]
    fn cluster_curve_conserves_rate_at_low_iml() {
        let surface = RuptureSurface::from_trace(&flat_trace(), 90.0, 10.0, 0.0, 2.0).unwrap();
        let r1 = Rupture::try_new(6.5, 90.0, 0.01, surface.clone()).unwrap();
        let r2 = Rupture::try_new(6.0, 90.0, 0.01, surface).unwrap();
        let cluster = Box::new(crate::source::ClusterSource::new(vec![
            ClusterAlternative {
                weight: 1.0,
                ruptures: vec![r1, r2],
            },
        ]));
        let gmms = GmmSet::single_model(vec![(Imt::Pga, Arc::new(crustal_pga()))]);
        let set = SourceSet::new("cluster", vec![cluster], 1.0, gmms, 300.0);

        let mut grids = HashMap::new();
        grids.insert(Imt::Pga, vec![1e-6]);
        let context = RunContext::new(grids, 0.0, None);
        let site = on_site();
        let totals = compute_site(&context, &site, &[set]).unwrap();
        let curve = totals.get(&Imt::Pga).unwrap();
        assert!((curve.ys()[0] - 0.02).abs() < 1e-6);
    }
}
