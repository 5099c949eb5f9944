//! Deaggregation (C8): re-traverses the pipeline at a single return-period
//! IML, binning each rupture's contribution into a 3-D (R, M, ε) histogram
//! plus a categorical source-type axis (§4.8), instead of summing over the
//! whole IML grid.

use crate::error::{HazardError, HazardResult};
use crate::gmm::Imt;
use crate::pipeline::{build_input, evaluate_gmm_tree, exceedance_prob, RunContext};
use crate::rupture::Rupture;
use crate::site::Site;
use crate::source::{ClusterAlternative, Source, SourceSet, SourceType};
use crate::config::DeaggBins;

/// One bin of the (R, M, ε, source-type) histogram, with its accumulated
/// exceedance-rate contribution.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct DeaggBin {
    pub r_lo: f64,
    pub r_hi: f64,
    pub m_lo: f64,
    pub m_hi: f64,
    pub epsilon_lo: f64,
    pub epsilon_hi: f64,
    pub source_type: SourceType,
    pub rate: f64,
}

/// Full deaggregation result for one site/IMT: the resolved IML and the
/// populated bins (zero-rate bins are omitted).
#[derive(Debug, Clone)]
pub struct DeaggResult {
    pub imt: Imt,
    pub iml: f64,
    pub total_rate: f64,
    pub bins: Vec<DeaggBin>,
}

/// Bin edge index along one axis, clamping out-of-range values to the
/// nearest edge bin so every contribution lands somewhere (§8 invariant 5:
/// bin rates must sum to the total rate, not silently drop the tail).
fn bin_index(value: f64, lo: f64, hi: f64, delta: f64) -> usize {
    let n = ((hi - lo) / delta).round().max(1.0) as usize;
    if value <= lo {
        return 0;
    }
    if value >= hi {
        return n - 1;
    }
    (((value - lo) / delta) as usize).min(n - 1)
}

struct Accumulator {
    bins: DeaggBins,
    n_r: usize,
    n_m: usize,
    n_eps: usize,
    rates: std::collections::HashMap<(usize, usize, usize, SourceType), f64>,
}

impl Accumulator {
    fn new(bins: DeaggBins) -> Self {
        let n_r = ((bins.r_max - bins.r_min) / bins.delta_r).round().max(1.0) as usize;
        let n_m = ((bins.m_max - bins.m_min) / bins.delta_m).round().max(1.0) as usize;
        let n_eps = ((bins.epsilon_max - bins.epsilon_min) / bins.delta_epsilon)
            .round()
            .max(1.0) as usize;
        Self {
            bins,
            n_r,
            n_m,
            n_eps,
            rates: std::collections::HashMap::new(),
        }
    }

    fn add(&mut self, r: f64, m: f64, epsilon: f64, source_type: SourceType, rate: f64) {
        if rate <= 0.0 || !rate.is_finite() {
            return;
        }
        let ir = bin_index(r, self.bins.r_min, self.bins.r_max, self.bins.delta_r);
        let im = bin_index(m, self.bins.m_min, self.bins.m_max, self.bins.delta_m);
        let ie = bin_index(
            epsilon,
            self.bins.epsilon_min,
            self.bins.epsilon_max,
            self.bins.delta_epsilon,
        );
        *self.rates.entry((ir, im, ie, source_type)).or_insert(0.0) += rate;
    }

    fn into_bins(self) -> Vec<DeaggBin> {
        self.rates
            .into_iter()
            .map(|((ir, im, ie, source_type), rate)| DeaggBin {
                r_lo: self.bins.r_min + ir as f64 * self.bins.delta_r,
                r_hi: self.bins.r_min + (ir + 1).min(self.n_r) as f64 * self.bins.delta_r,
                m_lo: self.bins.m_min + im as f64 * self.bins.delta_m,
                m_hi: self.bins.m_min + (im + 1).min(self.n_m) as f64 * self.bins.delta_m,
                epsilon_lo: self.bins.epsilon_min + ie as f64 * self.bins.delta_epsilon,
                epsilon_hi: self.bins.epsilon_min
                    + (ie + 1).min(self.n_eps) as f64 * self.bins.delta_epsilon,
                source_type,
                rate,
            })
            .collect()
    }
}

/// Mean/sigma of a rupture's ground motion, averaged across GMM logic-tree
/// branches by weight — used to place the rupture's epsilon, matching the
/// same branch-weighted averaging the hazard curve itself uses for the
/// exceedance probability (§4.7.3).
fn weighted_mean_sigma(branches: &[(f64, crate::site::ScalarGroundMotion)]) -> Option<(f64, f64)> {
    let total_w: f64 = branches.iter().map(|(w, _)| w).sum();
    if total_w <= 0.0 {
        return None;
    }
    let mean: f64 = branches.iter().map(|(w, gm)| w * gm.mean).sum::<f64>() / total_w;
    let sigma: f64 = branches.iter().map(|(w, gm)| w * gm.sigma).sum::<f64>() / total_w;
    Some((mean, sigma))
}

/// A rupture's location in the (R, M, ε) histogram at `ln_iml`, plus its
/// own exceedance probability at that IML — everything needed to bin it,
/// computed once and shared between the independent-source and cluster
/// binning paths so the two never disagree on a rupture's placement.
struct RupturePlacement {
    r_rup: f64,
    magnitude: f64,
    epsilon: f64,
    exceedance: f64,
}

fn place_rupture(
    rupture: &Rupture,
    site: &Site,
    gmm_tree: &crate::gmm::GmmTree,
    ln_iml: f64,
    truncation: f64,
    cutoff_km: f64,
) -> Option<RupturePlacement> {
    let distances = rupture.surface.distance_to(&site.location);
    if distances.r_jb > cutoff_km {
        return None;
    }
    let input = build_input(rupture, &distances, site);
    let branches = evaluate_gmm_tree(gmm_tree, &input);
    if branches.is_empty() {
        return None;
    }
    let exceedance: f64 = branches
        .iter()
        .map(|(w, gm)| w * exceedance_prob(ln_iml, gm.mean, gm.sigma, truncation))
        .sum();
    let (mean, sigma) = weighted_mean_sigma(&branches)?;
    let epsilon = if sigma > 0.0 { (ln_iml - mean) / sigma } else { 0.0 };
    Some(RupturePlacement {
        r_rup: distances.r_rup,
        magnitude: rupture.magnitude,
        epsilon,
        exceedance,
    })
}

/// Bin one independent rupture's exceedance-rate contribution at `ln_iml`
/// into `acc`, using r_rup as the mid-surface distance proxy (§4.8) and the
/// branch-weighted mean/sigma to place epsilon.
fn bin_rupture(
    acc: &mut Accumulator,
    rupture: &Rupture,
    site: &Site,
    gmm_tree: &crate::gmm::GmmTree,
    ln_iml: f64,
    truncation: f64,
    cutoff_km: f64,
    source_type: SourceType,
    rate_scale: f64,
) {
    if rupture.rate <= 0.0 {
        return;
    }
    let placement = match place_rupture(rupture, site, gmm_tree, ln_iml, truncation, cutoff_km) {
        Some(p) => p,
        None => return,
    };
    let rate = rupture.rate * rate_scale * placement.exceedance;
    acc.add(placement.r_rup, placement.magnitude, placement.epsilon, source_type, rate);
}

/// §4.8 + §9's resolved Open Question: cluster deagg bins per (alternative,
/// rupture) pair rather than by some averaged "representative" rupture,
/// reusing the curve calculation's combinatorics (§4.7.4) to get each
/// rupture's share of the cluster's total exceedance contribution, then
/// allocating that share proportionally across (alternative, rupture).
fn bin_cluster(
    acc: &mut Accumulator,
    alternatives: &[ClusterAlternative],
    site: &Site,
    gmm_tree: &crate::gmm::GmmTree,
    ln_iml: f64,
    truncation: f64,
    cutoff_km: f64,
    source_type: SourceType,
    source_set_weight: f64,
) {
    let total_rate: f64 = alternatives
        .iter()
        .map(|alt| alt.weight * alt.ruptures.iter().map(|r| r.rate).sum::<f64>())
        .sum();
    if total_rate <= 0.0 {
        return;
    }

    let mut nonexceedance = 0.0;
    let mut placements: Vec<(f64, RupturePlacement)> = Vec::new();
    for alt in alternatives {
        let mut product = 1.0;
        for rupture in &alt.ruptures {
            match place_rupture(rupture, site, gmm_tree, ln_iml, truncation, cutoff_km) {
                Some(placement) => {
                    product *= 1.0 - placement.exceedance;
                    placements.push((alt.weight, placement));
                }
                None => continue,
            }
        }
        nonexceedance += alt.weight * product;
    }
    let total_exceedance = (1.0 - nonexceedance).clamp(0.0, 1.0);
    let cluster_rate = source_set_weight * total_rate * total_exceedance;
    if cluster_rate <= 0.0 {
        return;
    }

    let weight_sum: f64 = placements.iter().map(|(w, p)| w * p.exceedance).sum();
    if weight_sum <= 0.0 {
        return;
    }
    for (weight, placement) in &placements {
        let share = (weight * placement.exceedance) / weight_sum;
        acc.add(
            placement.r_rup,
            placement.magnitude,
            placement.epsilon,
            source_type,
            cluster_rate * share,
        );
    }
}

/// Deaggregate the total hazard at `imt` for `return_period_years`, across
/// every source set, into the (R, M, ε, source-type) histogram (§4.8).
///
/// The deagg IML is found by log-log interpolation on the already-computed
/// hazard curve; a return period outside the curve's y-range is
/// `INPUT_OUT_OF_RANGE` (§4.8), not a silent clamp.
pub fn deaggregate(
    ctx: &RunContext,
    site: &Site,
    source_sets: &[SourceSet],
    imt: &Imt,
    bins: &DeaggBins,
    return_period_years: f64,
) -> HazardResult<DeaggResult> {
    let curves = crate::pipeline::compute_site(ctx, site, source_sets)?;
    let curve = curves
        .get(imt)
        .ok_or_else(|| HazardError::ModelIntegrity(format!("no hazard curve computed for {imt}")))?;

    let target_rate = 1.0 / return_period_years;
    let iml = curve.interpolate_x_for_y(target_rate).ok_or_else(|| {
        HazardError::InputOutOfRange(format!(
            "return period {return_period_years}y (rate {target_rate:e}) outside hazard curve's range for {imt}"
        ))
    })?;
    let ln_iml = iml.ln();

    let mut acc = Accumulator::new(*bins);
    for source_set in source_sets {
        let gmm_tree = match source_set.gmms.get(imt) {
            Some(tree) => tree,
            None => continue,
        };
        let filtered = source_set.filter(&site.location);
        for source in filtered {
            let source_type = source.source_type();
            if let Some(alternatives) = source.cluster_alternatives() {
                bin_cluster(
                    &mut acc,
                    alternatives,
                    site,
                    gmm_tree,
                    ln_iml,
                    ctx.truncation,
                    source_set.distance_cutoff_km,
                    source_type,
                    source_set.weight,
                );
                continue;
            }
            for rupture in source.ruptures() {
                bin_rupture(
                    &mut acc,
                    &rupture,
                    site,
                    gmm_tree,
                    ln_iml,
                    ctx.truncation,
                    source_set.distance_cutoff_km,
                    source_type,
                    source_set.weight,
                );
            }
        }
    }

    let mut bins_out = acc.into_bins();
    bins_out.retain(|b| b.rate > 0.0);
    let total_rate: f64 = bins_out.iter().map(|b| b.rate).sum();

    Ok(DeaggResult {
        imt: *imt,
        iml,
        total_rate,
        bins: bins_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmm::presets::crustal_pga;
    use crate::gmm::GmmSet;
    use crate::mfd::CharacteristicMfd;
    use crate::rupture::{FloatingMode, LogLinearScaling, RuptureSurface};
    use crate::site::Location;
    use crate::source::FaultSource;
    use std::sync::Arc;

    fn flat_surface() -> RuptureSurface {
        RuptureSurface::from_trace(
            &[Location::new(0.0, 0.0, 0.0), Location::new(0.0, 0.5, 0.0)],
            90.0,
            15.0,
            0.0,
            1.0,
        )
        .unwrap()
    }

    fn single_fault_source_set(weight: f64) -> SourceSet {
        let mfd = CharacteristicMfd {
            magnitude: 6.5,
            rate: 0.01,
        };
        let source = FaultSource::new(
            flat_surface(),
            Box::new(mfd),
            90.0,
            Box::new(LogLinearScaling::wells_coppersmith_1994()),
            FloatingMode::Off,
        );
        let gmms = GmmSet::single_model(vec![(Imt::Pga, Arc::new(crustal_pga()) as Arc<dyn crate::gmm::Gmm>)]);
        SourceSet::new("set1", vec![Box::new(source)], weight, gmms, 200.0)
    }

    fn ctx() -> RunContext {
        let mut grids = std::collections::HashMap::new();
        grids.insert(Imt::Pga, vec![0.001, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0]);
        RunContext::new(grids, crate::auxilary::DEFAULT_TRUNCATION_SIGMA, None)
    }

    #[test]
    fn bins_sum_to_interpolated_curve_rate() {
        let source_sets = vec![single_fault_source_set(1.0)];
        let ctx = ctx();
        let site = Site::new(Location::new(0.0, 0.2, 0.0), 760.0, true, f64::NAN, f64::NAN);

        let curves = crate::pipeline::compute_site(&ctx, &site, &source_sets).unwrap();
        let curve = curves.get(&Imt::Pga).unwrap();
        let target_rate = curve.ys()[2].max(1e-6);
        let return_period = 1.0 / target_rate;

        let result = deaggregate(&ctx, &site, &source_sets, &Imt::Pga, &DeaggBins::default(), return_period)
            .unwrap();
        let expected = curve.interpolate_x_for_y(1.0 / return_period).unwrap();
        assert!((result.iml - expected).abs() / expected < 1e-6);

        let curve_rate = curve.interpolate_log_log(result.iml);
        assert!((result.total_rate - curve_rate).abs() / curve_rate.max(1e-12) < 1e-3);
    }

    #[test]
    fn out_of_range_return_period_is_input_out_of_range() {
        let source_sets = vec![single_fault_source_set(1.0)];
        let ctx = ctx();
        let site = Site::new(Location::new(0.0, 0.2, 0.0), 760.0, true, f64::NAN, f64::NAN);

        let err = deaggregate(&ctx, &site, &source_sets, &Imt::Pga, &DeaggBins::default(), 1e18)
            .unwrap_err();
        assert!(matches!(err, HazardError::InputOutOfRange(_)));
    }

    #[test]
    fn bin_index_clamps_out_of_range_values() {
        assert_eq!(bin_index(-10.0, 0.0, 300.0, 10.0), 0);
        assert_eq!(bin_index(1000.0, 0.0, 300.0, 10.0), 29);
        assert_eq!(bin_index(15.0, 0.0, 300.0, 10.0), 1);
    }
}
