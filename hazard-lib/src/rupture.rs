//! Rupture surfaces & floating (C3).
//!
//! A [`RuptureSurface`] is a row-major grid of [`Location`]s (rows along
//! dip, columns along strike). "Floating" selects sub-surfaces representing
//! ruptures smaller than the full fault, per the five modes of §4.3.

use crate::auxilary::{rint, FLOATER_WEIGHT_TOLERANCE};
use crate::error::{HazardError, HazardResult};
use crate::geo::{self, Distances};
use crate::site::Location;

/// A gridded rupture surface: row 0 is the trace projected to `z_top`, each
/// subsequent row steps one `dip_spacing` down the dip direction.
#[derive(Debug, Clone)]
pub struct RuptureSurface {
    /// Row-major grid; `grid[row][col]`.
    grid: Vec<Vec<Location>>,
    pub dip: f64,
    pub width: f64,
    pub z_top: f64,
    pub strike_spacing: f64,
    pub dip_spacing: f64,
}

impl RuptureSurface {
    /// Build a gridded surface from a polyline `trace`, stepping down-dip
    /// by `spacing` until `width` is covered.
    pub fn from_trace(
        trace: &[Location],
        dip: f64,
        width: f64,
        z_top: f64,
        spacing: f64,
    ) -> HazardResult<Self> {
        if trace.len() < 2 {
            return Err(HazardError::InputValidation(
                "rupture trace must have at least two points".to_string(),
            ));
        }
        if spacing <= 0.0 {
            return Err(HazardError::InputValidation(
                "grid spacing must be positive".to_string(),
            ));
        }

        // Resample the trace at `spacing` along strike.
        let strike_row: Vec<Location> = resample_polyline(trace, spacing, z_top);

        let n_dip_rows = ((width / spacing).round() as usize + 1).max(1);
        let dip_azimuth = dip_direction_azimuth(trace);
        let dip_rad = dip.to_radians();

        let mut grid = Vec::with_capacity(n_dip_rows);
        for row_idx in 0..n_dip_rows {
            let down_dip_distance = row_idx as f64 * spacing;
            let horizontal = down_dip_distance * dip_rad.cos();
            let vertical = down_dip_distance * dip_rad.sin();
            let row: Vec<Location> = strike_row
                .iter()
                .map(|loc| geo::translate(loc, dip_azimuth, horizontal, vertical))
                .collect();
            grid.push(row);
        }

        Ok(Self {
            grid,
            dip,
            width,
            z_top,
            strike_spacing: spacing,
            dip_spacing: spacing,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.grid.len()
    }

    pub fn n_cols(&self) -> usize {
        self.grid.first().map(Vec::len).unwrap_or(0)
    }

    pub fn grid(&self) -> &[Vec<Location>] {
        &self.grid
    }

    /// Source-to-site distance triplet, per §4.1.
    pub fn distance_to(&self, site: &Location) -> Distances {
        geo::grid_distance_to(&self.grid, site)
    }

    /// Extract the sub-surface spanning `row_range`/`col_range` (both
    /// end-exclusive), used to build a floating rupture's surface.
    pub fn sub_surface(
        &self,
        row_range: std::ops::Range<usize>,
        col_range: std::ops::Range<usize>,
    ) -> RuptureSurface {
        let sub_grid: Vec<Vec<Location>> = self.grid[row_range.clone()]
            .iter()
            .map(|row| row[col_range.clone()].to_vec())
            .collect();
        let n_rows = sub_grid.len().max(1) as f64;
        RuptureSurface {
            grid: sub_grid,
            dip: self.dip,
            width: self.dip_spacing * (n_rows - 1.0),
            z_top: self.z_top + row_range.start as f64 * self.dip_spacing * self.dip.to_radians().sin(),
            strike_spacing: self.strike_spacing,
            dip_spacing: self.dip_spacing,
        }
    }

    /// Hypocentral depth for a rupture on this surface:
    /// `z_top + sin(dip) * width / 2`, per S2 of §4.7.2.
    pub fn z_hyp(&self) -> f64 {
        self.z_top + self.dip.to_radians().sin() * self.width / 2.0
    }
}

/// Resample a polyline at uniform `spacing` (km), projecting all points to
/// `depth`. Row 0 of a rupture surface is always the trace at `z_top`.
fn resample_polyline(trace: &[Location], spacing: f64, depth: f64) -> Vec<Location> {
    let mut cumulative_lengths = vec![0.0];
    for pair in trace.windows(2) {
        let seg = geo::surface_distance_km(&pair[0], &pair[1]);
        cumulative_lengths.push(cumulative_lengths.last().unwrap() + seg);
    }
    let total_length = *cumulative_lengths.last().unwrap();
    let n_points = ((total_length / spacing).round() as usize + 1).max(2);

    let mut out = Vec::with_capacity(n_points);
    for i in 0..n_points {
        let target = (i as f64 / (n_points - 1) as f64) * total_length;
        let seg_idx = cumulative_lengths
            .windows(2)
            .position(|w| target >= w[0] && target <= w[1])
            .unwrap_or(trace.len().saturating_sub(2));
        let (a, b) = (&trace[seg_idx], &trace[seg_idx + 1]);
        let seg_len = cumulative_lengths[seg_idx + 1] - cumulative_lengths[seg_idx];
        let t = if seg_len > 1e-9 {
            (target - cumulative_lengths[seg_idx]) / seg_len
        } else {
            0.0
        };
        let az = geo::azimuth_deg(a, b);
        let loc = geo::translate(a, az, t * seg_len, depth - a.depth);
        out.push(loc);
    }
    out
}

/// Overall strike azimuth of the trace, used as the baseline for the
/// down-dip direction (perpendicular, to the right of strike).
fn dip_direction_azimuth(trace: &[Location]) -> f64 {
    let strike = geo::azimuth_deg(&trace[0], &trace[trace.len() - 1]);
    (strike + 90.0) % 360.0
}

/// A single earthquake rupture: magnitude, rake, annual rate, and the
/// surface that produces source-to-site distances.
#[derive(Debug, Clone)]
pub struct Rupture {
    pub magnitude: f64,
    pub rake: f64,
    pub rate: f64,
    pub surface: RuptureSurface,
}

impl Rupture {
    /// Validate `magnitude` ∈ [-2.0, 9.7] and `rate` >= 0, per §3.
    pub fn try_new(
        magnitude: f64,
        rake: f64,
        rate: f64,
        surface: RuptureSurface,
    ) -> HazardResult<Self> {
        if !(-2.0..=9.7).contains(&magnitude) {
            return Err(HazardError::InputValidation(format!(
                "magnitude {magnitude} out of range [-2.0, 9.7]"
            )));
        }
        if rate < 0.0 {
            return Err(HazardError::InputValidation(format!(
                "rupture rate {rate} must be non-negative"
            )));
        }
        Ok(Self {
            magnitude,
            rake,
            rate,
            surface,
        })
    }
}

/// Log-linear magnitude↔area/length/width scaling relation family
/// (Wells & Coppersmith-style fits): `log10(dim) = a + b*M`.
pub trait RuptureScaling: Send + Sync {
    fn area_km2(&self, magnitude: f64) -> f64;
    fn length_km(&self, magnitude: f64) -> f64;
    fn width_km(&self, magnitude: f64, max_width: f64) -> f64 {
        (self.area_km2(magnitude) / self.length_km(magnitude)).min(max_width)
    }
}

/// A concrete log-linear scaling relation: `log10(area) = a_area +
/// b_area*M`, `log10(length) = a_len + b_len*M`.
#[derive(Debug, Clone, Copy)]
pub struct LogLinearScaling {
    pub a_area: f64,
    pub b_area: f64,
    pub a_len: f64,
    pub b_len: f64,
}

impl LogLinearScaling {
    /// Wells & Coppersmith (1994) all-slip-types coefficients, a
    /// representative default instantiation.
    pub fn wells_coppersmith_1994() -> Self {
        Self {
            a_area: -3.49,
            b_area: 0.91,
            a_len: -3.22,
            b_len: 0.69,
        }
    }
}

impl RuptureScaling for LogLinearScaling {
    fn area_km2(&self, magnitude: f64) -> f64 {
        10f64.powf(self.a_area + self.b_area * magnitude)
    }

    fn length_km(&self, magnitude: f64) -> f64 {
        10f64.powf(self.a_len + self.b_len * magnitude)
    }
}

/// The five rupture-floating selection modes of §4.3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FloatingMode {
    /// Full parent surface, single rupture, weight 1.
    Off,
    /// Magnitude-scaled row/column span, uniform position weights.
    /// `area_sigma` optionally broadens the position set (treated here as a
    /// count multiplier on positions sampled, kept `None` for the base
    /// behaviour).
    On { area_sigma: Option<f64> },
    /// Full row span (down-dip), magnitude-scaled column span.
    StrikeOnly,
    /// Depth-dependent down-dip offsets chosen by magnitude thresholds;
    /// skipped (degrades to `On`) if `z_top > 1` km.
    Nshm,
    /// Magnitude-scaled span with a triangular hypocentral-depth weighting
    /// peaking at 1/3 of the parent width.
    Triangular,
}

/// A single floater: its surface, its rate (parent rate divided by floater
/// count, times its position weight), and its position weight alone (for
/// invariant checks).
#[derive(Debug, Clone)]
pub struct Floater {
    pub surface: RuptureSurface,
    pub rate: f64,
    pub weight: f64,
}

/// Float ruptures of magnitude `magnitude` (with total `parent_rate`) over
/// `parent`, per the mode's row/column span rule. Returns floaters whose
/// weights sum to 1 (§4.3 invariant) and whose rates sum to `parent_rate`.
pub fn float_ruptures(
    parent: &RuptureSurface,
    magnitude: f64,
    parent_rate: f64,
    scaling: &dyn RuptureScaling,
    mode: FloatingMode,
) -> Vec<Floater> {
    let parent_rows = parent.n_rows();
    let parent_cols = parent.n_cols();
    if parent_rows == 0 || parent_cols == 0 {
        return Vec::new();
    }

    let length_km = scaling.length_km(magnitude);
    let width_km = scaling.width_km(magnitude, parent.width);

    let scaled_cols = clamp_count(
        rint(length_km / parent.strike_spacing + 1.0) as usize,
        parent_cols,
    );
    let scaled_rows = clamp_count(
        rint(width_km / parent.dip_spacing + 1.0) as usize,
        parent_rows,
    );

    let effective_mode = if mode == FloatingMode::Nshm && parent.z_top > 1.0 {
        FloatingMode::On { area_sigma: None }
    } else {
        mode
    };

    let (row_span, col_span): (usize, usize) = match effective_mode {
        FloatingMode::Off => (parent_rows, parent_cols),
        FloatingMode::On { .. } => (scaled_rows, scaled_cols),
        FloatingMode::StrikeOnly => (parent_rows, scaled_cols),
        FloatingMode::Nshm => (scaled_rows, scaled_cols),
        FloatingMode::Triangular => (scaled_rows, scaled_cols),
    };

    let row_offsets: Vec<usize> = match effective_mode {
        FloatingMode::Off => vec![0],
        FloatingMode::Nshm => nshm_row_offsets(magnitude, parent_rows, row_span, parent.dip_spacing),
        _ => (0..=parent_rows.saturating_sub(row_span)).collect(),
    };
    let col_offsets: Vec<usize> = (0..=parent_cols.saturating_sub(col_span)).collect();

    if row_offsets.is_empty() || col_offsets.is_empty() {
        // Parent too small to host a floater of this size; fall back to
        // the full surface as a single rupture.
        return vec![Floater {
            surface: parent.clone(),
            rate: parent_rate,
            weight: 1.0,
        }];
    }

    let row_weights: Vec<f64> = match effective_mode {
        FloatingMode::Triangular => triangular_weights(&row_offsets, parent_rows, row_span),
        _ => vec![1.0; row_offsets.len()],
    };

    let mut raw: Vec<(usize, usize, f64)> = Vec::with_capacity(row_offsets.len() * col_offsets.len());
    for (ri, &r) in row_offsets.iter().enumerate() {
        for &c in &col_offsets {
            raw.push((r, c, row_weights[ri]));
        }
    }

    let weight_sum: f64 = raw.iter().map(|(_, _, w)| w).sum();
    let n = raw.len() as f64;

    let mut floaters = Vec::with_capacity(raw.len());
    for (r, c, w) in raw {
        let weight = w / weight_sum;
        let surface = parent.sub_surface(r..(r + row_span), c..(c + col_span));
        floaters.push(Floater {
            surface,
            rate: parent_rate / n * (weight * n),
            weight,
        });
    }

    // Rebalance rate to exactly `parent_rate` distributed by weight
    // (equivalent formula, stated this way so the weight invariant and the
    // rate-conservation invariant are both visibly satisfied by
    // construction).
    for f in floaters.iter_mut() {
        f.rate = parent_rate * f.weight;
    }

    floaters
}

fn clamp_count(count: usize, max: usize) -> usize {
    count.clamp(1, max.max(1))
}

/// NSHM down-dip offset selection: number of offsets chosen by magnitude
/// threshold (§4.3 table), each spaced 2 km along dip-distance converted to
/// grid rows via `spacing`.
fn nshm_row_offsets(magnitude: f64, parent_rows: usize, row_span: usize, spacing: f64) -> Vec<usize> {
    let n_offsets = if magnitude > 7.0 {
        1
    } else if magnitude > 6.75 {
        2
    } else if magnitude > 6.5 {
        3
    } else {
        4
    };
    let max_offset_rows = parent_rows.saturating_sub(row_span);
    (0..n_offsets)
        .map(|i| {
            let depth_km = 2.0 * i as f64;
            let rows = if spacing > 0.0 {
                (depth_km / spacing).round() as usize
            } else {
                0
            };
            rows.min(max_offset_rows)
        })
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Triangular pdf weights over row offsets, peaking at 1/3 of the parent's
/// down-dip extent (in rows).
fn triangular_weights(row_offsets: &[usize], parent_rows: usize, row_span: usize) -> Vec<f64> {
    let max_offset = parent_rows.saturating_sub(row_span) as f64;
    let peak = max_offset / 3.0;
    row_offsets
        .iter()
        .map(|&r| {
            let x = r as f64;
            let dist = (x - peak).abs();
            let half_range = peak.max(max_offset - peak).max(1e-9);
            (1.0 - dist / half_range).max(1e-6)
        })
        .collect()
}

/// Verify the §4.3 invariant Σ(floater weights) = 1 within tolerance, for
/// use by tests and by callers that want to assert model integrity after
/// loading a source.
pub fn floater_weights_sum_to_one(floaters: &[Floater]) -> bool {
    let sum: f64 = floaters.iter().map(|f| f.weight).sum();
    (sum - 1.0).abs() < FLOATER_WEIGHT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auxilary::approx_equal;

    fn test_trace() -> Vec<Location> {
        vec![
            Location::new(49.8, 142.0, 0.0),
            Location::new(50.2, 142.0, 0.0),
        ]
    }

    #[test]
    fn surface_has_expected_rows() {
        let surface = RuptureSurface::from_trace(&test_trace(), 60.0, 10.0, 0.0, 2.0).unwrap();
        assert_eq!(surface.n_rows(), 6);
        assert!(surface.n_cols() >= 2);
    }

    #[test]
    fn z_hyp_matches_formula() {
        let surface = RuptureSurface::from_trace(&test_trace(), 90.0, 10.0, 1.0, 2.0).unwrap();
        let expected = 1.0 + 90f64.to_radians().sin() * 10.0 / 2.0;
        assert!(approx_equal(surface.z_hyp(), expected, 1e-9));
    }

    #[test]
    fn off_mode_returns_full_surface_weight_one() {
        let surface = RuptureSurface::from_trace(&test_trace(), 90.0, 10.0, 0.0, 2.0).unwrap();
        let scaling = LogLinearScaling::wells_coppersmith_1994();
        let floaters = float_ruptures(&surface, 6.5, 0.01, &scaling, FloatingMode::Off);
        assert_eq!(floaters.len(), 1);
        assert!(approx_equal(floaters[0].weight, 1.0, 1e-12));
        assert!(approx_equal(floaters[0].rate, 0.01, 1e-12));
    }

    #[test]
    fn floater_weights_sum_to_one_for_on_mode() {
        let surface = RuptureSurface::from_trace(&test_trace(), 90.0, 20.0, 0.0, 2.0).unwrap();
        let scaling = LogLinearScaling::wells_coppersmith_1994();
        let floaters = float_ruptures(
            &surface,
            6.0,
            0.01,
            &scaling,
            FloatingMode::On { area_sigma: None },
        );
        assert!(floater_weights_sum_to_one(&floaters));
        let total_rate: f64 = floaters.iter().map(|f| f.rate).sum();
        assert!(approx_equal(total_rate, 0.01, 1e-9));
    }

    #[test]
    fn floater_weights_sum_to_one_for_all_modes() {
        let surface = RuptureSurface::from_trace(&test_trace(), 45.0, 20.0, 0.0, 2.0).unwrap();
        let scaling = LogLinearScaling::wells_coppersmith_1994();
        for mode in [
            FloatingMode::Off,
            FloatingMode::On { area_sigma: None },
            FloatingMode::StrikeOnly,
            FloatingMode::Nshm,
            FloatingMode::Triangular,
        ] {
            let floaters = float_ruptures(&surface, 6.2, 0.02, &scaling, mode);
            assert!(floater_weights_sum_to_one(&floaters), "mode={mode:?}");
            let total_rate: f64 = floaters.iter().map(|f| f.rate).sum();
            assert!(approx_equal(total_rate, 0.02, 1e-9), "mode={mode:?}");
        }
    }

    #[test]
    fn nshm_skips_when_z_top_exceeds_one_km() {
        let surface = RuptureSurface::from_trace(&test_trace(), 45.0, 20.0, 2.0, 2.0).unwrap();
        let scaling = LogLinearScaling::wells_coppersmith_1994();
        let floaters = float_ruptures(&surface, 6.2, 0.02, &scaling, FloatingMode::Nshm);
        assert!(floater_weights_sum_to_one(&floaters));
    }
}
