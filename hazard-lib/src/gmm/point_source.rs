//! Point-source attenuation GMM family.
//!
//! Magnitude/distance/site-amplification/deep-layer/ASID coefficient shape,
//! consuming a [`GmmInput`] (`r_rup` is pre-computed from the rupture
//! surface) and returning natural-log (mean, sigma) per the [`Gmm`]
//! contract.

use crate::auxilary::{DL, G_GLOBAL};
use crate::gmm::{FieldRange, FieldRanges, Gmm, Imt};
use crate::site::{GmmInput, ScalarGroundMotion};

/// Morikawa & Fujiwara (2013)-family point-source GMPE coefficients.
#[derive(Debug, Clone, Copy)]
pub struct PointSourceAttenuation {
    /// Magnitude upper limit (Mw0).
    pub mw0: f64,
    /// Coefficient for magnitude scaling.
    pub a: f64,
    /// Coefficient for distance scaling.
    pub b: f64,
    /// Constant term.
    pub c: f64,
    /// Distance damping parameter.
    pub d: f64,
    /// Exponent scaling factor for distance damping.
    pub e: f64,
    /// Total standard deviation of log ground motion.
    pub sigma: f64,
    /// Coefficient for deep sedimentary layer correction.
    pub pd: f64,
    /// Minimum depth for deep sedimentary layer correction, in meters.
    pub dl_min: f64,
    /// Reference depth for deep layer correction, in meters.
    pub d0: f64,
    /// Coefficient for Vs30 amplification term.
    pub ps: f64,
    /// Maximum Vs30 considered for amplification.
    pub vs_max: f64,
    /// Reference Vs30 value.
    pub v0: f64,
    /// Coefficient for anomalous seismic intensity distribution (ASID).
    pub gamma: f64,
    /// Whether the ASID correction is enabled.
    pub asid: bool,
    pub imt: Imt,
}

impl PointSourceAttenuation {
    /// Physical-unit ground motion (cm/s² for PGA/SA, cm/s for PGV),
    /// before the ln(g) conversion the [`Gmm`] contract requires.
    fn physical_median(&self, input: &GmmInput) -> f64 {
        let r_rup = input.r_rup.max(1e-3);
        let magnitude = input.m.min(self.mw0);
        let a_m_w = self.a * magnitude;

        let dl = if input.z1p0.is_finite() {
            (input.z1p0 * 1000.0).max(0.0)
        } else {
            DL as f64
        };
        let g_d = self.pd * (dl.max(self.dl_min) / self.d0).log10();

        let log_a = (a_m_w + self.b * r_rup + self.c)
            - (r_rup + self.d * 10f64.powf(self.e * magnitude)).log10();
        let log_agd = log_a + g_d;

        let vs30 = if input.vs30.is_finite() {
            input.vs30
        } else {
            self.v0
        };
        let gs = self.ps * (vs30.min(self.vs_max) / self.v0).log10();
        let log_ags = log_agd + gs;

        if self.asid {
            let xvf = if input.rake.is_finite() && input.rake != 0.0 {
                1.0
            } else {
                0.0
            };
            let ai = self.gamma + xvf * (input.z_hyp - 30.0);
            10f64.powf(log_ags + ai)
        } else {
            10f64.powf(log_ags)
        }
    }
}

impl Gmm for PointSourceAttenuation {
    fn imt(&self) -> Imt {
        self.imt
    }

    fn calc(&self, input: &GmmInput) -> ScalarGroundMotion {
        let physical = self.physical_median(input);
        // Convert cm/s^2 to g for PGA/SA; PGV stays in cm/s.
        let in_g = match self.imt {
            Imt::Pgv => physical,
            _ => (physical / 100.0) / G_GLOBAL,
        };
        ScalarGroundMotion::new(in_g.max(1e-12).ln(), self.sigma)
    }

    fn constraints(&self) -> FieldRanges {
        FieldRanges {
            magnitude: Some(FieldRange::new(-2.0, self.mw0)),
            r_rup: Some(FieldRange::new(0.0, 400.0)),
            vs30: Some(FieldRange::new(50.0, self.vs_max)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmm::presets::crustal_pga;

    fn sample_input(m: f64, r_rup: f64) -> GmmInput {
        GmmInput::new(m, r_rup, r_rup, 0.0, 90.0, 10.0, 0.0, 5.0, 90.0, 350.0, false, f64::NAN, f64::NAN)
    }

    #[test]
    fn calc_is_pure() {
        let gmm = crustal_pga();
        let input = sample_input(6.5, 20.0);
        let first = gmm.calc(&input);
        for _ in 0..1000 {
            let again = gmm.calc(&input);
            assert_eq!(first.mean.to_bits(), again.mean.to_bits());
            assert_eq!(first.sigma.to_bits(), again.sigma.to_bits());
        }
    }

    #[test]
    fn larger_magnitude_increases_median() {
        let gmm = crustal_pga();
        let small = gmm.calc(&sample_input(5.5, 20.0));
        let large = gmm.calc(&sample_input(7.5, 20.0));
        assert!(large.mean > small.mean);
    }

    #[test]
    fn larger_distance_decreases_median() {
        let gmm = crustal_pga();
        let near = gmm.calc(&sample_input(6.5, 10.0));
        let far = gmm.calc(&sample_input(6.5, 100.0));
        assert!(far.mean < near.mean);
    }
}
