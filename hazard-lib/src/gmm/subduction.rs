//! Subduction-zone GMMs: interface and intraslab variants of the point-source
//! attenuation family, each adding a depth-dependent correction term on top
//! of [`PointSourceAttenuation`].

use crate::gmm::point_source::PointSourceAttenuation;
use crate::gmm::{FieldRange, FieldRanges, Gmm, Imt};
use crate::site::{GmmInput, ScalarGroundMotion};

/// Subduction interface GMM: shallow, shield-thrust events on the
/// subducting-plate boundary. Adds a depth-scaling term relative to a
/// reference hypocentral depth.
#[derive(Debug, Clone, Copy)]
pub struct SubductionInterface {
    pub base: PointSourceAttenuation,
    /// Coefficient applied to `(z_hyp - z_ref)` in ln-space.
    pub depth_coeff: f64,
    pub z_ref: f64,
}

impl Gmm for SubductionInterface {
    fn imt(&self) -> Imt {
        self.base.imt()
    }

    fn calc(&self, input: &GmmInput) -> ScalarGroundMotion {
        let inner = self.base.calc(input);
        let z_hyp = if input.z_hyp.is_finite() {
            input.z_hyp
        } else {
            self.z_ref
        };
        let correction = self.depth_coeff * (z_hyp - self.z_ref);
        ScalarGroundMotion::new(inner.mean + correction, inner.sigma)
    }

    fn constraints(&self) -> FieldRanges {
        let mut c = self.base.constraints();
        c.r_rup = Some(FieldRange::new(0.0, 600.0));
        c
    }
}

/// Subduction intraslab GMM: deep in-slab events. Deeper events produce
/// stronger high-frequency motion, so the depth term carries the opposite
/// sign convention from [`SubductionInterface`] by construction of
/// `depth_coeff` at the preset level, not in this struct's logic.
#[derive(Debug, Clone, Copy)]
pub struct SubductionSlab {
    pub base: PointSourceAttenuation,
    pub depth_coeff: f64,
    pub z_ref: f64,
}

impl Gmm for SubductionSlab {
    fn imt(&self) -> Imt {
        self.base.imt()
    }

    fn calc(&self, input: &GmmInput) -> ScalarGroundMotion {
        let inner = self.base.calc(input);
        let z_hyp = if input.z_hyp.is_finite() {
            input.z_hyp
        } else {
            self.z_ref
        };
        let correction = self.depth_coeff * (z_hyp - self.z_ref);
        ScalarGroundMotion::new(inner.mean + correction, inner.sigma)
    }

    fn constraints(&self) -> FieldRanges {
        let mut c = self.base.constraints();
        c.r_rup = Some(FieldRange::new(0.0, 600.0));
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmm::presets::crustal_pga;

    fn input_with_depth(z_hyp: f64) -> GmmInput {
        GmmInput::new(7.0, 80.0, 80.0, 0.0, 20.0, 50.0, 10.0, z_hyp, 90.0, 400.0, false, f64::NAN, f64::NAN)
    }

    #[test]
    fn deeper_slab_event_increases_motion_for_positive_coeff() {
        let gmm = SubductionSlab {
            base: crustal_pga(),
            depth_coeff: 0.01,
            z_ref: 50.0,
        };
        let shallow = gmm.calc(&input_with_depth(60.0));
        let deep = gmm.calc(&input_with_depth(150.0));
        assert!(deep.mean > shallow.mean);
    }

    #[test]
    fn interface_matches_base_at_reference_depth() {
        let base = crustal_pga();
        let gmm = SubductionInterface {
            base,
            depth_coeff: 0.02,
            z_ref: 30.0,
        };
        let at_ref = gmm.calc(&input_with_depth(30.0));
        let plain = base.calc(&input_with_depth(30.0));
        assert!((at_ref.mean - plain.mean).abs() < 1e-9);
    }
}
