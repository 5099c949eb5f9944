//! Basin-amplification wrapper GMM.
//!
//! Wraps any inner [`Gmm`] and adds a simple deep-basin amplification term
//! driven by the site's `z2p5` (depth to Vs=2.5 km/s). Sites without a
//! resolved basin depth (`z2p5` is `NaN`) pass through unmodified.

use crate::gmm::{FieldRanges, Gmm, Imt};
use crate::site::{GmmInput, ScalarGroundMotion};
use std::sync::Arc;

/// Amplifies an inner GMM's output by a basin-depth-dependent term. Generic
/// over the inner model so it composes with any [`Gmm`], matching the way a
/// basin term is bolted onto a base attenuation relation rather than
/// duplicated across every attenuation family.
#[derive(Clone)]
pub struct BasinAmplified<G: Gmm> {
    pub inner: G,
    /// Reference basin depth (km) at which no amplification is applied.
    pub z2p5_ref: f64,
    /// Coefficient applied to `ln(z2p5 / z2p5_ref)`.
    pub coeff: f64,
}

impl<G: Gmm> BasinAmplified<G> {
    pub fn new(inner: G, z2p5_ref: f64, coeff: f64) -> Self {
        Self {
            inner,
            z2p5_ref,
            coeff,
        }
    }
}

impl<G: Gmm> Gmm for BasinAmplified<G> {
    fn imt(&self) -> Imt {
        self.inner.imt()
    }

    fn calc(&self, input: &GmmInput) -> ScalarGroundMotion {
        let base = self.inner.calc(input);
        if !input.z2p5.is_finite() || input.z2p5 <= 0.0 {
            return base;
        }
        let amp = self.coeff * (input.z2p5 / self.z2p5_ref).ln();
        ScalarGroundMotion::new(base.mean + amp, base.sigma)
    }

    fn constraints(&self) -> FieldRanges {
        self.inner.constraints()
    }
}

/// Type-erased alias used where a `BasinAmplified` wraps a dynamic inner
/// model (e.g. when built from a preset at runtime rather than a concrete
/// type parameter).
pub type DynBasinAmplified = BasinAmplified<Arc<dyn Gmm>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmm::presets::crustal_pga;

    fn input_with_z2p5(z2p5: f64) -> GmmInput {
        GmmInput::new(6.5, 20.0, 20.0, 0.0, 90.0, 10.0, 0.0, 5.0, 90.0, 350.0, false, f64::NAN, z2p5)
    }

    #[test]
    fn passthrough_when_z2p5_absent() {
        let base = crustal_pga();
        let wrapped = BasinAmplified::new(base, 1.0, 0.3);
        let plain = base.calc(&input_with_z2p5(f64::NAN));
        let amped = wrapped.calc(&input_with_z2p5(f64::NAN));
        assert_eq!(plain.mean, amped.mean);
    }

    #[test]
    fn deeper_basin_amplifies_positive_coeff() {
        let base = crustal_pga();
        let wrapped = BasinAmplified::new(base, 1.0, 0.3);
        let shallow = wrapped.calc(&input_with_z2p5(1.0));
        let deep = wrapped.calc(&input_with_z2p5(3.0));
        assert!(deep.mean > shallow.mean);
    }
}
