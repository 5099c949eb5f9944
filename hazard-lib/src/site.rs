//! Site and source-site input records (§3).
//!
//! [`Location`] and [`Site`] describe a point of interest; [`GmmInput`] is
//! the flattened per-rupture record a GMM actually consumes, carrying full
//! rupture geometry (rJB/rRup/rX, magnitude, rake) rather than just a
//! source-to-site epicentral distance.

use crate::error::{HazardError, HazardResult};
use serde::{Deserialize, Serialize};

/// A point on (or above/below) the Earth's surface.
///
/// Invariant: `lat` ∈ [-90, 90], `lon` ∈ [-180, 180], `depth` ∈ [-5, 700] km,
/// positive-down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub depth: f64,
}

impl Location {
    /// Build a location, validating the §3 range invariant.
    pub fn try_new(lat: f64, lon: f64, depth: f64) -> HazardResult<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(HazardError::InputValidation(format!(
                "latitude {lat} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(HazardError::InputValidation(format!(
                "longitude {lon} out of range [-180, 180]"
            )));
        }
        if !(-5.0..=700.0).contains(&depth) {
            return Err(HazardError::InputValidation(format!(
                "depth {depth} out of range [-5, 700] km"
            )));
        }
        Ok(Self { lat, lon, depth })
    }

    /// Build a location without validation. Intended for internal geometry
    /// code (gridded surface construction) operating on already-validated
    /// trace points, where propagating a `Result` through every grid cell
    /// would obscure the algorithm.
    pub fn new(lat: f64, lon: f64, depth: f64) -> Self {
        Self { lat, lon, depth }
    }
}

/// Site characterization: a [`Location`] plus the parameters a GMM needs
/// about local soil conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub location: Location,
    /// Average shear-wave velocity in the top 30 m, in m/s.
    pub vs30: f64,
    /// Whether `vs30` was measured or inferred from geology/slope proxies.
    pub vs_inferred: bool,
    /// Depth to Vs=1.0 km/s, in km. `NaN` means "use GMM default".
    pub z1p0: f64,
    /// Depth to Vs=2.5 km/s, in km. `NaN` means "use GMM default".
    pub z2p5: f64,
}

impl Site {
    pub fn new(location: Location, vs30: f64, vs_inferred: bool, z1p0: f64, z2p5: f64) -> Self {
        Self {
            location,
            vs30,
            vs_inferred,
            z1p0,
            z2p5,
        }
    }

    /// Build a site with default (NaN) basin depths.
    pub fn with_vs30(location: Location, vs30: f64, vs_inferred: bool) -> Self {
        Self::new(location, vs30, vs_inferred, f64::NAN, f64::NAN)
    }
}

/// The flattened source-site parameter record consumed by a GMM.
///
/// Any field may be `NaN` (for floats) or otherwise absent, meaning
/// "model-default"; a GMM implementation is responsible for substituting
/// its own default and may additionally report [`HazardError::InputOutOfRange`]
/// when a present value falls outside its declared domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GmmInput {
    pub m: f64,
    pub r_jb: f64,
    pub r_rup: f64,
    pub r_x: f64,
    pub dip: f64,
    pub width: f64,
    pub z_top: f64,
    pub z_hyp: f64,
    pub rake: f64,
    pub vs30: f64,
    pub vs_inferred: bool,
    pub z1p0: f64,
    pub z2p5: f64,
}

impl GmmInput {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        m: f64,
        r_jb: f64,
        r_rup: f64,
        r_x: f64,
        dip: f64,
        width: f64,
        z_top: f64,
        z_hyp: f64,
        rake: f64,
        vs30: f64,
        vs_inferred: bool,
        z1p0: f64,
        z2p5: f64,
    ) -> Self {
        Self {
            m,
            r_jb,
            r_rup,
            r_x,
            dip,
            width,
            z_top,
            z_hyp,
            rake,
            vs30,
            vs_inferred,
            z1p0,
            z2p5,
        }
    }
}

/// A lognormal ground-motion distribution: `mean` = ln(median ground motion
/// in g), `sigma` = log-standard-deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarGroundMotion {
    pub mean: f64,
    pub sigma: f64,
}

impl ScalarGroundMotion {
    pub fn new(mean: f64, sigma: f64) -> Self {
        Self { mean, sigma }
    }

    /// `true` if either field is non-finite — the pipeline treats this as
    /// an [`HazardError::ArithmeticDegenerate`] condition and drops the
    /// contributing rupture.
    pub fn is_degenerate(&self) -> bool {
        !self.mean.is_finite() || !self.sigma.is_finite() || self.sigma <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_rejects_bad_lat() {
        assert!(Location::try_new(91.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn location_accepts_boundary_values() {
        assert!(Location::try_new(-90.0, -180.0, 700.0).is_ok());
        assert!(Location::try_new(90.0, 180.0, -5.0).is_ok());
    }

    #[test]
    fn degenerate_ground_motion_detected() {
        let gm = ScalarGroundMotion::new(f64::NAN, 0.5);
        assert!(gm.is_degenerate());
        let gm = ScalarGroundMotion::new(-1.0, 0.0);
        assert!(gm.is_degenerate());
        let gm = ScalarGroundMotion::new(-1.0, 0.5);
        assert!(!gm.is_degenerate());
    }
}
