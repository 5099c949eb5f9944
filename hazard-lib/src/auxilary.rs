//! Auxiliary constants and helper functions.
//!
//! This module provides numerical constants and utility functions for
//! common operations used throughout the hazard pipeline.

/// Standard acceleration due to gravity on Earth's surface, in m/s².
pub const G_GLOBAL: f64 = 9.81;

/// Mean radius of the WGS spherical approximation of the Earth, in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default normal-distribution tail truncation, in standard deviations,
/// applied to curve calculation unless a config overrides it.
pub const DEFAULT_TRUNCATION_SIGMA: f64 = 3.0;

/// Default depth (in meters) to the subsurface layer where the shear-wave
/// velocity (Vs) reaches 1400 m/s at a site.
///
/// This value is used when no site-specific `dl` value is provided,
/// but is required by a GMPE implementation.
pub const DL: u64 = 250;

/// Relative tolerance used by logic-tree weight-sum and curve-conservation
/// invariants (§8).
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-4;

/// Tighter tolerance used for floating-rupture weight conservation checks.
pub const FLOATER_WEIGHT_TOLERANCE: f64 = 1e-6;

/// Check if two floating-point numbers are approximately equal within a given tolerance (epsilon).
///
/// # Examples
///
/// ```
/// use hazard_lib::auxilary::approx_equal;
/// assert!(approx_equal(1.00001, 1.00002, 0.0001));
/// ```
pub fn approx_equal(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Check if two floating-point numbers are approximately equal within a
/// given *relative* tolerance, falling back to an absolute comparison near
/// zero. Used for curve-conservation and deagg-sum invariants that compare
/// rates spanning many orders of magnitude.
///
/// # Examples
///
/// ```
/// use hazard_lib::auxilary::approx_equal_relative;
/// assert!(approx_equal_relative(1.0e-4, 1.0000001e-4, 1e-6));
/// ```
pub fn approx_equal_relative(a: f64, b: f64, rel_tolerance: f64) -> bool {
    let diff = (a - b).abs();
    if diff == 0.0 {
        return true;
    }
    let scale = a.abs().max(b.abs());
    if scale < 1e-300 {
        diff < rel_tolerance
    } else {
        diff / scale < rel_tolerance
    }
}

/// Round a floating-point number to a specified number of decimal places.
///
/// # Examples
///
/// ```
/// use hazard_lib::auxilary::round_to_places;
/// assert_eq!(round_to_places(3.14159, 2), 3.14);
/// ```
pub fn round_to_places(val: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    (val * factor).round() / factor
}

/// `rint`-style round-to-nearest-integer used by floating-rupture counts
/// (`rint(dim/spacing + 1)`, see §4.3).
pub fn rint(val: f64) -> f64 {
    val.round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_equal_true() {
        assert!(approx_equal(1.000001, 1.000002, 0.00001));
    }

    #[test]
    fn test_approx_equal_false() {
        assert!(!approx_equal(1.0, 1.1, 0.00001));
    }

    #[test]
    fn test_approx_equal_exact() {
        assert!(approx_equal(3.14, 3.14, 0.00001));
    }

    #[test]
    fn test_approx_equal_relative() {
        assert!(approx_equal_relative(1000.0, 1000.0005, 1e-6));
        assert!(!approx_equal_relative(1000.0, 1001.0, 1e-6));
        assert!(approx_equal_relative(0.0, 0.0, 1e-9));
    }

    #[test]
    fn test_round_to_places() {
        assert_eq!(round_to_places(3.14159, 2), 3.14);
        assert_eq!(round_to_places(3.145, 2), 3.15);
        assert_eq!(round_to_places(-3.145, 2), -3.15);
        assert_eq!(round_to_places(3.0, 2), 3.0);
    }

    #[test]
    fn test_round_zero_places() {
        assert_eq!(round_to_places(3.7, 0), 4.0);
        assert_eq!(round_to_places(3.3, 0), 3.0);
    }

    #[test]
    fn test_rint() {
        assert_eq!(rint(3.4), 3.0);
        assert_eq!(rint(3.5), 4.0);
    }
}
