//! Named GMM presets.
//!
//! Coefficient tables for the point-source attenuation family, each entry a
//! [`PointSourceAttenuation`] tagged with an [`Imt`].

use crate::gmm::point_source::PointSourceAttenuation;
use crate::gmm::subduction::{SubductionInterface, SubductionSlab};
use crate::gmm::Imt;
use std::collections::HashMap;
use std::sync::OnceLock;

static CONFIGS: OnceLock<HashMap<&'static str, PointSourceAttenuation>> = OnceLock::new();

/// Lazily builds and returns the named point-source attenuation presets,
/// keyed by descriptive identifiers such as `"crustal_pga"` or
/// `"interplate_psa_10"`.
pub fn named_configs() -> &'static HashMap<&'static str, PointSourceAttenuation> {
    CONFIGS.get_or_init(|| {
        let mut map = HashMap::new();

        map.insert(
            "crustal_pga",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.5507,
                b: -0.004531,
                c: 0.4631,
                d: 0.006875,
                e: 0.5,
                sigma: 0.377556,
                pd: 0.0663,
                dl_min: 100.,
                d0: 250.,
                ps: -0.3709,
                vs_max: 1950.00,
                v0: 350.,
                gamma: 0.00007602,
                asid: false,
                imt: Imt::Pga,
            },
        );

        map.insert(
            "crustal_pga_2",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.87,
                b: -0.0038,
                c: -1.726,
                d: 0.006,
                e: 0.5,
                sigma: 0.34,
                pd: 0.0663,
                dl_min: 100.,
                d0: 250.,
                ps: -0.3709,
                vs_max: 1950.,
                v0: 350.,
                gamma: 0.00007602,
                asid: false,
                imt: Imt::Pga,
            },
        );

        map.insert(
            "interplate_pga",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.5507,
                b: -0.004716,
                c: 0.5418,
                d: 0.006875,
                e: 0.5,
                sigma: 0.377556,
                pd: 0.0663,
                dl_min: 100.,
                d0: 250.,
                ps: -0.3709,
                vs_max: 1950.,
                v0: 350.,
                gamma: 0.00007602,
                asid: false,
                imt: Imt::Pga,
            },
        );

        map.insert(
            "intraplate_pga",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.5507,
                b: -0.005273,
                c: 0.9338,
                d: 0.006875,
                e: 0.5,
                sigma: 0.377556,
                pd: 0.0663,
                dl_min: 100.,
                d0: 250.,
                ps: -0.3709,
                vs_max: 1950.,
                v0: 350.,
                gamma: 0.00007602,
                asid: false,
                imt: Imt::Pga,
            },
        );

        map.insert(
            "intraplate_pga_asid",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.5507,
                b: -0.005273,
                c: 0.9338,
                d: 0.006875,
                e: 0.5,
                sigma: 0.377556,
                pd: 0.0663,
                dl_min: 100.,
                d0: 250.,
                ps: -0.3709,
                vs_max: 1950.,
                v0: 350.,
                gamma: 0.00007602,
                asid: true,
                imt: Imt::Pga,
            },
        );

        map.insert(
            "crustal_pgv",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.6014,
                b: -0.002602,
                c: -1.1779,
                d: 0.002109,
                e: 0.5,
                sigma: 0.341184,
                pd: 0.2317,
                dl_min: 60.,
                d0: 250.,
                ps: -0.5546,
                vs_max: 1100.,
                v0: 350.,
                gamma: 0.00004693,
                asid: false,
                imt: Imt::Pgv,
            },
        );

        map.insert(
            "interplate_pgv",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.6014,
                b: -0.002375,
                c: -1.2682,
                d: 0.002109,
                e: 0.5,
                sigma: 0.341184,
                pd: 0.2317,
                dl_min: 60.,
                d0: 250.,
                ps: -0.5546,
                vs_max: 1100.,
                v0: 350.,
                gamma: 0.00004693,
                asid: false,
                imt: Imt::Pgv,
            },
        );

        map.insert(
            "intraplate_pgv",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.6014,
                b: -0.003435,
                c: -0.8601,
                d: 0.002109,
                e: 0.5,
                sigma: 0.341184,
                pd: 0.2317,
                dl_min: 60.,
                d0: 250.,
                ps: -0.5546,
                vs_max: 1100.,
                v0: 350.,
                gamma: 0.00004693,
                asid: false,
                imt: Imt::Pgv,
            },
        );

        map.insert(
            "crustal_psa_03",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.563,
                b: -0.004033,
                c: 0.639,
                d: 0.005205,
                e: 0.5,
                sigma: 0.407229,
                pd: 0.1006,
                dl_min: 21.,
                d0: 250.,
                ps: -0.6217,
                vs_max: 2000.,
                v0: 350.,
                gamma: 0.00007711,
                asid: false,
                imt: Imt::Sa(0.3),
            },
        );

        map.insert(
            "interplate_psa_03",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.563,
                b: -0.00388,
                c: 0.6544,
                d: 0.005205,
                e: 0.5,
                sigma: 0.407229,
                pd: 0.1006,
                dl_min: 21.,
                d0: 250.,
                ps: -0.6217,
                vs_max: 2000.,
                v0: 350.,
                gamma: 0.00007711,
                asid: false,
                imt: Imt::Sa(0.3),
            },
        );

        map.insert(
            "intraplate_psa_03",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.563,
                b: -0.004427,
                c: 1.0482,
                d: 0.005205,
                e: 0.5,
                sigma: 0.407229,
                pd: 0.1006,
                dl_min: 21.,
                d0: 250.,
                ps: -0.6217,
                vs_max: 2000.,
                v0: 350.,
                gamma: 0.00007711,
                asid: false,
                imt: Imt::Sa(0.3),
            },
        );

        map.insert(
            "crustal_psa_10",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.6011,
                b: -0.001955,
                c: -0.2766,
                d: 0.00055,
                e: 0.5,
                sigma: 0.410513,
                pd: 0.2744,
                dl_min: 39.32,
                d0: 250.,
                ps: -0.6755,
                vs_max: 1423.23,
                v0: 350.,
                gamma: 0.00005324,
                asid: false,
                imt: Imt::Sa(1.0),
            },
        );

        map.insert(
            "interplate_psa_10",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.6011,
                b: -0.001256,
                c: -0.4191,
                d: 0.00055,
                e: 0.5,
                sigma: 0.410513,
                pd: 0.2744,
                dl_min: 39.32,
                d0: 250.,
                ps: -0.6755,
                vs_max: 1423.23,
                v0: 350.,
                gamma: 0.00005324,
                asid: false,
                imt: Imt::Sa(1.0),
            },
        );

        map.insert(
            "intraplate_psa_10",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.6011,
                b: -0.00229,
                c: -0.024,
                d: 0.00055,
                e: 0.5,
                sigma: 0.410513,
                pd: 0.2744,
                dl_min: 39.32,
                d0: 250.,
                ps: -0.6755,
                vs_max: 1423.23,
                v0: 350.,
                gamma: 0.00005324,
                asid: false,
                imt: Imt::Sa(1.0),
            },
        );

        map.insert(
            "crustal_psa_30",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.7089,
                b: -0.001276,
                c: -1.6579,
                d: 0.001021,
                e: 0.5,
                sigma: 0.379064,
                pd: 0.3996,
                dl_min: 69.69,
                d0: 250.,
                ps: -0.4398,
                vs_max: 864.01,
                v0: 350.,
                gamma: 0.00002548,
                asid: false,
                imt: Imt::Sa(3.0),
            },
        );

        map.insert(
            "interplate_psa_30",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.7089,
                b: -0.00047,
                c: -1.9088,
                d: 0.001021,
                e: 0.5,
                sigma: 0.379064,
                pd: 0.3996,
                dl_min: 69.69,
                d0: 250.,
                ps: -0.4398,
                vs_max: 864.01,
                v0: 350.,
                gamma: 0.00002548,
                asid: false,
                imt: Imt::Sa(3.0),
            },
        );

        map.insert(
            "intraplate_psa_30",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.7089,
                b: -0.001086,
                c: -1.5998,
                d: 0.001021,
                e: 0.5,
                sigma: 0.379064,
                pd: 0.3996,
                dl_min: 69.69,
                d0: 250.,
                ps: -0.4398,
                vs_max: 864.01,
                v0: 350.,
                gamma: 0.00002548,
                asid: false,
                imt: Imt::Sa(3.0),
            },
        );

        map.insert(
            "ab1995",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.344,
                b: -0.0014,
                c: 1.141,
                d: 0.0005,
                e: 0.5,
                sigma: 0.308,
                pd: 0.0663,
                dl_min: 100.,
                d0: 250.,
                ps: -0.3709,
                vs_max: 1950.,
                v0: 350.,
                gamma: 0.00007602,
                asid: false,
                imt: Imt::Pga,
            },
        );

        map.insert(
            "as1997",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.505,
                b: -0.0029,
                c: 0.41,
                d: 0.0026,
                e: 0.5,
                sigma: 0.272,
                pd: 0.0663,
                dl_min: 100.,
                d0: 250.,
                ps: -0.3709,
                vs_max: 1950.,
                v0: 350.,
                gamma: 0.00007602,
                asid: false,
                imt: Imt::Pga,
            },
        );

        map.insert(
            "asb2013",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.495,
                b: -0.0041,
                c: 0.468,
                d: 0.004,
                e: 0.5,
                sigma: 0.321,
                pd: 0.0663,
                dl_min: 100.,
                d0: 250.,
                ps: -0.3709,
                vs_max: 1950.,
                v0: 350.,
                gamma: 0.00007602,
                asid: false,
                imt: Imt::Pga,
            },
        );

        map.insert(
            "jsgga2022",
            PointSourceAttenuation {
                mw0: 8.1,
                a: 0.447,
                b: -0.0021,
                c: 0.81,
                d: 0.0006,
                e: 0.5,
                sigma: 0.355,
                pd: 0.0663,
                dl_min: 100.,
                d0: 250.,
                ps: -0.3709,
                vs_max: 1950.,
                v0: 350.,
                gamma: 0.00007602,
                asid: false,
                imt: Imt::Pga,
            },
        );

        map
    })
}

/// Convenience accessor for the crustal PGA preset — used throughout the
/// unit test suite as a representative GMM.
pub fn crustal_pga() -> PointSourceAttenuation {
    *named_configs().get("crustal_pga").expect("built-in preset")
}

/// A subduction interface preset built on the crustal PGA coefficients, with
/// a modest positive depth term.
pub fn interface_pga() -> SubductionInterface {
    SubductionInterface {
        base: *named_configs().get("interplate_pga").expect("built-in preset"),
        depth_coeff: 0.015,
        z_ref: 30.0,
    }
}

/// A subduction intraslab preset built on the intraplate PGA coefficients,
/// whose stronger depth term reflects deeper, higher-frequency-rich events.
pub fn slab_pga() -> SubductionSlab {
    SubductionSlab {
        base: *named_configs().get("intraplate_pga").expect("built-in preset"),
        depth_coeff: 0.03,
        z_ref: 60.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_configs_contains_expected_keys() {
        let configs = named_configs();
        assert!(configs.contains_key("crustal_pga"));
        assert!(configs.contains_key("intraplate_psa_30"));
        assert_eq!(configs.len(), 21);
    }

    #[test]
    fn crustal_pga_preset_is_bound_to_pga() {
        assert_eq!(crustal_pga().imt, Imt::Pga);
    }
}
