use std::collections::HashMap;
use std::sync::Arc;

use hazard_lib::config::{Config, DeaggBins};
use hazard_lib::deagg::deaggregate;
use hazard_lib::gmm::presets::crustal_pga;
use hazard_lib::gmm::{Gmm, GmmSet, Imt};
use hazard_lib::mfd::CharacteristicMfd;
use hazard_lib::pipeline::{compute_site, RunContext};
use hazard_lib::rupture::{FloatingMode, LogLinearScaling, RuptureSurface};
use hazard_lib::site::{Location, Site};
use hazard_lib::source::{FaultSource, Source, SourceSet};

fn fault_source_set(name: &str, weight: f64) -> SourceSet {
    let trace = vec![Location::new(50.0, 142.0, 0.0), Location::new(50.2, 142.2, 0.0)];
    let surface = RuptureSurface::from_trace(&trace, 60.0, 15.0, 0.0, 2.0).unwrap();
    let mfd = CharacteristicMfd {
        magnitude: 7.0,
        rate: 0.01,
    };
    let source: Box<dyn Source> = Box::new(FaultSource::new(
        surface,
        Box::new(mfd),
        90.0,
        Box::new(LogLinearScaling::wells_coppersmith_1994()),
        FloatingMode::Off,
    ));
    let gmms = GmmSet::single_model(vec![(Imt::Pga, Arc::new(crustal_pga()) as Arc<dyn Gmm>)]);
    SourceSet::new(name, vec![source], weight, gmms, 300.0)
}

fn site() -> Site {
    Site::new(Location::new(50.05, 142.05, 0.0), 400.0, true, f64::NAN, f64::NAN)
}

fn ctx() -> RunContext {
    let mut grids = HashMap::new();
    let grid: Vec<f64> = (1..=20).map(|i| 0.001 * 1.4f64.powi(i)).collect();
    grids.insert(Imt::Pga, grid);
    RunContext::new(grids, 3.0, None)
}

#[test]
fn compute_site_produces_monotone_non_increasing_curve() {
    let source_sets = vec![fault_source_set("near-fault", 1.0)];
    let result = compute_site(&ctx(), &site(), &source_sets).unwrap();
    let curve = result.get(&Imt::Pga).expect("PGA curve present");
    assert!(curve.is_non_increasing());
    assert!(curve.ys().iter().all(|y| *y >= 0.0));
}

#[test]
fn source_set_weight_scales_the_aggregated_curve() {
    let full_weight = vec![fault_source_set("set", 1.0)];
    let half_weight = vec![fault_source_set("set", 0.5)];
    let full = compute_site(&ctx(), &site(), &full_weight).unwrap();
    let half = compute_site(&ctx(), &site(), &half_weight).unwrap();
    let full_curve = full.get(&Imt::Pga).unwrap();
    let half_curve = half.get(&Imt::Pga).unwrap();
    for (f, h) in full_curve.ys().iter().zip(half_curve.ys().iter()) {
        assert!((h - f * 0.5).abs() < 1e-9 || (*f == 0.0 && *h == 0.0));
    }
}

#[test]
fn distant_site_outside_cutoff_yields_zero_curve() {
    let mut far_set = fault_source_set("far", 1.0);
    far_set.distance_cutoff_km = 1.0;
    let far_site = Site::new(Location::new(-10.0, 100.0, 0.0), 400.0, true, f64::NAN, f64::NAN);
    let result = compute_site(&ctx(), &far_site, &[far_set]).unwrap();
    let curve = result.get(&Imt::Pga).unwrap();
    assert!(curve.ys().iter().all(|y| *y == 0.0));
}

#[test]
fn deaggregation_rate_matches_hazard_curve_at_target_return_period() {
    let source_sets = vec![fault_source_set("set", 1.0)];
    let bins = DeaggBins::default();
    let result = deaggregate(&ctx(), &site(), &source_sets, &Imt::Pga, &bins, 475.0).unwrap();
    assert!(result.iml > 0.0);
    assert!((result.total_rate - 1.0 / 475.0).abs() / (1.0 / 475.0) < 0.05);
    assert!(!result.bins.is_empty());
    assert!(result.bins.iter().all(|b| b.rate > 0.0));
}

#[test]
fn config_default_roundtrips_through_run_context() {
    let mut config = Config::default();
    config.imts = vec!["PGA".to_string()];
    config
        .iml_grids
        .insert("PGA".to_string(), vec![0.01, 0.05, 0.1, 0.5]);
    let ctx = RunContext::from_config(&config).unwrap();
    assert!(ctx.iml_grid(&Imt::Pga).is_some());
    assert_eq!(ctx.imts().count(), 1);
}
