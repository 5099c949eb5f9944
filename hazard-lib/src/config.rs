//! Run configuration (§6 config keys).
//!
//! A serde-deserializable structure bound to the recognized config keys,
//! with defaults matching the documented fallbacks. JSON is the on-disk
//! format, consistent with [`crate::writers`] also emitting `config.json`.

use crate::gmm::Imt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `performance.threadCount` values (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadCount {
    One,
    Two,
    Half,
    AllButOne,
    All,
}

impl ThreadCount {
    /// Resolve against the machine's available parallelism.
    pub fn resolve(&self, available: usize) -> usize {
        let available = available.max(1);
        match self {
            ThreadCount::One => 1,
            ThreadCount::Two => 2.min(available),
            ThreadCount::Half => (available / 2).max(1),
            ThreadCount::AllButOne => available.saturating_sub(1).max(1),
            ThreadCount::All => available,
        }
    }
}

impl Default for ThreadCount {
    fn default() -> Self {
        ThreadCount::AllButOne
    }
}

/// `hazard.valueFormat` (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueFormat {
    AnnualRate,
    PoissonProb,
}

impl Default for ValueFormat {
    fn default() -> Self {
        ValueFormat::AnnualRate
    }
}

/// `deagg.bins` (§6): bin edges for the (R, M, ε) histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeaggBins {
    pub r_min: f64,
    pub r_max: f64,
    pub delta_r: f64,
    pub m_min: f64,
    pub m_max: f64,
    pub delta_m: f64,
    pub epsilon_min: f64,
    pub epsilon_max: f64,
    pub delta_epsilon: f64,
}

impl Default for DeaggBins {
    fn default() -> Self {
        Self {
            r_min: 0.0,
            r_max: 300.0,
            delta_r: 10.0,
            m_min: 5.0,
            m_max: 9.0,
            delta_m: 0.25,
            epsilon_min: -3.0,
            epsilon_max: 3.0,
            delta_epsilon: 0.5,
        }
    }
}

/// The effective run configuration, bound from the recognized §6 config
/// keys, written back out verbatim as `config.json` by [`crate::writers`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `hazard.imts` — IMTs to compute, by display name ("PGA", "PGV",
    /// "SA(0.2)", ...). Resolution to [`Imt`] happens at load time.
    pub imts: Vec<String>,
    /// `hazard.iml.<imt>` — the IML grid per IMT, keyed the same way.
    pub iml_grids: HashMap<String, Vec<f64>>,
    /// `hazard.truncation` — normal tail truncation in σ; 0 disables it.
    pub truncation: f64,
    pub value_format: ValueFormat,
    /// `hazard.distanceCutoffs` — per-source-type cutoff in km, keyed by
    /// [`crate::source::SourceType::as_str`].
    pub distance_cutoffs: HashMap<String, f64>,
    pub thread_count: ThreadCount,
    pub deagg_bins: DeaggBins,
    /// `deagg.returnPeriod` — years.
    pub deagg_return_period: f64,
    pub output_directory: String,
    /// `output.flushLimit` — sites per batch before a partial flush.
    pub output_flush_limit: usize,
    /// Wall-clock bound on the reducer (§5); `None` means no timeout.
    pub timeout_seconds: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let mut distance_cutoffs = HashMap::new();
        for kind in ["FAULT", "GRID", "CLUSTER", "INTERFACE", "SLAB", "AREA"] {
            distance_cutoffs.insert(kind.to_string(), 200.0);
        }
        Self {
            imts: vec!["PGA".to_string()],
            iml_grids: HashMap::new(),
            truncation: crate::auxilary::DEFAULT_TRUNCATION_SIGMA,
            value_format: ValueFormat::default(),
            distance_cutoffs,
            thread_count: ThreadCount::default(),
            deagg_bins: DeaggBins::default(),
            deagg_return_period: 2475.0,
            output_directory: "output".to_string(),
            output_flush_limit: 100,
            timeout_seconds: None,
        }
    }
}

impl Config {
    /// Parse an IMT display name ("PGA", "PGV", "SA(0.2)") into an [`Imt`].
    pub fn parse_imt(name: &str) -> Option<Imt> {
        if name.eq_ignore_ascii_case("PGA") {
            return Some(Imt::Pga);
        }
        if name.eq_ignore_ascii_case("PGV") {
            return Some(Imt::Pgv);
        }
        let inner = name.strip_prefix("SA(").and_then(|s| s.strip_suffix(')'))?;
        inner.parse::<f64>().ok().map(Imt::Sa)
    }

    /// The distance cutoff for a source type, falling back to 200 km if the
    /// config doesn't mention it.
    pub fn cutoff_for(&self, source_type: &str) -> f64 {
        self.distance_cutoffs
            .get(source_type)
            .copied()
            .unwrap_or(200.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_imt_handles_all_variants() {
        assert_eq!(Config::parse_imt("PGA"), Some(Imt::Pga));
        assert_eq!(Config::parse_imt("pgv"), Some(Imt::Pgv));
        assert_eq!(Config::parse_imt("SA(0.2)"), Some(Imt::Sa(0.2)));
        assert_eq!(Config::parse_imt("garbage"), None);
    }

    #[test]
    fn thread_count_resolves_against_available() {
        assert_eq!(ThreadCount::One.resolve(8), 1);
        assert_eq!(ThreadCount::Half.resolve(8), 4);
        assert_eq!(ThreadCount::AllButOne.resolve(8), 7);
        assert_eq!(ThreadCount::All.resolve(8), 8);
        assert_eq!(ThreadCount::AllButOne.resolve(1), 1);
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let cfg = Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.truncation, back.truncation);
        assert_eq!(cfg.output_directory, back.output_directory);
    }
}
