//! Source model loading: turns a model directory's `model.json` manifest
//! into the `Vec<SourceSet>` the pipeline runs against.
//!
//! Model *authoring* is out of scope (spec's Non-goals); this module only
//! resolves a plain-data description into the library's runtime types —
//! sources, MFDs, and GMM assignments pulled from `hazard_lib::gmm::presets`
//! by name.

use hazard_lib::error::{HazardError, HazardResult};
use hazard_lib::gmm::presets::named_configs;
use hazard_lib::gmm::{Gmm, GmmSet, Imt};
use hazard_lib::logic_tree::LogicTreeBuilder;
use hazard_lib::mfd::{CharacteristicMfd, GutenbergRichterMfd, Mfd};
use hazard_lib::rupture::{FloatingMode, LogLinearScaling, RuptureSurface};
use hazard_lib::site::Location;
use hazard_lib::source::{ClusterAlternative, ClusterSource, FaultSource, GridCell, GridSource, Source, SourceSet};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ManifestFile {
    source_sets: Vec<SourceSetDef>,
}

#[derive(Debug, Deserialize)]
struct SourceSetDef {
    name: String,
    #[serde(default = "default_weight")]
    weight: f64,
    #[serde(default)]
    distance_cutoff_km: Option<f64>,
    /// IMT display name -> branch list (name, weight, gmm preset name).
    gmms: std::collections::HashMap<String, Vec<GmmBranchDef>>,
    sources: Vec<SourceDef>,
}

#[derive(Debug, Deserialize)]
struct GmmBranchDef {
    #[serde(default = "default_branch_id")]
    id: String,
    #[serde(default = "default_weight")]
    weight: f64,
    preset: String,
}

fn default_weight() -> f64 {
    1.0
}

fn default_branch_id() -> String {
    "only".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum MfdDef {
    Characteristic { magnitude: f64, rate: f64 },
    GutenbergRichter { a: f64, b: f64, m_min: f64, m_max: f64, bin_width: f64 },
}

impl MfdDef {
    fn build(&self) -> Box<dyn Mfd> {
        match self {
            MfdDef::Characteristic { magnitude, rate } => Box::new(CharacteristicMfd {
                magnitude: *magnitude,
                rate: *rate,
            }),
            MfdDef::GutenbergRichter { a, b, m_min, m_max, bin_width } => Box::new(GutenbergRichterMfd {
                a: *a,
                b: *b,
                m_min: *m_min,
                m_max: *m_max,
                bin_width: *bin_width,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum SourceDef {
    Fault {
        trace: Vec<[f64; 2]>,
        dip: f64,
        width: f64,
        z_top: f64,
        spacing: f64,
        rake: f64,
        mfd: MfdDef,
        #[serde(default)]
        is_slab: Option<bool>,
        #[serde(default)]
        is_interface: Option<bool>,
    },
    Grid {
        cells: Vec<GridCellDef>,
    },
    Area {
        cells: Vec<GridCellDef>,
    },
    Cluster {
        alternatives: Vec<ClusterAlternativeDef>,
    },
}

#[derive(Debug, Deserialize)]
struct GridCellDef {
    lat: f64,
    lon: f64,
    depth: f64,
    rake: f64,
    mfd: MfdDef,
}

#[derive(Debug, Deserialize)]
struct ClusterAlternativeDef {
    weight: f64,
    ruptures: Vec<ClusterRuptureDef>,
}

#[derive(Debug, Deserialize)]
struct ClusterRuptureDef {
    magnitude: f64,
    rake: f64,
    rate: f64,
    trace: Vec<[f64; 2]>,
    dip: f64,
    width: f64,
    z_top: f64,
    spacing: f64,
}

fn trace_locations(trace: &[[f64; 2]]) -> Vec<Location> {
    trace.iter().map(|[lat, lon]| Location::new(*lat, *lon, 0.0)).collect()
}

impl SourceDef {
    fn build(self) -> HazardResult<Box<dyn Source>> {
        match self {
            SourceDef::Fault { trace, dip, width, z_top, spacing, rake, mfd, is_slab, is_interface } => {
                let surface = RuptureSurface::from_trace(&trace_locations(&trace), dip, width, z_top, spacing)?;
                let scaling = Box::new(LogLinearScaling::wells_coppersmith_1994());
                let source: Box<dyn Source> = if is_slab.unwrap_or(false) {
                    Box::new(FaultSource::new_subduction(surface, mfd.build(), rake, scaling, FloatingMode::Off, true))
                } else if is_interface.unwrap_or(false) {
                    Box::new(FaultSource::new_subduction(surface, mfd.build(), rake, scaling, FloatingMode::Off, false))
                } else {
                    Box::new(FaultSource::new(surface, mfd.build(), rake, scaling, FloatingMode::Off))
                };
                Ok(source)
            }
            SourceDef::Grid { cells } => Ok(Box::new(GridSource::new(build_cells(cells)))),
            SourceDef::Area { cells } => Ok(Box::new(GridSource::new_area(build_cells(cells)))),
            SourceDef::Cluster { alternatives } => {
                let mut built = Vec::with_capacity(alternatives.len());
                for alt in alternatives {
                    let mut ruptures = Vec::with_capacity(alt.ruptures.len());
                    for r in alt.ruptures {
                        let surface =
                            RuptureSurface::from_trace(&trace_locations(&r.trace), r.dip, r.width, r.z_top, r.spacing)?;
                        ruptures.push(hazard_lib::rupture::Rupture::try_new(r.magnitude, r.rake, r.rate, surface)?);
                    }
                    built.push(ClusterAlternative { weight: alt.weight, ruptures });
                }
                Ok(Box::new(ClusterSource::new(built)))
            }
        }
    }
}

fn build_cells(defs: Vec<GridCellDef>) -> Vec<GridCell> {
    defs.into_iter()
        .map(|c| GridCell {
            location: Location::new(c.lat, c.lon, c.depth),
            mfd: c.mfd.build(),
            rake: c.rake,
        })
        .collect()
}

fn resolve_gmm(preset_name: &str) -> HazardResult<Arc<dyn Gmm>> {
    named_configs()
        .get(preset_name)
        .map(|cfg| Arc::new(*cfg) as Arc<dyn Gmm>)
        .ok_or_else(|| HazardError::ModelIntegrity(format!("unknown GMM preset '{preset_name}'")))
}

fn parse_imt(name: &str) -> HazardResult<Imt> {
    hazard_lib::config::Config::parse_imt(name)
        .ok_or_else(|| HazardError::ModelIntegrity(format!("unrecognized IMT '{name}' in model manifest")))
}

fn build_gmm_set(defs: std::collections::HashMap<String, Vec<GmmBranchDef>>) -> HazardResult<GmmSet> {
    let mut set = GmmSet::new();
    for (imt_name, branches) in defs {
        let imt = parse_imt(&imt_name)?;
        let mut builder = LogicTreeBuilder::new();
        for branch in branches {
            let gmm = resolve_gmm(&branch.preset)?;
            builder = builder.add(branch.id, branch.weight, gmm);
        }
        set.insert(imt, builder.build()?);
    }
    Ok(set)
}

/// Load `<model_dir>/model.json` into the `SourceSet`s the pipeline runs
/// against, resolving each SourceSet's declared distance cutoff against
/// `config`'s per-source-type defaults when not overridden.
pub fn load_model(model_dir: &Path, config: &hazard_lib::config::Config) -> HazardResult<Vec<SourceSet>> {
    let manifest_path = model_dir.join("model.json");
    let raw = fs::read_to_string(&manifest_path)?;
    let manifest: ManifestFile = serde_json::from_str(&raw)?;

    let mut source_sets = Vec::with_capacity(manifest.source_sets.len());
    for def in manifest.source_sets {
        let sources: HazardResult<Vec<Box<dyn Source>>> =
            def.sources.into_iter().map(SourceDef::build).collect();
        let sources = sources?;
        let source_type_str = sources
            .first()
            .map(|s| s.source_type().as_str())
            .unwrap_or("FAULT");
        let cutoff = def
            .distance_cutoff_km
            .unwrap_or_else(|| config.cutoff_for(source_type_str));
        let gmms = build_gmm_set(def.gmms)?;
        source_sets.push(SourceSet::new(def.name, sources, def.weight, gmms, cutoff));
    }
    Ok(source_sets)
}
