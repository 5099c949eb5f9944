//! Source model (C4).
//!
//! Six source types share one contract: `ruptures()` and a location-based
//! pre-filter against a site. A [`SourceSet`] groups sources of one
//! [`SourceType`], attaching a weight and the GMM assignment to use with
//! that collection (§4.4).

use crate::geo;
use crate::gmm::GmmSet;
use crate::mfd::Mfd;
use crate::rupture::{float_ruptures, FloatingMode, Rupture, RuptureScaling, RuptureSurface};
use crate::site::Location;

/// The six source geometries the pipeline dispatches over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum SourceType {
    Fault,
    Grid,
    Cluster,
    Interface,
    Slab,
    Area,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Fault => "FAULT",
            SourceType::Grid => "GRID",
            SourceType::Cluster => "CLUSTER",
            SourceType::Interface => "INTERFACE",
            SourceType::Slab => "SLAB",
            SourceType::Area => "AREA",
        }
    }
}

/// One alternative rupture-geometry realization within a [`ClusterSource`],
/// with its branch weight.
#[derive(Debug, Clone)]
pub struct ClusterAlternative {
    pub weight: f64,
    pub ruptures: Vec<Rupture>,
}

/// Common contract every source geometry implements.
pub trait Source: Send + Sync {
    fn source_type(&self) -> SourceType;

    /// A cheap proxy location (centroid or trace endpoint) used for the
    /// conservative pre-filter pad in S1; never used for the actual
    /// distance calculation once a source passes the filter.
    fn proxy_location(&self) -> Location;

    /// Enumerate this source's ruptures (including floaters). Independent
    /// sources return a flat list; [`ClusterSource`] instead exposes
    /// [`Source::cluster_alternatives`] because its ruptures must be
    /// combined multiplicatively within each alternative (§4.7.4), not
    /// summed as independent Poisson contributions.
    fn ruptures(&self) -> Vec<Rupture>;

    /// `Some(alternatives)` only for [`SourceType::Cluster`] sources.
    fn cluster_alternatives(&self) -> Option<&[ClusterAlternative]> {
        None
    }
}

/// Cheap location-based pre-filter: `true` if `source` might have ruptures
/// within `cutoff_km` of `site`, using a conservative pad to cover the
/// error of the fast 3-D distance approximation.
pub fn passes_location_filter(source: &dyn Source, site: &Location, cutoff_km: f64) -> bool {
    const PAD_KM: f64 = 50.0;
    geo::distance_3d_fast(&source.proxy_location(), site) <= cutoff_km + PAD_KM
}

/// A finite-fault source: one gridded surface, one MFD, floated per `mode`.
pub struct FaultSource {
    pub surface: RuptureSurface,
    pub mfd: Box<dyn Mfd>,
    pub rake: f64,
    pub scaling: Box<dyn RuptureScaling>,
    pub floating_mode: FloatingMode,
    source_type: SourceType,
}

impl FaultSource {
    pub fn new(
        surface: RuptureSurface,
        mfd: Box<dyn Mfd>,
        rake: f64,
        scaling: Box<dyn RuptureScaling>,
        floating_mode: FloatingMode,
    ) -> Self {
        Self {
            surface,
            mfd,
            rake,
            scaling,
            floating_mode,
            source_type: SourceType::Fault,
        }
    }

    /// Build an interface or slab subduction source using the same
    /// fault-floating machinery but tagged for the deagg source-type axis
    /// and GMM family dispatch.
    pub fn new_subduction(
        surface: RuptureSurface,
        mfd: Box<dyn Mfd>,
        rake: f64,
        scaling: Box<dyn RuptureScaling>,
        floating_mode: FloatingMode,
        is_slab: bool,
    ) -> Self {
        let mut s = Self::new(surface, mfd, rake, scaling, floating_mode);
        s.source_type = if is_slab {
            SourceType::Slab
        } else {
            SourceType::Interface
        };
        s
    }
}

impl Source for FaultSource {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn proxy_location(&self) -> Location {
        let grid = self.surface.grid();
        let trace = &grid[0];
        trace[trace.len() / 2]
    }

    fn ruptures(&self) -> Vec<Rupture> {
        let mut out = Vec::new();
        for (magnitude, rate) in self.mfd.bins() {
            if rate <= 0.0 {
                continue;
            }
            let floaters = float_ruptures(
                &self.surface,
                magnitude,
                rate,
                self.scaling.as_ref(),
                self.floating_mode,
            );
            for f in floaters {
                if let Ok(r) = Rupture::try_new(magnitude, self.rake, f.rate, f.surface) {
                    out.push(r);
                }
            }
        }
        out
    }
}

/// One cell of a gridded-seismicity source: a point location with its own
/// MFD and nodal-plane rake.
pub struct GridCell {
    pub location: Location,
    pub mfd: Box<dyn Mfd>,
    pub rake: f64,
}

/// A gridded-seismicity source: independent point ruptures on a lattice of
/// locations, each with its own MFD (typically derived from smoothed
/// seismicity). Also used for [`SourceType::Area`] sources, whose cells are
/// simply uniformly distributed across a polygon by the model-loading layer
/// (out of scope here per §1 — this type just iterates the cells it's
/// given).
pub struct GridSource {
    pub cells: Vec<GridCell>,
    source_type: SourceType,
}

impl GridSource {
    pub fn new(cells: Vec<GridCell>) -> Self {
        Self {
            cells,
            source_type: SourceType::Grid,
        }
    }

    pub fn new_area(cells: Vec<GridCell>) -> Self {
        Self {
            cells,
            source_type: SourceType::Area,
        }
    }
}

impl Source for GridSource {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn proxy_location(&self) -> Location {
        if self.cells.is_empty() {
            return Location::new(0.0, 0.0, 0.0);
        }
        let n = self.cells.len() as f64;
        let (lat, lon, depth) = self.cells.iter().fold((0.0, 0.0, 0.0), |acc, c| {
            (
                acc.0 + c.location.lat,
                acc.1 + c.location.lon,
                acc.2 + c.location.depth,
            )
        });
        Location::new(lat / n, lon / n, depth / n)
    }

    fn ruptures(&self) -> Vec<Rupture> {
        self.cells
            .iter()
            .flat_map(|cell| {
                cell.mfd.bins().into_iter().filter_map(move |(m, rate)| {
                    if rate <= 0.0 {
                        return None;
                    }
                    let surface =
                        RuptureSurface::from_trace(&point_trace(&cell.location), 90.0, 0.0, cell.location.depth, 1.0)
                            .ok()?;
                    Rupture::try_new(m, cell.rake, rate, surface).ok()
                })
            })
            .collect()
    }
}

/// A degenerate two-point "trace" used to represent a point source as a
/// zero-width gridded surface, reusing the same distance machinery as
/// finite faults.
fn point_trace(loc: &Location) -> Vec<Location> {
    let nudged = Location::new(loc.lat, loc.lon + 1e-6, loc.depth);
    vec![*loc, nudged]
}

/// A cluster source: a set of rupture-geometry alternatives with branch
/// weights, combined multiplicatively within an alternative and
/// weighted-additively across alternatives (§4.7.4).
pub struct ClusterSource {
    pub alternatives: Vec<ClusterAlternative>,
}

impl ClusterSource {
    pub fn new(alternatives: Vec<ClusterAlternative>) -> Self {
        Self { alternatives }
    }

    /// Total rate Λ across all alternatives, weighted.
    pub fn total_rate(&self) -> f64 {
        self.alternatives
            .iter()
            .map(|alt| alt.weight * alt.ruptures.iter().map(|r| r.rate).sum::<f64>())
            .sum()
    }
}

impl Source for ClusterSource {
    fn source_type(&self) -> SourceType {
        SourceType::Cluster
    }

    fn proxy_location(&self) -> Location {
        self.alternatives
            .first()
            .and_then(|alt| alt.ruptures.first())
            .map(|r| r.surface.grid()[0][0])
            .unwrap_or(Location::new(0.0, 0.0, 0.0))
    }

    fn ruptures(&self) -> Vec<Rupture> {
        // Flat iteration is still meaningful for S2 input-building (each
        // rupture still needs a GmmInput); S4's combinatorics instead goes
        // through `cluster_alternatives`.
        self.alternatives
            .iter()
            .flat_map(|alt| alt.ruptures.iter().cloned())
            .collect()
    }

    fn cluster_alternatives(&self) -> Option<&[ClusterAlternative]> {
        Some(&self.alternatives)
    }
}

/// A collection of [`Source`]s of one [`SourceType`], attaching the branch
/// weight this set contributes at the S5/S6 aggregation stages and the GMM
/// assignment (per-IMT, possibly a logic tree of alternative GMMs) its
/// ruptures dispatch through.
pub struct SourceSet {
    pub name: String,
    pub sources: Vec<Box<dyn Source>>,
    /// This set's weight in the total-hazard aggregation (S6); 1.0 for a
    /// run with a single, non-logic-tree source model.
    pub weight: f64,
    pub gmms: GmmSet,
    /// Distance beyond which a source is dropped at S1 (per source type in
    /// `hazard.distanceCutoffs`, resolved to a single value for this set).
    pub distance_cutoff_km: f64,
}

impl SourceSet {
    pub fn new(
        name: impl Into<String>,
        sources: Vec<Box<dyn Source>>,
        weight: f64,
        gmms: GmmSet,
        distance_cutoff_km: f64,
    ) -> Self {
        Self {
            name: name.into(),
            sources,
            weight,
            gmms,
            distance_cutoff_km,
        }
    }

    /// S1: sources within `distance_cutoff_km` of `site`, via the cheap
    /// proxy-location pre-filter.
    pub fn filter(&self, site: &Location) -> Vec<&dyn Source> {
        self.sources
            .iter()
            .map(|b| b.as_ref())
            .filter(|s| passes_location_filter(*s, site, self.distance_cutoff_km))
            .collect()
    }
}
