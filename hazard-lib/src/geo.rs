//! Geodesy on the WGS spherical Earth approximation (C1).
//!
//! Distances, azimuths, location translation, and the gridded-surface
//! distance contract (rJB, rRup, rX) used to build [`crate::site::GmmInput`]
//! records from ruptures. Builds on [`geo`]'s `Haversine` great-circle
//! distance to cover the full kernel the pipeline needs.

use crate::auxilary::EARTH_RADIUS_KM;
use crate::site::Location;
use geo::{Distance, Haversine, Point};

/// Great-circle surface distance between two locations, in km. Ignores
/// depth; see [`distance_3d_fast`] for the depth-aware pre-filter distance.
pub fn surface_distance_km(a: &Location, b: &Location) -> f64 {
    Haversine.distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat)) / 1000.0
}

/// Initial bearing (azimuth) from `a` to `b`, in degrees clockwise from
/// north, range `[0, 360)`.
pub fn azimuth_deg(a: &Location, b: &Location) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlon = (b.lon - a.lon).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let theta = y.atan2(x).to_degrees();
    (theta + 360.0) % 360.0
}

/// "Linear fast" 3-D distance between two locations using a small-angle
/// approximation for the horizontal component, composed with the vertical
/// separation. Deliberately cheaper and less accurate than
/// [`surface_distance_km`] — used only for the conservative source-rupture
/// pre-filtering pass of S1, where the error is tolerable because the
/// cutoff pad absorbs it.
pub fn distance_3d_fast(a: &Location, b: &Location) -> f64 {
    let lat_mid = ((a.lat + b.lat) / 2.0).to_radians();
    let dlat_km = (b.lat - a.lat).to_radians() * EARTH_RADIUS_KM;
    let dlon_km = (b.lon - a.lon).to_radians() * EARTH_RADIUS_KM * lat_mid.cos();
    let ddepth = b.depth - a.depth;
    (dlat_km * dlat_km + dlon_km * dlon_km + ddepth * ddepth).sqrt()
}

/// Translate `origin` by `horizontal_km` along `azimuth_deg`, and by
/// `vertical_km` in depth (positive down). Used to build gridded rupture
/// surfaces by stepping along strike and dip directions.
pub fn translate(origin: &Location, azimuth_deg: f64, horizontal_km: f64, vertical_km: f64) -> Location {
    let az = azimuth_deg.to_radians();
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let ang_dist = horizontal_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * ang_dist.cos() + lat1.cos() * ang_dist.sin() * az.cos()).asin();
    let lon2 = lon1
        + (az.sin() * ang_dist.sin() * lat1.cos()).atan2(ang_dist.cos() - lat1.sin() * lat2.sin());

    Location::new(
        lat2.to_degrees(),
        normalize_lon(lon2.to_degrees()),
        origin.depth + vertical_km,
    )
}

/// Wrap a longitude into `[-180, 180]`.
fn normalize_lon(lon: f64) -> f64 {
    let mut l = lon;
    while l > 180.0 {
        l -= 360.0;
    }
    while l < -180.0 {
        l += 360.0;
    }
    l
}

/// The three source-to-site distance metrics a gridded rupture surface's
/// `distance_to` produces, per §4.1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distances {
    /// Joyner-Boore distance: minimum *horizontal* distance to the
    /// surface's projection onto the surface of the earth, in km.
    pub r_jb: f64,
    /// Closest 3-D ("rupture") distance to any point on the surface, in km.
    pub r_rup: f64,
    /// Signed perpendicular distance from the surface's top-edge trace,
    /// positive on the hanging-wall side, in km.
    pub r_x: f64,
}

/// Compute the (rJB, rRup, rX) triplet for a site against a row-major grid
/// of [`Location`]s (row 0 is the top-edge trace, each row steps down-dip).
///
/// `strike_trace` is the row-0 trace used to establish rX sign: the cross
/// product of the trace direction (first-to-last point) and the
/// trace-to-site vector determines hanging-wall side. A perfectly vertical
/// fault's rX sign is ambiguous by construction (the trace and the full
/// surface project to the same line); per §4.1 we tie-break to the
/// right-hand side of the first-to-last trace vector, which the cross
/// product formula already does without a special case.
pub fn grid_distance_to(grid: &[Vec<Location>], site: &Location) -> Distances {
    let mut r_rup = f64::INFINITY;
    let mut r_jb = f64::INFINITY;

    for row in grid {
        for loc in row {
            let horiz = surface_distance_km(loc, site);
            let vert = loc.depth - site.depth;
            let d3 = (horiz * horiz + vert * vert).sqrt();
            r_rup = r_rup.min(d3);
            r_jb = r_jb.min(horiz);
        }
    }

    let trace = &grid[0];
    let r_x = signed_perpendicular_distance(trace, site);

    Distances { r_jb, r_rup, r_x }
}

/// Signed perpendicular distance from `site` to the polyline `trace`,
/// positive on the hanging-wall (right-hand) side of the first-to-last
/// trace vector. Uses the nearest trace segment's perpendicular distance
/// and takes its sign from the cross product against the whole-trace
/// direction, matching the "sign from the trace-direction cross
/// trace-to-site vector" rule in §4.1.
fn signed_perpendicular_distance(trace: &[Location], site: &Location) -> f64 {
    let first = &trace[0];
    let last = &trace[trace.len() - 1];

    // Local equirectangular projection about the trace's first point, in km.
    let lat0 = first.lat.to_radians();
    let to_xy = |loc: &Location| -> (f64, f64) {
        let dlat_km = (loc.lat - first.lat).to_radians() * EARTH_RADIUS_KM;
        let dlon_km = (loc.lon - first.lon).to_radians() * EARTH_RADIUS_KM * lat0.cos();
        (dlon_km, dlat_km)
    };

    let (fx, fy) = to_xy(first);
    let (lx, ly) = to_xy(last);
    let (sx, sy) = to_xy(site);

    let dir_x = lx - fx;
    let dir_y = ly - fy;
    let to_site_x = sx - fx;
    let to_site_y = sy - fy;

    let dir_len = (dir_x * dir_x + dir_y * dir_y).sqrt();
    if dir_len < 1e-9 {
        // Degenerate zero-length trace; fall back to raw distance from the
        // single point, arbitrarily positive.
        return (to_site_x * to_site_x + to_site_y * to_site_y).sqrt();
    }

    // Minimum perpendicular distance to any trace segment.
    let mut min_perp = f64::INFINITY;
    for pair in trace.windows(2) {
        let (ax, ay) = to_xy(&pair[0]);
        let (bx, by) = to_xy(&pair[1]);
        let seg_x = bx - ax;
        let seg_y = by - ay;
        let seg_len2 = seg_x * seg_x + seg_y * seg_y;
        let t = if seg_len2 < 1e-12 {
            0.0
        } else {
            (((sx - ax) * seg_x + (sy - ay) * seg_y) / seg_len2).clamp(0.0, 1.0)
        };
        let px = ax + t * seg_x;
        let py = ay + t * seg_y;
        let dx = sx - px;
        let dy = sy - py;
        min_perp = min_perp.min((dx * dx + dy * dy).sqrt());
    }

    // Cross product of trace direction and trace-to-site vector determines
    // the hanging-wall side: positive = right of the first-to-last vector.
    let cross = dir_x * to_site_y - dir_y * to_site_x;
    if cross >= 0.0 {
        min_perp
    } else {
        -min_perp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_distance_is_symmetric() {
        let a = Location::new(50.0, 142.0, 0.0);
        let b = Location::new(50.1, 142.2, 0.0);
        assert!((surface_distance_km(&a, &b) - surface_distance_km(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn azimuth_due_east_is_90() {
        let a = Location::new(0.0, 0.0, 0.0);
        let b = Location::new(0.0, 1.0, 0.0);
        assert!((azimuth_deg(&a, &b) - 90.0).abs() < 1e-6);
    }

    #[test]
    fn translate_round_trips_distance() {
        let origin = Location::new(50.0, 142.0, 5.0);
        let moved = translate(&origin, 45.0, 10.0, 2.0);
        let horiz = surface_distance_km(&origin, &moved);
        assert!((horiz - 10.0).abs() < 1e-2);
        assert!((moved.depth - 7.0).abs() < 1e-9);
    }

    #[test]
    fn rx_sign_flips_across_trace() {
        // A north-south trace along lon=142; site east of it is hanging-wall (+).
        let trace = vec![
            Location::new(49.9, 142.0, 0.0),
            Location::new(50.1, 142.0, 0.0),
        ];
        let grid = vec![trace.clone()];
        let east_site = Location::new(50.0, 142.1, 0.0);
        let west_site = Location::new(50.0, 141.9, 0.0);
        let east = grid_distance_to(&grid, &east_site);
        let west = grid_distance_to(&grid, &west_site);
        assert!(east.r_x > 0.0);
        assert!(west.r_x < 0.0);
    }

    #[test]
    fn rjb_le_rrup() {
        let trace = vec![
            Location::new(49.9, 142.0, 5.0),
            Location::new(50.1, 142.0, 5.0),
        ];
        let grid = vec![trace];
        let site = Location::new(50.0, 142.1, 0.0);
        let d = grid_distance_to(&grid, &site);
        assert!(d.r_jb <= d.r_rup + 1e-9);
    }
}
