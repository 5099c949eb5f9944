//! Site input readers (§6): a sites CSV/triplet string, or a sites GeoJSON
//! FeatureCollection, both resolving to a flat list of [`Site`] plus the
//! display `name` each one was read with (lon/lat/vs30/vsInf/z1p0/z2p5).

use crate::error::{HazardError, HazardResult};
use crate::site::{Location, Site};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read as _;
use std::path::Path;

/// A site paired with the display name it was read under.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSite {
    pub name: String,
    pub site: Site,
}

/// One raw CSV row, before resolving optional fields to the `Site`
/// defaults (missing `vs30` fails fast; the others default to "GMM
/// default" sentinels).
#[derive(Debug, serde::Deserialize)]
struct SiteRow {
    name: String,
    lon: f64,
    lat: f64,
    vs30: Option<f64>,
    #[serde(rename = "vsInf")]
    vs_inf: Option<u8>,
    z1p0: Option<f64>,
    z2p5: Option<f64>,
}

impl SiteRow {
    fn into_named_site(self) -> HazardResult<NamedSite> {
        let vs30 = self.vs30.ok_or_else(|| {
            HazardError::InputValidation(format!("site '{}' is missing vs30", self.name))
        })?;
        let site = Site::new(
            Location::new(self.lat, self.lon, 0.0),
            vs30,
            self.vs_inf.map(|v| v != 0).unwrap_or(false),
            self.z1p0.unwrap_or(f64::NAN),
            self.z2p5.unwrap_or(f64::NAN),
        );
        Ok(NamedSite {
            name: self.name,
            site,
        })
    }
}

/// Parse one `"name,lon,lat[,vs30,vsInf[,z1p0,z2p5]]"` positional site
/// string (§6 CLI sites argument).
pub fn parse_site_triplet(spec: &str) -> HazardResult<NamedSite> {
    let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 5 && parts.len() != 7 {
        return Err(HazardError::InputValidation(format!(
            "site spec '{spec}' must have 3, 5, or 7 comma-separated fields"
        )));
    }
    let field = |i: usize| -> HazardResult<f64> {
        parts[i].parse::<f64>().map_err(|e| {
            HazardError::InputValidation(format!("site spec '{spec}': field {i}: {e}"))
        })
    };
    let row = SiteRow {
        name: parts[0].to_string(),
        lon: field(1)?,
        lat: field(2)?,
        vs30: if parts.len() >= 5 { Some(field(3)?) } else { None },
        vs_inf: if parts.len() >= 5 {
            Some(if field(4)? != 0.0 { 1 } else { 0 })
        } else {
            None
        },
        z1p0: if parts.len() == 7 { Some(field(5)?) } else { None },
        z2p5: if parts.len() == 7 { Some(field(6)?) } else { None },
    };
    row.into_named_site()
}

/// Read a sites CSV file (§6): `name, lon, lat[, vs30, vsInf, z1p0, z2p5]`,
/// `#`-prefixed lines treated as comments.
pub fn read_sites_csv<P: AsRef<Path>>(path: P) -> HazardResult<Vec<NamedSite>> {
    let raw = std::fs::read_to_string(path)?;
    let filtered: String = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(filtered.as_bytes());

    let mut sites = Vec::new();
    for result in rdr.deserialize() {
        let row: SiteRow = result?;
        sites.push(row.into_named_site()?);
    }
    Ok(sites)
}

/// Read a sites GeoJSON FeatureCollection (§6): each Feature's geometry is
/// a Point (lon, lat); the properties object carries the same optional
/// keys as the CSV schema.
pub fn read_sites_geojson<P: AsRef<Path>>(path: P) -> HazardResult<Vec<NamedSite>> {
    let mut raw = String::new();
    File::open(path)?.read_to_string(&mut raw)?;
    let geojson = raw.parse::<geojson::GeoJson>()?;
    let collection = match geojson {
        geojson::GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(HazardError::InputValidation(
                "sites GeoJSON must be a FeatureCollection".to_string(),
            ))
        }
    };

    let mut sites = Vec::new();
    for (i, feature) in collection.features.into_iter().enumerate() {
        let geometry = feature.geometry.as_ref().ok_or_else(|| {
            HazardError::InputValidation(format!("feature {i} has no geometry"))
        })?;
        let (lon, lat) = match &geometry.value {
            geojson::Value::Point(coords) if coords.len() >= 2 => (coords[0], coords[1]),
            _ => {
                return Err(HazardError::InputValidation(format!(
                    "feature {i} geometry must be a Point"
                )))
            }
        };

        let props = feature.properties.unwrap_or_default();
        let get_f64 = |key: &str| -> Option<f64> { props.get(key).and_then(|v| v.as_f64()) };
        let name = props
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("site_{i}"));

        let row = SiteRow {
            name,
            lon,
            lat,
            vs30: get_f64("vs30"),
            vs_inf: get_f64("vsInf").map(|v| v as u8),
            z1p0: get_f64("z1p0"),
            z2p5: get_f64("z2p5"),
        };
        sites.push(row.into_named_site()?);
    }
    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_triplet() {
        let named = parse_site_triplet("site-a, 142.5, 50.0, 400.0, 1").unwrap();
        assert_eq!(named.name, "site-a");
        assert_eq!(named.site.vs30, 400.0);
        assert!(named.site.vs_inferred);
        assert!(named.site.z1p0.is_nan());
    }

    #[test]
    fn rejects_malformed_spec() {
        assert!(parse_site_triplet("site-a,142.5").is_err());
    }

    #[test]
    fn csv_round_trip_ignores_comment_lines() {
        let csv = "name,lon,lat,vs30,vsInf,z1p0,z2p5\n# a comment\nsite-a,142.5,50.0,400,1,,\n";
        let dir = std::env::temp_dir().join(format!("hazard-sites-test-{}", std::process::id()));
        std::fs::write(&dir, csv).unwrap();
        let sites = read_sites_csv(&dir).unwrap();
        std::fs::remove_file(&dir).unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "site-a");
        assert_eq!(sites[0].site.vs30, 400.0);
    }

    #[test]
    fn csv_missing_vs30_is_input_validation() {
        let csv = "name,lon,lat\nsite-a,142.5,50.0\n";
        let dir = std::env::temp_dir().join(format!("hazard-sites-test-missing-{}", std::process::id()));
        std::fs::write(&dir, csv).unwrap();
        let err = read_sites_csv(&dir).unwrap_err();
        std::fs::remove_file(&dir).unwrap();
        assert!(matches!(err, HazardError::InputValidation(_)));
    }
}
