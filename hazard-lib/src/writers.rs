//! Run output writers (§6): per-IMT hazard curve and map CSVs, the
//! effective `config.json`, and per-site deaggregation JSON, each written
//! as flat delimited rows or plain JSON objects.

use crate::config::Config;
use crate::deagg::DeaggResult;
use crate::error::HazardResult;
use crate::gmm::Imt;
use crate::readers::NamedSite;
use crate::xy_sequence::HazardCurve;
use csv::WriterBuilder;
use std::fs;
use std::path::Path;

/// Write `curves-<imt>.csv` (§6): one row per site, `lon, lat, y0, y1, ...`
/// on the curve's IML grid, with a header naming each grid point.
pub fn write_curves_csv<P: AsRef<Path>>(
    path: P,
    imt: &Imt,
    sites: &[NamedSite],
    curves: &[HazardCurve],
) -> HazardResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;

    let mut header = vec!["lon".to_string(), "lat".to_string()];
    if let Some(first) = curves.first() {
        header.extend(first.xs().iter().map(|x| format!("{imt}@{x}")));
    }
    wtr.write_record(&header)?;

    for (named, curve) in sites.iter().zip(curves.iter()) {
        let mut record = vec![
            named.site.location.lon.to_string(),
            named.site.location.lat.to_string(),
        ];
        record.extend(curve.ys().iter().map(|y| y.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `map-<imt>.csv` (§6): one row per site, `name, lon, lat, iml_rp0,
/// iml_rp1, ...` — the curve's interpolated IML at each requested return
/// period.
pub fn write_map_csv<P: AsRef<Path>>(
    path: P,
    sites: &[NamedSite],
    curves: &[HazardCurve],
    return_periods: &[f64],
) -> HazardResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;

    let mut header = vec!["name".to_string(), "lon".to_string(), "lat".to_string()];
    header.extend(return_periods.iter().map(|rp| format!("rp{rp}")));
    wtr.write_record(&header)?;

    for (named, curve) in sites.iter().zip(curves.iter()) {
        let mut record = vec![
            named.name.clone(),
            named.site.location.lon.to_string(),
            named.site.location.lat.to_string(),
        ];
        for rp in return_periods {
            let target_rate = 1.0 / rp;
            let iml = curve.interpolate_x_for_y(target_rate).unwrap_or(f64::NAN);
            record.push(iml.to_string());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the effective `config.json` used for the run (§6).
pub fn write_config_json<P: AsRef<Path>>(path: P, config: &Config) -> HazardResult<()> {
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

/// Deaggregation JSON shape written to `deagg/<site>/<imt>.json` (§6).
#[derive(Debug, serde::Serialize)]
struct DeaggJson<'a> {
    imt: String,
    iml: f64,
    total_rate: f64,
    bins: &'a [crate::deagg::DeaggBin],
}

/// Write `deagg/<site>/<imt>.json`, creating the `deagg/<site>/` directory
/// if it doesn't already exist.
pub fn write_deagg_json<P: AsRef<Path>>(
    deagg_dir: P,
    site_name: &str,
    result: &DeaggResult,
) -> HazardResult<()> {
    let dir = deagg_dir.as_ref().join(site_name);
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.json", result.imt));
    let json = serde_json::to_string_pretty(&DeaggJson {
        imt: result.imt.to_string(),
        iml: result.iml,
        total_rate: result.total_rate,
        bins: &result.bins,
    })?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Location, Site};
    use std::sync::Arc;

    fn tmp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("hazard-writers-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn curves_csv_round_trips_row_count() {
        let sites = vec![NamedSite {
            name: "a".to_string(),
            site: Site::new(Location::new(50.0, 142.0, 0.0), 400.0, true, f64::NAN, f64::NAN),
        }];
        let curve = HazardCurve::zeros_on(Arc::new(vec![0.01, 0.1, 1.0]));
        let path = tmp_path("curves.csv");
        write_curves_csv(&path, &Imt::Pga, &sites, &[curve]).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn config_json_round_trips() {
        let config = Config::default();
        let path = tmp_path("config.json");
        write_config_json(&path, &config).unwrap();
        let back: Config = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.truncation, back.truncation);
    }
}
