use hazard_lib::readers::{read_sites_csv, read_sites_geojson};

fn tmp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("hazard-readers-test-{}-{}", std::process::id(), name))
}

#[test]
fn reads_multi_row_sites_csv() {
    let csv = "name,lon,lat,vs30,vsInf,z1p0,z2p5\n\
               # regional grid\n\
               site-a,142.0,50.0,400,1,,\n\
               site-b,142.5,50.5,760,0,100.0,2.0\n";
    let path = tmp_path("sites.csv");
    std::fs::write(&path, csv).unwrap();
    let sites = read_sites_csv(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].name, "site-a");
    assert!(sites[0].site.vs_inferred);
    assert!(sites[0].site.z1p0.is_nan());
    assert_eq!(sites[1].site.vs30, 760.0);
    assert!(!sites[1].site.vs_inferred);
    assert_eq!(sites[1].site.z1p0, 100.0);
}

#[test]
fn reads_sites_feature_collection() {
    let geojson = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [142.0, 50.0]},
                "properties": {"name": "site-a", "vs30": 400.0, "vsInf": 1}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [142.5, 50.5]},
                "properties": {"vs30": 760.0}
            }
        ]
    }"#;
    let path = tmp_path("sites.geojson");
    std::fs::write(&path, geojson).unwrap();
    let sites = read_sites_geojson(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].name, "site-a");
    assert_eq!(sites[0].site.location.lon, 142.0);
    assert_eq!(sites[0].site.location.lat, 50.0);
    assert_eq!(sites[1].name, "site_1");
    assert_eq!(sites[1].site.vs30, 760.0);
}

#[test]
fn geojson_with_non_point_geometry_is_rejected() {
    let geojson = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[142.0, 50.0], [142.1, 50.1]]},
                "properties": {"vs30": 400.0}
            }
        ]
    }"#;
    let path = tmp_path("sites-bad.geojson");
    std::fs::write(&path, geojson).unwrap();
    let err = read_sites_geojson(&path).unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(err, hazard_lib::error::HazardError::InputValidation(_)));
}
