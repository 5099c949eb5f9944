mod cmd_args;
mod model;

use chrono::Local;
use clap::Parser;
use cmd_args::{CmdArgs, Command};
use hazard_lib::config::Config;
use hazard_lib::deagg::deaggregate;
use hazard_lib::pipeline::{compute_site, RunContext};
use hazard_lib::readers::{parse_site_triplet, read_sites_csv, read_sites_geojson, NamedSite};
use hazard_lib::writers::{write_config_json, write_curves_csv, write_deagg_json, write_map_csv};
use std::error::Error;
use std::path::Path;

fn load_sites(spec: &str) -> Result<Vec<NamedSite>, Box<dyn Error>> {
    if spec.contains(',') {
        return Ok(vec![parse_site_triplet(spec)?]);
    }
    let path = Path::new(spec);
    match path.extension().and_then(|e| e.to_str()) {
        Some("geojson") | Some("json") => Ok(read_sites_geojson(path)?),
        _ => Ok(read_sites_csv(path)?),
    }
}

fn load_config(path: &Option<String>) -> Result<Config, Box<dyn Error>> {
    match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(Config::default()),
    }
}

fn output_dir() -> std::path::PathBuf {
    let stamp = Local::now().format("%Y%m%dT%H%M%S").to_string();
    std::path::PathBuf::from(format!("output-{stamp}"))
}

fn init_logging(out_dir: &Path) -> Result<(), Box<dyn Error>> {
    let log_path = out_dir.join("hazard.log");
    let target = Box::new(std::fs::File::create(log_path)?);
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let cmd_args = CmdArgs::parse();

    match cmd_args.command {
        Command::Hazard { model_dir, sites, config } => {
            let config = load_config(&config)?;
            let out_dir = output_dir();
            std::fs::create_dir_all(&out_dir)?;
            init_logging(&out_dir)?;

            let named_sites = load_sites(&sites)?;
            let source_sets = model::load_model(Path::new(&model_dir), &config)?;
            let ctx = RunContext::from_config(&config)?;

            let mut curves_by_imt: std::collections::HashMap<_, Vec<_>> = std::collections::HashMap::new();
            for named in &named_sites {
                log::info!("computing hazard curves for site '{}'", named.name);
                let result = compute_site(&ctx, &named.site, &source_sets)?;
                for (imt, curve) in result {
                    curves_by_imt.entry(imt).or_default().push(curve);
                }
            }

            let return_periods = [475.0, 975.0, 2475.0];
            for (imt, curves) in &curves_by_imt {
                write_curves_csv(out_dir.join(format!("curves-{imt}.csv")), imt, &named_sites, curves)?;
                write_map_csv(out_dir.join(format!("map-{imt}.csv")), &named_sites, curves, &return_periods)?;
            }
            write_config_json(out_dir.join("config.json"), &config)?;
            log::info!("done: wrote output to {}", out_dir.display());
        }

        Command::Deagg { model_dir, sites, return_period, config } => {
            let config = load_config(&config)?;
            let out_dir = output_dir();
            std::fs::create_dir_all(&out_dir)?;
            init_logging(&out_dir)?;

            let named_sites = load_sites(&sites)?;
            let source_sets = model::load_model(Path::new(&model_dir), &config)?;
            let ctx = RunContext::from_config(&config)?;

            let deagg_dir = out_dir.join("deagg");
            for named in &named_sites {
                for imt_name in &config.imts {
                    let imt = Config::parse_imt(imt_name)
                        .ok_or_else(|| format!("unrecognized IMT '{imt_name}' in hazard.imts"))?;
                    log::info!(
                        "deaggregating '{}' at {imt} for a {return_period}y return period",
                        named.name
                    );
                    let result =
                        deaggregate(&ctx, &named.site, &source_sets, &imt, &config.deagg_bins, return_period)?;
                    write_deagg_json(&deagg_dir, &named.name, &result)?;
                }
            }
            write_config_json(out_dir.join("config.json"), &config)?;
            log::info!("done: wrote output to {}", out_dir.display());
        }
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
