use clap::{Parser, Subcommand};

/// Command-line front end for the PSHA hazard pipeline (§6).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CmdArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute mean hazard curves for a site or site list.
    Hazard {
        /// Path to a model directory containing `model.json`.
        model_dir: String,

        /// Site spec: "name,lon,lat[,vs30,vsInf[,z1p0,z2p5]]", a CSV
        /// file path, or a GeoJSON file path.
        sites: String,

        /// Optional configuration file overriding model defaults.
        config: Option<String>,
    },

    /// Compute a hazard curve, then deaggregate it at a return period.
    Deagg {
        /// Path to a model directory containing `model.json`.
        model_dir: String,

        /// Site spec: "name,lon,lat[,vs30,vsInf[,z1p0,z2p5]]", a CSV
        /// file path, or a GeoJSON file path.
        sites: String,

        /// Return period in years (e.g. 2475 for a ~2%-in-50-years event).
        return_period: f64,

        /// Optional configuration file overriding model defaults.
        config: Option<String>,
    },
}
