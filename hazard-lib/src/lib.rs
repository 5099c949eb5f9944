//! # `hazard_lib`
//!
//! **A modular Rust library for Probabilistic Seismic Hazard Analysis
//! (PSHA): source models, ground motion prediction equations (GMMs), and
//! the hazard/deaggregation pipelines that combine them into mean hazard
//! curves and (R, M, ε) deaggregations for a site.**
//!
//! ## Features
//!
//! - Modular ground motion model interface via the [`gmm::Gmm`] trait,
//!   with point-source, subduction-depth, and basin-amplification
//!   variants, plus weighted [`gmm::GmmTree`] logic trees.
//! - Six source geometries ([`source`]) sharing one [`source::Source`]
//!   contract, with magnitude-frequency distributions ([`mfd`]) and
//!   rupture floating ([`rupture`]).
//! - The hazard pipeline ([`pipeline`]) fans sources out over Rayon,
//!   evaluates each rupture's exceedance contribution, and reduces per-site
//!   curves through a single-owner channel.
//! - Deaggregation ([`deagg`]) re-traverses the same pipeline at a single
//!   return-period IML, binning contributions by (R, M, ε, source-type).
//! - CSV/GeoJSON readers and CSV/JSON writers for site inputs and run
//!   outputs.
//!
//! ## Module Overview
//!
//! - [`auxilary`] — Supporting constants and utility functions.
//! - [`config`] — Run configuration bound from the recognized config keys.
//! - [`deagg`] — Deaggregation pass (R, M, ε, source-type histogram).
//! - [`error`] — Unified error taxonomy.
//! - [`geo`] — Spherical-earth distance geometry.
//! - [`gmm`] — Ground motion model trait, presets, and logic trees.
//! - [`logic_tree`] — Generic weighted-branch logic tree.
//! - [`mfd`] — Magnitude-frequency distribution models.
//! - [`pipeline`] — The hazard curve pipeline (S1-S6).
//! - [`readers`] — Site and source-model input loaders.
//! - [`rupture`] — Rupture surfaces, scaling relations, and floating.
//! - [`site`] — Site and GMM-input records.
//! - [`source`] — Source geometries and `SourceSet` grouping.
//! - [`writers`] — Curve, map, config, and deaggregation output writers.
//! - [`xy_sequence`] — Monotone XY sequences underlying hazard curves.
//!
//! ## Parallelism
//!
//! This crate uses [`Rayon`](https://docs.rs/rayon/latest/rayon/) for the
//! source-level fan-out in [`pipeline::compute_site`], reduced through a
//! [`crossbeam_channel`] single-owner accumulator per `(SourceSet, IMT)`.
//!
//! ## License
//!
//! Licensed under the Apache License, Version 2.0 ([Apache-2.0](http://www.apache.org/licenses/LICENSE-2.0))
//!
//! ---
//!
//! ```text
//! Copyright 2025 Andrey Stepnov, GEOPHYSTECH LLC
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! you may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.
//! ```
//! ---

pub mod auxilary;
pub mod config;
pub mod deagg;
pub mod error;
pub mod geo;
pub mod gmm;
pub mod logic_tree;
pub mod mfd;
pub mod pipeline;
pub mod readers;
pub mod rupture;
pub mod site;
pub mod source;
pub mod writers;
pub mod xy_sequence;
