//! # GridConvergence
//!
//! Discretization error of CFD results computed on a sequence of systematically
//! refined meshes.
//!
//! - [`RANS`]: apparent order of convergence, Richardson extrapolation and the Grid
//!   Convergence Index (safety factor 1.25) from three meshes.
//! - [`LES`]: separation of numerical and modelling errors from three meshes (closed
//!   form with assumed orders) or five meshes (nonlinear system for the orders).
//! - [`Mesh`]: characteristic lengths, refinement ratios and LES scales.
//! - [`Sampling`]: alignment of per-mesh samples on a common coordinate.
//! - [`Numerics`]: Nelder-Mead minimizer.
//!
//! A study is described by [`settings::AnalysisConfig`] and run by
//! [`case_runner::run_from_config`]; the binary builds that configuration from an
//! interactive menu or reads it from a JSON file.
#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod LES;
#[allow(non_snake_case)]
pub mod Mesh;
#[allow(non_snake_case)]
pub mod Numerics;
#[allow(non_snake_case)]
pub mod RANS;
#[allow(non_snake_case)]
pub mod Sampling;
#[allow(non_snake_case)]
pub mod Utils;
pub mod case_runner;
pub mod cli;
pub mod errors;
pub mod settings;
