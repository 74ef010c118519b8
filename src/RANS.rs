//! # RANS Grid Convergence Module
//!
//! Three-mesh Grid Convergence Index (GCI) analysis for steady (RANS) simulations,
//! following the Richardson extrapolation procedure of Celik et al. (2008).
//!
//! ## Procedure
//!
//! For meshes 1 (finer), 2 (medium) and 3 (coarser) with spacings `h1 < h2 < h3`:
//!
//! ```text
//! r21 = h2/h1,   r32 = h3/h2
//! e21 = f2 - f1, e32 = f3 - f2,  s = sign(e32/e21)
//! p   = | ln|e32/e21| + q(p) | / ln(r21)
//! q(p) = ln( (r21^p - s) / (r32^p - s) )
//! f_ext21 = (r21^p f1 - f2) / (r21^p - 1)
//! GCI21   = 1.25 |(f1 - f2)/f1| / (r21^p - 1)
//! ```
//!
//! The relation for the apparent order `p` is implicit whenever `r21 != r32`; it is solved
//! independently for every coordinate row by minimizing `|p - p_apparent(p)|` with a
//! Nelder-Mead simplex started from the classical second order.
//!
//! ## Main Structures
//!
//! - **`OrderEstimator`** (`order_estimator`): apparent order of one row
//! - **`extrapolate_row`** (`richardson`): extrapolated values, relative errors and GCI
//! - **`RansAnalysis`** (`rans_analysis`): whole-table pipeline producing a `RansReport`
//!
//! Rows where the order or the extrapolation is undefined are removed from the report and
//! counted in its `RowDiagnostics`.
pub mod order_estimator;
pub mod rans_analysis;
mod rans_tests;
pub mod richardson;
