//! # LES Error Separation Module
//!
//! Large-eddy simulations mix two sources of error that both shrink with the mesh: the
//! numerical (discretization) error and the modelling error of the subgrid-scale model,
//! whose filter width is tied to the cell size. Following Klein's systematic grid and
//! model variation, the solution on mesh `i` (finest `i = 0`) is modelled as
//!
//! ```text
//! s_i = Sc + cn (r^i h*)^pn + cm (r^i delta)^pm
//! ```
//!
//! | Symbol | Description |
//! |--------|-------------|
//! | `Sc` | Solution at zero spacing |
//! | `cn`, `pn` | Numerical error constant and order |
//! | `cm`, `pm` | Modelling error constant and order |
//! | `r` | Mean refinement ratio of the study |
//! | `h*` | Mean combined space/time scale `sqrt(h dt)` |
//! | `delta` | Largest characteristic length (filter width) |
//!
//! ## Methods
//!
//! - **Three levels**: orders are assumed (`pn = 1.7`, `pm = 1.5` by default) and `Sc`, `cn`,
//!   `cm` follow in closed form.
//! - **Five levels**: the five equations are solved together for `Sc, cn, cm, pn, pm` with
//!   the Newton-Raphson solver of `RustedSciThe`. The start comes from a scan of the orders
//!   with `Sc, cn, cm` fitted by least squares. Since `h*` and `delta` share the ratio `r`,
//!   the numerical and modelling terms can swap; the root whose orders are nearest to
//!   the initial guess `(0.007, 1, 1, 1.7, 1.5)` is kept.
//!
//! Both methods are applied to every aligned coordinate row; any failure stops the run.
pub mod error_separator;
pub mod les_analysis;
