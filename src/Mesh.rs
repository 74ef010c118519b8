//! # Mesh Module
//!
//! Converts the mesh metadata of a refinement study (element count, total volume or area
//! and, for LES, the time-step size) into the characteristic lengths used by every
//! convergence method.
//!
//! ## Nomenclature
//!
//! | Symbol | Description |
//! |--------|-------------|
//! | `N_i` | Number of elements (cells) of mesh `i`, finest mesh is `i = 0` |
//! | `V` | Total volume (3D) or area (2D) of the computational domain |
//! | `h_i` | Characteristic spacing `(V / N_i)^(1/d)` |
//! | `r_i` | Refinement ratio `h_{i+1} / h_i`, always greater than 1 |
//! | `dt_i` | Time-step size of simulation `i` (LES only) |
//! | `h*_i` | Combined space/time scale `sqrt(h_i * dt_i)` (LES only) |
//!
//! Meshes are always ordered from the finer to the coarser one.
pub mod spacing_model;
