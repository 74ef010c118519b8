//! # Sampling Module
//!
//! Every mesh of a refinement study samples the variable of interest at its own set of
//! coordinates (a line probe, a time history, ...). Before errors can be compared the
//! series must live on one common axis: this module interpolates all of them onto the
//! coordinates of a reference mesh and keeps only the rows covered by every mesh.
//!
//! - `SampleSeries`: (coordinate, value) pairs of one mesh
//! - `AlignedTable`: shared coordinate column + one value column per mesh
//! - `align()`: monotone index-based linear interpolation, no extrapolation
pub mod sample_aligner;
