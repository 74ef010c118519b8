//! # Error taxonomy of the convergence analysis
//!
//! Two families of failures are distinguished:
//! - **run-global** errors (`InvalidDimension`, `DegenerateRefinement`, `UnsortedSeries`,
//!   `LesSystemUnsolved`, `InvalidInput`) abort the whole run before anything is written;
//! - **row-local** errors (`DivisionByZero`, `OrderEstimationDidNotConverge`,
//!   `ExtrapolationUndefined`) only remove one coordinate row from the results and are
//!   collected in [`RowDiagnostics`].
//!
//! `SeparationUndefined` is raised by the three-level LES method and is run-global as well.
//!
//! [`DataError`] covers the file layer (reading samples, case information, writing
//! results) and [`AnalysisError`] is what a file-driven run returns.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvergenceError {
    #[error("invalid dimensionality {0}: only 2D (area) and 3D (volume) analyses are supported")]
    InvalidDimension(u32),

    #[error(
        "degenerate refinement between mesh {finer} and mesh {coarser}: refinement ratio {ratio} must be greater than 1"
    )]
    DegenerateRefinement {
        finer: usize,
        coarser: usize,
        ratio: f64,
    },

    #[error("series '{series}' is not monotonic in its coordinate (at sample {index})")]
    UnsortedSeries { series: String, index: usize },

    #[error("zero error difference e21 at coordinate {coordinate}: error ratio is undefined")]
    DivisionByZero { coordinate: f64 },

    #[error(
        "apparent order did not converge at coordinate {coordinate} after {iterations} iterations"
    )]
    OrderEstimationDidNotConverge { coordinate: f64, iterations: usize },

    #[error("Richardson extrapolation undefined at coordinate {coordinate} (r^p = {ratio_power})")]
    ExtrapolationUndefined { coordinate: f64, ratio_power: f64 },

    #[error("LES error separation undefined: denominator {denominator:e} is too close to zero")]
    SeparationUndefined { denominator: f64 },

    #[error(
        "LES nonlinear system unsolved after {iterations} iterations (residual {residual:e})"
    )]
    LesSystemUnsolved { iterations: usize, residual: f64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ConvergenceError {
    /// true for the failures that only discard a single coordinate row
    pub fn is_row_local(&self) -> bool {
        matches!(
            self,
            ConvergenceError::DivisionByZero { .. }
                | ConvergenceError::OrderEstimationDidNotConverge { .. }
                | ConvergenceError::ExtrapolationUndefined { .. }
        )
    }
}

/// Counters of the rows excluded from a result table, by failure kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowDiagnostics {
    pub division_by_zero: usize,
    pub did_not_converge: usize,
    pub extrapolation_undefined: usize,
    /// rows of the reference series with no overlap on some other mesh
    pub dropped_by_alignment: usize,
    pub failures: Vec<ConvergenceError>,
}

impl RowDiagnostics {
    pub fn record(&mut self, failure: ConvergenceError) {
        match failure {
            ConvergenceError::DivisionByZero { .. } => self.division_by_zero += 1,
            ConvergenceError::OrderEstimationDidNotConverge { .. } => self.did_not_converge += 1,
            ConvergenceError::ExtrapolationUndefined { .. } => self.extrapolation_undefined += 1,
            _ => {}
        }
        self.failures.push(failure);
    }

    /// number of rows removed by the solvers (alignment losses not included)
    pub fn excluded(&self) -> usize {
        self.division_by_zero + self.did_not_converge + self.extrapolation_undefined
    }
}

/// Failures of the file layer.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("column '{column}' not found in {}", file.display())]
    MissingColumn { file: PathBuf, column: String },

    #[error("cannot parse '{value}' as a number in {} (line {line})", file.display())]
    Parse {
        file: PathBuf,
        line: usize,
        value: String,
    },

    #[error("no delimiter could be detected in {}", file.display())]
    UndetectedDelimiter { file: PathBuf },

    #[error("expected {expected} data files in {}, found {found}", dir.display())]
    NotEnoughFiles {
        dir: PathBuf,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Convergence(#[from] ConvergenceError),

    #[error(transparent)]
    Data(#[from] DataError),
}

impl From<std::io::Error> for AnalysisError {
    fn from(e: std::io::Error) -> Self {
        AnalysisError::Data(DataError::Io(e))
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::Data(DataError::Json(e))
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(e: csv::Error) -> Self {
        AnalysisError::Data(DataError::Csv(e))
    }
}
