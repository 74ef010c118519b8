use super::order_estimator::OrderEstimator;
use super::richardson::extrapolate_row;
use crate::Mesh::spacing_model::MeshHierarchy;
use crate::Sampling::sample_aligner::{AlignedTable, SampleSeries, align};
use crate::errors::{ConvergenceError, RowDiagnostics};
use crate::settings::SolverSettings;
use log::{info, warn};
use serde::Serialize;

/// index of the medium mesh, whose coordinates are used as the common axis
pub const RANS_REFERENCE_MESH: usize = 1;

/// One fully resolved coordinate row of a RANS study. Fields are in the column order of
/// the written GCI table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RansRow {
    pub coordinate: f64,
    pub finer: f64,
    pub medium: f64,
    pub coarser: f64,
    pub e21: f64,
    pub e32: f64,
    pub sign: f64,
    pub apparent_order: f64,
    pub optimized_order: f64,
    pub order_error: f64,
    pub extrapolated_fine_medium: f64,
    pub extrapolated_medium_coarse: f64,
    pub approx_relative_error: f64,
    pub extrapolated_relative_error: f64,
    pub gci: f64,
}

/// Result of one (variable, axis) RANS run.
#[derive(Debug, Clone, PartialEq)]
pub struct RansReport {
    pub variable_name: String,
    pub axis_name: String,
    pub r21: f64,
    pub r32: f64,
    pub rows: Vec<RansRow>,
    pub diagnostics: RowDiagnostics,
}

impl RansReport {
    /// largest GCI over the retained rows
    pub fn max_gci(&self) -> Option<f64> {
        self.rows.iter().map(|r| r.gci).reduce(f64::max)
    }

    pub fn mean_apparent_order(&self) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        Some(self.rows.iter().map(|r| r.apparent_order).sum::<f64>() / self.rows.len() as f64)
    }
}

/// Three-mesh GCI pipeline: order estimation then Richardson extrapolation, row by row.
#[derive(Debug, Clone)]
pub struct RansAnalysis {
    estimator: OrderEstimator,
}

impl RansAnalysis {
    pub fn new(hierarchy: &MeshHierarchy) -> Result<Self, ConvergenceError> {
        if hierarchy.levels() != 3 {
            return Err(ConvergenceError::InvalidInput(format!(
                "RANS grid convergence needs exactly 3 meshes, got {}",
                hierarchy.levels()
            )));
        }
        let r = hierarchy.refinement_ratios();
        Self::from_ratios(r[0], r[1])
    }

    /// For studies where the refinement ratios are known directly.
    pub fn from_ratios(r21: f64, r32: f64) -> Result<Self, ConvergenceError> {
        Ok(Self {
            estimator: OrderEstimator::new(r21, r32)?,
        })
    }

    pub fn with_solver(mut self, tolerance: f64, max_iterations: usize, initial_order: f64) -> Self {
        self.estimator = self
            .estimator
            .with_solver(tolerance, max_iterations, initial_order);
        self
    }

    pub fn estimator(&self) -> &OrderEstimator {
        &self.estimator
    }

    /// Pure per-row computation, independent of every other row.
    pub fn analyse_row(&self, coordinate: f64, values: [f64; 3]) -> Result<RansRow, ConvergenceError> {
        let [finer, medium, coarser] = values;
        let order = self
            .estimator
            .estimate_row(coordinate, finer, medium, coarser)?;
        let extrapolation = extrapolate_row(
            coordinate,
            values,
            self.estimator.r21,
            self.estimator.r32,
            order.apparent_order,
        )?;
        Ok(RansRow {
            coordinate,
            finer,
            medium,
            coarser,
            e21: order.e21,
            e32: order.e32,
            sign: order.sign,
            apparent_order: order.apparent_order,
            optimized_order: order.optimized_order,
            order_error: order.order_error,
            extrapolated_fine_medium: extrapolation.fine_medium,
            extrapolated_medium_coarse: extrapolation.medium_coarse,
            approx_relative_error: extrapolation.approx_relative_error,
            extrapolated_relative_error: extrapolation.extrapolated_relative_error,
            gci: extrapolation.gci,
        })
    }

    /// Runs the analysis on an aligned 3-column table. Rows with an undefined order or
    /// extrapolation are excluded and counted; every other failure aborts the run.
    pub fn run(&self, table: &AlignedTable) -> Result<RansReport, ConvergenceError> {
        if table.n_meshes() != 3 {
            return Err(ConvergenceError::InvalidInput(format!(
                "RANS grid convergence needs 3 mesh columns, table has {}",
                table.n_meshes()
            )));
        }
        info!(
            "GCI analysis of '{}' over '{}': {} rows, r21 = {:.4}, r32 = {:.4}",
            table.variable_name,
            table.axis_name,
            table.n_rows(),
            self.estimator.r21,
            self.estimator.r32
        );
        let mut diagnostics = RowDiagnostics {
            dropped_by_alignment: table.dropped_rows,
            ..RowDiagnostics::default()
        };
        let mut rows = Vec::with_capacity(table.n_rows());
        for (i, &coordinate) in table.coordinates.iter().enumerate() {
            let values = [table.columns[0][i], table.columns[1][i], table.columns[2][i]];
            match self.analyse_row(coordinate, values) {
                Ok(row) => rows.push(row),
                Err(e) if e.is_row_local() => {
                    warn!("row excluded: {}", e);
                    diagnostics.record(e);
                }
                Err(e) => return Err(e),
            }
        }
        if diagnostics.excluded() > 0 {
            warn!(
                "{} rows excluded ({} zero e21, {} not converged, {} undefined extrapolation)",
                diagnostics.excluded(),
                diagnostics.division_by_zero,
                diagnostics.did_not_converge,
                diagnostics.extrapolation_undefined
            );
        }
        info!("GCI analysis finished with {} rows", rows.len());
        Ok(RansReport {
            variable_name: table.variable_name.clone(),
            axis_name: table.axis_name.clone(),
            r21: self.estimator.r21,
            r32: self.estimator.r32,
            rows,
            diagnostics,
        })
    }
}

/// Aligns the three series on the medium mesh and runs the GCI analysis.
pub fn run_rans(
    hierarchy: &MeshHierarchy,
    series: &[SampleSeries],
    axis_name: &str,
    variable_name: &str,
    solver: &SolverSettings,
) -> Result<RansReport, ConvergenceError> {
    if series.len() != hierarchy.levels() {
        return Err(ConvergenceError::InvalidInput(format!(
            "{} sample series given for {} meshes",
            series.len(),
            hierarchy.levels()
        )));
    }
    let analysis = RansAnalysis::new(hierarchy)?.with_solver(
        solver.order_tolerance,
        solver.order_max_iterations,
        solver.initial_order,
    );
    let table = align(series, RANS_REFERENCE_MESH, axis_name, variable_name)?;
    analysis.run(&table)
}
