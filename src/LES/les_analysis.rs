use super::error_separator::{LesErrorModel, five_level_separation, three_level_separation};
use crate::Mesh::spacing_model::{LesScales, MeshHierarchy};
use crate::Sampling::sample_aligner::{AlignedTable, SampleSeries, align};
use crate::errors::ConvergenceError;
use crate::settings::{LesSettings, SolverSettings};
use log::info;
use serde::Serialize;
use std::fmt;

/// Separation method, fixed by the number of mesh levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LesMethod {
    /// closed form with assumed orders
    ThreeLevel,
    /// nonlinear system for constants and orders
    FiveLevel,
}

impl LesMethod {
    pub fn for_levels(levels: usize) -> Result<Self, ConvergenceError> {
        match levels {
            3 => Ok(LesMethod::ThreeLevel),
            5 => Ok(LesMethod::FiveLevel),
            n => Err(ConvergenceError::InvalidInput(format!(
                "LES error separation needs 3 or 5 meshes, got {}",
                n
            ))),
        }
    }

    pub fn levels(&self) -> usize {
        match self {
            LesMethod::ThreeLevel => 3,
            LesMethod::FiveLevel => 5,
        }
    }
}

impl fmt::Display for LesMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LesMethod::ThreeLevel => write!(f, "three-level (assumed orders)"),
            LesMethod::FiveLevel => write!(f, "five-level (nonlinear system)"),
        }
    }
}

/// the middle mesh gives the common coordinate axis
pub fn les_reference_mesh(levels: usize) -> usize {
    levels / 2
}

/// One coordinate row of a per-mesh table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LesMeshRow {
    pub coordinate: f64,
    pub value: f64,
    pub sc: f64,
    pub numerical_error: f64,
    pub modeling_error: f64,
    pub total_error: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LesMeshTable {
    pub mesh: usize,
    pub rows: Vec<LesMeshRow>,
}

/// Error model fitted at one coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct LesRowModel {
    pub coordinate: f64,
    pub model: LesErrorModel,
}

/// One-row summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LesSummary {
    #[serde(rename = "Numerical Order")]
    pub numerical_order: f64,
    #[serde(rename = "Modelling Order")]
    pub modeling_order: f64,
    #[serde(rename = "Sc")]
    pub mean_sc: f64,
    #[serde(rename = "Numerical Constant")]
    pub mean_numerical_constant: f64,
    #[serde(rename = "Modelling Constant")]
    pub mean_modeling_constant: f64,
    #[serde(rename = "Delta")]
    pub delta: f64,
    #[serde(rename = "hstar")]
    pub hstar: f64,
    #[serde(rename = "Mean Refinement Rate")]
    pub mean_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LesReport {
    pub variable_name: String,
    pub axis_name: String,
    pub method: LesMethod,
    pub scales: LesScales,
    pub models: Vec<LesRowModel>,
    /// one table per mesh level, finest first
    pub meshes: Vec<LesMeshTable>,
    pub summary: LesSummary,
    pub dropped_by_alignment: usize,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    sum / n as f64
}

/// Numerical/modelling error separation over an aligned table.
#[derive(Debug, Clone)]
pub struct LesAnalysis {
    method: LesMethod,
    scales: LesScales,
    assumed_numerical_order: f64,
    assumed_modeling_order: f64,
    initial_guess: [f64; 5],
    tolerance: f64,
    max_iterations: usize,
}

impl LesAnalysis {
    pub fn new(
        hierarchy: &MeshHierarchy,
        les: &LesSettings,
        solver: &SolverSettings,
    ) -> Result<Self, ConvergenceError> {
        let method = LesMethod::for_levels(hierarchy.levels())?;
        let scales = hierarchy.les_scales()?;
        Ok(Self::from_scales(method, scales, les, solver))
    }

    /// For studies where delta, hstar and the mean ratio are known directly.
    pub fn from_scales(
        method: LesMethod,
        scales: LesScales,
        les: &LesSettings,
        solver: &SolverSettings,
    ) -> Self {
        Self {
            method,
            scales,
            assumed_numerical_order: les.assumed_numerical_order,
            assumed_modeling_order: les.assumed_modeling_order,
            initial_guess: les.initial_guess,
            tolerance: solver.les_tolerance,
            max_iterations: solver.les_max_iterations,
        }
    }

    pub fn method(&self) -> LesMethod {
        self.method
    }

    pub fn scales(&self) -> &LesScales {
        &self.scales
    }

    /// Fits the error model to the values of one row, finest first.
    pub fn fit_row(&self, values: &[f64]) -> Result<LesErrorModel, ConvergenceError> {
        match (self.method, values) {
            (LesMethod::ThreeLevel, &[s1, s2, s3]) => three_level_separation(
                [s1, s2, s3],
                &self.scales,
                self.assumed_numerical_order,
                self.assumed_modeling_order,
            ),
            (LesMethod::FiveLevel, &[s1, s2, s3, s4, s5]) => five_level_separation(
                [s1, s2, s3, s4, s5],
                &self.scales,
                self.tolerance,
                self.max_iterations,
                self.initial_guess,
            ),
            (method, values) => Err(ConvergenceError::InvalidInput(format!(
                "{} method needs {} values per row, got {}",
                method,
                method.levels(),
                values.len()
            ))),
        }
    }

    /// Fits every row; any failure aborts the run since there is no partial result.
    pub fn run(&self, table: &AlignedTable) -> Result<LesReport, ConvergenceError> {
        if table.n_meshes() != self.method.levels() {
            return Err(ConvergenceError::InvalidInput(format!(
                "{} method needs {} mesh columns, table has {}",
                self.method,
                self.method.levels(),
                table.n_meshes()
            )));
        }
        if table.is_empty() {
            return Err(ConvergenceError::InvalidInput(format!(
                "no common coordinate rows for '{}'",
                table.variable_name
            )));
        }
        info!(
            "LES {} error separation of '{}': {} rows, delta = {:.4e}, hstar = {:.4e}, r = {:.4}",
            self.method,
            table.variable_name,
            table.n_rows(),
            self.scales.delta,
            self.scales.hstar,
            self.scales.mean_ratio
        );

        let mut models = Vec::with_capacity(table.n_rows());
        for (i, &coordinate) in table.coordinates.iter().enumerate() {
            let model = self.fit_row(&table.row(i))?;
            models.push(LesRowModel { coordinate, model });
        }

        let meshes = (0..table.n_meshes())
            .map(|level| LesMeshTable {
                mesh: level,
                rows: models
                    .iter()
                    .zip(&table.columns[level])
                    .map(|(row, &value)| LesMeshRow {
                        coordinate: row.coordinate,
                        value,
                        sc: row.model.sc,
                        numerical_error: row.model.numerical_error(level, &self.scales),
                        modeling_error: row.model.modeling_error(level, &self.scales),
                        total_error: row.model.total_error(level, &self.scales),
                    })
                    .collect(),
            })
            .collect();

        let (numerical_order, modeling_order) = match self.method {
            LesMethod::ThreeLevel => (self.assumed_numerical_order, self.assumed_modeling_order),
            LesMethod::FiveLevel => (
                mean(models.iter().map(|m| m.model.numerical_order)),
                mean(models.iter().map(|m| m.model.modeling_order)),
            ),
        };
        let summary = LesSummary {
            numerical_order,
            modeling_order,
            mean_sc: mean(models.iter().map(|m| m.model.sc)),
            mean_numerical_constant: mean(models.iter().map(|m| m.model.numerical_constant)),
            mean_modeling_constant: mean(models.iter().map(|m| m.model.modeling_constant)),
            delta: self.scales.delta,
            hstar: self.scales.hstar,
            mean_ratio: self.scales.mean_ratio,
        };
        info!(
            "LES error separation finished: pn = {:.4}, pm = {:.4}",
            summary.numerical_order, summary.modeling_order
        );
        Ok(LesReport {
            variable_name: table.variable_name.clone(),
            axis_name: table.axis_name.clone(),
            method: self.method,
            scales: self.scales.clone(),
            models,
            meshes,
            summary,
            dropped_by_alignment: table.dropped_rows,
        })
    }
}

/// Aligns the series on the middle mesh and runs the error separation.
pub fn run_les(
    hierarchy: &MeshHierarchy,
    series: &[SampleSeries],
    axis_name: &str,
    variable_name: &str,
    les: &LesSettings,
    solver: &SolverSettings,
) -> Result<LesReport, ConvergenceError> {
    if series.len() != hierarchy.levels() {
        return Err(ConvergenceError::InvalidInput(format!(
            "{} sample series given for {} meshes",
            series.len(),
            hierarchy.levels()
        )));
    }
    let analysis = LesAnalysis::new(hierarchy, les, solver)?;
    let table = align(
        series,
        les_reference_mesh(hierarchy.levels()),
        axis_name,
        variable_name,
    )?;
    analysis.run(&table)
}
