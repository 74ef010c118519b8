//! # Settings Module
//!
//! ## Purpose
//! Holds the explicit configuration of one grid convergence study. Everything the
//! pipelines need (method, meshes, variable, solver budgets) lives in an
//! [`AnalysisConfig`] value; prompting only ever builds one, computation never prompts.
//!
//! ## Configuration File
//! The configuration is persisted as `case_information.json` in the working directory,
//! so a second run on the same case does not ask for the mesh data again:
//! ```json
//! {
//!   "method": "Rans",
//!   "dimensionality": 3,
//!   "meshes": [
//!     { "elements": 8000, "measure": 1.0 },
//!     { "elements": 1000, "measure": 1.0 },
//!     { "elements": 125, "measure": 1.0 }
//!   ],
//!   "variable_name": "U",
//!   "axis_name": "x",
//!   "data_files": ["fine.csv", "medium.csv", "coarse.csv"]
//! }
//! ```
//! Every other field falls back to its default. Without `axis_name` the study is a point
//! analysis and takes its samples from `point_values`.
//!
//! ## Defaults
//! | Setting | Default |
//! |---------|---------|
//! | order_tolerance | 1e-6 |
//! | order_max_iterations | 1000 |
//! | initial_order | 2.0 |
//! | les_tolerance | 1e-10 |
//! | les_max_iterations | 200 |
//! | assumed_numerical_order | 1.7 |
//! | assumed_modeling_order | 1.5 |
//! | initial_guess | (0.007, 1, 1, 1.7, 1.5) |

use crate::LES::error_separator::{
    ASSUMED_MODELING_ORDER, ASSUMED_NUMERICAL_ORDER, DEFAULT_INITIAL_GUESS,
};
use crate::Mesh::spacing_model::{
    Dimensionality, MAX_REFINEMENT_LEVELS, MeshDescriptor, MeshHierarchy,
};
use crate::RANS::order_estimator::CLASSICAL_ORDER;
use crate::errors::{AnalysisError, ConvergenceError};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// file name of the persisted case information
pub const DEFAULT_FILE: &str = "case_information.json";
/// directory holding the case information, the data files and `results/`
pub const DEFAULT_WORKDIR: &str = "treatment";

/// The caller always selects the method, it is never inferred from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisMethod {
    /// three-mesh apparent order and GCI
    Rans,
    /// numerical/modelling error separation on 3 or 5 meshes
    Les,
}

/// Budgets and starting points of the iterative solvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub order_tolerance: f64,
    pub order_max_iterations: usize,
    pub initial_order: f64,
    pub les_tolerance: f64,
    pub les_max_iterations: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            order_tolerance: 1e-6,
            order_max_iterations: 1000,
            initial_order: CLASSICAL_ORDER,
            les_tolerance: 1e-10,
            les_max_iterations: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LesSettings {
    /// pn of the three-level method
    pub assumed_numerical_order: f64,
    /// pm of the three-level method
    pub assumed_modeling_order: f64,
    /// (Sc, cn, cm, pn, pm) seed of the five-level method
    pub initial_guess: [f64; 5],
}

impl Default for LesSettings {
    fn default() -> Self {
        Self {
            assumed_numerical_order: ASSUMED_NUMERICAL_ORDER,
            assumed_modeling_order: ASSUMED_MODELING_ORDER,
            initial_guess: DEFAULT_INITIAL_GUESS,
        }
    }
}

/// Complete description of one study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub method: AnalysisMethod,
    pub dimensionality: Dimensionality,
    /// ordered finest to coarsest
    pub meshes: Vec<MeshDescriptor>,
    pub variable_name: String,
    /// `None` for a point analysis (one value per mesh)
    #[serde(default)]
    pub axis_name: Option<String>,
    /// one file per mesh, finest first; discovered by size when absent
    #[serde(default)]
    pub data_files: Option<Vec<PathBuf>>,
    /// detected from the first numeric line when absent
    #[serde(default)]
    pub delimiter: Option<char>,
    /// one value per mesh, finest first, for a point analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_values: Option<Vec<f64>>,
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub les: LesSettings,
}

impl AnalysisConfig {
    pub fn new(
        method: AnalysisMethod,
        dimensionality: Dimensionality,
        meshes: Vec<MeshDescriptor>,
        variable_name: &str,
    ) -> Self {
        Self {
            method,
            dimensionality,
            meshes,
            variable_name: variable_name.to_string(),
            axis_name: None,
            data_files: None,
            delimiter: None,
            point_values: None,
            solver: SolverSettings::default(),
            les: LesSettings::default(),
        }
    }

    /// Template of a 3D RANS study, written by the menu as a starting point.
    pub fn default_rans() -> Self {
        let mut config = Self::new(
            AnalysisMethod::Rans,
            Dimensionality::Three,
            vec![
                MeshDescriptor::new(8000, 1.0),
                MeshDescriptor::new(1000, 1.0),
                MeshDescriptor::new(125, 1.0),
            ],
            "U",
        );
        config.axis_name = Some("x".to_string());
        config
    }

    /// Template of a five-level 3D LES study.
    pub fn default_les() -> Self {
        let meshes = [32768u64, 4096, 512, 64, 8]
            .iter()
            .enumerate()
            .map(|(i, &n)| MeshDescriptor::with_time_step(n, 1.0, 1e-3 * 2f64.powi(i as i32)))
            .collect();
        let mut config = Self::new(AnalysisMethod::Les, Dimensionality::Three, meshes, "U");
        config.axis_name = Some("x".to_string());
        config
    }

    pub fn is_point_analysis(&self) -> bool {
        self.axis_name.is_none()
    }

    /// Checks everything that can be checked before any data is read and returns
    /// the mesh hierarchy the pipelines run on.
    pub fn validate(&self) -> Result<MeshHierarchy, ConvergenceError> {
        let levels = self.meshes.len();
        if levels > MAX_REFINEMENT_LEVELS {
            return Err(ConvergenceError::InvalidInput(format!(
                "{} meshes given, at most {} refinement levels are supported",
                levels, MAX_REFINEMENT_LEVELS
            )));
        }
        match self.method {
            AnalysisMethod::Rans if levels != 3 => {
                return Err(ConvergenceError::InvalidInput(format!(
                    "RANS analysis needs exactly 3 meshes, {} given",
                    levels
                )));
            }
            AnalysisMethod::Les if levels != 3 && levels != 5 => {
                return Err(ConvergenceError::InvalidInput(format!(
                    "LES analysis needs 3 or 5 meshes, {} given",
                    levels
                )));
            }
            _ => {}
        }
        if self.variable_name.trim().is_empty() {
            return Err(ConvergenceError::InvalidInput(
                "no variable name given".to_string(),
            ));
        }
        if let Some(files) = &self.data_files {
            if files.len() != levels {
                return Err(ConvergenceError::InvalidInput(format!(
                    "{} data files given for {} meshes",
                    files.len(),
                    levels
                )));
            }
        }
        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() {
                return Err(ConvergenceError::InvalidInput(format!(
                    "delimiter '{}' is not a single-byte ASCII character",
                    delimiter
                )));
            }
        }
        if let Some(values) = &self.point_values {
            if values.len() != levels {
                return Err(ConvergenceError::InvalidInput(format!(
                    "{} point values given for {} meshes",
                    values.len(),
                    levels
                )));
            }
        }
        let hierarchy = MeshHierarchy::new(self.meshes.clone(), self.dimensionality)?;
        if self.method == AnalysisMethod::Les {
            hierarchy.les_scales()?;
        }
        Ok(hierarchy)
    }

    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let content = fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        info!("case information loaded from {}", path.display());
        Ok(config)
    }

    /// Loads `path` if it exists.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>, AnalysisError> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AnalysisError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("case information saved to {}", path.display());
        Ok(())
    }
}
