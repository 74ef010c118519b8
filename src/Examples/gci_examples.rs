//! Manufactured solutions `f = f_exact + C h^p` run through the same pipelines as
//! real data, so the recovered orders and extrapolated values can be compared with
//! the known ones.
use crate::LES::error_separator::LesErrorModel;
use crate::LES::les_analysis::{LesReport, run_les};
use crate::Mesh::spacing_model::{Dimensionality, MeshDescriptor, MeshHierarchy};
use crate::RANS::rans_analysis::{RansReport, run_rans};
use crate::Sampling::sample_aligner::SampleSeries;
use crate::Utils::output::{print_les_report, print_rans_report};
use crate::case_runner::run_from_config;
use crate::errors::{AnalysisError, ConvergenceError};
use crate::settings::{AnalysisConfig, DEFAULT_FILE, LesSettings, SolverSettings};
use log::{error, info};
use std::fs;
use std::path::Path;

/// directory written by the file-driven example
pub const EXAMPLE_CASE_DIR: &str = "gci_example_case";

fn exact(x: f64) -> f64 {
    1.0 + 2.0 * x
}

/// samples of every mesh on its own grid; linear in x so alignment adds no error
fn rans_series(hierarchy: &MeshHierarchy, c: f64, p: f64) -> Result<Vec<SampleSeries>, ConvergenceError> {
    hierarchy
        .spacings()
        .iter()
        .enumerate()
        .map(|(i, &h)| {
            let n = 40 >> i;
            let xs: Vec<f64> = (0..=n).map(|k| k as f64 / n as f64).collect();
            let vs = xs.iter().map(|&x| exact(x) + c * h.powf(p) * (1.0 + x)).collect();
            SampleSeries::new(&format!("Mesh {}", i), xs, vs)
        })
        .collect()
}

/// 3D meshes with r21 = r32 = 2, second order error
pub fn rans_constant_ratio() -> Result<RansReport, ConvergenceError> {
    let meshes = vec![
        MeshDescriptor::new(64000, 1.0),
        MeshDescriptor::new(8000, 1.0),
        MeshDescriptor::new(1000, 1.0),
    ];
    let hierarchy = MeshHierarchy::new(meshes, Dimensionality::Three)?;
    let series = rans_series(&hierarchy, 0.5, 2.0)?;
    run_rans(&hierarchy, &series, "x", "U", &SolverSettings::default())
}

/// r21 = 1.5, r32 = 2 and an order of 1.5, the case where the order equation is
/// really nonlinear
pub fn rans_varying_ratio() -> Result<RansReport, ConvergenceError> {
    let meshes = vec![
        MeshDescriptor::new(27000, 1.0),
        MeshDescriptor::new(8000, 1.0),
        MeshDescriptor::new(1000, 1.0),
    ];
    let hierarchy = MeshHierarchy::new(meshes, Dimensionality::Three)?;
    let series = rans_series(&hierarchy, -0.8, 1.5)?;
    run_rans(&hierarchy, &series, "x", "U", &SolverSettings::default())
}

fn les_hierarchy(levels: usize) -> Result<MeshHierarchy, ConvergenceError> {
    let meshes = [32768u64, 4096, 512, 64, 8]
        .iter()
        .take(levels)
        .enumerate()
        .map(|(i, &n)| MeshDescriptor::with_time_step(n, 1.0, 1e-3 * 2f64.powi(i as i32)))
        .collect();
    MeshHierarchy::new(meshes, Dimensionality::Three)
}

fn les_series(hierarchy: &MeshHierarchy, pn: f64, pm: f64) -> Result<Vec<SampleSeries>, ConvergenceError> {
    let scales = hierarchy.les_scales()?;
    (0..hierarchy.levels())
        .map(|level| {
            let xs: Vec<f64> = (0..=20).map(|k| k as f64 / 20.0).collect();
            let vs = xs
                .iter()
                .map(|&x| {
                    let model = LesErrorModel {
                        sc: 0.01 + x,
                        numerical_constant: 1.3,
                        modeling_constant: 0.8,
                        numerical_order: pn,
                        modeling_order: pm,
                    };
                    model.predicted(level, &scales)
                })
                .collect();
            SampleSeries::new(&format!("Mesh {}", level), xs, vs)
        })
        .collect()
}

/// three meshes generated with the orders the closed form assumes
pub fn les_three_level() -> Result<LesReport, ConvergenceError> {
    let hierarchy = les_hierarchy(3)?;
    let les = LesSettings::default();
    let series = les_series(
        &hierarchy,
        les.assumed_numerical_order,
        les.assumed_modeling_order,
    )?;
    run_les(&hierarchy, &series, "x", "U", &les, &SolverSettings::default())
}

/// five meshes, orders recovered by the nonlinear system
pub fn les_five_level() -> Result<LesReport, ConvergenceError> {
    let hierarchy = les_hierarchy(5)?;
    let series = les_series(&hierarchy, 1.9, 1.3)?;
    run_les(
        &hierarchy,
        &series,
        "x",
        "U",
        &LesSettings::default(),
        &SolverSettings::default(),
    )
}

/// Writes three semicolon separated mesh files and the case file into `dir`.
pub fn write_example_case(dir: &Path) -> Result<AnalysisConfig, AnalysisError> {
    fs::create_dir_all(dir)?;
    let config = AnalysisConfig::default_rans();
    let hierarchy = config.validate()?;
    for (series, name) in rans_series(&hierarchy, 0.5, 2.0)?
        .iter()
        .zip(["fine.csv", "medium.csv", "coarse.csv"])
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_path(dir.join(name))?;
        writer.write_record(["x", "U", "p"])?;
        for (x, u) in series.coordinates.iter().zip(&series.values) {
            writer.write_record(&[x.to_string(), u.to_string(), "0".to_string()])?;
        }
        writer.flush()?;
    }
    config.save(&dir.join(DEFAULT_FILE))?;
    Ok(config)
}

pub fn gci_examples(task: usize) {
    match task {
        0 => match rans_constant_ratio() {
            Ok(report) => print_rans_report(&report),
            Err(e) => error!("{}", e),
        },
        1 => match rans_varying_ratio() {
            Ok(report) => print_rans_report(&report),
            Err(e) => error!("{}", e),
        },
        2 => match les_three_level() {
            Ok(report) => print_les_report(&report),
            Err(e) => error!("{}", e),
        },
        3 => match les_five_level() {
            Ok(report) => print_les_report(&report),
            Err(e) => error!("{}", e),
        },
        4 => {
            let dir = Path::new(EXAMPLE_CASE_DIR);
            let result = write_example_case(dir).and_then(|config| run_from_config(&config, dir));
            match result {
                Ok(outcome) => info!("example case written to {}, {} result files", dir.display(), outcome.written.len()),
                Err(e) => error!("{}", e),
            }
        }
        _ => println!("no example {}", task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    #[test]
    fn test_constant_ratio_recovers_second_order() {
        let report = rans_constant_ratio().unwrap();
        assert_relative_eq!(report.r21, 2.0, epsilon = 1e-12);
        assert_eq!(report.diagnostics.excluded(), 0);
        // medium mesh grid
        assert_eq!(report.rows.len(), 21);
        for row in &report.rows {
            assert_relative_eq!(row.apparent_order, 2.0, epsilon = 1e-3);
            assert_relative_eq!(row.extrapolated_fine_medium, exact(row.coordinate), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_varying_ratio_recovers_order() {
        let report = rans_varying_ratio().unwrap();
        assert_relative_eq!(report.r21, 1.5, epsilon = 1e-9);
        assert_relative_eq!(report.r32, 2.0, epsilon = 1e-9);
        for row in &report.rows {
            assert_relative_eq!(row.apparent_order, 1.5, epsilon = 1e-3);
            assert_eq!(row.sign, 1.0);
        }
    }

    #[test]
    fn test_les_examples() {
        let three = les_three_level().unwrap();
        for row in &three.models {
            assert_relative_eq!(row.model.sc, 0.01 + row.coordinate, epsilon = 1e-8);
        }
        let five = les_five_level().unwrap();
        assert_relative_eq!(five.summary.numerical_order, 1.9, epsilon = 1e-3);
        assert_relative_eq!(five.summary.modeling_order, 1.3, epsilon = 1e-3);
    }

    #[test]
    fn test_example_case_runs_from_files() {
        let dir = tempdir().unwrap();
        let config = write_example_case(dir.path()).unwrap();
        assert!(dir.path().join(DEFAULT_FILE).exists());
        let outcome = run_from_config(&config, dir.path()).unwrap();
        assert_eq!(outcome.written.len(), 1);
    }
}
