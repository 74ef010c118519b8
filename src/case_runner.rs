//! File-driven study: validate the configuration, read the samples, run the selected
//! pipeline, then print and write the results. Nothing is written unless the whole run
//! succeeds.
use crate::LES::les_analysis::{LesReport, run_les};
use crate::RANS::rans_analysis::{RansReport, run_rans};
use crate::Sampling::sample_aligner::SampleSeries;
use crate::Utils::load_from_file::{detect_delimiter, discover_case_files, load_series};
use crate::Utils::output::{
    print_les_report, print_rans_report, results_dir, write_les_csv, write_rans_csv,
};
use crate::errors::{AnalysisError, ConvergenceError};
use crate::settings::{AnalysisConfig, AnalysisMethod};
use log::info;
use std::path::{Path, PathBuf};

/// axis label of point analyses
pub const POINT_AXIS: &str = "point";

#[derive(Debug, Clone)]
pub enum StudyReport {
    Rans(RansReport),
    Les(LesReport),
}

#[derive(Debug, Clone)]
pub struct StudyOutcome {
    pub report: StudyReport,
    pub written: Vec<PathBuf>,
}

fn mesh_name(i: usize) -> String {
    format!("Mesh {}", i)
}

/// Samples of every mesh, finest first.
pub fn collect_series(
    config: &AnalysisConfig,
    workdir: &Path,
) -> Result<Vec<SampleSeries>, AnalysisError> {
    let levels = config.meshes.len();
    let Some(axis_name) = &config.axis_name else {
        let values = config.point_values.as_ref().ok_or_else(|| {
            ConvergenceError::InvalidInput(
                "a point analysis needs one point value per mesh".to_string(),
            )
        })?;
        return Ok(values
            .iter()
            .enumerate()
            .map(|(i, &v)| SampleSeries::point(&mesh_name(i), v))
            .collect());
    };
    let files = match &config.data_files {
        Some(files) => files
            .iter()
            .map(|f| if f.is_absolute() { f.clone() } else { workdir.join(f) })
            .collect(),
        None => discover_case_files(workdir, levels)?,
    };
    // one delimiter for the whole case, detected on the finest mesh file
    let delimiter = match (config.delimiter, files.first()) {
        (Some(d), _) => Some(d),
        (None, Some(first)) => Some(detect_delimiter(first)?),
        (None, None) => None,
    };
    files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            load_series(file, axis_name, &config.variable_name, delimiter, &mesh_name(i))
        })
        .collect()
}

pub fn run_from_config(
    config: &AnalysisConfig,
    workdir: &Path,
) -> Result<StudyOutcome, AnalysisError> {
    let hierarchy = config.validate()?;
    info!(
        "{:?} study of '{}' on {} meshes, spacings {:?}",
        config.method,
        config.variable_name,
        hierarchy.levels(),
        hierarchy.spacings()
    );
    let series = collect_series(config, workdir)?;
    let axis_name = config.axis_name.as_deref().unwrap_or(POINT_AXIS);
    let (report, written) = match config.method {
        AnalysisMethod::Rans => {
            let report = run_rans(
                &hierarchy,
                &series,
                axis_name,
                &config.variable_name,
                &config.solver,
            )?;
            print_rans_report(&report);
            let path = write_rans_csv(&report, &results_dir(workdir)?)?;
            (StudyReport::Rans(report), vec![path])
        }
        AnalysisMethod::Les => {
            let report = run_les(
                &hierarchy,
                &series,
                axis_name,
                &config.variable_name,
                &config.les,
                &config.solver,
            )?;
            print_les_report(&report);
            let paths = write_les_csv(&report, &results_dir(workdir)?)?;
            (StudyReport::Les(report), paths)
        }
    };
    Ok(StudyOutcome { report, written })
}
