use crate::LES::les_analysis::LesReport;
use crate::RANS::rans_analysis::RansReport;
use crate::errors::DataError;
use log::info;
use prettytable::{Table, row};
use std::fs;
use std::path::{Path, PathBuf};

/// sub-directory of the work directory receiving every result file
pub const RESULTS_DIR: &str = "results";

pub const RANS_HEADERS: [&str; 11] = [
    "e21",
    "e32",
    "Sign",
    "Aparent Order",
    "Optimized Order",
    "Order Error",
    "Extrapolated Value (Finer, Medium)",
    "Extrapolated Value (Medium, Coarser)",
    "Aproximated Relative Error",
    "Extrapolated Relative Error",
    "Grid Convergence Index",
];

pub const LES_HEADERS: [&str; 4] = ["Sc", "Numerical Error", "Modelling Error", "Total Error"];

/// `<workdir>/results`, created on demand
pub fn results_dir(workdir: &Path) -> Result<PathBuf, DataError> {
    let dir = workdir.join(RESULTS_DIR);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn file_stem(variable_name: &str) -> String {
    variable_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Writes `gci_<variable>.csv`: coordinate, the three mesh values and the GCI columns.
pub fn write_rans_csv(report: &RansReport, dir: &Path) -> Result<PathBuf, DataError> {
    let path = dir.join(format!("gci_{}.csv", file_stem(&report.variable_name)));
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)?;
    let mut header = vec![
        report.axis_name.as_str(),
        "Mesh 0",
        "Mesh 1",
        "Mesh 2",
    ];
    header.extend(RANS_HEADERS);
    writer.write_record(&header)?;
    for row in &report.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("{} GCI rows written to {}", report.rows.len(), path.display());
    Ok(path)
}

/// Writes one `les_<variable>_mesh_<i>.csv` table per mesh and `les_<variable>_summary.csv`.
pub fn write_les_csv(report: &LesReport, dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    let stem = file_stem(&report.variable_name);
    let mut written = Vec::with_capacity(report.meshes.len() + 1);
    for table in &report.meshes {
        let path = dir.join(format!("les_{}_mesh_{}.csv", stem, table.mesh));
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        let mesh_column = format!("Mesh {}", table.mesh);
        let mut header = vec![report.axis_name.as_str(), mesh_column.as_str()];
        header.extend(LES_HEADERS);
        writer.write_record(&header)?;
        for row in &table.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        written.push(path);
    }
    let path = dir.join(format!("les_{}_summary.csv", stem));
    let mut writer = csv::Writer::from_path(&path)?;
    writer.serialize(&report.summary)?;
    writer.flush()?;
    written.push(path);
    info!(
        "LES tables of '{}' written to {}",
        report.variable_name,
        dir.display()
    );
    Ok(written)
}

pub fn print_rans_report(report: &RansReport) {
    println!(
        "\n=== GRID CONVERGENCE INDEX: {} over {} ===",
        report.variable_name, report.axis_name
    );
    println!("r21 = {:.6}, r32 = {:.6}", report.r21, report.r32);
    let mut table = Table::new();
    table.add_row(row![
        report.axis_name,
        "Finer",
        "Medium",
        "Coarser",
        "Sign",
        "Apparent order",
        "Order error",
        "Extrapolated",
        "GCI"
    ]);
    for r in &report.rows {
        table.add_row(row![
            format!("{:.4}", r.coordinate),
            format!("{:.6e}", r.finer),
            format!("{:.6e}", r.medium),
            format!("{:.6e}", r.coarser),
            format!("{}", r.sign),
            format!("{:.4}", r.apparent_order),
            format!("{:.2e}", r.order_error),
            format!("{:.6e}", r.extrapolated_fine_medium),
            format!("{:.4e}", r.gci)
        ]);
    }
    table.printstd();
    let d = &report.diagnostics;
    if d.excluded() > 0 || d.dropped_by_alignment > 0 {
        println!(
            "excluded rows: {} zero e21, {} order not converged, {} undefined extrapolation; {} not covered by every mesh",
            d.division_by_zero, d.did_not_converge, d.extrapolation_undefined, d.dropped_by_alignment
        );
    }
    if let (Some(order), Some(gci)) = (report.mean_apparent_order(), report.max_gci()) {
        println!("mean apparent order: {:.4}, largest GCI: {:.4e}", order, gci);
    }
}

pub fn print_les_report(report: &LesReport) {
    println!(
        "\n=== LES ERROR SEPARATION ({}): {} over {} ===",
        report.method, report.variable_name, report.axis_name
    );
    for mesh in &report.meshes {
        println!("\nMesh {}:", mesh.mesh);
        let mut table = Table::new();
        table.add_row(row![
            report.axis_name,
            "Value",
            "Sc",
            "Numerical error",
            "Modelling error",
            "Total error"
        ]);
        for r in &mesh.rows {
            table.add_row(row![
                format!("{:.4}", r.coordinate),
                format!("{:.6e}", r.value),
                format!("{:.6e}", r.sc),
                format!("{:.4e}", r.numerical_error),
                format!("{:.4e}", r.modeling_error),
                format!("{:.4e}", r.total_error)
            ]);
        }
        table.printstd();
    }
    let s = &report.summary;
    let mut table = Table::new();
    table.add_row(row!["Parameter", "Value"]);
    table.add_row(row!["Numerical order (pn)", format!("{:.4}", s.numerical_order)]);
    table.add_row(row!["Modelling order (pm)", format!("{:.4}", s.modeling_order)]);
    table.add_row(row!["Mean Sc", format!("{:.6e}", s.mean_sc)]);
    table.add_row(row!["Mean cn", format!("{:.6e}", s.mean_numerical_constant)]);
    table.add_row(row!["Mean cm", format!("{:.6e}", s.mean_modeling_constant)]);
    table.add_row(row!["delta", format!("{:.6e}", s.delta)]);
    table.add_row(row!["hstar", format!("{:.6e}", s.hstar)]);
    table.add_row(row!["Mean refinement rate", format!("{:.4}", s.mean_ratio)]);
    println!("\nSummary:");
    table.printstd();
}
