use crate::Mesh::spacing_model::{Dimensionality, MeshDescriptor, characteristic_length_checked};
use crate::Utils::load_from_file::{DELIMITER_CANDIDATES, detect_delimiter, discover_case_files};
use crate::case_runner::run_from_config;
use crate::errors::{AnalysisError, ConvergenceError};
use crate::settings::{AnalysisConfig, AnalysisMethod, DEFAULT_FILE};
use log::{error, info};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Line-oriented questions over any input, so the dialogue can be replayed in tests.
pub struct Prompter<R: BufRead> {
    input: R,
}

impl<R: BufRead> Prompter<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Trimmed answer; closed input is an error so that a dialogue never loops forever.
    pub fn ask(&mut self, question: &str) -> Result<String, ConvergenceError> {
        print!("\x1b[36m{}\x1b[0m ", question);
        io::stdout().flush().ok();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => Err(ConvergenceError::InvalidInput(
                "input closed before the case was complete".to_string(),
            )),
            Ok(_) => Ok(line.trim().to_string()),
        }
    }

    /// Asks until the answer parses; an empty answer takes the default when there is one.
    pub fn ask_parsed<T: FromStr>(
        &mut self,
        question: &str,
        default: Option<T>,
    ) -> Result<T, ConvergenceError> {
        let mut default = default;
        loop {
            let answer = self.ask(question)?;
            if answer.is_empty() {
                if let Some(value) = default.take() {
                    return Ok(value);
                }
            }
            match answer.parse::<T>() {
                Ok(value) => return Ok(value),
                Err(_) => println!("\x1b[31mInvalid value '{}', try again\x1b[0m", answer),
            }
        }
    }

    /// y/n question, empty answer gives `default`
    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool, ConvergenceError> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.ask(&format!("{} {}", question, hint))?;
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => println!("\x1b[31mAnswer y or n\x1b[0m"),
            }
        }
    }

    pub fn ask_text(&mut self, question: &str, default: &str) -> Result<String, ConvergenceError> {
        let answer = self.ask(&format!("{} [{}]", question, default))?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }
}

fn ask_meshes<R: BufRead>(
    prompter: &mut Prompter<R>,
    method: AnalysisMethod,
) -> Result<(Dimensionality, Vec<MeshDescriptor>), ConvergenceError> {
    let dim: u32 = prompter.ask_parsed("Dimensionality of the meshes (2 or 3) [3]:", Some(3))?;
    let dimensionality = Dimensionality::try_from(dim)?;
    let levels = match method {
        AnalysisMethod::Rans => 3,
        AnalysisMethod::Les => loop {
            let n: usize = prompter.ask_parsed("Number of meshes (3 or 5):", None)?;
            if n == 3 || n == 5 {
                break n;
            }
            println!("\x1b[31mLES error separation works with 3 or 5 meshes\x1b[0m");
        },
    };
    let measure: f64 = prompter.ask_parsed(
        "Domain measure, total area or volume of the computational domain:",
        None,
    )?;
    println!("Mesh data from the finest to the coarsest mesh");
    let mut meshes = Vec::with_capacity(levels);
    for i in 0..levels {
        let elements: u64 = prompter.ask_parsed(&format!("Mesh {}: number of elements:", i), None)?;
        let h = characteristic_length_checked(elements, measure, dim)?;
        println!("Mesh {}: characteristic length h = {:.4e}", i, h);
        let mesh = match method {
            AnalysisMethod::Rans => MeshDescriptor::new(elements, measure),
            AnalysisMethod::Les => {
                let dt: f64 = prompter.ask_parsed(&format!("Mesh {}: time step:", i), None)?;
                MeshDescriptor::with_time_step(elements, measure, dt)
            }
        };
        meshes.push(mesh);
    }
    Ok((dimensionality, meshes))
}

fn ask_data_files<R: BufRead>(
    prompter: &mut Prompter<R>,
    workdir: &Path,
    levels: usize,
) -> Result<Vec<PathBuf>, AnalysisError> {
    if let Ok(found) = discover_case_files(workdir, levels) {
        println!("Files assigned by size, finest mesh first:");
        for (i, file) in found.iter().enumerate() {
            println!("  Mesh {}: {}", i, file.display());
        }
        if prompter.confirm("Use this assignment?", true)? {
            return Ok(found);
        }
    }
    let mut files = Vec::with_capacity(levels);
    for i in 0..levels {
        let name = prompter.ask(&format!(
            "Mesh {}: data file (relative to {}):",
            i,
            workdir.display()
        ))?;
        files.push(PathBuf::from(name));
    }
    Ok(files)
}

fn ask_delimiter<R: BufRead>(prompter: &mut Prompter<R>) -> Result<char, ConvergenceError> {
    println!("The delimiter could not be detected:");
    println!("\x1b[33m1. comma  2. semicolon  3. tab  4. blank\x1b[0m");
    loop {
        let choice: usize = prompter.ask_parsed("Enter your choice:", None)?;
        if (1..=DELIMITER_CANDIDATES.len()).contains(&choice) {
            return Ok(DELIMITER_CANDIDATES[choice - 1]);
        }
        println!("Invalid choice. Please try again.");
    }
}

/// Runs the dialogue of one study and returns the configuration; nothing is computed here.
/// Mesh data of a matching `case_information.json` in `workdir` may be reused.
pub fn build_config<R: BufRead>(
    prompter: &mut Prompter<R>,
    method: AnalysisMethod,
    workdir: &Path,
) -> Result<AnalysisConfig, AnalysisError> {
    let case_file = workdir.join(DEFAULT_FILE);
    let previous = AnalysisConfig::load_if_exists(&case_file)?.filter(|c| c.method == method);
    let reused = match previous {
        Some(previous) => {
            let question = format!("Reuse the mesh data of {}?", case_file.display());
            prompter.confirm(&question, true)?.then_some(previous)
        }
        None => None,
    };
    let mut config = match reused {
        Some(mut previous) => {
            previous.data_files = None;
            previous.point_values = None;
            previous
        }
        None => {
            let (dimensionality, meshes) = ask_meshes(prompter, method)?;
            AnalysisConfig::new(method, dimensionality, meshes, "U")
        }
    };
    let levels = config.meshes.len();

    println!("\x1b[33m1. Line data (one file per mesh)\x1b[0m");
    println!("\x1b[33m2. Point data (one value per mesh)\x1b[0m");
    let point = loop {
        match prompter.ask("Enter your choice:")?.as_str() {
            "1" => break false,
            "2" => break true,
            _ => println!("Invalid choice. Please try again."),
        }
    };
    let variable = config.variable_name.clone();
    config.variable_name = prompter.ask_text("Variable name", &variable)?;

    if point {
        config.axis_name = None;
        let mut values = Vec::with_capacity(levels);
        for i in 0..levels {
            values.push(prompter.ask_parsed::<f64>(&format!("Mesh {}: value:", i), None)?);
        }
        config.point_values = Some(values);
    } else {
        let axis = config.axis_name.clone().unwrap_or_else(|| "x".to_string());
        config.axis_name = Some(prompter.ask_text("Coordinate column name", &axis)?);
        let files = ask_data_files(prompter, workdir, levels)?;
        let first = files
            .first()
            .map(|f| if f.is_absolute() { f.clone() } else { workdir.join(f) });
        config.delimiter = match first.map(|f| detect_delimiter(&f)) {
            Some(Ok(_)) => None,
            _ => Some(ask_delimiter(prompter)?),
        };
        config.data_files = Some(files);
    }
    Ok(config)
}

/// Menu entry of one study: dialogue on stdin, persisted case file, run.
pub fn study_menu(method: AnalysisMethod, workdir: &Path) {
    if let Err(e) = fs::create_dir_all(workdir) {
        error!("cannot create {}: {}", workdir.display(), e);
        return;
    }
    println!(
        "\n=== {} ===\nData files are read from {}",
        match method {
            AnalysisMethod::Rans => "RANS Grid Convergence Index",
            AnalysisMethod::Les => "LES numerical and modelling errors",
        },
        workdir.display()
    );
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock());
    let result = build_config(&mut prompter, method, workdir).and_then(|config| {
        config.save(&workdir.join(DEFAULT_FILE))?;
        run_from_config(&config, workdir)
    });
    match result {
        Ok(outcome) => {
            for path in &outcome.written {
                info!("written {}", path.display());
            }
            println!("\x1b[32mDone, results in {}\x1b[0m", workdir.join("results").display());
        }
        Err(e) => {
            error!("{}", e);
            println!("\x1b[31mStudy failed: {}\x1b[0m", e);
        }
    }
}
