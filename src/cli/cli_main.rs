use super::cli_examples::examples_menu;
use super::cli_study::{Prompter, study_menu};
use crate::case_runner::run_from_config;
use crate::settings::{AnalysisConfig, AnalysisMethod, DEFAULT_FILE, DEFAULT_WORKDIR};
use log::error;
use std::io::{self, Write};
use std::path::Path;

pub fn run_interactive_menu() {
    let workdir = Path::new(DEFAULT_WORKDIR);
    loop {
        show_main_menu();
        let Some(choice) = get_user_input() else {
            break;
        };

        match choice.trim() {
            "1" => study_menu(AnalysisMethod::Rans, workdir),
            "2" => study_menu(AnalysisMethod::Les, workdir),
            "3" => case_file_menu(),
            "4" => write_templates(workdir),
            "5" => examples_menu(),
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
/* colors
Blue (\x1b[34m) - Welcome header text

Yellow (\x1b[33m) - Menu options

Cyan (\x1b[36m) - "Enter your choice:" prompt

Reset (\x1b[0m) - Returns to normal color after each colored section
*/
fn show_main_menu() {
    println!(
        "\x1b[34m\n GridConvergence: discretization error of CFD results computed on\n
    several meshes (RANS Grid Convergence Index, LES error separation) \n \x1b[0m"
    );
    println!("\x1b[33m1. RANS Grid Convergence Index (3 meshes)\x1b[0m");
    println!("\x1b[33m2. LES numerical and modelling errors (3 or 5 meshes)\x1b[0m");
    println!("\x1b[33m3. Run a case file\x1b[0m");
    println!("\x1b[33m4. Write case file templates\x1b[0m");
    println!("\x1b[33m5. Examples\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
    print!("\x1b[36mEnter your choice: \x1b[0m");
    io::stdout().flush().ok();
}

/// Runs a saved case; data files are looked up next to it.
fn case_file_menu() {
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock());
    let default = Path::new(DEFAULT_WORKDIR).join(DEFAULT_FILE);
    let path = match prompter.ask_text("Case file", &default.to_string_lossy()) {
        Ok(path) => path,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
    let path = Path::new(&path);
    let workdir = path.parent().unwrap_or(Path::new("."));
    match AnalysisConfig::load(path).and_then(|config| run_from_config(&config, workdir)) {
        Ok(outcome) => println!("\x1b[32m{} result files written\x1b[0m", outcome.written.len()),
        Err(e) => println!("\x1b[31mStudy failed: {}\x1b[0m", e),
    }
}

fn write_templates(workdir: &Path) {
    let templates = [
        ("rans_case.json", AnalysisConfig::default_rans()),
        ("les_case.json", AnalysisConfig::default_les()),
    ];
    if let Err(e) = std::fs::create_dir_all(workdir) {
        println!("\x1b[31mcannot create {}: {}\x1b[0m", workdir.display(), e);
        return;
    }
    for (name, config) in templates {
        let path = workdir.join(name);
        match config.save(&path) {
            Ok(()) => println!("template written to {}", path.display()),
            Err(e) => println!("\x1b[31m{}\x1b[0m", e),
        }
    }
}

/// `None` once stdin is closed
pub(crate) fn get_user_input() -> Option<String> {
    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input),
    }
}
