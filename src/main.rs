use GridConvergence::case_runner::run_from_config;
use GridConvergence::cli::cli_main::run_interactive_menu;
use GridConvergence::settings::AnalysisConfig;
use log::{LevelFilter, error};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::path::Path;
use std::process::ExitCode;

pub fn main() -> ExitCode {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
    // `GridConvergence <case.json>` runs without prompts, data files next to the case file
    let Some(case_file) = std::env::args().nth(1) else {
        run_interactive_menu();
        return ExitCode::SUCCESS;
    };
    let path = Path::new(&case_file);
    let workdir = path.parent().unwrap_or(Path::new("."));
    match AnalysisConfig::load(path).and_then(|config| run_from_config(&config, workdir)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
