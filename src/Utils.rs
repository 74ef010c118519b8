//! File glue around the pipelines: reading per-mesh sample files, writing result
//! tables as CSV and printing them to the terminal.
pub mod load_from_file;
pub mod output;
