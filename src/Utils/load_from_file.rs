use crate::Sampling::sample_aligner::SampleSeries;
use crate::errors::{AnalysisError, ConvergenceError, DataError};
use log::{info, warn};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// candidates tried by [`detect_delimiter`], in order of preference on a tie
pub const DELIMITER_CANDIDATES: [char; 4] = [',', ';', '\t', ' '];

fn fields(line: &str, delimiter: char) -> usize {
    if delimiter == ' ' || delimiter == '\t' {
        line.split(delimiter).filter(|f| !f.trim().is_empty()).count()
    } else {
        line.split(delimiter).count()
    }
}

/// Picks the delimiter that splits the first line starting with a number into the most
/// fields. Header lines are skipped.
pub fn detect_delimiter(path: &Path) -> Result<char, DataError> {
    let content = fs::read_to_string(path)?;
    let numeric_line = Regex::new(r"^\s*[-+]?\.?\d").map_err(|_| DataError::UndetectedDelimiter {
        file: path.to_path_buf(),
    })?;
    let line = content
        .lines()
        .find(|line| numeric_line.is_match(line))
        .ok_or_else(|| DataError::UndetectedDelimiter {
            file: path.to_path_buf(),
        })?;
    let mut best: Option<(char, usize)> = None;
    for candidate in DELIMITER_CANDIDATES {
        let n = fields(line.trim(), candidate);
        if n >= 2 && best.is_none_or(|(_, m)| n > m) {
            best = Some((candidate, n));
        }
    }
    match best {
        Some((delimiter, n)) => {
            info!(
                "detected delimiter {:?} ({} fields) in {}",
                delimiter,
                n,
                path.display()
            );
            Ok(delimiter)
        }
        None => Err(DataError::UndetectedDelimiter {
            file: path.to_path_buf(),
        }),
    }
}

/// Collapses runs of blanks so whitespace-separated columns parse as single fields.
fn normalize_whitespace(content: &str, delimiter: char) -> String {
    match Regex::new(r"[ \t]+") {
        Ok(blanks) => content
            .lines()
            .map(|line| blanks.replace_all(line.trim(), delimiter.to_string().as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        Err(_) => content.to_string(),
    }
}

fn column_index(headers: &csv::StringRecord, name: &str, file: &Path) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| DataError::MissingColumn {
            file: file.to_path_buf(),
            column: name.to_string(),
        })
}

/// Reads the `axis_name` and `variable_name` columns of a delimited file with a header
/// row. The delimiter is detected when not given.
pub fn load_series(
    path: &Path,
    axis_name: &str,
    variable_name: &str,
    delimiter: Option<char>,
    series_name: &str,
) -> Result<SampleSeries, AnalysisError> {
    let delimiter = match delimiter {
        Some(d) => d,
        None => detect_delimiter(path)?,
    };
    let delimiter_byte = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            ConvergenceError::InvalidInput(format!(
                "delimiter '{}' is not a single-byte ASCII character",
                delimiter
            ))
        })?;
    let content = fs::read_to_string(path).map_err(DataError::from)?;
    let content = if delimiter == ' ' || delimiter == '\t' {
        normalize_whitespace(&content, delimiter)
    } else {
        content
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter_byte)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers().map_err(DataError::from)?.clone();
    let axis_idx = column_index(&headers, axis_name, path)?;
    let var_idx = column_index(&headers, variable_name, path)?;

    let mut coordinates = Vec::new();
    let mut values = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(DataError::from)?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        // the header is line 1
        let line = row + 2;
        let parse = |idx: usize| -> Result<f64, DataError> {
            let raw = record.get(idx).unwrap_or("");
            raw.parse::<f64>().map_err(|_| DataError::Parse {
                file: path.to_path_buf(),
                line,
                value: raw.to_string(),
            })
        };
        coordinates.push(parse(axis_idx)?);
        values.push(parse(var_idx)?);
    }
    info!(
        "loaded {} samples of '{}' over '{}' from {}",
        values.len(),
        variable_name,
        axis_name,
        path.display()
    );
    Ok(SampleSeries::new(series_name, coordinates, values)?)
}

/// Data files of a case directory ordered by size, largest first: the finest mesh
/// usually writes the most samples. Case files (`.json`) and hidden files are skipped.
pub fn discover_case_files(dir: &Path, count: usize) -> Result<Vec<PathBuf>, DataError> {
    let mut files: Vec<(u64, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let is_case_file = path.extension().is_some_and(|ext| ext == "json");
        if name.starts_with('.') || is_case_file {
            continue;
        }
        files.push((metadata.len(), path));
    }
    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    if files.len() < count {
        return Err(DataError::NotEnoughFiles {
            dir: dir.to_path_buf(),
            expected: count,
            found: files.len(),
        });
    }
    if files.len() > count {
        warn!(
            "{} files found in {}, using the {} largest",
            files.len(),
            dir.display(),
            count
        );
    }
    let selected: Vec<PathBuf> = files.into_iter().take(count).map(|(_, p)| p).collect();
    for (i, path) in selected.iter().enumerate() {
        info!("Mesh {} <- {}", i, path.display());
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_FILE;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_detects_common_delimiters() {
        let comma = file_with("x,U,V\n0.0,1.0,2.0\n");
        assert_eq!(detect_delimiter(comma.path()).unwrap(), ',');
        let semicolon = file_with("x;U;V\n0.5;1.5;2\n");
        assert_eq!(detect_delimiter(semicolon.path()).unwrap(), ';');
        let tabs = file_with("x\tU\n0.0\t1.0\n");
        assert_eq!(detect_delimiter(tabs.path()).unwrap(), '\t');
        let blanks = file_with("# comment\n  x    U\n  0.0    1.0\n");
        assert_eq!(detect_delimiter(blanks.path()).unwrap(), ' ');
    }

    #[test]
    fn test_undetectable_delimiter() {
        let single = file_with("U\n1.0\n2.0\n");
        assert!(matches!(
            detect_delimiter(single.path()),
            Err(DataError::UndetectedDelimiter { .. })
        ));
        let text = file_with("no numbers here\n");
        assert!(detect_delimiter(text.path()).is_err());
    }

    #[test]
    fn test_load_series_by_header() {
        let file = file_with("V, x, U\n9, 0.0, 1.0\n9, 0.5, 1.5\n9, 1.0, 2.5\n");
        let s = load_series(file.path(), "x", "u", None, "Mesh 0").unwrap();
        assert_eq!(s.name, "Mesh 0");
        assert_eq!(s.coordinates, vec![0.0, 0.5, 1.0]);
        assert_eq!(s.values, vec![1.0, 1.5, 2.5]);
    }

    #[test]
    fn test_load_whitespace_separated() {
        let file = file_with("x    U\n0.0   1.0\n1.0\t\t2.0\n");
        let s = load_series(file.path(), "x", "U", Some(' '), "Mesh 1").unwrap();
        assert_eq!(s.values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_missing_column_and_bad_number() {
        let file = file_with("x,U\n0.0,1.0\n");
        assert!(matches!(
            load_series(file.path(), "x", "p", Some(','), "Mesh 0"),
            Err(AnalysisError::Data(DataError::MissingColumn { .. }))
        ));
        let bad = file_with("x,U\n0.0,1.0\n0.5,abc\n");
        assert!(matches!(
            load_series(bad.path(), "x", "U", Some(','), "Mesh 0"),
            Err(AnalysisError::Data(DataError::Parse { line: 3, .. }))
        ));
    }

    #[test]
    fn test_non_ascii_delimiter_is_invalid_input() {
        // U+012C truncated to a byte is the comma
        let file = file_with("x,U\n0.0,1.0\n");
        for delimiter in ['\u{12C}', '→'] {
            assert!(matches!(
                load_series(file.path(), "x", "U", Some(delimiter), "Mesh 0"),
                Err(AnalysisError::Convergence(ConvergenceError::InvalidInput(_)))
            ));
        }
    }

    #[test]
    fn test_empty_file_is_invalid_input() {
        let file = file_with("x,U\n");
        assert!(matches!(
            load_series(file.path(), "x", "U", Some(','), "Mesh 0"),
            Err(AnalysisError::Convergence(ConvergenceError::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_discover_orders_by_size() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("coarse.csv"), "x,U\n0,1\n").unwrap();
        fs::write(dir.path().join("fine.csv"), "x,U\n0,1\n1,2\n2,3\n3,4\n").unwrap();
        fs::write(dir.path().join("medium.csv"), "x,U\n0,1\n1,2\n").unwrap();
        fs::write(dir.path().join(DEFAULT_FILE), "{ \"a very long\": \"json file that is skipped\" }").unwrap();
        fs::create_dir(dir.path().join("results")).unwrap();
        let files = discover_case_files(dir.path(), 3).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["fine.csv", "medium.csv", "coarse.csv"]);
        assert!(matches!(
            discover_case_files(dir.path(), 5),
            Err(DataError::NotEnoughFiles { found: 3, .. })
        ));
    }
}
