use crate::errors::ConvergenceError;
use log::{info, warn};

/// Values of one variable sampled on one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    /// usually "Mesh i"
    pub name: String,
    pub coordinates: Vec<f64>,
    pub values: Vec<f64>,
}

impl SampleSeries {
    pub fn new(
        name: &str,
        coordinates: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self, ConvergenceError> {
        if coordinates.len() != values.len() {
            return Err(ConvergenceError::InvalidInput(format!(
                "series '{}' has {} coordinates but {} values",
                name,
                coordinates.len(),
                values.len()
            )));
        }
        if coordinates.is_empty() {
            return Err(ConvergenceError::InvalidInput(format!(
                "series '{}' is empty",
                name
            )));
        }
        Ok(Self {
            name: name.to_string(),
            coordinates,
            values,
        })
    }

    /// Single value of a point analysis, placed at coordinate 0.
    pub fn point(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            coordinates: vec![0.0],
            values: vec![value],
        }
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Returns the series with strictly ascending coordinates.
    /// A descending series is reversed, anything else is rejected.
    pub fn normalized(&self) -> Result<SampleSeries, ConvergenceError> {
        let c = &self.coordinates;
        if let Some(index) = c.iter().position(|x| !x.is_finite()) {
            return Err(ConvergenceError::UnsortedSeries {
                series: self.name.clone(),
                index,
            });
        }
        if c.len() < 2 {
            return Ok(self.clone());
        }
        let ascending = c[1] > c[0];
        for i in 0..c.len() - 1 {
            let ordered = if ascending {
                c[i + 1] > c[i]
            } else {
                c[i + 1] < c[i]
            };
            if !ordered {
                return Err(ConvergenceError::UnsortedSeries {
                    series: self.name.clone(),
                    index: i + 1,
                });
            }
        }
        if ascending {
            Ok(self.clone())
        } else {
            Ok(SampleSeries {
                name: self.name.clone(),
                coordinates: c.iter().rev().cloned().collect(),
                values: self.values.iter().rev().cloned().collect(),
            })
        }
    }

    /// Linear interpolation on an ascending series; `None` outside of its domain.
    pub fn interpolate(&self, x: f64) -> Option<f64> {
        let c = &self.coordinates;
        let v = &self.values;
        let n = c.len();
        if n == 0 || x < c[0] || x > c[n - 1] {
            return None;
        }
        let idx = c.partition_point(|&ci| ci < x);
        let value = if c[idx] == x {
            v[idx]
        } else {
            let (x0, x1) = (c[idx - 1], c[idx]);
            let (y0, y1) = (v[idx - 1], v[idx]);
            y0 + (y1 - y0) * (x - x0) / (x1 - x0)
        };
        if value.is_finite() { Some(value) } else { None }
    }
}

/// Samples of all meshes on one shared coordinate column.
/// `columns[i][row]` is the value of mesh `i` (0 = finest) at `coordinates[row]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    pub axis_name: String,
    pub variable_name: String,
    pub coordinates: Vec<f64>,
    pub columns: Vec<Vec<f64>>,
    /// reference rows lost because some mesh did not cover them
    pub dropped_rows: usize,
}

impl AlignedTable {
    /// Builds a table from already aligned columns (each column as long as `coordinates`).
    pub fn from_columns(
        axis_name: &str,
        variable_name: &str,
        coordinates: Vec<f64>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, ConvergenceError> {
        if let Some((i, col)) = columns
            .iter()
            .enumerate()
            .find(|(_, col)| col.len() != coordinates.len())
        {
            return Err(ConvergenceError::InvalidInput(format!(
                "column of mesh {} has {} rows, coordinate column has {}",
                i,
                col.len(),
                coordinates.len()
            )));
        }
        Ok(Self {
            axis_name: axis_name.to_string(),
            variable_name: variable_name.to_string(),
            coordinates,
            columns,
            dropped_rows: 0,
        })
    }

    pub fn n_meshes(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// values of every mesh at one row, finest first
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.columns.iter().map(|col| col[row]).collect()
    }
}

/// Interpolates every series onto the coordinates of `series[reference]`, then drops the
/// rows where any mesh has no value. Series are sorted first; a non-monotonic series is an
/// error.
pub fn align(
    series: &[SampleSeries],
    reference: usize,
    axis_name: &str,
    variable_name: &str,
) -> Result<AlignedTable, ConvergenceError> {
    if reference >= series.len() {
        return Err(ConvergenceError::InvalidInput(format!(
            "reference series {} does not exist, only {} series given",
            reference,
            series.len()
        )));
    }
    let sorted: Vec<SampleSeries> = series
        .iter()
        .map(|s| s.normalized())
        .collect::<Result<_, _>>()?;

    let reference_coordinates = &sorted[reference].coordinates;
    let mut coordinates = Vec::with_capacity(reference_coordinates.len());
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(reference_coordinates.len()); sorted.len()];
    let mut dropped_rows = 0;
    for &x in reference_coordinates {
        let row: Option<Vec<f64>> = sorted.iter().map(|s| s.interpolate(x)).collect();
        match row {
            Some(values) => {
                coordinates.push(x);
                for (column, value) in columns.iter_mut().zip(values) {
                    column.push(value);
                }
            }
            None => dropped_rows += 1,
        }
    }
    if dropped_rows > 0 {
        warn!(
            "{} of {} rows of '{}' are not covered by every mesh and were dropped",
            dropped_rows,
            reference_coordinates.len(),
            sorted[reference].name
        );
    }
    info!(
        "aligned {} meshes of '{}' on {} rows of '{}'",
        sorted.len(),
        variable_name,
        coordinates.len(),
        axis_name
    );
    Ok(AlignedTable {
        axis_name: axis_name.to_string(),
        variable_name: variable_name.to_string(),
        coordinates,
        columns,
        dropped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interpolation_inside_and_outside() {
        let s = SampleSeries::new("Mesh 0", vec![0.0, 1.0, 2.0], vec![0.0, 10.0, 30.0]).unwrap();
        assert_relative_eq!(s.interpolate(0.5).unwrap(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(s.interpolate(1.5).unwrap(), 20.0, epsilon = 1e-12);
        assert_relative_eq!(s.interpolate(2.0).unwrap(), 30.0, epsilon = 1e-12);
        assert_eq!(s.interpolate(-0.1), None);
        assert_eq!(s.interpolate(2.1), None);
    }

    #[test]
    fn test_descending_series_is_reversed() {
        let s = SampleSeries::new("Mesh 1", vec![3.0, 2.0, 1.0], vec![30.0, 20.0, 10.0]).unwrap();
        let n = s.normalized().unwrap();
        assert_eq!(n.coordinates, vec![1.0, 2.0, 3.0]);
        assert_eq!(n.values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_non_monotonic_series_is_rejected() {
        let s = SampleSeries::new("Mesh 2", vec![0.0, 2.0, 1.0, 3.0], vec![0.0; 4]).unwrap();
        assert_eq!(
            s.normalized(),
            Err(ConvergenceError::UnsortedSeries {
                series: "Mesh 2".to_string(),
                index: 2
            })
        );
        let duplicated = SampleSeries::new("Mesh 0", vec![0.0, 0.0], vec![1.0, 2.0]).unwrap();
        assert!(duplicated.normalized().is_err());
    }

    #[test]
    fn test_length_mismatch() {
        assert!(SampleSeries::new("Mesh 0", vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(SampleSeries::new("Mesh 0", vec![], vec![]).is_err());
    }

    #[test]
    fn test_align_on_reference_and_drop_uncovered_rows() {
        let finer = SampleSeries::new(
            "Mesh 0",
            vec![0.0, 0.25, 0.5, 0.75, 1.0],
            vec![0.0, 0.25, 0.5, 0.75, 1.0],
        )
        .unwrap();
        // medium mesh reaches further than the others: its last row must be dropped
        let medium = SampleSeries::new("Mesh 1", vec![0.0, 0.5, 1.0, 1.5], vec![0.0, 1.0, 2.0, 3.0])
            .unwrap();
        // coarser mesh is given in descending order
        let coarser = SampleSeries::new("Mesh 2", vec![1.2, 0.0], vec![3.6, 0.0]).unwrap();
        let table = align(&[finer, medium, coarser], 1, "x", "U").unwrap();
        assert_eq!(table.n_meshes(), 3);
        assert_eq!(table.coordinates, vec![0.0, 0.5, 1.0]);
        assert_eq!(table.dropped_rows, 1);
        assert_relative_eq!(table.columns[0][1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(table.columns[1][2], 2.0, epsilon = 1e-12);
        assert_relative_eq!(table.columns[2][1], 1.5, epsilon = 1e-12);
        assert_eq!(table.row(2).len(), 3);
    }

    #[test]
    fn test_align_point_values() {
        let series = vec![
            SampleSeries::point("Mesh 0", 1.0),
            SampleSeries::point("Mesh 1", 1.1),
            SampleSeries::point("Mesh 2", 1.3),
        ];
        let table = align(&series, 1, "point", "Cd").unwrap();
        assert_eq!(table.n_rows(), 1);
        assert_eq!(table.row(0), vec![1.0, 1.1, 1.3]);
    }

    #[test]
    fn test_align_invalid_reference() {
        let series = vec![SampleSeries::point("Mesh 0", 1.0)];
        assert!(matches!(
            align(&series, 3, "x", "U"),
            Err(ConvergenceError::InvalidInput(_))
        ));
    }
}
