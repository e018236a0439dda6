//! Column-oriented sampled data as logged by the instrumented bicycle.

use std::fs::File;
use std::io::Read;
use std::ops::Range;
use std::path::Path;

use log::debug;

use crate::error::{DataError, Result};

/// Name of the time column, seconds since the start of the recording.
pub const TIME_COLUMN: &str = "seconds_since_start";

/// Named `f64` columns of equal length, one row per sample.
///
/// Columns keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    columns: Vec<(String, Vec<f64>)>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series, rejecting columns of differing lengths.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut series = Self::new();
        for (name, values) in columns {
            series.insert(name, values)?;
        }
        Ok(series)
    }

    /// Reads CSV with a header row. Empty fields load as NaN.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let names: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            for (col, field) in record.iter().enumerate() {
                let field = field.trim();
                let value = if field.is_empty() {
                    f64::NAN
                } else {
                    field.parse().map_err(|_| DataError::Parse {
                        column: names[col].clone(),
                        row,
                        value: field.to_string(),
                    })?
                };
                values[col].push(value);
            }
        }

        let series = Self::from_columns(names.into_iter().zip(values))?;
        debug!(
            "loaded {} samples of {} columns",
            series.len(),
            series.columns.len()
        );
        Ok(series)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |(_, values)| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// The time column.
    pub fn times(&self) -> Result<&[f64]> {
        self.column(TIME_COLUMN)
    }

    /// Adds or replaces a column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        let expected = self.len();
        let replaces_only_column = self.columns.len() == 1 && self.has_column(&name);
        if !self.columns.is_empty() && !replaces_only_column && values.len() != expected {
            return Err(DataError::RaggedColumn {
                column: name,
                expected,
                actual: values.len(),
            });
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name, values)),
        }
        Ok(())
    }

    /// Rows in `range`, every column.
    ///
    /// Panics if `range` is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values[range.clone()].to_vec()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
seconds_since_start,roll_angle,speed
0.00,0.5,1.8
0.01,,1.9
0.02,-0.25,2.0
";

    #[test]
    fn test_reads_csv_columns() {
        let series = TimeSeries::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(
            series.column_names().collect::<Vec<_>>(),
            vec![TIME_COLUMN, "roll_angle", "speed"]
        );
        assert_eq!(series.column("speed").unwrap(), &[1.8, 1.9, 2.0]);
        assert!(series.column("roll_angle").unwrap()[1].is_nan());
    }

    #[test]
    fn test_parse_error_names_the_cell() {
        let err = TimeSeries::from_csv_reader("a,b\n1.0,x\n".as_bytes()).unwrap_err();
        match err {
            DataError::Parse { column, row, value } => {
                assert_eq!(column, "b");
                assert_eq!(row, 0);
                assert_eq!(value, "x");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_short_record_is_a_csv_error() {
        let err = TimeSeries::from_csv_reader("a,b\n1.0,2.0\n3.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Csv(_)));
    }

    #[test]
    fn test_missing_column() {
        let series = TimeSeries::from_csv_reader(CSV.as_bytes()).unwrap();
        assert!(matches!(
            series.column("steer_angle"),
            Err(DataError::MissingColumn(name)) if name == "steer_angle"
        ));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = TimeSeries::from_columns([("a", vec![1.0, 2.0]), ("b", vec![1.0])]).unwrap_err();
        assert!(matches!(err, DataError::RaggedColumn { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut series = TimeSeries::from_columns([("a", vec![1.0, 2.0])]).unwrap();
        series.insert("a", vec![3.0]).unwrap();
        assert_eq!(series.column("a").unwrap(), &[3.0]);
        series.insert("b", vec![4.0]).unwrap();
        assert_eq!(series.column_names().count(), 2);
    }

    #[test]
    fn test_slice_keeps_all_columns() {
        let series = TimeSeries::from_csv_reader(CSV.as_bytes()).unwrap();
        let window = series.slice(1..3);
        assert_eq!(window.len(), 2);
        assert_eq!(window.times().unwrap(), &[0.01, 0.02]);
        assert_eq!(window.column("speed").unwrap(), &[1.9, 2.0]);
    }
}
