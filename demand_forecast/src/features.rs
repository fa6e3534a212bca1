//! Feature vectors and the zero-initialized frames they are built from

use crate::error::{DemandError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Numeric components derived from the observation date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatePart {
    Day,
    Month,
    Year,
    /// Monday = 0 .. Sunday = 6
    DayOfWeek,
}

impl DatePart {
    /// Every date part the encoder knows how to produce
    pub const ALL: [DatePart; 4] = [
        DatePart::Day,
        DatePart::Month,
        DatePart::Year,
        DatePart::DayOfWeek,
    ];

    /// Column name of the part in the feature schema
    pub fn column(self) -> &'static str {
        match self {
            DatePart::Day => "Day",
            DatePart::Month => "Month",
            DatePart::Year => "Year",
            DatePart::DayOfWeek => "Day Of Week",
        }
    }

    /// Extract the part from a date
    pub fn extract(self, date: NaiveDate) -> f64 {
        match self {
            DatePart::Day => date.day() as f64,
            DatePart::Month => date.month() as f64,
            DatePart::Year => date.year() as f64,
            DatePart::DayOfWeek => date.weekday().num_days_from_monday() as f64,
        }
    }
}

/// Fixed-length ordered feature values, one per schema column
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Single-row frame keyed by column name.
///
/// Frames start at zero for every schema column. Writes address columns by
/// name, and [`FeatureFrame::align`] produces the vector in schema order.
#[derive(Debug, Clone)]
pub struct FeatureFrame<'s> {
    columns: &'s [String],
    index: &'s HashMap<String, usize>,
    values: Vec<f64>,
}

impl<'s> FeatureFrame<'s> {
    pub(crate) fn zeros(columns: &'s [String], index: &'s HashMap<String, usize>) -> Self {
        Self {
            columns,
            index,
            values: vec![0.0; columns.len()],
        }
    }

    /// Whether the frame has a column with this name
    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Write a value; unknown columns are a structural mismatch
    pub fn set(&mut self, column: &str, value: f64) -> Result<()> {
        let position = *self.index.get(column).ok_or_else(|| {
            DemandError::SchemaMismatch(format!("Column '{}' is not part of the schema", column))
        })?;
        self.values[position] = value;
        Ok(())
    }

    /// Value currently held by a column
    pub fn get(&self, column: &str) -> Option<f64> {
        self.index.get(column).map(|&i| self.values[i])
    }

    /// Reorder the frame into `expected` column order.
    pub fn align(self, expected: &[String]) -> Result<FeatureVector> {
        if self.columns.len() != expected.len() || self.values.len() != expected.len() {
            return Err(DemandError::SchemaMismatch(format!(
                "Frame has {} columns, schema expects {}",
                self.values.len(),
                expected.len()
            )));
        }

        let mut aligned = Vec::with_capacity(expected.len());
        for column in expected {
            let position = self.index.get(column).ok_or_else(|| {
                DemandError::SchemaMismatch(format!("Frame is missing column '{}'", column))
            })?;
            aligned.push(self.values[*position]);
        }

        if aligned.iter().any(|v| !v.is_finite()) {
            return Err(DemandError::SchemaMismatch(
                "Frame contains non-finite values".to_string(),
            ));
        }

        Ok(FeatureVector(aligned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(columns: &[String]) -> HashMap<String, usize> {
        columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect()
    }

    #[test]
    fn date_parts() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(DatePart::Day.extract(date), 29.0);
        assert_eq!(DatePart::Month.extract(date), 2.0);
        assert_eq!(DatePart::Year.extract(date), 2024.0);
        // 2024-02-29 was a Thursday
        assert_eq!(DatePart::DayOfWeek.extract(date), 3.0);
    }

    #[test]
    fn frame_starts_at_zero_and_aligns() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let index = index_of(&columns);
        let mut frame = FeatureFrame::zeros(&columns, &index);
        frame.set("b", 2.5).unwrap();

        assert_eq!(frame.get("a"), Some(0.0));
        assert_eq!(frame.align(&columns).unwrap().as_slice(), &[0.0, 2.5]);
    }

    #[test]
    fn unknown_column_is_a_mismatch() {
        let columns = vec!["a".to_string()];
        let index = index_of(&columns);
        let mut frame = FeatureFrame::zeros(&columns, &index);
        assert!(matches!(
            frame.set("z", 1.0),
            Err(DemandError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn aligning_to_a_different_schema_fails() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let index = index_of(&columns);
        let frame = FeatureFrame::zeros(&columns, &index);

        let shorter = vec!["a".to_string()];
        assert!(frame.clone().align(&shorter).is_err());

        let renamed = vec!["a".to_string(), "c".to_string()];
        assert!(frame.align(&renamed).is_err());
    }

    #[test]
    fn reordering_follows_expected_order() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let index = index_of(&columns);
        let mut frame = FeatureFrame::zeros(&columns, &index);
        frame.set("a", 1.0).unwrap();
        frame.set("b", 2.0).unwrap();

        let reversed = vec!["b".to_string(), "a".to_string()];
        assert_eq!(frame.align(&reversed).unwrap().as_slice(), &[2.0, 1.0]);
    }
}
