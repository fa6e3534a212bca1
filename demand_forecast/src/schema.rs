//! The frozen feature schema shared by training and inference
//!
//! A [`FeatureSchema`] is learned once from the training partition and
//! persisted with the model. Its ordered column list is the contract: both
//! the training matrix and every inference vector are produced by
//! [`FeatureSchema::encode`], so the two can never disagree on width or order.

use crate::data::{column_mean, RawRecord};
use crate::error::{DemandError, Result};
use crate::features::{DatePart, FeatureFrame, FeatureVector};
use crate::fields::{CategoricalField, NumericField, TARGET_COLUMN};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Version of the persisted schema layout
pub const SCHEMA_FORMAT_VERSION: u32 = 1;

/// Indicator expansion of one categorical field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoding {
    pub field: CategoricalField,
    /// Level without an indicator column; encoded as all zeros
    pub reference: String,
    /// Levels with an indicator column, in column order
    pub levels: Vec<String>,
}

impl CategoricalEncoding {
    /// Indicator column name for a level, e.g. `Store ID_S1`
    pub fn indicator_column(&self, level: &str) -> String {
        format!("{}_{}", self.field.column(), level)
    }
}

/// Imputation value for a numeric field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericFill {
    pub field: NumericField,
    pub value: f64,
}

/// Optional features the builder may add to the schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingOptions {
    /// Add a day-of-week column next to day, month and year
    pub include_day_of_week: bool,
}

/// On-disk form of the schema
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaDocument {
    format_version: u32,
    columns: Vec<String>,
    numeric: Vec<NumericField>,
    categorical: Vec<CategoricalEncoding>,
    date_parts: Vec<DatePart>,
    fills: Vec<NumericFill>,
    target_fill: f64,
}

/// Ordered feature columns plus the metadata needed to rebuild them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDocument", into = "SchemaDocument")]
pub struct FeatureSchema {
    format_version: u32,
    columns: Vec<String>,
    numeric: Vec<NumericField>,
    categorical: Vec<CategoricalEncoding>,
    date_parts: Vec<DatePart>,
    fills: Vec<NumericFill>,
    target_fill: f64,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Learn imputation values, category levels and column order from the
    /// training partition.
    pub fn fit(records: &[&RawRecord], options: EncodingOptions) -> Result<Self> {
        if records.is_empty() {
            return Err(DemandError::TrainingData(
                "Training partition is empty".to_string(),
            ));
        }

        let mut fills = Vec::with_capacity(NumericField::ALL.len());
        for field in NumericField::ALL {
            // Business rule: a missing discount means no discount was given.
            let value = if field == NumericField::Discount {
                0.0
            } else {
                let values: Vec<Option<f64>> = records.iter().map(|r| r.numeric(field)).collect();
                column_mean(field.column(), &values).ok_or_else(|| {
                    DemandError::TrainingData(format!(
                        "'{}' has no values in the training partition",
                        field.column()
                    ))
                })?
            };
            fills.push(NumericFill { field, value });
        }

        let targets: Vec<Option<f64>> = records.iter().map(|r| r.units_sold).collect();
        let target_fill = column_mean(TARGET_COLUMN, &targets).ok_or_else(|| {
            DemandError::TrainingData(format!(
                "'{}' has no values in the training partition",
                TARGET_COLUMN
            ))
        })?;

        let mut categorical = Vec::with_capacity(CategoricalField::ALL.len());
        for field in CategoricalField::ALL {
            let observed: BTreeSet<String> = records
                .iter()
                .filter_map(|r| r.categorical(field))
                .map(|v| field.normalize(v))
                .collect();
            let mut levels: Vec<String> = observed.into_iter().collect();
            let reference = levels.pop().ok_or_else(|| {
                DemandError::TrainingData(format!(
                    "'{}' has no values in the training partition",
                    field.column()
                ))
            })?;
            categorical.push(CategoricalEncoding {
                field,
                reference,
                levels,
            });
        }

        let mut date_parts = vec![DatePart::Day, DatePart::Month, DatePart::Year];
        if options.include_day_of_week {
            date_parts.push(DatePart::DayOfWeek);
        }

        let numeric = NumericField::ALL.to_vec();
        let columns = expected_columns(&numeric, &categorical, &date_parts);

        Self::try_from(SchemaDocument {
            format_version: SCHEMA_FORMAT_VERSION,
            columns,
            numeric,
            categorical,
            date_parts,
            fills,
            target_fill,
        })
    }

    /// Ordered column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn numeric_fields(&self) -> &[NumericField] {
        &self.numeric
    }

    pub fn categorical(&self) -> &[CategoricalEncoding] {
        &self.categorical
    }

    /// Encoding of one categorical field
    pub fn encoding(&self, field: CategoricalField) -> Option<&CategoricalEncoding> {
        self.categorical.iter().find(|e| e.field == field)
    }

    pub fn date_parts(&self) -> &[DatePart] {
        &self.date_parts
    }

    /// Training-partition imputation value of a numeric field
    pub fn fill_for(&self, field: NumericField) -> f64 {
        self.fills
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.value)
            .unwrap_or(0.0)
    }

    /// Target value of a training record, imputed when missing
    pub fn target(&self, record: &RawRecord) -> f64 {
        record.units_sold.unwrap_or(self.target_fill)
    }

    /// A zero-initialized frame over every schema column
    pub fn frame(&self) -> FeatureFrame<'_> {
        FeatureFrame::zeros(&self.columns, &self.index)
    }

    /// Build the feature vector of a record.
    ///
    /// Missing numeric values take the training fill. A categorical value
    /// sets its indicator only when that indicator is a schema column, so
    /// unseen levels and missing values both encode as the reference level.
    /// Date parts are written only when the schema carries them.
    pub fn encode(&self, record: &RawRecord) -> Result<FeatureVector> {
        let date = record
            .date
            .ok_or_else(|| DemandError::Validation("Record has no date".to_string()))?;

        let mut frame = self.frame();

        for &field in &self.numeric {
            let value = record.numeric(field).unwrap_or_else(|| self.fill_for(field));
            frame.set(field.column(), value)?;
        }

        for encoding in &self.categorical {
            if let Some(level) = record.categorical(encoding.field) {
                let column = encoding.indicator_column(&encoding.field.normalize(level));
                if frame.contains(&column) {
                    frame.set(&column, 1.0)?;
                }
            }
        }

        for part in DatePart::ALL {
            if frame.contains(part.column()) {
                frame.set(part.column(), part.extract(date))?;
            }
        }

        frame.align(&self.columns)
    }
}

/// Numeric fields, then indicator blocks in field order, then date parts
fn expected_columns(
    numeric: &[NumericField],
    categorical: &[CategoricalEncoding],
    date_parts: &[DatePart],
) -> Vec<String> {
    let mut columns: Vec<String> = numeric.iter().map(|f| f.column().to_string()).collect();
    for encoding in categorical {
        columns.extend(encoding.levels.iter().map(|l| encoding.indicator_column(l)));
    }
    columns.extend(date_parts.iter().map(|p| p.column().to_string()));
    columns
}

impl TryFrom<SchemaDocument> for FeatureSchema {
    type Error = DemandError;

    fn try_from(doc: SchemaDocument) -> Result<Self> {
        if doc.format_version != SCHEMA_FORMAT_VERSION {
            return Err(DemandError::SchemaMismatch(format!(
                "Unsupported schema format version {} (expected {})",
                doc.format_version, SCHEMA_FORMAT_VERSION
            )));
        }

        let expected = expected_columns(&doc.numeric, &doc.categorical, &doc.date_parts);
        if expected != doc.columns {
            return Err(DemandError::SchemaMismatch(format!(
                "Column list ({} columns) does not match its encoding metadata ({} columns)",
                doc.columns.len(),
                expected.len()
            )));
        }

        let mut seen = HashSet::with_capacity(doc.columns.len());
        if let Some(duplicate) = doc.columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(DemandError::SchemaMismatch(format!(
                "Duplicate column '{}'",
                duplicate
            )));
        }

        for field in &doc.numeric {
            match doc.fills.iter().find(|f| f.field == *field) {
                Some(fill) if fill.value.is_finite() => {}
                _ => {
                    return Err(DemandError::SchemaMismatch(format!(
                        "No usable fill value for '{}'",
                        field.column()
                    )))
                }
            }
        }
        if !doc.target_fill.is_finite() {
            return Err(DemandError::SchemaMismatch(
                "Target fill value is not finite".to_string(),
            ));
        }

        let index = doc
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        Ok(Self {
            format_version: doc.format_version,
            columns: doc.columns,
            numeric: doc.numeric,
            categorical: doc.categorical,
            date_parts: doc.date_parts,
            fills: doc.fills,
            target_fill: doc.target_fill,
            index,
        })
    }
}

impl From<FeatureSchema> for SchemaDocument {
    fn from(schema: FeatureSchema) -> Self {
        Self {
            format_version: schema.format_version,
            columns: schema.columns,
            numeric: schema.numeric,
            categorical: schema.categorical,
            date_parts: schema.date_parts,
            fills: schema.fills,
            target_fill: schema.target_fill,
        }
    }
}
