use crate::dataset::{Column, Dataset};
use crate::schema::ColumnKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

/// Encoding of one categorical column: labels sorted lexicographically,
/// assigned the codes `0..k-1` in that order.
///
/// Code assignment never depends on row order, so the same data produces
/// the same codes on every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEncoding {
    labels: Vec<String>,
    codes: HashMap<String, usize>,
}

impl ColumnEncoding {
    fn from_sorted_labels(labels: Vec<String>) -> Self {
        let codes = labels
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code))
            .collect();
        ColumnEncoding { labels, codes }
    }

    /// Returns the code assigned to a label, if the label was seen at fit.
    pub fn code_of(&self, label: &str) -> Option<usize> {
        self.codes.get(label).copied()
    }

    /// Returns the label a code stands for, if the code is in range.
    pub fn label_of(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    /// Returns the labels in code order (lexicographic).
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the number of distinct labels.
    pub fn cardinality(&self) -> usize {
        self.labels.len()
    }
}

/// Label-to-code encodings for a set of categorical columns.
///
/// Built once at load time and immutable afterwards. Exposed read-only
/// so consumers can decode integer codes back to their labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingMap {
    columns: BTreeMap<String, ColumnEncoding>,
}

impl EncodingMap {
    /// Returns the encoding for the named column, if fitted.
    pub fn column(&self, name: &str) -> Option<&ColumnEncoding> {
        self.columns.get(name)
    }

    /// Returns the fitted column names in lexicographic order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Returns the number of fitted columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if no columns were fitted.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Encoder that replaces categorical label columns with integer code
/// columns.
///
/// Codes are assigned by sorting each column's distinct labels
/// lexicographically and numbering them `0..k-1`. First-seen ordering is
/// deliberately not used: it would make codes depend on row order.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    columns: Vec<String>,
}

impl CategoricalEncoder {
    /// Creates an encoder for the named columns.
    ///
    /// # Arguments
    /// * `columns` - Names of the categorical columns to encode
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        CategoricalEncoder {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the configured column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fits an encoding map on the dataset's categorical columns.
    ///
    /// # Arguments
    /// * `dataset` - Dataset holding the label columns
    ///
    /// # Returns
    /// Returns an `EncodingMap` with one entry per configured column.
    ///
    /// # Errors
    /// Returns `EncodeError::UnknownColumn` if a configured column is not
    /// declared, `EncodeError::NotCategorical` if it is numeric, or
    /// `EncodeError::EmptyColumn` if it holds zero values.
    pub fn fit(&self, dataset: &Dataset) -> Result<EncodingMap, EncodeError> {
        let mut columns = BTreeMap::new();
        for name in &self.columns {
            let column = dataset
                .column(name)
                .ok_or_else(|| EncodeError::UnknownColumn(name.clone()))?;
            let labels = column
                .as_categorical()
                .ok_or_else(|| EncodeError::NotCategorical(name.clone()))?;
            if labels.is_empty() {
                return Err(EncodeError::EmptyColumn(name.clone()));
            }

            let distinct: BTreeSet<&String> = labels.iter().collect();
            let sorted: Vec<String> = distinct.into_iter().cloned().collect();
            debug!(
                "Fitted encoding for column '{}' ({} distinct labels)",
                name,
                sorted.len()
            );
            columns.insert(name.clone(), ColumnEncoding::from_sorted_labels(sorted));
        }
        Ok(EncodingMap { columns })
    }

    /// Transforms the dataset by replacing configured label columns with
    /// their code columns.
    ///
    /// Column order and names are preserved; columns not configured for
    /// encoding pass through untouched. The result's schema marks the
    /// encoded columns as numeric.
    ///
    /// # Arguments
    /// * `dataset` - Dataset to transform
    /// * `map` - Encoding map fitted on data containing the same labels
    ///
    /// # Errors
    /// Returns `EncodeError::UnknownColumn` if a configured column is not
    /// declared or absent from the map, `EncodeError::NotCategorical` if a
    /// configured column is numeric, or `EncodeError::UnmappedLabel` if a
    /// label is missing from the map.
    pub fn transform(&self, dataset: &Dataset, map: &EncodingMap) -> Result<Dataset, EncodeError> {
        let schema = dataset.schema();
        for name in &self.columns {
            if !schema.contains(name) {
                return Err(EncodeError::UnknownColumn(name.clone()));
            }
        }

        let mut columns = Vec::with_capacity(schema.len());

        for spec in schema.columns() {
            let column = dataset
                .column(&spec.name)
                .ok_or_else(|| EncodeError::UnknownColumn(spec.name.clone()))?;

            if !self.columns.contains(&spec.name) {
                columns.push(column.clone());
                continue;
            }
            if spec.kind != ColumnKind::Categorical {
                return Err(EncodeError::NotCategorical(spec.name.clone()));
            }

            let labels = column
                .as_categorical()
                .ok_or_else(|| EncodeError::NotCategorical(spec.name.clone()))?;
            let encoding = map
                .column(&spec.name)
                .ok_or_else(|| EncodeError::UnknownColumn(spec.name.clone()))?;

            let mut codes = Vec::with_capacity(labels.len());
            for label in labels {
                let code = encoding
                    .code_of(label)
                    .ok_or_else(|| EncodeError::UnmappedLabel {
                        column: spec.name.clone(),
                        label: label.clone(),
                    })?;
                codes.push(code as f64);
            }
            columns.push(Column::Numeric(codes));
        }

        let schema = schema.recode_as_numeric(&self.columns);
        Ok(Dataset::from_parts(schema, columns, dataset.loaded_at()))
    }

    /// Fits an encoding map and transforms the dataset in one step.
    ///
    /// # Errors
    /// Propagates any error from `fit` or `transform`.
    pub fn fit_transform(
        &self,
        dataset: &Dataset,
    ) -> Result<(Dataset, EncodingMap), EncodeError> {
        let map = self.fit(dataset)?;
        let encoded = self.transform(dataset, &map)?;
        Ok((encoded, map))
    }
}

/// Errors that can occur when encoding categorical columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A named column is not declared in the dataset or encoding map
    UnknownColumn(String),
    /// A named column holds zero values
    EmptyColumn(String),
    /// A named column is numeric, not categorical
    NotCategorical(String),
    /// A label was not seen when the encoding map was fitted
    UnmappedLabel { column: String, label: String },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::UnknownColumn(name) => write!(f, "Unknown column '{}'", name),
            EncodeError::EmptyColumn(name) => {
                write!(f, "Column '{}' holds zero values", name)
            }
            EncodeError::NotCategorical(name) => {
                write!(f, "Column '{}' is not categorical", name)
            }
            EncodeError::UnmappedLabel { column, label } => {
                write!(
                    f,
                    "Label '{}' in column '{}' is missing from the encoding map",
                    label, column
                )
            }
        }
    }
}

impl std::error::Error for EncodeError {}
