use crate::schema::{ColumnKind, Schema};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single dataset column, stored contiguously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// Floating-point values
    Numeric(Vec<f64>),
    /// String labels
    Categorical(Vec<String>),
}

impl Column {
    /// Returns the kind of this column.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Numeric(_) => ColumnKind::Numeric,
            Column::Categorical(_) => ColumnKind::Categorical,
        }
    }

    /// Returns the number of values in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Categorical(values) => values.len(),
        }
    }

    /// Returns true if the column holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the numeric values, or None for a categorical column.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(values) => Some(values),
            Column::Categorical(_) => None,
        }
    }

    /// Returns the label values, or None for a numeric column.
    pub fn as_categorical(&self) -> Option<&[String]> {
        match self {
            Column::Numeric(_) => None,
            Column::Categorical(values) => Some(values),
        }
    }
}

/// Column-oriented dataset with a fixed schema.
///
/// Columns are stored in schema order and share a single row count.
/// A dataset is immutable once constructed: the loading stage builds it,
/// every later stage only reads it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    schema: Schema,
    columns: Vec<Column>,
    loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Creates a dataset from a schema and matching columns.
    ///
    /// # Arguments
    /// * `schema` - Column declarations in dataset order
    /// * `columns` - One column per declaration, in the same order
    ///
    /// # Returns
    /// Returns `Ok(Dataset)` if the columns agree with the schema.
    ///
    /// # Errors
    /// Returns `LoadError::SchemaMismatch` if the column count differs from
    /// the schema, a column kind disagrees with its declaration, or the
    /// columns have unequal lengths.
    pub fn new(schema: Schema, columns: Vec<Column>) -> Result<Self, LoadError> {
        if columns.len() != schema.len() {
            return Err(LoadError::SchemaMismatch(format!(
                "expected {} columns, got {}",
                schema.len(),
                columns.len()
            )));
        }
        for (spec, column) in schema.columns().iter().zip(columns.iter()) {
            if column.kind() != spec.kind {
                return Err(LoadError::SchemaMismatch(format!(
                    "column '{}' declared {} but holds {} values",
                    spec.name,
                    spec.kind,
                    column.kind()
                )));
            }
        }
        let row_count = columns.first().map(|c| c.len()).unwrap_or(0);
        for (spec, column) in schema.columns().iter().zip(columns.iter()) {
            if column.len() != row_count {
                return Err(LoadError::SchemaMismatch(format!(
                    "column '{}' has {} rows, expected {}",
                    spec.name,
                    column.len(),
                    row_count
                )));
            }
        }
        Ok(Dataset {
            schema,
            columns,
            loaded_at: Utc::now(),
        })
    }

    /// Crate-internal constructor for columns already validated against
    /// the schema. Used when deriving one dataset from another, so the
    /// derived dataset keeps the original load timestamp.
    pub(crate) fn from_parts(
        schema: Schema,
        columns: Vec<Column>,
        loaded_at: DateTime<Utc>,
    ) -> Self {
        Dataset {
            schema,
            columns,
            loaded_at,
        }
    }

    /// Returns the schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Returns the named column, if declared.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema
            .columns()
            .iter()
            .position(|spec| spec.name == name)
            .map(|index| &self.columns[index])
    }

    /// Returns the named column's numeric values.
    ///
    /// None if the column is not declared or is categorical.
    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        self.column(name).and_then(Column::as_numeric)
    }

    /// Returns the named column's label values.
    ///
    /// None if the column is not declared or is numeric.
    pub fn categorical(&self, name: &str) -> Option<&[String]> {
        self.column(name).and_then(Column::as_categorical)
    }

    /// Returns the time at which this dataset was constructed.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Returns a summary of the dataset shape.
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            rows: self.row_count(),
            columns: self
                .schema
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Shape summary of a loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Number of rows
    pub rows: usize,
    /// Column names in schema order
    pub columns: Vec<String>,
    /// Time the dataset was constructed
    pub loaded_at: DateTime<Utc>,
}

/// Trait for dataset source abstraction.
///
/// This trait allows the pipeline to load a dataset from any source
/// without being coupled to a specific file format or storage layer.
///
/// Implementations can be:
/// - In-memory columns (for testing)
/// - CSV files
/// - Any other tabular source
pub trait DatasetSource {
    /// Loads a dataset conforming to the given schema.
    ///
    /// # Arguments
    /// * `schema` - The required columns and their kinds
    ///
    /// # Returns
    /// Returns `Ok(Dataset)` with columns in schema order.
    ///
    /// # Errors
    /// Returns `LoadError::SourceNotFound` if the source cannot be opened,
    /// or `LoadError::SchemaMismatch` if the source data does not conform
    /// to the schema. Loading never repairs bad data: a missing column,
    /// an unparsable value or a short row fails the whole load.
    fn load(&self, schema: &Schema) -> Result<Dataset, LoadError>;
}

/// Errors that can occur when loading a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The source does not exist or cannot be opened
    SourceNotFound(String),
    /// The source data does not conform to the schema
    SchemaMismatch(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::SourceNotFound(msg) => write!(f, "Source not found: {}", msg),
            LoadError::SchemaMismatch(msg) => write!(f, "Schema mismatch: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {}

/// In-memory dataset source for testing.
///
/// Stores named columns and assembles them into a dataset in schema
/// order on load. This allows testing without touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatasetSource {
    columns: Vec<(String, Column)>,
}

impl InMemoryDatasetSource {
    /// Creates a new empty in-memory source.
    pub fn new() -> Self {
        InMemoryDatasetSource {
            columns: Vec::new(),
        }
    }

    /// Adds a numeric column.
    ///
    /// # Arguments
    /// * `name` - Column name
    /// * `values` - Column values (all columns must end up the same length)
    pub fn push_numeric(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.columns.push((name.into(), Column::Numeric(values)));
    }

    /// Adds a categorical column.
    ///
    /// # Arguments
    /// * `name` - Column name
    /// * `labels` - Column labels (all columns must end up the same length)
    pub fn push_categorical<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        labels: Vec<S>,
    ) {
        let labels = labels.into_iter().map(Into::into).collect();
        self.columns.push((name.into(), Column::Categorical(labels)));
    }

    /// Clears all columns from the source.
    pub fn clear(&mut self) {
        self.columns.clear();
    }
}

impl DatasetSource for InMemoryDatasetSource {
    fn load(&self, schema: &Schema) -> Result<Dataset, LoadError> {
        let mut columns = Vec::with_capacity(schema.len());
        for spec in schema.columns() {
            let column = self
                .columns
                .iter()
                .find(|(name, _)| *name == spec.name)
                .map(|(_, column)| column.clone())
                .ok_or_else(|| {
                    LoadError::SchemaMismatch(format!(
                        "required column '{}' missing from source",
                        spec.name
                    ))
                })?;
            columns.push(column);
        }
        Dataset::new(schema.clone(), columns)
    }
}
