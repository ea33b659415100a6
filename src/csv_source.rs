use crate::dataset::{Column, Dataset, DatasetSource, LoadError};
use crate::schema::{ColumnKind, Schema};
use log::info;
use std::fs::File;
use std::path::PathBuf;

/// Dataset source backed by a CSV file with a header row.
///
/// The file is opened on each `load` call. Loading is strict: every
/// schema column must appear in the header, every value must parse
/// according to its declared kind, and rows must be complete. Columns
/// present in the file but absent from the schema are ignored.
#[derive(Debug, Clone)]
pub struct CsvDatasetSource {
    path: PathBuf,
}

impl CsvDatasetSource {
    /// Creates a source for the given CSV file path.
    ///
    /// The path is not checked here; a missing file surfaces as
    /// `LoadError::SourceNotFound` on load.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvDatasetSource { path: path.into() }
    }

    /// Returns the configured file path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn parse_numeric(field: &str, column: &str, row: usize) -> Result<f64, LoadError> {
        let value: f64 = field.parse().map_err(|_| {
            LoadError::SchemaMismatch(format!(
                "row {} column '{}': expected a numeric value, got '{}'",
                row, column, field
            ))
        })?;
        if !value.is_finite() {
            return Err(LoadError::SchemaMismatch(format!(
                "row {} column '{}': non-finite value '{}'",
                row, column, field
            )));
        }
        Ok(value)
    }
}

impl DatasetSource for CsvDatasetSource {
    fn load(&self, schema: &Schema) -> Result<Dataset, LoadError> {
        let file = File::open(&self.path).map_err(|e| {
            LoadError::SourceNotFound(format!("{}: {}", self.path.display(), e))
        })?;
        info!("Loading dataset from {}", self.path.display());

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| LoadError::SchemaMismatch(format!("unreadable header: {}", e)))?
            .clone();

        // Header position of each schema column, in schema order
        let mut indices = Vec::with_capacity(schema.len());
        for spec in schema.columns() {
            let index = headers
                .iter()
                .position(|header| header == spec.name)
                .ok_or_else(|| {
                    LoadError::SchemaMismatch(format!(
                        "required column '{}' missing from header",
                        spec.name
                    ))
                })?;
            indices.push(index);
        }

        let mut columns: Vec<Column> = schema
            .columns()
            .iter()
            .map(|spec| match spec.kind {
                ColumnKind::Numeric => Column::Numeric(Vec::new()),
                ColumnKind::Categorical => Column::Categorical(Vec::new()),
            })
            .collect();

        let mut rows = 0usize;
        for (row_index, record) in reader.records().enumerate() {
            let row = row_index + 1;
            let record = record.map_err(|e| {
                LoadError::SchemaMismatch(format!("row {}: {}", row, e))
            })?;

            for ((spec, &index), column) in schema
                .columns()
                .iter()
                .zip(indices.iter())
                .zip(columns.iter_mut())
            {
                let field = record.get(index).ok_or_else(|| {
                    LoadError::SchemaMismatch(format!(
                        "row {} is missing column '{}'",
                        row, spec.name
                    ))
                })?;
                if field.is_empty() {
                    return Err(LoadError::SchemaMismatch(format!(
                        "row {} has an empty value in column '{}'",
                        row, spec.name
                    )));
                }
                match column {
                    Column::Numeric(values) => {
                        values.push(Self::parse_numeric(field, &spec.name, row)?);
                    }
                    Column::Categorical(labels) => {
                        labels.push(field.to_string());
                    }
                }
            }
            rows += 1;
        }

        if rows == 0 {
            return Err(LoadError::SchemaMismatch(format!(
                "{}: source contains no data rows",
                self.path.display()
            )));
        }

        info!(
            "Loaded {} rows x {} columns from {}",
            rows,
            schema.len(),
            self.path.display()
        );
        Dataset::new(schema.clone(), columns)
    }
}
