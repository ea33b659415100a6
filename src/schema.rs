use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of values a dataset column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Floating-point values (integer counts are widened to f64)
    Numeric,
    /// String labels drawn from a finite set
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// Declaration of a single column: its name and value kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name as it appears in the source header
    pub name: String,
    /// Kind of values the column holds
    pub kind: ColumnKind,
}

impl ColumnSpec {
    /// Creates a new column spec.
    ///
    /// # Arguments
    /// * `name` - Column name (must be non-empty)
    /// * `kind` - Kind of values the column holds
    ///
    /// # Errors
    /// Returns `SchemaError::EmptyColumnName` if the name is empty.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::EmptyColumnName);
        }
        Ok(ColumnSpec { name, kind })
    }

    /// Convenience constructor for a numeric column.
    pub fn numeric(name: impl Into<String>) -> Result<Self, SchemaError> {
        Self::new(name, ColumnKind::Numeric)
    }

    /// Convenience constructor for a categorical column.
    pub fn categorical(name: impl Into<String>) -> Result<Self, SchemaError> {
        Self::new(name, ColumnKind::Categorical)
    }
}

/// Ordered set of column declarations describing a dataset.
///
/// Column order is significant: datasets store their columns in schema
/// order and the correlation matrix labels follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Creates a schema from an ordered list of column specs.
    ///
    /// # Arguments
    /// * `columns` - Column declarations in dataset order
    ///
    /// # Returns
    /// Returns `Ok(Schema)` if the declarations are valid.
    ///
    /// # Errors
    /// Returns `SchemaError::Empty` if no columns are given, or
    /// `SchemaError::DuplicateColumn` if two columns share a name.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }
        for (i, spec) in columns.iter().enumerate() {
            if columns[..i].iter().any(|other| other.name == spec.name) {
                return Err(SchemaError::DuplicateColumn(spec.name.clone()));
            }
        }
        Ok(Schema { columns })
    }

    /// Returns the standard insurance dataset layout.
    ///
    /// Columns: age, sex, bmi, children, smoker, region, charges.
    /// `sex`, `smoker` and `region` are categorical; the rest numeric.
    pub fn insurance() -> Self {
        let columns = vec![
            ColumnSpec {
                name: "age".to_string(),
                kind: ColumnKind::Numeric,
            },
            ColumnSpec {
                name: "sex".to_string(),
                kind: ColumnKind::Categorical,
            },
            ColumnSpec {
                name: "bmi".to_string(),
                kind: ColumnKind::Numeric,
            },
            ColumnSpec {
                name: "children".to_string(),
                kind: ColumnKind::Numeric,
            },
            ColumnSpec {
                name: "smoker".to_string(),
                kind: ColumnKind::Categorical,
            },
            ColumnSpec {
                name: "region".to_string(),
                kind: ColumnKind::Categorical,
            },
            ColumnSpec {
                name: "charges".to_string(),
                kind: ColumnKind::Numeric,
            },
        ];
        Schema { columns }
    }

    /// Returns a copy of this schema in which the named columns are numeric.
    ///
    /// Used after categorical encoding replaces label columns with code
    /// columns. Names not present in the schema are ignored.
    pub fn recode_as_numeric<S: AsRef<str>>(&self, columns: &[S]) -> Schema {
        let columns = self
            .columns
            .iter()
            .map(|spec| {
                let recoded = columns.iter().any(|name| name.as_ref() == spec.name);
                ColumnSpec {
                    name: spec.name.clone(),
                    kind: if recoded {
                        ColumnKind::Numeric
                    } else {
                        spec.kind
                    },
                }
            })
            .collect();
        Schema { columns }
    }

    /// Returns the column declarations in order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema declares no columns.
    ///
    /// Always false for schemas built through `Schema::new`.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the kind of the named column, if declared.
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.kind)
    }

    /// Returns true if the named column is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.kind_of(name).is_some()
    }

    /// Returns the column names in schema order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|spec| spec.name.as_str()).collect()
    }

    /// Returns the categorical column names in schema order.
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|spec| spec.kind == ColumnKind::Categorical)
            .map(|spec| spec.name.as_str())
            .collect()
    }

    /// Returns the numeric column names in schema order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|spec| spec.kind == ColumnKind::Numeric)
            .map(|spec| spec.name.as_str())
            .collect()
    }
}

/// Errors that can occur when building a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema declares no columns
    Empty,
    /// A column name is empty
    EmptyColumnName,
    /// Two columns share the same name
    DuplicateColumn(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::Empty => write!(f, "Schema must declare at least one column"),
            SchemaError::EmptyColumnName => write!(f, "Column name cannot be empty"),
            SchemaError::DuplicateColumn(name) => {
                write!(f, "Duplicate column name '{}'", name)
            }
        }
    }
}

impl std::error::Error for SchemaError {}
