use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Aggregate function applied to each group's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateKind {
    /// Arithmetic mean
    Mean,
    /// Sum of values
    Sum,
    /// Number of values
    Count,
    /// Smallest value
    Min,
    /// Largest value
    Max,
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateKind::Mean => "mean",
            AggregateKind::Sum => "sum",
            AggregateKind::Count => "count",
            AggregateKind::Min => "min",
            AggregateKind::Max => "max",
        };
        write!(f, "{}", name)
    }
}

/// One group's aggregate result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Group label
    pub group: String,
    /// Aggregated value
    pub value: f64,
}

/// Per-group aggregate of one numeric column, grouped by one categorical
/// column.
///
/// Rows are sorted by group label, so the same dataset always yields the
/// same view. Views are computed per request and never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateView {
    group_column: String,
    value_column: String,
    kind: AggregateKind,
    rows: Vec<AggregateRow>,
}

impl AggregateView {
    /// Builds an aggregate view with groups derived from the dataset.
    ///
    /// # Arguments
    /// * `dataset` - Source dataset (the labeled one, not the encoded one)
    /// * `group_column` - Categorical column to group by
    /// * `value_column` - Numeric column to aggregate
    /// * `kind` - Aggregate function
    ///
    /// # Returns
    /// A view with one row per distinct group label, sorted by label.
    /// A dataset with zero rows yields a view with zero rows.
    ///
    /// # Errors
    /// Returns `AggregateError::UnknownColumn` if either column is not
    /// declared, `AggregateError::NotCategorical` if the group column is
    /// numeric, or `AggregateError::NotNumeric` if the value column is
    /// categorical.
    pub fn build(
        dataset: &Dataset,
        group_column: &str,
        value_column: &str,
        kind: AggregateKind,
    ) -> Result<Self, AggregateError> {
        let groups = accumulate(dataset, group_column, value_column)?;
        let rows = groups
            .into_iter()
            .map(|(group, acc)| AggregateRow {
                group,
                value: acc.apply(kind),
            })
            .collect();
        Ok(AggregateView {
            group_column: group_column.to_string(),
            value_column: value_column.to_string(),
            kind,
            rows,
        })
    }

    /// Builds an aggregate view restricted to an externally supplied set
    /// of group labels.
    ///
    /// Used when the caller fixes the group set independently of the
    /// data. Duplicate labels in `groups` are collapsed; rows come out
    /// sorted by label regardless of the supplied order.
    ///
    /// # Errors
    /// As for `build`, plus `AggregateError::EmptyGroup` naming the first
    /// supplied label that has zero members in the dataset.
    pub fn build_with_groups(
        dataset: &Dataset,
        group_column: &str,
        value_column: &str,
        kind: AggregateKind,
        groups: &[String],
    ) -> Result<Self, AggregateError> {
        let accumulated = accumulate(dataset, group_column, value_column)?;
        let requested: BTreeSet<&String> = groups.iter().collect();

        let mut rows = Vec::with_capacity(requested.len());
        for group in requested {
            let acc = accumulated
                .get(group)
                .ok_or_else(|| AggregateError::EmptyGroup(group.clone()))?;
            rows.push(AggregateRow {
                group: group.clone(),
                value: acc.apply(kind),
            });
        }
        Ok(AggregateView {
            group_column: group_column.to_string(),
            value_column: value_column.to_string(),
            kind,
            rows,
        })
    }

    /// Returns the group column name.
    pub fn group_column(&self) -> &str {
        &self.group_column
    }

    /// Returns the value column name.
    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    /// Returns the aggregate function.
    pub fn kind(&self) -> AggregateKind {
        self.kind
    }

    /// Returns the rows, sorted by group label.
    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    /// Returns the aggregated value for a group label, if present.
    pub fn get(&self, group: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.group == group)
            .map(|row| row.value)
    }
}

/// Running accumulator for one group.
struct GroupAcc {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl GroupAcc {
    fn new(value: f64) -> Self {
        GroupAcc {
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn apply(&self, kind: AggregateKind) -> f64 {
        match kind {
            AggregateKind::Mean => self.sum / self.count as f64,
            AggregateKind::Sum => self.sum,
            AggregateKind::Count => self.count as f64,
            AggregateKind::Min => self.min,
            AggregateKind::Max => self.max,
        }
    }
}

fn accumulate(
    dataset: &Dataset,
    group_column: &str,
    value_column: &str,
) -> Result<BTreeMap<String, GroupAcc>, AggregateError> {
    let group_col = dataset
        .column(group_column)
        .ok_or_else(|| AggregateError::UnknownColumn(group_column.to_string()))?;
    let labels = group_col
        .as_categorical()
        .ok_or_else(|| AggregateError::NotCategorical(group_column.to_string()))?;

    let value_col = dataset
        .column(value_column)
        .ok_or_else(|| AggregateError::UnknownColumn(value_column.to_string()))?;
    let values = value_col
        .as_numeric()
        .ok_or_else(|| AggregateError::NotNumeric(value_column.to_string()))?;

    let mut groups: BTreeMap<String, GroupAcc> = BTreeMap::new();
    for (label, &value) in labels.iter().zip(values.iter()) {
        match groups.get_mut(label) {
            Some(acc) => acc.push(value),
            None => {
                groups.insert(label.clone(), GroupAcc::new(value));
            }
        }
    }
    Ok(groups)
}

/// Errors that can occur when building an aggregate view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// A named column is not declared in the dataset
    UnknownColumn(String),
    /// A supplied group label has zero members
    EmptyGroup(String),
    /// The group column is numeric, not categorical
    NotCategorical(String),
    /// The value column is categorical, not numeric
    NotNumeric(String),
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateError::UnknownColumn(name) => write!(f, "Unknown column '{}'", name),
            AggregateError::EmptyGroup(group) => {
                write!(f, "Group '{}' has zero members", group)
            }
            AggregateError::NotCategorical(name) => {
                write!(f, "Column '{}' is not categorical", name)
            }
            AggregateError::NotNumeric(name) => {
                write!(f, "Column '{}' is not numeric", name)
            }
        }
    }
}

impl std::error::Error for AggregateError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetSource, InMemoryDatasetSource};
    use crate::schema::{ColumnSpec, Schema};

    fn region_schema() -> Schema {
        Schema::new(vec![
            ColumnSpec::categorical("region").unwrap(),
            ColumnSpec::numeric("charges").unwrap(),
        ])
        .unwrap()
    }

    fn region_dataset(regions: Vec<&str>, charges: Vec<f64>) -> Dataset {
        let mut source = InMemoryDatasetSource::new();
        source.push_categorical("region", regions);
        source.push_numeric("charges", charges);
        source.load(&region_schema()).unwrap()
    }

    #[test]
    fn test_mean_by_group() {
        let dataset = region_dataset(
            vec!["northeast", "southeast", "northeast"],
            vec![100.0, 300.0, 200.0],
        );

        let view =
            AggregateView::build(&dataset, "region", "charges", AggregateKind::Mean).unwrap();
        assert_eq!(view.rows().len(), 2);
        assert_eq!(view.rows()[0].group, "northeast");
        assert_eq!(view.rows()[0].value, 150.0);
        assert_eq!(view.rows()[1].group, "southeast");
        assert_eq!(view.rows()[1].value, 300.0);
    }

    #[test]
    fn test_rows_sorted_by_label_regardless_of_input_order() {
        let dataset = region_dataset(
            vec!["southwest", "northeast", "southeast", "northwest"],
            vec![1.0, 2.0, 3.0, 4.0],
        );

        let view =
            AggregateView::build(&dataset, "region", "charges", AggregateKind::Sum).unwrap();
        let groups: Vec<&str> = view.rows().iter().map(|row| row.group.as_str()).collect();
        assert_eq!(
            groups,
            vec!["northeast", "northwest", "southeast", "southwest"]
        );
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let dataset = region_dataset(
            vec!["northeast", "southeast", "northeast"],
            vec![100.0, 300.0, 200.0],
        );

        let first =
            AggregateView::build(&dataset, "region", "charges", AggregateKind::Mean).unwrap();
        let second =
            AggregateView::build(&dataset, "region", "charges", AggregateKind::Mean).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sum_count_min_max() {
        let dataset = region_dataset(
            vec!["northeast", "northeast", "southeast"],
            vec![100.0, 300.0, 50.0],
        );

        let sum =
            AggregateView::build(&dataset, "region", "charges", AggregateKind::Sum).unwrap();
        assert_eq!(sum.get("northeast"), Some(400.0));
        assert_eq!(sum.get("southeast"), Some(50.0));

        let count =
            AggregateView::build(&dataset, "region", "charges", AggregateKind::Count).unwrap();
        assert_eq!(count.get("northeast"), Some(2.0));

        let min =
            AggregateView::build(&dataset, "region", "charges", AggregateKind::Min).unwrap();
        assert_eq!(min.get("northeast"), Some(100.0));

        let max =
            AggregateView::build(&dataset, "region", "charges", AggregateKind::Max).unwrap();
        assert_eq!(max.get("northeast"), Some(300.0));
    }

    #[test]
    fn test_unknown_group_column() {
        let dataset = region_dataset(vec!["northeast"], vec![100.0]);

        let result = AggregateView::build(&dataset, "state", "charges", AggregateKind::Mean);
        assert_eq!(
            result.unwrap_err(),
            AggregateError::UnknownColumn("state".to_string())
        );
    }

    #[test]
    fn test_unknown_value_column() {
        let dataset = region_dataset(vec!["northeast"], vec![100.0]);

        let result = AggregateView::build(&dataset, "region", "premium", AggregateKind::Mean);
        assert_eq!(
            result.unwrap_err(),
            AggregateError::UnknownColumn("premium".to_string())
        );
    }

    #[test]
    fn test_numeric_group_column_rejected() {
        let dataset = region_dataset(vec!["northeast"], vec![100.0]);

        let result = AggregateView::build(&dataset, "charges", "charges", AggregateKind::Mean);
        assert_eq!(
            result.unwrap_err(),
            AggregateError::NotCategorical("charges".to_string())
        );
    }

    #[test]
    fn test_categorical_value_column_rejected() {
        let dataset = region_dataset(vec!["northeast"], vec![100.0]);

        let result = AggregateView::build(&dataset, "region", "region", AggregateKind::Mean);
        assert_eq!(
            result.unwrap_err(),
            AggregateError::NotNumeric("region".to_string())
        );
    }

    #[test]
    fn test_external_groups_missing_label_is_empty_group() {
        let dataset = region_dataset(
            vec!["northeast", "southeast"],
            vec![100.0, 300.0],
        );

        let groups = vec!["northeast".to_string(), "northwest".to_string()];
        let result = AggregateView::build_with_groups(
            &dataset,
            "region",
            "charges",
            AggregateKind::Mean,
            &groups,
        );
        assert_eq!(
            result.unwrap_err(),
            AggregateError::EmptyGroup("northwest".to_string())
        );
    }

    #[test]
    fn test_external_groups_restrict_and_sort() {
        let dataset = region_dataset(
            vec!["southwest", "northeast", "southeast"],
            vec![1.0, 2.0, 3.0],
        );

        let groups = vec![
            "southwest".to_string(),
            "northeast".to_string(),
            "northeast".to_string(),
        ];
        let view = AggregateView::build_with_groups(
            &dataset,
            "region",
            "charges",
            AggregateKind::Mean,
            &groups,
        )
        .unwrap();
        let labels: Vec<&str> = view.rows().iter().map(|row| row.group.as_str()).collect();
        assert_eq!(labels, vec!["northeast", "southwest"]);
    }

    #[test]
    fn test_empty_dataset_yields_empty_view() {
        let dataset = region_dataset(vec![], vec![]);

        let view =
            AggregateView::build(&dataset, "region", "charges", AggregateKind::Mean).unwrap();
        assert!(view.rows().is_empty());
    }

    #[test]
    fn test_view_metadata() {
        let dataset = region_dataset(vec!["northeast"], vec![100.0]);

        let view =
            AggregateView::build(&dataset, "region", "charges", AggregateKind::Mean).unwrap();
        assert_eq!(view.group_column(), "region");
        assert_eq!(view.value_column(), "charges");
        assert_eq!(view.kind(), AggregateKind::Mean);
        assert_eq!(view.get("missing"), None);
    }
}
