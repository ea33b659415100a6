//! Chart-ready data products consumed by a rendering layer.
//!
//! Each product carries plain values plus the column names it was built
//! from, so a renderer needs no access to the pipeline itself.

use crate::aggregate::AggregateView;
use crate::correlation::CorrelationMatrix;
use crate::dataset::Dataset;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Correlation heatmap: square value grid with shared axis labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapData {
    /// Column labels along the x axis
    pub x_labels: Vec<String>,
    /// Column labels along the y axis (same order as x)
    pub y_labels: Vec<String>,
    /// Correlation values, row-major, aligned with the labels
    pub values: Vec<Vec<f64>>,
}

impl HeatmapData {
    /// Builds heatmap data from a correlation matrix.
    pub fn from_matrix(matrix: &CorrelationMatrix) -> Self {
        HeatmapData {
            x_labels: matrix.labels().to_vec(),
            y_labels: matrix.labels().to_vec(),
            values: matrix.values().to_vec(),
        }
    }
}

/// Per-point color values for a scatter plot.
///
/// Numeric colors map onto a continuous scale; label colors assign one
/// discrete color per distinct label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorSeries {
    /// Continuous color values
    Numeric(Vec<f64>),
    /// Discrete color labels
    Label(Vec<String>),
}

/// Scatter plot: two numeric axes plus a per-point color series.
///
/// All three series are row-aligned with the source dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterData {
    /// Name of the x-axis column
    pub x_column: String,
    /// Name of the y-axis column
    pub y_column: String,
    /// Name of the color column
    pub color_column: String,
    /// X values
    pub x: Vec<f64>,
    /// Y values
    pub y: Vec<f64>,
    /// Per-point color values
    pub color: ColorSeries,
}

impl ScatterData {
    /// Builds a scatter colored by a numeric column.
    ///
    /// # Errors
    /// Returns `ChartError::UnknownColumn` if a named column is not
    /// declared, or `ChartError::NotNumeric` if any of the three columns
    /// is categorical.
    pub fn numeric_color(
        dataset: &Dataset,
        x_column: &str,
        y_column: &str,
        color_column: &str,
    ) -> Result<Self, ChartError> {
        Ok(ScatterData {
            x_column: x_column.to_string(),
            y_column: y_column.to_string(),
            color_column: color_column.to_string(),
            x: numeric_series(dataset, x_column)?.to_vec(),
            y: numeric_series(dataset, y_column)?.to_vec(),
            color: ColorSeries::Numeric(numeric_series(dataset, color_column)?.to_vec()),
        })
    }

    /// Builds a scatter colored by a categorical column's labels.
    ///
    /// # Errors
    /// Returns `ChartError::UnknownColumn` if a named column is not
    /// declared, `ChartError::NotNumeric` if an axis column is
    /// categorical, or `ChartError::NotCategorical` if the color column
    /// is numeric.
    pub fn label_color(
        dataset: &Dataset,
        x_column: &str,
        y_column: &str,
        color_column: &str,
    ) -> Result<Self, ChartError> {
        Ok(ScatterData {
            x_column: x_column.to_string(),
            y_column: y_column.to_string(),
            color_column: color_column.to_string(),
            x: numeric_series(dataset, x_column)?.to_vec(),
            y: numeric_series(dataset, y_column)?.to_vec(),
            color: ColorSeries::Label(label_series(dataset, color_column)?.to_vec()),
        })
    }

    /// Returns the number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns true if the scatter has no points.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// One histogram series: per-bin sums for a single group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSeries {
    /// Group label
    pub group: String,
    /// Sum of the value column per bin, aligned with the shared bin edges
    pub sums: Vec<f64>,
}

/// Grouped histogram: uniform bins over one numeric column, summing a
/// second numeric column per bin, one series per group label.
///
/// Every series shares the same bin edges, derived from the full range
/// of the binned column, so the series overlay correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramData {
    /// Name of the binned column
    pub x_column: String,
    /// Name of the summed column
    pub y_column: String,
    /// Name of the grouping column
    pub group_column: String,
    /// Bin edges, ascending; one more edge than bins
    pub bin_edges: Vec<f64>,
    /// One series per group label, sorted by label
    pub series: Vec<HistogramSeries>,
}

impl HistogramData {
    /// Builds a grouped histogram.
    ///
    /// # Arguments
    /// * `dataset` - Source dataset (the labeled one)
    /// * `x_column` - Numeric column to bin
    /// * `y_column` - Numeric column summed per bin
    /// * `group_column` - Categorical column splitting the series
    /// * `bins` - Number of uniform bins (must be at least 1)
    ///
    /// # Behavior
    /// - Bins are half-open; the last bin includes its upper edge
    /// - A column whose values are all equal collapses to a single bin
    ///
    /// # Errors
    /// Returns `ChartError::InvalidBinCount` for zero bins,
    /// `ChartError::EmptyColumn` for a dataset with zero rows, and the
    /// usual column lookup and kind errors otherwise.
    pub fn build(
        dataset: &Dataset,
        x_column: &str,
        y_column: &str,
        group_column: &str,
        bins: usize,
    ) -> Result<Self, ChartError> {
        if bins == 0 {
            return Err(ChartError::InvalidBinCount(0));
        }
        let x = numeric_series(dataset, x_column)?;
        let y = numeric_series(dataset, y_column)?;
        let groups = label_series(dataset, group_column)?;
        if x.is_empty() {
            return Err(ChartError::EmptyColumn(x_column.to_string()));
        }

        let min = x
            .iter()
            .copied()
            .map(OrderedFloat)
            .min()
            .map(|v| v.into_inner())
            .unwrap_or(0.0);
        let max = x
            .iter()
            .copied()
            .map(OrderedFloat)
            .max()
            .map(|v| v.into_inner())
            .unwrap_or(0.0);

        let (bin_edges, bin_count) = if min == max {
            (vec![min, max], 1)
        } else {
            let width = (max - min) / bins as f64;
            let mut edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();
            edges[bins] = max;
            (edges, bins)
        };

        let mut by_group: BTreeMap<&String, Vec<f64>> = BTreeMap::new();
        for ((&xi, &yi), group) in x.iter().zip(y.iter()).zip(groups.iter()) {
            let sums = by_group
                .entry(group)
                .or_insert_with(|| vec![0.0; bin_count]);
            // Assign against the published edges so a value equal to an
            // inner edge lands in the bin that edge opens.
            let bin = bin_edges
                .partition_point(|edge| *edge <= xi)
                .saturating_sub(1)
                .min(bin_count - 1);
            sums[bin] += yi;
        }

        let series = by_group
            .into_iter()
            .map(|(group, sums)| HistogramSeries {
                group: group.clone(),
                sums,
            })
            .collect();

        Ok(HistogramData {
            x_column: x_column.to_string(),
            y_column: y_column.to_string(),
            group_column: group_column.to_string(),
            bin_edges,
            series,
        })
    }

    /// Returns the number of bins.
    pub fn bin_count(&self) -> usize {
        self.bin_edges.len().saturating_sub(1)
    }
}

/// Bar chart: one bar per group label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarData {
    /// Name of the label column
    pub label_column: String,
    /// Name of the aggregated value column
    pub value_column: String,
    /// Bar labels, sorted
    pub labels: Vec<String>,
    /// Bar heights, aligned with the labels
    pub values: Vec<f64>,
}

impl BarData {
    /// Builds bar data from an aggregate view, preserving its row order.
    pub fn from_view(view: &AggregateView) -> Self {
        BarData {
            label_column: view.group_column().to_string(),
            value_column: view.value_column().to_string(),
            labels: view.rows().iter().map(|row| row.group.clone()).collect(),
            values: view.rows().iter().map(|row| row.value).collect(),
        }
    }
}

fn numeric_series<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a [f64], ChartError> {
    let column = dataset
        .column(name)
        .ok_or_else(|| ChartError::UnknownColumn(name.to_string()))?;
    column
        .as_numeric()
        .ok_or_else(|| ChartError::NotNumeric(name.to_string()))
}

fn label_series<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a [String], ChartError> {
    let column = dataset
        .column(name)
        .ok_or_else(|| ChartError::UnknownColumn(name.to_string()))?;
    column
        .as_categorical()
        .ok_or_else(|| ChartError::NotCategorical(name.to_string()))
}

/// Errors that can occur when building chart data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    /// A named column is not declared in the dataset
    UnknownColumn(String),
    /// A column expected to be numeric is categorical
    NotNumeric(String),
    /// A column expected to be categorical is numeric
    NotCategorical(String),
    /// A chart input column holds zero values
    EmptyColumn(String),
    /// The requested bin count is unusable
    InvalidBinCount(usize),
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::UnknownColumn(name) => write!(f, "Unknown column '{}'", name),
            ChartError::NotNumeric(name) => write!(f, "Column '{}' is not numeric", name),
            ChartError::NotCategorical(name) => {
                write!(f, "Column '{}' is not categorical", name)
            }
            ChartError::EmptyColumn(name) => {
                write!(f, "Column '{}' holds zero values", name)
            }
            ChartError::InvalidBinCount(bins) => {
                write!(f, "Invalid bin count {}; at least 1 bin is required", bins)
            }
        }
    }
}

impl std::error::Error for ChartError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::spearman_matrix;
    use crate::dataset::{DatasetSource, InMemoryDatasetSource};
    use crate::schema::{ColumnSpec, Schema};

    fn chart_schema() -> Schema {
        Schema::new(vec![
            ColumnSpec::numeric("bmi").unwrap(),
            ColumnSpec::numeric("charges").unwrap(),
            ColumnSpec::numeric("age").unwrap(),
            ColumnSpec::categorical("smoker").unwrap(),
        ])
        .unwrap()
    }

    fn chart_dataset() -> Dataset {
        let mut source = InMemoryDatasetSource::new();
        source.push_numeric("bmi", vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        source.push_numeric("charges", vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        source.push_numeric("age", vec![19.0, 33.0, 27.0, 52.0, 44.0]);
        source.push_categorical("smoker", vec!["no", "no", "yes", "yes", "no"]);
        source.load(&chart_schema()).unwrap()
    }

    #[test]
    fn test_heatmap_mirrors_matrix() {
        let mut source = InMemoryDatasetSource::new();
        source.push_numeric("age", vec![1.0, 2.0, 3.0]);
        source.push_numeric("charges", vec![30.0, 10.0, 20.0]);
        let schema = Schema::new(vec![
            ColumnSpec::numeric("age").unwrap(),
            ColumnSpec::numeric("charges").unwrap(),
        ])
        .unwrap();
        let dataset = source.load(&schema).unwrap();
        let matrix = spearman_matrix(&dataset).unwrap();

        let heatmap = HeatmapData::from_matrix(&matrix);
        assert_eq!(heatmap.x_labels, matrix.labels());
        assert_eq!(heatmap.y_labels, matrix.labels());
        assert_eq!(heatmap.values, matrix.values());
    }

    #[test]
    fn test_scatter_numeric_color_row_aligned() {
        let dataset = chart_dataset();

        let scatter = ScatterData::numeric_color(&dataset, "bmi", "charges", "age").unwrap();
        assert_eq!(scatter.len(), dataset.row_count());
        assert_eq!(scatter.x, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(scatter.y, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(
            scatter.color,
            ColorSeries::Numeric(vec![19.0, 33.0, 27.0, 52.0, 44.0])
        );
    }

    #[test]
    fn test_scatter_label_color_keeps_labels() {
        let dataset = chart_dataset();

        let scatter = ScatterData::label_color(&dataset, "bmi", "charges", "smoker").unwrap();
        match &scatter.color {
            ColorSeries::Label(labels) => {
                assert_eq!(labels, &["no", "no", "yes", "yes", "no"]);
            }
            other => panic!("expected label colors, got {:?}", other),
        }
    }

    #[test]
    fn test_scatter_unknown_column() {
        let dataset = chart_dataset();

        let result = ScatterData::numeric_color(&dataset, "bmi", "charges", "height");
        assert_eq!(
            result.unwrap_err(),
            ChartError::UnknownColumn("height".to_string())
        );
    }

    #[test]
    fn test_scatter_kind_mismatches() {
        let dataset = chart_dataset();

        let result = ScatterData::numeric_color(&dataset, "bmi", "charges", "smoker");
        assert_eq!(
            result.unwrap_err(),
            ChartError::NotNumeric("smoker".to_string())
        );

        let result = ScatterData::label_color(&dataset, "bmi", "charges", "age");
        assert_eq!(
            result.unwrap_err(),
            ChartError::NotCategorical("age".to_string())
        );
    }

    #[test]
    fn test_histogram_shared_bins_and_group_sums() {
        let dataset = chart_dataset();

        let hist = HistogramData::build(&dataset, "bmi", "charges", "smoker", 2).unwrap();
        assert_eq!(hist.bin_edges, vec![0.0, 1.0, 2.0]);
        assert_eq!(hist.bin_count(), 2);
        assert_eq!(hist.series.len(), 2);

        // Groups sorted by label; each series spans the shared bins
        assert_eq!(hist.series[0].group, "no");
        assert_eq!(hist.series[0].sums, vec![3.0, 5.0]);
        assert_eq!(hist.series[1].group, "yes");
        assert_eq!(hist.series[1].sums, vec![0.0, 7.0]);
    }

    #[test]
    fn test_histogram_last_bin_includes_upper_edge() {
        let dataset = chart_dataset();

        let hist = HistogramData::build(&dataset, "bmi", "charges", "smoker", 2).unwrap();
        // bmi 2.0 sits on the final edge and lands in the last bin
        let total: f64 = hist
            .series
            .iter()
            .flat_map(|series| series.sums.iter())
            .sum();
        assert_eq!(total, 15.0);
    }

    #[test]
    fn test_histogram_inner_edge_value_lands_in_upper_bin() {
        // An x value bit-equal to a published inner edge belongs to the
        // bin that edge opens, even when the edge is not exactly
        // representable from the raw width arithmetic.
        let (min, max) = (16.47_f64, 53.13_f64);
        let inner_edge = min + (max - min) / 2.0;

        let mut source = InMemoryDatasetSource::new();
        source.push_numeric("bmi", vec![min, inner_edge, max]);
        source.push_numeric("charges", vec![1.0, 10.0, 100.0]);
        source.push_numeric("age", vec![20.0, 30.0, 40.0]);
        source.push_categorical("smoker", vec!["no", "no", "no"]);
        let dataset = source.load(&chart_schema()).unwrap();

        let hist = HistogramData::build(&dataset, "bmi", "charges", "smoker", 2).unwrap();
        assert_eq!(hist.bin_edges[1], inner_edge);
        assert_eq!(hist.series[0].sums, vec![1.0, 110.0]);
    }

    #[test]
    fn test_histogram_degenerate_range_single_bin() {
        let mut source = InMemoryDatasetSource::new();
        source.push_numeric("bmi", vec![7.0, 7.0, 7.0]);
        source.push_numeric("charges", vec![1.0, 2.0, 3.0]);
        source.push_numeric("age", vec![20.0, 30.0, 40.0]);
        source.push_categorical("smoker", vec!["no", "yes", "no"]);
        let dataset = source.load(&chart_schema()).unwrap();

        let hist = HistogramData::build(&dataset, "bmi", "charges", "smoker", 10).unwrap();
        assert_eq!(hist.bin_edges, vec![7.0, 7.0]);
        assert_eq!(hist.bin_count(), 1);
        assert_eq!(hist.series[0].sums, vec![4.0]);
        assert_eq!(hist.series[1].sums, vec![2.0]);
    }

    #[test]
    fn test_histogram_zero_bins_rejected() {
        let dataset = chart_dataset();

        let result = HistogramData::build(&dataset, "bmi", "charges", "smoker", 0);
        assert_eq!(result.unwrap_err(), ChartError::InvalidBinCount(0));
    }

    #[test]
    fn test_histogram_empty_dataset_rejected() {
        let mut source = InMemoryDatasetSource::new();
        source.push_numeric("bmi", vec![]);
        source.push_numeric("charges", vec![]);
        source.push_numeric("age", vec![]);
        source.push_categorical::<String>("smoker", vec![]);
        let dataset = source.load(&chart_schema()).unwrap();

        let result = HistogramData::build(&dataset, "bmi", "charges", "smoker", 10);
        assert_eq!(
            result.unwrap_err(),
            ChartError::EmptyColumn("bmi".to_string())
        );
    }

    #[test]
    fn test_bar_from_view_preserves_order() {
        let schema = Schema::new(vec![
            ColumnSpec::categorical("region").unwrap(),
            ColumnSpec::numeric("charges").unwrap(),
        ])
        .unwrap();
        let mut source = InMemoryDatasetSource::new();
        source.push_categorical("region", vec!["southeast", "northeast", "northeast"]);
        source.push_numeric("charges", vec![300.0, 100.0, 200.0]);
        let dataset = source.load(&schema).unwrap();

        let view = AggregateView::build(
            &dataset,
            "region",
            "charges",
            crate::aggregate::AggregateKind::Mean,
        )
        .unwrap();
        let bar = BarData::from_view(&view);
        assert_eq!(bar.labels, vec!["northeast", "southeast"]);
        assert_eq!(bar.values, vec![150.0, 300.0]);
        assert_eq!(bar.label_column, "region");
        assert_eq!(bar.value_column, "charges");
    }
}
