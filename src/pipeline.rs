//! Dashboard pipeline: loads the dataset once, fits the categorical
//! encodings, computes the correlation matrix, then serves chart data
//! products on request. The pipeline holds no global state; callers own
//! the instance and every request returns freshly built values.

use crate::aggregate::{AggregateError, AggregateKind, AggregateView};
use crate::charts::{BarData, ChartError, HeatmapData, HistogramData, ScatterData};
use crate::correlation::{spearman_matrix, CorrelationError, CorrelationMatrix};
use crate::dataset::{Dataset, DatasetSource, DatasetSummary, LoadError};
use crate::encoder::{CategoricalEncoder, EncodeError, EncodingMap};
use crate::schema::{ColumnKind, Schema, SchemaError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Column bindings for the dashboard's charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartBindings {
    /// X axis of both scatter plots (numeric)
    pub scatter_x: String,
    /// Y axis of both scatter plots (numeric)
    pub scatter_y: String,
    /// Continuous color column of the first scatter (numeric)
    pub scatter_numeric_color: String,
    /// Discrete color column of the second scatter (categorical)
    pub scatter_group_color: String,
    /// Binned column of the histogram (numeric)
    pub histogram_x: String,
    /// Summed column of the histogram (numeric)
    pub histogram_y: String,
    /// Grouping column of the histogram (categorical)
    pub histogram_group: String,
    /// Grouping column of the bar chart (categorical)
    pub bar_group: String,
    /// Averaged column of the bar chart (numeric)
    pub bar_value: String,
}

impl Default for ChartBindings {
    fn default() -> Self {
        ChartBindings {
            scatter_x: "bmi".to_string(),
            scatter_y: "charges".to_string(),
            scatter_numeric_color: "age".to_string(),
            scatter_group_color: "smoker".to_string(),
            histogram_x: "bmi".to_string(),
            histogram_y: "charges".to_string(),
            histogram_group: "smoker".to_string(),
            bar_group: "region".to_string(),
            bar_value: "charges".to_string(),
        }
    }
}

/// Pipeline configuration: the required dataset schema, the chart column
/// bindings and the histogram bin count.
///
/// The default configuration matches the insurance dashboard layout.
/// Configurations loaded from JSON are validated when the pipeline is
/// built, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Required columns and their kinds
    pub schema: Schema,
    /// Chart column bindings
    pub charts: ChartBindings,
    /// Number of uniform histogram bins
    pub histogram_bins: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            schema: Schema::insurance(),
            charts: ChartBindings::default(),
            histogram_bins: 10,
        }
    }
}

impl PipelineConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// All chart data products for one dashboard render, assembled by a
/// single `refresh` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Correlation heatmap over the encoded dataset
    pub heatmap: HeatmapData,
    /// Scatter with a continuous color scale
    pub scatter_continuous: ScatterData,
    /// Scatter colored by group labels
    pub scatter_grouped: ScatterData,
    /// Grouped histogram
    pub histogram: HistogramData,
    /// Bar chart of per-group means
    pub bar: BarData,
    /// Label-to-code encodings, for decoding codes in the other products
    pub encodings: EncodingMap,
    /// Shape summary of the loaded dataset
    pub summary: DatasetSummary,
}

/// Dashboard pipeline over a single loaded dataset.
///
/// Construction performs all one-time work: loading, encoding and the
/// correlation matrix. Afterwards the pipeline is immutable; `refresh`
/// and `aggregate_view` take `&self` and return owned values, so a
/// pipeline shared behind `Arc` serves concurrent readers without
/// locking.
#[derive(Debug, Clone)]
pub struct DashboardPipeline {
    config: PipelineConfig,
    dataset: Dataset,
    encoded: Dataset,
    encodings: EncodingMap,
    correlation: CorrelationMatrix,
}

impl DashboardPipeline {
    /// Builds a pipeline by loading the dataset from the given source.
    ///
    /// # Arguments
    /// * `config` - Schema, chart bindings and histogram bin count
    /// * `source` - Where to load the dataset from
    ///
    /// # Returns
    /// A ready pipeline. Construction either fully succeeds or returns
    /// the first error; there is no partially loaded state.
    ///
    /// # Errors
    /// Propagates schema validation, load, encoding and correlation
    /// errors, and rejects chart bindings that reference missing or
    /// wrongly-kinded columns.
    pub fn from_source(
        config: PipelineConfig,
        source: &dyn DatasetSource,
    ) -> Result<Self, PipelineError> {
        // External configurations bypass Schema::new, so re-validate
        let schema = Schema::new(config.schema.columns().to_vec())?;
        validate_bindings(&schema, &config.charts)?;
        if config.histogram_bins == 0 {
            return Err(PipelineError::Chart(ChartError::InvalidBinCount(0)));
        }

        let dataset = source.load(&schema)?;
        let encoder = CategoricalEncoder::new(schema.categorical_columns());
        let (encoded, encodings) = encoder.fit_transform(&dataset)?;
        let correlation = spearman_matrix(&encoded)?;
        info!(
            "Pipeline ready: {} rows, {} columns, {} encoded",
            dataset.row_count(),
            schema.len(),
            encodings.len()
        );

        Ok(DashboardPipeline {
            config,
            dataset,
            encoded,
            encodings,
            correlation,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the loaded dataset with its original labels.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Returns the dataset with categorical columns replaced by codes.
    pub fn encoded(&self) -> &Dataset {
        &self.encoded
    }

    /// Returns the label-to-code encodings.
    pub fn encodings(&self) -> &EncodingMap {
        &self.encodings
    }

    /// Returns the Spearman correlation matrix.
    pub fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    /// Returns a summary of the loaded dataset.
    pub fn summary(&self) -> DatasetSummary {
        self.dataset.summary()
    }

    /// Builds a fresh aggregate view over the labeled dataset.
    ///
    /// # Errors
    /// Propagates `AggregateError` wrapped in `PipelineError`.
    pub fn aggregate_view(
        &self,
        group_column: &str,
        value_column: &str,
        kind: AggregateKind,
    ) -> Result<AggregateView, PipelineError> {
        let view = AggregateView::build(&self.dataset, group_column, value_column, kind)?;
        Ok(view)
    }

    /// Assembles all chart data products for one dashboard render.
    ///
    /// Each call recomputes the per-request products and returns values
    /// owned by the caller, independent of any other request.
    ///
    /// # Errors
    /// Propagates chart and aggregation errors wrapped in
    /// `PipelineError`.
    pub fn refresh(&self) -> Result<DashboardSnapshot, PipelineError> {
        debug!("Assembling dashboard snapshot");
        let charts = &self.config.charts;

        let heatmap = HeatmapData::from_matrix(&self.correlation);
        let scatter_continuous = ScatterData::numeric_color(
            &self.dataset,
            &charts.scatter_x,
            &charts.scatter_y,
            &charts.scatter_numeric_color,
        )?;
        let scatter_grouped = ScatterData::label_color(
            &self.dataset,
            &charts.scatter_x,
            &charts.scatter_y,
            &charts.scatter_group_color,
        )?;
        let histogram = HistogramData::build(
            &self.dataset,
            &charts.histogram_x,
            &charts.histogram_y,
            &charts.histogram_group,
            self.config.histogram_bins,
        )?;
        let means =
            self.aggregate_view(&charts.bar_group, &charts.bar_value, AggregateKind::Mean)?;
        let bar = BarData::from_view(&means);

        Ok(DashboardSnapshot {
            heatmap,
            scatter_continuous,
            scatter_grouped,
            histogram,
            bar,
            encodings: self.encodings.clone(),
            summary: self.dataset.summary(),
        })
    }
}

fn validate_bindings(schema: &Schema, charts: &ChartBindings) -> Result<(), ChartError> {
    let numeric = [
        &charts.scatter_x,
        &charts.scatter_y,
        &charts.scatter_numeric_color,
        &charts.histogram_x,
        &charts.histogram_y,
        &charts.bar_value,
    ];
    for name in numeric {
        match schema.kind_of(name) {
            Some(ColumnKind::Numeric) => {}
            Some(ColumnKind::Categorical) => return Err(ChartError::NotNumeric(name.clone())),
            None => return Err(ChartError::UnknownColumn(name.clone())),
        }
    }

    let categorical = [
        &charts.scatter_group_color,
        &charts.histogram_group,
        &charts.bar_group,
    ];
    for name in categorical {
        match schema.kind_of(name) {
            Some(ColumnKind::Categorical) => {}
            Some(ColumnKind::Numeric) => return Err(ChartError::NotCategorical(name.clone())),
            None => return Err(ChartError::UnknownColumn(name.clone())),
        }
    }
    Ok(())
}

/// Errors surfaced by the pipeline, wrapping each stage's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Configured schema is invalid
    Schema(SchemaError),
    /// Dataset loading failed
    Load(LoadError),
    /// Categorical encoding failed
    Encode(EncodeError),
    /// Correlation matrix computation failed
    Correlation(CorrelationError),
    /// Aggregate view construction failed
    Aggregate(AggregateError),
    /// Chart data construction failed
    Chart(ChartError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Schema(err) => write!(f, "Schema error: {}", err),
            PipelineError::Load(err) => write!(f, "Load failed: {}", err),
            PipelineError::Encode(err) => write!(f, "Encoding failed: {}", err),
            PipelineError::Correlation(err) => write!(f, "Correlation failed: {}", err),
            PipelineError::Aggregate(err) => write!(f, "Aggregation failed: {}", err),
            PipelineError::Chart(err) => write!(f, "Chart build failed: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<SchemaError> for PipelineError {
    fn from(err: SchemaError) -> Self {
        PipelineError::Schema(err)
    }
}

impl From<LoadError> for PipelineError {
    fn from(err: LoadError) -> Self {
        PipelineError::Load(err)
    }
}

impl From<EncodeError> for PipelineError {
    fn from(err: EncodeError) -> Self {
        PipelineError::Encode(err)
    }
}

impl From<CorrelationError> for PipelineError {
    fn from(err: CorrelationError) -> Self {
        PipelineError::Correlation(err)
    }
}

impl From<AggregateError> for PipelineError {
    fn from(err: AggregateError) -> Self {
        PipelineError::Aggregate(err)
    }
}

impl From<ChartError> for PipelineError {
    fn from(err: ChartError) -> Self {
        PipelineError::Chart(err)
    }
}
