pub mod schema;
pub mod dataset;
pub mod csv_source;
pub mod encoder;
pub mod correlation;
pub mod aggregate;
pub mod charts;
pub mod pipeline;

#[cfg(test)]
mod integration_tests;

pub use schema::{ColumnKind, ColumnSpec, Schema, SchemaError};
pub use dataset::{
    Column, Dataset, DatasetSource, DatasetSummary, InMemoryDatasetSource, LoadError,
};
pub use csv_source::CsvDatasetSource;
pub use encoder::{CategoricalEncoder, ColumnEncoding, EncodeError, EncodingMap};
pub use correlation::{rank, spearman, spearman_matrix, CorrelationError, CorrelationMatrix};
pub use aggregate::{AggregateError, AggregateKind, AggregateRow, AggregateView};
pub use charts::{
    BarData, ChartError, ColorSeries, HeatmapData, HistogramData, HistogramSeries, ScatterData,
};
pub use pipeline::{
    ChartBindings, DashboardPipeline, DashboardSnapshot, PipelineConfig, PipelineError,
};
