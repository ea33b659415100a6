//! Spearman Rank Correlation
//!
//! This module provides stateless ranking and correlation functions plus
//! the labeled correlation matrix computed over a fully-numeric dataset.
//! Encoded categorical columns enter the matrix as their integer codes,
//! which treats nominal categories as ordinal. That behavior is part of
//! the dashboard's established output and is kept as-is.

use crate::dataset::Dataset;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Calculates ranks for a series, averaging ranks over ties.
///
/// # Arguments
/// * `values` - Slice of values as f64 (finite; the loading stage admits
///   no NaN or infinite values)
///
/// # Returns
/// Vector of 1-based ranks, same length and order as the input.
///
/// # Behavior
/// - Equal values share the average of the ranks they occupy
/// - Empty input returns empty output
///
/// # Examples
/// ```
/// use dashmetrics::correlation::rank;
///
/// let ranks = rank(&[30.0, 10.0, 20.0]);
/// assert_eq!(ranks, vec![3.0, 1.0, 2.0]);
///
/// // Ties share the average rank
/// let ranks = rank(&[1.0, 2.0, 2.0, 3.0]);
/// assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
/// ```
pub fn rank(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| OrderedFloat(a.1).cmp(&OrderedFloat(b.1)));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }

        // Positions i..j (1-based ranks i+1..=j) share the average rank
        let avg_rank = (i + j) as f64 / 2.0 + 0.5;
        for k in i..j {
            ranks[indexed[k].0] = avg_rank;
        }

        i = j;
    }

    ranks
}

/// Calculates the Pearson correlation of two series.
///
/// Returns None if the lengths differ, fewer than 2 points are given, or
/// either series has zero variance.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x: f64 = x.iter().sum::<f64>() / n;
    let mean_y: f64 = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Calculates the Spearman rank correlation of two series.
///
/// Spearman is the Pearson correlation of the rank-transformed series,
/// with ties resolved by average rank.
///
/// # Arguments
/// * `x` - First series
/// * `y` - Second series (same length)
///
/// # Returns
/// The coefficient in [-1, 1], or None if it is undefined: lengths
/// differ, fewer than 2 points, or a series with zero variance.
///
/// # Examples
/// ```
/// use dashmetrics::correlation::spearman;
///
/// // Any strictly increasing relationship ranks identically
/// let r = spearman(&[1.0, 2.0, 3.0], &[10.0, 400.0, 500.0]).unwrap();
/// assert!((r - 1.0).abs() < 1e-9);
/// ```
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    pearson(&rank(x), &rank(y))
}

/// Labeled square matrix of Spearman correlations.
///
/// Symmetric with a diagonal of exactly 1.0; labels follow the source
/// dataset's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Returns the column labels in matrix order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the matrix values, row-major, aligned with the labels.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Returns the number of rows (equal to the number of columns).
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    /// Returns the correlation between two named columns, if both exist.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|label| label == a)?;
        let j = self.labels.iter().position(|label| label == b)?;
        Some(self.values[i][j])
    }
}

/// Computes the Spearman correlation matrix over all dataset columns.
///
/// The dataset must be fully numeric (categorical columns already
/// replaced by their code columns).
///
/// # Arguments
/// * `dataset` - Fully-numeric dataset
///
/// # Returns
/// A symmetric matrix with diagonal exactly 1.0 and entries in [-1, 1],
/// labeled in dataset column order.
///
/// # Errors
/// Returns `CorrelationError::NonNumericColumn` if a column still holds
/// labels, or `CorrelationError::InsufficientData` naming the first
/// column with fewer than 2 distinct values (a constant column, a
/// single-row dataset) for which the coefficient is undefined. Undefined
/// correlations are never reported as NaN entries.
pub fn spearman_matrix(dataset: &Dataset) -> Result<CorrelationMatrix, CorrelationError> {
    let mut labels = Vec::with_capacity(dataset.schema().len());
    let mut series = Vec::with_capacity(dataset.schema().len());
    for spec in dataset.schema().columns() {
        let values = dataset.numeric(&spec.name).ok_or_else(|| {
            CorrelationError::NonNumericColumn(spec.name.clone())
        })?;
        labels.push(spec.name.clone());
        series.push(values);
    }

    for (label, values) in labels.iter().zip(series.iter()) {
        if distinct_count(values) < 2 {
            return Err(CorrelationError::InsufficientData {
                column: label.clone(),
            });
        }
    }

    // Rank each column once; every pairwise coefficient reuses the ranks
    let ranked: Vec<Vec<f64>> = series.iter().map(|values| rank(values)).collect();

    let n = labels.len();
    let mut values = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r = pearson(&ranked[i], &ranked[j]).ok_or_else(|| {
                CorrelationError::InsufficientData {
                    column: labels[i].clone(),
                }
            })?;
            // Float error can push |r| just past 1
            let r = r.clamp(-1.0, 1.0);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    debug!(
        "Computed {}x{} Spearman correlation matrix over {} rows",
        n,
        n,
        dataset.row_count()
    );
    Ok(CorrelationMatrix { labels, values })
}

fn distinct_count(values: &[f64]) -> usize {
    values
        .iter()
        .map(|v| OrderedFloat(*v))
        .collect::<HashSet<_>>()
        .len()
}

/// Errors that can occur when computing correlations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    /// A column has fewer than 2 distinct values, so its correlation is undefined
    InsufficientData { column: String },
    /// A column holds labels rather than numeric values
    NonNumericColumn(String),
}

impl fmt::Display for CorrelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationError::InsufficientData { column } => write!(
                f,
                "Column '{}' has fewer than 2 distinct values; correlation is undefined",
                column
            ),
            CorrelationError::NonNumericColumn(name) => {
                write!(f, "Column '{}' is not numeric", name)
            }
        }
    }
}

impl std::error::Error for CorrelationError {}
