//! Labeled evaluation dataset.

use std::collections::BTreeMap;

use crate::error::{CertError, Result};

/// Class label. Current checks use 0/1, but any finite label set is allowed.
pub type Label = i64;

/// Ordered rows of fixed-width numeric features with one label each.
///
/// # Invariants
///
/// `features.len() == labels.len()` and every row has the same width. Both
/// are enforced by [`Dataset::new`]; the fields are private so a `Dataset`
/// can never be observed in a violating state.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<Vec<f64>>,
    labels: Vec<Label>,
}

impl Dataset {
    /// Build a dataset, rejecting mismatched row counts or ragged rows.
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<Label>) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(CertError::InvalidDataset(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if let Some(first) = features.first() {
            let width = first.len();
            if width == 0 {
                return Err(CertError::InvalidDataset(
                    "rows must have at least one feature".to_string(),
                ));
            }
            if let Some((row, bad)) = features
                .iter()
                .enumerate()
                .find(|(_, r)| r.len() != width)
            {
                return Err(CertError::InvalidDataset(format!(
                    "row {} has {} features, expected {}",
                    row,
                    bad.len(),
                    width
                )));
            }
        }
        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Feature width shared by all rows (0 for an empty dataset).
    pub fn width(&self) -> usize {
        self.features.first().map(Vec::len).unwrap_or(0)
    }

    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Values of one feature column, or `None` when `index >= width`.
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.width() {
            return None;
        }
        Some(self.features.iter().map(|row| row[index]).collect())
    }

    /// A new dataset holding the given rows, in the given order.
    ///
    /// Out-of-range indices are skipped.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        let mut features = Vec::with_capacity(indices.len());
        let mut labels = Vec::with_capacity(indices.len());
        for &i in indices {
            if let (Some(row), Some(label)) = (self.features.get(i), self.labels.get(i)) {
                features.push(row.clone());
                labels.push(*label);
            }
        }
        Dataset { features, labels }
    }

    /// Split into (head, tail) where the tail holds `fraction` of the rows.
    pub fn split_tail(&self, fraction: f64) -> (Dataset, Dataset) {
        let fraction = fraction.clamp(0.0, 1.0);
        let tail_len = (self.len() as f64 * fraction).round() as usize;
        let cut = self.len() - tail_len;
        let head: Vec<usize> = (0..cut).collect();
        let tail: Vec<usize> = (cut..self.len()).collect();
        (self.subset(&head), self.subset(&tail))
    }

    /// Count of rows per label, in ascending label order.
    pub fn class_counts(&self) -> BTreeMap<Label, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(*label).or_insert(0) += 1;
        }
        counts
    }

    pub fn has_nan(&self) -> bool {
        self.features.iter().flatten().any(|v| v.is_nan())
    }

    pub fn has_infinite(&self) -> bool {
        self.features.iter().flatten().any(|v| v.is_infinite())
    }
}
