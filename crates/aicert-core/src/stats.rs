//! Metric computations shared by the validation and red-team batteries.
//!
//! Both batteries measure group disparity and perturbation sensitivity; the
//! numbers come from here and each battery applies its own scoring or
//! severity policy on top.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Label};
use crate::error::CheckError;
use crate::model::Model;

/// Fraction of predictions equal to their label. Empty input yields 0.
pub fn accuracy(predictions: &[Label], labels: &[Label]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(p, l)| p == l)
        .count();
    correct as f64 / labels.len() as f64
}

/// Median of the non-NaN values, or `None` when there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// `minority / majority` class count. Fewer than two classes yields 1.0.
pub fn class_balance_ratio(data: &Dataset) -> f64 {
    let counts = data.class_counts();
    if counts.len() < 2 {
        return 1.0;
    }
    let min = counts.values().copied().min().unwrap_or(0);
    let max = counts.values().copied().max().unwrap_or(0);
    if max == 0 {
        return 1.0;
    }
    min as f64 / max as f64
}

/// Run `predict` and verify one output per row.
pub fn predict_checked(model: &dyn Model, rows: &[Vec<f64>]) -> Result<Vec<Label>, CheckError> {
    let predictions = model.predict(rows)?;
    if predictions.len() != rows.len() {
        return Err(CheckError::OutputLength {
            expected: rows.len(),
            actual: predictions.len(),
        });
    }
    Ok(predictions)
}

/// Run `predict_probabilities` and verify one output per row.
pub fn probabilities_checked(
    model: &dyn Model,
    rows: &[Vec<f64>],
) -> Result<Vec<Vec<f64>>, CheckError> {
    let probabilities = model.predict_probabilities(rows)?;
    if probabilities.len() != rows.len() {
        return Err(CheckError::OutputLength {
            expected: rows.len(),
            actual: probabilities.len(),
        });
    }
    Ok(probabilities)
}

/// Accuracy gap between the two halves of a median split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupDisparity {
    /// Split point of the sensitive feature.
    pub median: f64,
    /// Rows with value `<= median`.
    pub group_a_size: usize,
    /// Rows with value `> median`.
    pub group_b_size: usize,
    pub group_a_accuracy: f64,
    pub group_b_accuracy: f64,
    /// `|group_a_accuracy - group_b_accuracy|`.
    pub disparity: f64,
}

/// Split rows at the median of `feature` and compare per-group accuracy.
///
/// Rows whose sensitive value is NaN fall in neither group. An empty group
/// has accuracy 0.
pub fn group_disparity(
    model: &dyn Model,
    data: &Dataset,
    feature: usize,
) -> Result<GroupDisparity, CheckError> {
    let column = data.column(feature).ok_or(CheckError::FeatureIndex {
        index: feature,
        width: data.width(),
    })?;
    let median = median(&column).unwrap_or(0.0);

    let group_a: Vec<usize> = (0..column.len()).filter(|&i| column[i] <= median).collect();
    let group_b: Vec<usize> = (0..column.len()).filter(|&i| column[i] > median).collect();

    let group_a_accuracy = subgroup_accuracy(model, data, &group_a)?;
    let group_b_accuracy = subgroup_accuracy(model, data, &group_b)?;

    Ok(GroupDisparity {
        median,
        group_a_size: group_a.len(),
        group_b_size: group_b.len(),
        group_a_accuracy,
        group_b_accuracy,
        disparity: (group_a_accuracy - group_b_accuracy).abs(),
    })
}

fn subgroup_accuracy(
    model: &dyn Model,
    data: &Dataset,
    indices: &[usize],
) -> Result<f64, CheckError> {
    if indices.is_empty() {
        return Ok(0.0);
    }
    let group = data.subset(indices);
    let predictions = predict_checked(model, group.features())?;
    Ok(accuracy(&predictions, group.labels()))
}

/// Accuracy lost when inputs are perturbed with Gaussian noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Degradation {
    pub original_accuracy: f64,
    pub perturbed_accuracy: f64,
    /// `original_accuracy - perturbed_accuracy`; negative when noise helps.
    pub degradation: f64,
}

pub fn degradation(
    model: &dyn Model,
    data: &Dataset,
    sigma: f64,
    rng: &mut StdRng,
) -> Result<Degradation, CheckError> {
    let original = predict_checked(model, data.features())?;
    let perturbed_rows = perturb(data.features(), sigma, rng);
    let perturbed = predict_checked(model, &perturbed_rows)?;

    let original_accuracy = accuracy(&original, data.labels());
    let perturbed_accuracy = accuracy(&perturbed, data.labels());
    Ok(Degradation {
        original_accuracy,
        perturbed_accuracy,
        degradation: original_accuracy - perturbed_accuracy,
    })
}

/// Predictions that change under small random perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlipRate {
    pub samples: usize,
    pub flipped: usize,
    pub rate: f64,
}

pub fn flip_rate(
    model: &dyn Model,
    data: &Dataset,
    epsilon: f64,
    rng: &mut StdRng,
) -> Result<FlipRate, CheckError> {
    let original = predict_checked(model, data.features())?;
    let perturbed_rows = perturb(data.features(), epsilon, rng);
    let perturbed = predict_checked(model, &perturbed_rows)?;

    let flipped = original
        .iter()
        .zip(&perturbed)
        .filter(|(a, b)| a != b)
        .count();
    let samples = data.len();
    let rate = if samples == 0 {
        0.0
    } else {
        flipped as f64 / samples as f64
    };
    Ok(FlipRate {
        samples,
        flipped,
        rate,
    })
}

/// Wrong predictions made with top-class probability above a cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Overconfidence {
    pub cutoff: f64,
    pub errors: usize,
    /// `errors / total rows` (not over confident rows).
    pub rate: f64,
}

/// Count misclassifications whose maximum class probability exceeds `cutoff`.
///
/// Callers must check [`crate::model::Capability::Probabilities`] first.
pub fn overconfidence(
    model: &dyn Model,
    data: &Dataset,
    cutoff: f64,
) -> Result<Overconfidence, CheckError> {
    let predictions = predict_checked(model, data.features())?;
    let probabilities = probabilities_checked(model, data.features())?;

    let errors = predictions
        .iter()
        .zip(data.labels())
        .zip(&probabilities)
        .filter(|((p, l), probs)| {
            let top = probs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            p != l && top > cutoff
        })
        .count();
    let rate = if data.is_empty() {
        0.0
    } else {
        errors as f64 / data.len() as f64
    };
    Ok(Overconfidence {
        cutoff,
        errors,
        rate,
    })
}

/// Resolve an optional seed, drawing one from OS entropy when absent.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Add independent `N(0, sigma²)` noise to every feature.
pub fn perturb(rows: &[Vec<f64>], sigma: f64, rng: &mut StdRng) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|row| row.iter().map(|x| x + sigma * standard_normal(rng)).collect())
        .collect()
}

/// Box–Muller transform over two uniform draws.
fn standard_normal(rng: &mut StdRng) -> f64 {
    // gen::<f64>() is in [0, 1); shift to (0, 1] so ln() stays finite.
    let u1 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    /// Predicts 1 when feature 0 is positive.
    struct SignModel;

    impl Model for SignModel {
        fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Label>, ModelError> {
            Ok(features.iter().map(|r| i64::from(r[0] > 0.0)).collect())
        }
    }

    #[test]
    fn test_accuracy_empty_is_zero() {
        assert_eq!(accuracy(&[], &[]), 0.0);
        assert_eq!(accuracy(&[1, 0, 1, 1], &[1, 0, 0, 1]), 0.75);
    }

    #[test]
    fn test_median_even_odd_and_nan() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[f64::NAN, 5.0]), Some(5.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_class_balance_ratio() {
        let ds = Dataset::new(vec![vec![0.0]; 4], vec![0, 1, 1, 1]).unwrap();
        assert!((class_balance_ratio(&ds) - 1.0 / 3.0).abs() < 1e-12);
        let single = Dataset::new(vec![vec![0.0]; 2], vec![1, 1]).unwrap();
        assert_eq!(class_balance_ratio(&single), 1.0);
    }

    #[test]
    fn test_group_disparity_median_split() {
        // Feature 1 is the sensitive attribute; model only looks at feature 0.
        let ds = Dataset::new(
            vec![
                vec![1.0, 0.0],
                vec![-1.0, 1.0],
                vec![1.0, 2.0],
                vec![1.0, 3.0],
            ],
            // group A (feature1 <= 1.5): rows 0,1 both correct
            // group B (> 1.5): rows 2 correct, 3 wrong
            vec![1, 0, 1, 0],
        )
        .unwrap();
        let d = group_disparity(&SignModel, &ds, 1).unwrap();
        assert_eq!(d.median, 1.5);
        assert_eq!(d.group_a_size, 2);
        assert_eq!(d.group_b_size, 2);
        assert_eq!(d.group_a_accuracy, 1.0);
        assert_eq!(d.group_b_accuracy, 0.5);
        assert_eq!(d.disparity, 0.5);
    }

    #[test]
    fn test_group_disparity_empty_group_scores_zero() {
        // All values equal the median, so group B is empty.
        let ds = Dataset::new(vec![vec![1.0]; 3], vec![1, 1, 1]).unwrap();
        let d = group_disparity(&SignModel, &ds, 0).unwrap();
        assert_eq!(d.group_b_size, 0);
        assert_eq!(d.group_b_accuracy, 0.0);
        assert_eq!(d.disparity, 1.0);
    }

    #[test]
    fn test_group_disparity_bad_feature_index() {
        let ds = Dataset::new(vec![vec![1.0]], vec![1]).unwrap();
        assert!(matches!(
            group_disparity(&SignModel, &ds, 3),
            Err(CheckError::FeatureIndex { index: 3, width: 1 })
        ));
    }

    #[test]
    fn test_perturbation_is_seed_deterministic() {
        let rows = vec![vec![0.0, 1.0]; 5];
        let a = perturb(&rows, 0.1, &mut seeded_rng(7));
        let b = perturb(&rows, 0.1, &mut seeded_rng(7));
        let c = perturb(&rows, 0.1, &mut seeded_rng(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_zero_sigma_has_no_degradation() {
        let ds = Dataset::new(vec![vec![1.0], vec![-1.0]], vec![1, 0]).unwrap();
        let d = degradation(&SignModel, &ds, 0.0, &mut seeded_rng(1)).unwrap();
        assert_eq!(d.original_accuracy, 1.0);
        assert_eq!(d.degradation, 0.0);
        let f = flip_rate(&SignModel, &ds, 0.0, &mut seeded_rng(1)).unwrap();
        assert_eq!(f.flipped, 0);
    }

    #[test]
    fn test_predict_checked_rejects_short_output() {
        struct Short;
        impl Model for Short {
            fn predict(&self, _: &[Vec<f64>]) -> Result<Vec<Label>, ModelError> {
                Ok(vec![1])
            }
        }
        let err = predict_checked(&Short, &[vec![0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            CheckError::OutputLength {
                expected: 2,
                actual: 1
            }
        ));
    }
}
