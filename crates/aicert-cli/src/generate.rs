//! Synthetic deepfake-detection dataset and a fitted reference model.

use std::path::{Path, PathBuf};

use aicert_core::{Dataset, Label, LogisticModel};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset_io::{write_csv, LabeledTable};

pub const FEATURE_NAMES: [&str; 10] = [
    "facial_landmark_consistency",
    "blinking_pattern_freq",
    "head_pose_variance",
    "lighting_inconsistency_score",
    "compression_artifact_level",
    "temporal_coherence_error",
    "audio_sync_offset",
    "face_resolution_mismatch",
    "color_distribution_anomaly",
    "edge_sharpness_inconsistency",
];

const FIT_EPOCHS: usize = 400;
const LEARNING_RATE: f64 = 0.5;

pub struct SampleData {
    pub table: LabeledTable,
    pub model: LogisticModel,
}

/// Draw `samples` rows (label 1 = fake) and fit a logistic model to them.
pub fn generate(samples: usize, seed: u64) -> Result<SampleData> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(samples);
    let mut labels: Vec<Label> = Vec::with_capacity(samples);

    for _ in 0..samples {
        let fake = rng.gen_bool(0.5);
        let mut row: Vec<f64> = vec![
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..10.0),
            rng.gen_range(0.0..180.0),
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..500.0),
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
        ];
        if fake {
            row[0] *= 0.7;
            row[1] *= 0.5;
            row[3] += rng.gen_range(0.2..0.4);
            row[5] += rng.gen_range(0.1..0.3);
            row[6] += rng.gen_range(50.0..150.0);
        } else {
            row[0] = (row[0] + 0.2).min(1.0);
            row[1] = (row[1] + 2.0).clamp(0.0, 10.0);
            row[3] *= 0.5;
            row[5] *= 0.4;
        }
        features.push(row);
        labels.push(Label::from(fake));
    }

    let dataset = Dataset::new(features, labels)?;
    let model = fit_logistic(&dataset);
    Ok(SampleData {
        table: LabeledTable {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            dataset,
        },
        model,
    })
}

/// Batch gradient descent on standardized features, folded back to raw scale.
fn fit_logistic(data: &Dataset) -> LogisticModel {
    let width = data.width();
    let n = data.len().max(1) as f64;

    let (means, scales): (Vec<f64>, Vec<f64>) = (0..width)
        .map(|j| {
            let column = data.column(j).unwrap_or_default();
            let mean = column.iter().sum::<f64>() / n;
            let var = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            let sd = var.sqrt();
            (mean, if sd > 0.0 { sd } else { 1.0 })
        })
        .unzip();

    let standardized: Vec<Vec<f64>> = data
        .features()
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(j, x)| (x - means[j]) / scales[j])
                .collect()
        })
        .collect();

    let mut weights = vec![0.0; width];
    let mut bias = 0.0;
    for _ in 0..FIT_EPOCHS {
        let mut grad_w = vec![0.0; width];
        let mut grad_b = 0.0;
        for (row, label) in standardized.iter().zip(data.labels()) {
            let z = bias + row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>();
            let error = 1.0 / (1.0 + (-z).exp()) - *label as f64;
            for (g, x) in grad_w.iter_mut().zip(row) {
                *g += error * x;
            }
            grad_b += error;
        }
        for (w, g) in weights.iter_mut().zip(&grad_w) {
            *w -= LEARNING_RATE * g / n;
        }
        bias -= LEARNING_RATE * grad_b / n;
    }

    let raw_weights: Vec<f64> = weights.iter().zip(&scales).map(|(w, s)| w / s).collect();
    let raw_bias = bias
        - weights
            .iter()
            .zip(means.iter().zip(&scales))
            .map(|(w, (m, s))| w * m / s)
            .sum::<f64>();
    LogisticModel::new(raw_weights, raw_bias)
}

/// Write `deepfake_dataset.csv` and `deepfake_model.json` into `dir`.
pub fn write_sample(dir: &Path, sample: &SampleData) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let dataset_path = dir.join("deepfake_dataset.csv");
    let model_path = dir.join("deepfake_model.json");

    write_csv(&dataset_path, &sample.table, "label")?;
    let json = serde_json::to_string_pretty(&sample.model).context("serialize model")?;
    std::fs::write(&model_path, json)
        .with_context(|| format!("Failed to write model: {:?}", model_path))?;
    Ok((dataset_path, model_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aicert_core::Model;

    #[test]
    fn test_generation_is_seeded() {
        let a = generate(50, 7).unwrap();
        let b = generate(50, 7).unwrap();
        assert_eq!(a.table.dataset, b.table.dataset);
        assert_eq!(a.model, b.model);
        assert_eq!(a.table.dataset.width(), 10);
    }

    #[test]
    fn test_fitted_model_separates_classes() {
        let sample = generate(600, 42).unwrap();
        let data = &sample.table.dataset;
        let predictions = sample.model.predict(data.features()).unwrap();
        let correct = predictions
            .iter()
            .zip(data.labels())
            .filter(|(p, l)| p == l)
            .count();
        assert!(correct as f64 / data.len() as f64 > 0.85);
    }

    #[test]
    fn test_write_sample_files() {
        let dir = tempfile::tempdir().unwrap();
        let sample = generate(20, 1).unwrap();
        let (csv, json) = write_sample(dir.path(), &sample).unwrap();
        let header = std::fs::read_to_string(csv).unwrap();
        assert!(header.starts_with("facial_landmark_consistency,"));
        let model = LogisticModel::from_json(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(model.width(), 10);
    }
}
