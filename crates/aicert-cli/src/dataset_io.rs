//! CSV dataset loading and writing.
//!
//! The first line is a header. One column holds the integer label; every
//! other column is a numeric feature. `nan` and `inf` cells are accepted so
//! the data-quality check can see them.

use std::io::Read;
use std::path::Path;

use aicert_core::{Dataset, Label};
use anyhow::{bail, Context, Result};
use csv::StringRecord;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A parsed CSV: feature column names in file order plus the dataset.
#[derive(Debug, Clone)]
pub struct LabeledTable {
    pub feature_names: Vec<String>,
    pub dataset: Dataset,
}

pub fn load_csv(path: &Path, label_column: &str) -> Result<LabeledTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to read dataset: {:?}", path))?;
    read_table(file, label_column).with_context(|| format!("Invalid dataset: {:?}", path))
}

pub fn parse_csv(text: &str, label_column: &str) -> Result<LabeledTable> {
    read_table(text.as_bytes(), label_column)
}

fn read_table<R: Read>(input: R, label_column: &str) -> Result<LabeledTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let columns: Vec<String> = reader
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();
    if columns.is_empty() {
        bail!("dataset is empty");
    }
    let label_idx = columns
        .iter()
        .position(|c| c == label_column)
        .with_context(|| format!("label column '{}' not found in header", label_column))?;
    if columns.len() < 2 {
        bail!("dataset needs at least one feature column besides '{}'", label_column);
    }

    let feature_names = columns
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != label_idx)
        .map(|(_, c)| c.clone())
        .collect();

    let mut features: Vec<Vec<f64>> = Vec::new();
    let mut labels: Vec<Label> = Vec::new();
    let mut record = StringRecord::new();
    loop {
        let more = reader
            .read_record(&mut record)
            .with_context(|| format!("CSV parse error after row {}", labels.len()))?;
        if !more {
            break;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != columns.len() {
            bail!(
                "line {}: expected {} cells, found {}",
                line,
                columns.len(),
                record.len()
            );
        }
        let mut row = Vec::with_capacity(columns.len() - 1);
        for (i, cell) in record.iter().enumerate() {
            if i == label_idx {
                labels.push(parse_label(cell).with_context(|| format!("line {}", line))?);
            } else {
                let value: f64 = cell.parse().with_context(|| {
                    format!("line {}: '{}' in column '{}' is not numeric", line, cell, columns[i])
                })?;
                row.push(value);
            }
        }
        features.push(row);
    }

    Ok(LabeledTable {
        feature_names,
        dataset: Dataset::new(features, labels)?,
    })
}

/// Integer labels; integral floats such as `1.0` are accepted too.
fn parse_label(cell: &str) -> Result<Label> {
    if let Ok(label) = cell.parse::<Label>() {
        return Ok(label);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as Label),
        _ => bail!("label '{}' is not an integer", cell),
    }
}

/// Write features in column order with the label as the last column.
pub fn write_csv(path: &Path, table: &LabeledTable, label_column: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to write dataset: {:?}", path))?;

    let header = table
        .feature_names
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(label_column));
    writer.write_record(header).context("Failed to write CSV header")?;

    for (row, label) in table.dataset.features().iter().zip(table.dataset.labels()) {
        let cells = row
            .iter()
            .map(f64::to_string)
            .chain(std::iter::once(label.to_string()));
        writer.write_record(cells).context("Failed to write CSV row")?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write dataset: {:?}", path))
}

/// Seeded shuffle, then keep `fraction` of the rows as the evaluation split.
pub fn holdout(dataset: &Dataset, fraction: f64, seed: u64) -> Result<Dataset> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        bail!("holdout fraction {} must be within (0, 1]", fraction);
    }
    let mut indices: Vec<usize> = (0..dataset.len()).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let shuffled = dataset.subset(&indices);
    let (_, tail) = shuffled.split_tail(fraction);
    Ok(tail)
}
