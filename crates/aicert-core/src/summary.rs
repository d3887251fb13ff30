//! Weighted aggregation of check records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::runner::CheckRecord;

/// Passed and total counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub passed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    /// `passed / total`, 0 when there are no records.
    pub pass_rate: f64,
    /// `Σ(score·weight) / Σ(weight)`, 0 when there are no records.
    pub weighted_score: f64,
    pub category_breakdown: BTreeMap<String, CategoryStats>,
}

/// Aggregate records into a summary.
///
/// The weighted sum is accumulated in a canonical order, so the result is
/// bit-identical for any permutation of `records`.
pub fn summarize(records: &[CheckRecord]) -> Summary {
    let total_tests = records.len();
    let passed_tests = records.iter().filter(|r| r.passed).count();

    let mut terms: Vec<(f64, f64)> = records.iter().map(|r| (r.score, r.weight)).collect();
    terms.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    let (weighted_sum, total_weight) = terms
        .iter()
        .fold((0.0, 0.0), |(sum, weight), (s, w)| (sum + s * w, weight + w));

    let weighted_score = if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    };
    let pass_rate = if total_tests > 0 {
        passed_tests as f64 / total_tests as f64
    } else {
        0.0
    };

    let mut category_breakdown: BTreeMap<String, CategoryStats> = BTreeMap::new();
    for r in records {
        let stats = category_breakdown.entry(r.category.clone()).or_default();
        stats.total += 1;
        if r.passed {
            stats.passed += 1;
        }
    }

    Summary {
        total_tests,
        passed_tests,
        failed_tests: total_tests - passed_tests,
        pass_rate,
        weighted_score,
        category_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Details;

    fn record(category: &str, weight: f64, passed: bool, score: f64) -> CheckRecord {
        CheckRecord {
            name: format!("{}-{}", category, weight),
            category: category.to_string(),
            weight,
            passed,
            score,
            details: Details::new(),
        }
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let s = summarize(&[]);
        assert_eq!(s.total_tests, 0);
        assert_eq!(s.pass_rate, 0.0);
        assert_eq!(s.weighted_score, 0.0);
        assert!(s.category_breakdown.is_empty());
    }

    #[test]
    fn test_weighted_score_and_breakdown() {
        let records = vec![
            record("Performance", 2.0, true, 100.0),
            record("Security", 3.0, false, 50.0),
            record("Security", 1.0, true, 90.0),
        ];
        let s = summarize(&records);
        // (200 + 150 + 90) / 6
        assert!((s.weighted_score - 440.0 / 6.0).abs() < 1e-9);
        assert_eq!(s.passed_tests, 2);
        assert_eq!(s.failed_tests, 1);
        assert!((s.pass_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(
            s.category_breakdown["Security"],
            CategoryStats { passed: 1, total: 2 }
        );
        let keys: Vec<&String> = s.category_breakdown.keys().collect();
        assert_eq!(keys, vec!["Performance", "Security"]);
    }

    #[test]
    fn test_order_invariance_is_exact() {
        let records = vec![
            record("A", 2.0, true, 100.0 / 3.0),
            record("B", 3.0, true, 70.588_235_294),
            record("C", 2.5, false, 0.1),
            record("D", 1.5, true, 99.999),
        ];
        let forward = summarize(&records);
        let mut reversed = records.clone();
        reversed.reverse();
        let backward = summarize(&reversed);
        assert_eq!(
            forward.weighted_score.to_bits(),
            backward.weighted_score.to_bits()
        );
    }
}
