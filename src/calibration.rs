//! Offline threshold calibration from labelled embeddings.
//!
//! Every pair of embeddings sharing an identity contributes a genuine score,
//! every cross-identity pair an impostor score. A sweep then reports how each
//! candidate threshold would have classified those pairs.

use crate::vector::IdentityId;
use ndarray::Array1;
use serde::Serialize;

pub const DEFAULT_CANDIDATES: [f32; 5] = [0.45, 0.50, 0.55, 0.60, 0.65];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSets {
    pub genuine: Vec<f32>,
    pub impostor: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f32,
    pub min: f32,
    pub max: f32,
}

impl ScoreSummary {
    pub fn of(scores: &[f32]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let sum: f32 = scores.iter().sum();
        Some(Self {
            count: scores.len(),
            mean: sum / scores.len() as f32,
            min: scores.iter().copied().fold(f32::INFINITY, f32::min),
            max: scores.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        })
    }
}

impl ScoreSets {
    pub fn genuine_summary(&self) -> Option<ScoreSummary> {
        ScoreSummary::of(&self.genuine)
    }

    pub fn impostor_summary(&self) -> Option<ScoreSummary> {
        ScoreSummary::of(&self.impostor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdReport {
    pub threshold: f32,
    pub accuracy: f32,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub genuine_total: usize,
    pub impostor_total: usize,
}

impl ThresholdReport {
    pub fn false_positive_rate(&self) -> f32 {
        ratio(self.false_positives, self.impostor_total)
    }

    pub fn false_negative_rate(&self) -> f32 {
        ratio(self.false_negatives, self.genuine_total)
    }
}

fn ratio(part: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 / total as f32
    }
}

/// Pairwise dot products over `samples`, split by whether both sides share an identity.
pub fn collect_scores(samples: &[(IdentityId, Array1<f32>)]) -> ScoreSets {
    let mut sets = ScoreSets::default();
    for (i, (id_a, a)) in samples.iter().enumerate() {
        for (id_b, b) in &samples[i + 1..] {
            let score = a.dot(b);
            if id_a == id_b {
                sets.genuine.push(score);
            } else {
                sets.impostor.push(score);
            }
        }
    }
    sets
}

/// Classify every score against each candidate threshold (`score >= threshold` accepts).
pub fn sweep_thresholds(scores: &ScoreSets, thresholds: &[f32]) -> Vec<ThresholdReport> {
    let total = scores.genuine.len() + scores.impostor.len();
    thresholds
        .iter()
        .map(|&threshold| {
            let true_positives = scores.genuine.iter().filter(|s| **s >= threshold).count();
            let true_negatives = scores.impostor.iter().filter(|s| **s < threshold).count();
            ThresholdReport {
                threshold,
                accuracy: ratio(true_positives + true_negatives, total),
                false_positives: scores.impostor.len() - true_negatives,
                false_negatives: scores.genuine.len() - true_positives,
                genuine_total: scores.genuine.len(),
                impostor_total: scores.impostor.len(),
            }
        })
        .collect()
}

/// Most accurate report; ties go to fewer false positives, then the lower threshold.
pub fn best_threshold(reports: &[ThresholdReport]) -> Option<&ThresholdReport> {
    reports.iter().max_by(|a, b| {
        a.accuracy
            .total_cmp(&b.accuracy)
            .then(b.false_positives.cmp(&a.false_positives))
            .then(b.threshold.total_cmp(&a.threshold))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{generate_unit_vectors, vector_with_similarity};

    #[test]
    fn test_collect_scores_splits_pairs() {
        let base = generate_unit_vectors(32, 2);
        let alice_2 = vector_with_similarity(&base[0], 0.9);
        let samples = vec![
            (IdentityId::from("alice"), base[0].clone()),
            (IdentityId::from("alice"), alice_2),
            (IdentityId::from("bob"), base[1].clone()),
        ];

        let sets = collect_scores(&samples);
        assert_eq!(sets.genuine.len(), 1);
        assert_eq!(sets.impostor.len(), 2);
        assert!((sets.genuine[0] - 0.9).abs() < 1e-4);
        assert_eq!(sets.genuine_summary().unwrap().count, 1);
        assert_eq!(sets.impostor_summary().unwrap().count, 2);
    }

    #[test]
    fn test_sweep_counts_errors() {
        let scores = ScoreSets {
            genuine: vec![0.7, 0.6, 0.5],
            impostor: vec![0.2, 0.52, 0.3],
        };
        let reports = sweep_thresholds(&scores, &DEFAULT_CANDIDATES);
        assert_eq!(reports.len(), 5);

        let at_055 = reports.iter().find(|r| r.threshold == 0.55).unwrap();
        assert_eq!(at_055.false_negatives, 1);
        assert_eq!(at_055.false_positives, 0);
        assert!((at_055.accuracy - 5.0 / 6.0).abs() < 1e-6);

        assert!((at_055.false_negative_rate() - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(at_055.false_positive_rate(), 0.0);

        let at_045 = &reports[0];
        assert_eq!(at_045.false_positives, 1);
        assert_eq!(at_045.false_negatives, 0);
        assert!((at_045.false_positive_rate() - 1.0 / 3.0).abs() < 1e-6);

        let best = best_threshold(&reports).unwrap();
        assert_eq!(best.threshold, 0.55);
    }

    #[test]
    fn test_rates_with_no_pairs_are_zero() {
        let reports = sweep_thresholds(&ScoreSets::default(), &[0.5]);
        assert_eq!(reports[0].false_positive_rate(), 0.0);
        assert_eq!(reports[0].false_negative_rate(), 0.0);
        assert!(ScoreSets::default().genuine_summary().is_none());
    }

    #[test]
    fn test_summary_of_empty_is_none() {
        assert!(ScoreSummary::of(&[]).is_none());
        let summary = ScoreSummary::of(&[0.2, 0.4]).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.min, 0.2);
        assert_eq!(summary.max, 0.4);
    }
}
