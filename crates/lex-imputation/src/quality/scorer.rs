//! Aggregate statistics and summary metrics for an imputation run.

use super::confidence::{CONSISTENCY_BASE, CONSISTENCY_SPAN, clamp};
use crate::config::ImputationMethod;
use crate::types::{ImputationStatistics, ImputedFieldRecord, QualityMetrics};

/// Scores the audit trail produced by an estimator.
pub struct QualityScorer;

impl QualityScorer {
    /// Build the statistics block for a run.
    ///
    /// `confidence_threshold` only feeds `low_confidence_count`; it never
    /// filters records.
    pub fn statistics(
        records: &[ImputedFieldRecord],
        total_missing: usize,
        remaining_missing: usize,
        confidence_threshold: f64,
    ) -> ImputationStatistics {
        let mut methods_used: Vec<ImputationMethod> = Vec::new();
        for record in records {
            if !methods_used.contains(&record.method) {
                methods_used.push(record.method.clone());
            }
        }

        ImputationStatistics {
            total_missing,
            total_imputed: records.len(),
            remaining_missing,
            methods_used,
            average_confidence: Self::average_confidence(records),
            low_confidence_count: records
                .iter()
                .filter(|r| r.confidence < confidence_threshold)
                .count(),
        }
    }

    /// Mean confidence of the records; 0 when nothing was imputed.
    pub fn average_confidence(records: &[ImputedFieldRecord]) -> f64 {
        if records.is_empty() {
            return 0.0;
        }
        clamp(records.iter().map(|r| r.confidence).sum::<f64>() / records.len() as f64)
    }

    /// Summary metrics on a 0 - 100 scale.
    ///
    /// Completeness is always 100: every fillable cell has been filled.
    /// With nothing imputed there is nothing to distrust, so reliability and
    /// consistency are 100 as well.
    pub fn quality_metrics(statistics: &ImputationStatistics) -> QualityMetrics {
        if statistics.total_imputed == 0 {
            return QualityMetrics {
                completeness: 100.0,
                reliability: 100.0,
                consistency: 100.0,
            };
        }

        let avg = statistics.average_confidence;
        QualityMetrics {
            completeness: 100.0,
            reliability: avg * 100.0,
            consistency: (CONSISTENCY_BASE + avg * CONSISTENCY_SPAN).min(100.0),
        }
    }
}
