//! Confidence heuristics shared by the estimators and the diagnostician.
//!
//! Every constant here is a tuning knob, not a derived quantity. Keeping them
//! in one place lets them be adjusted and tested without touching estimator
//! logic.

/// Central tendency ignores every other field, so its fills are weak.
pub const CENTRAL_TENDENCY: f64 = 0.6;

/// Lowest confidence a regression fill can carry, reached when R² ≤ 0.4.
pub const REGRESSION_FLOOR: f64 = 0.4;

/// Lowest confidence a KNN fill can carry, reached when the nearest donor is
/// at distance ≥ 0.5.
pub const KNN_FLOOR: f64 = 0.5;

/// Confidence of an ensemble fill when no stump found a useful split.
pub const FOREST_BASE: f64 = 0.5;

/// Confidence added when every stump found a useful split.
pub const FOREST_SPAN: f64 = 0.4;

/// Lowest confidence a similarity-weighted fill can carry.
pub const SIMILARITY_FLOOR: f64 = 0.5;

/// Similarity assigned to a donor sharing no present field with the target row.
pub const NEUTRAL_SIMILARITY: f64 = 0.5;

/// Diagnosis confidence of a field with no predictors.
pub const DIAGNOSIS_FLOOR: f64 = 0.3;

/// Highest diagnosis confidence.
pub const DIAGNOSIS_CEILING: f64 = 0.9;

/// Consistency score of a result whose fills all have zero confidence.
pub const CONSISTENCY_BASE: f64 = 80.0;

/// Consistency added by perfectly confident fills.
pub const CONSISTENCY_SPAN: f64 = 20.0;

/// Clamp a confidence into `[0, 1]`; NaN becomes 0.
pub fn clamp(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// `max(0.4, R²)`.
pub fn regression(r_squared: f64) -> f64 {
    clamp(r_squared.max(REGRESSION_FLOOR))
}

/// `max(0.5, 1 - nearest_distance)`.
pub fn knn(nearest_distance: f64) -> f64 {
    clamp((1.0 - nearest_distance).max(KNN_FLOOR))
}

/// Scales with the fraction of stumps that found a split.
pub fn forest(split_stumps: usize, trees: usize) -> f64 {
    if trees == 0 {
        return FOREST_BASE;
    }
    clamp(FOREST_BASE + FOREST_SPAN * split_stumps as f64 / trees as f64)
}

/// `max(0.5, mean similarity of the contributing donors)`.
pub fn similarity(mean_similarity: f64) -> f64 {
    clamp(mean_similarity.max(SIMILARITY_FLOOR))
}

/// `min(0.9, predictors / total_fields × 2)`; 0.3 when there are no predictors.
pub fn diagnosis(predictors: usize, total_fields: usize) -> f64 {
    if predictors == 0 || total_fields == 0 {
        return DIAGNOSIS_FLOOR;
    }
    let raw = predictors as f64 / total_fields as f64 * 2.0;
    clamp(raw.min(DIAGNOSIS_CEILING))
}
