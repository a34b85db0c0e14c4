//! Rule-based estimator selection.
//!
//! The rules look only at missingness statistics. They are a heuristic, not
//! a validated model selection, and the recommendations say so.

use crate::config::ImputationMethod;
use crate::types::{MissingDataPattern, PatternKind};

/// Fields at or below this count may use central tendency.
const FEW_FIELDS: usize = 2;

/// Missing percentage below which central tendency is sufficient.
const LOW_MISSING_PERCENTAGE: f64 = 10.0;

/// Missing percentage above which a field is heavily incomplete.
const HIGH_MISSING_PERCENTAGE: f64 = 30.0;

/// Pick an estimator from the diagnosed patterns.
///
/// Rules are evaluated in order; the first match wins.
pub fn suggest_method(patterns: &[MissingDataPattern]) -> ImputationMethod {
    if patterns.is_empty() {
        return ImputationMethod::None;
    }

    if patterns.len() <= FEW_FIELDS
        && patterns
            .iter()
            .all(|p| p.missing_percentage < LOW_MISSING_PERCENTAGE)
    {
        return ImputationMethod::MeanMedian;
    }

    if patterns.iter().any(|p| !p.correlated_with.is_empty()) {
        return ImputationMethod::RandomForest;
    }

    if patterns
        .iter()
        .any(|p| p.missing_percentage > HIGH_MISSING_PERCENTAGE)
    {
        return ImputationMethod::NeuralNetwork;
    }

    ImputationMethod::Mice
}

/// Human-readable notes for the diagnosed patterns and chosen method.
pub fn recommendations(patterns: &[MissingDataPattern], method: &ImputationMethod) -> Vec<String> {
    let mut notes = Vec::new();

    for pattern in patterns {
        match pattern.pattern {
            PatternKind::Correlated => notes.push(format!(
                "Field '{}' is missing together with {}; consider a multivariate method",
                pattern.field,
                pattern.correlated_with.join(", ")
            )),
            PatternKind::Systematic => notes.push(format!(
                "Field '{}' looks systematically missing ({} predictor(s)); check its collection",
                pattern.field,
                pattern.predictors.len()
            )),
            PatternKind::Random => {}
        }

        if pattern.missing_percentage > HIGH_MISSING_PERCENTAGE {
            notes.push(format!(
                "Field '{}' is {:.1}% missing; imputed values will dominate it",
                pattern.field, pattern.missing_percentage
            ));
        }
    }

    notes.push(method_rationale(method).to_string());

    if !patterns.is_empty() {
        notes.push(
            "Method selection is a heuristic over missingness statistics, not a model comparison"
                .to_string(),
        );
    }

    notes
}

fn method_rationale(method: &ImputationMethod) -> &'static str {
    match method {
        ImputationMethod::None => "No missing data found; no imputation needed",
        ImputationMethod::MeanMedian => {
            "Few fields with little missing data: median/mode imputation is sufficient"
        }
        ImputationMethod::RandomForest => {
            "Missingness is correlated across fields: ensemble stumps can use related fields"
        }
        ImputationMethod::NeuralNetwork => {
            "Heavily incomplete fields: similarity-weighted matrix estimation is suggested"
        }
        ImputationMethod::Mice => {
            "Several fields with moderate missing data: chained equations are suggested"
        }
        ImputationMethod::Knn => "Nearest-neighbour imputation selected",
        ImputationMethod::Regression => "Linear regression imputation selected",
        ImputationMethod::Auto | ImputationMethod::Unrecognized(_) => {
            "Method will be chosen automatically"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(field: &str, pct: f64, correlated: bool) -> MissingDataPattern {
        MissingDataPattern {
            field: field.to_string(),
            missing_count: 1,
            missing_percentage: pct,
            pattern: if correlated {
                PatternKind::Correlated
            } else {
                PatternKind::Random
            },
            correlated_with: if correlated {
                vec!["other".to_string()]
            } else {
                Vec::new()
            },
            predictors: vec!["p1".to_string(), "p2".to_string()],
            confidence: 0.8,
        }
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(suggest_method(&[]), ImputationMethod::None);
        assert_eq!(
            suggest_method(&[pattern("a", 5.0, false), pattern("b", 9.9, false)]),
            ImputationMethod::MeanMedian
        );
        // Correlation wins over high missingness.
        assert_eq!(
            suggest_method(&[pattern("a", 40.0, false), pattern("b", 20.0, true)]),
            ImputationMethod::RandomForest
        );
        assert_eq!(
            suggest_method(&[pattern("a", 40.0, false), pattern("b", 20.0, false)]),
            ImputationMethod::NeuralNetwork
        );
        assert_eq!(
            suggest_method(&[
                pattern("a", 5.0, false),
                pattern("b", 5.0, false),
                pattern("c", 5.0, false)
            ]),
            ImputationMethod::Mice
        );
    }

    #[test]
    fn test_recommendations() {
        let patterns = vec![pattern("a", 45.0, true), pattern("b", 5.0, false)];
        let notes = recommendations(&patterns, &ImputationMethod::RandomForest);

        assert!(notes.iter().any(|n| n.contains("'a' is missing together with other")));
        assert!(notes.iter().any(|n| n.contains("45.0% missing")));
        assert!(!notes.iter().any(|n| n.contains("'b'")));
        assert!(notes.iter().any(|n| n.contains("heuristic")));
    }

    #[test]
    fn test_recommendations_complete_data() {
        let notes = recommendations(&[], &ImputationMethod::None);
        assert_eq!(notes, vec!["No missing data found; no imputation needed".to_string()]);
    }
}
