use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::questions::ScoredResponse;
use crate::engine::{Category, FactorScore, FactorScores};

/// Per-category sums and their unweighted mean.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateScores {
    pub category_scores: BTreeMap<String, f64>,
    /// Highest attainable sum per category, from each response's `max_score`.
    pub category_max: BTreeMap<String, f64>,
    pub overall_score: f64,
}

impl AggregateScores {
    /// Share of the attainable points, as a percentage. `None` when nothing was attainable.
    pub fn category_percentage(&self, category: &str) -> Option<f64> {
        let max = self.category_max.get(category).copied().unwrap_or(0.0);
        if max <= 0.0 {
            return None;
        }
        let score = self.category_scores.get(category).copied().unwrap_or(0.0);
        Some((score / max * 100.0).clamp(0.0, 100.0))
    }

    /// Categories whose tags name a scoring category and have a known maximum.
    pub fn factor_scores(&self) -> FactorScores {
        self.category_scores
            .iter()
            .filter_map(|(tag, score)| {
                let category = Category::from_tag(tag)?;
                let max = self.category_max.get(tag).copied().unwrap_or(0.0);
                (max > 0.0).then(|| (category, FactorScore::new(*score, max)))
            })
            .collect()
    }
}

/// Sum scores per category tag and average the sums. Empty input yields zeros.
pub fn aggregate(responses: &[ScoredResponse]) -> AggregateScores {
    let mut category_scores: BTreeMap<String, f64> = BTreeMap::new();
    let mut category_max: BTreeMap<String, f64> = BTreeMap::new();

    for response in responses {
        *category_scores.entry(response.category.clone()).or_default() += response.score;
        *category_max.entry(response.category.clone()).or_default() += response.max_score;
    }

    let overall_score = if category_scores.is_empty() {
        0.0
    } else {
        category_scores.values().sum::<f64>() / category_scores.len() as f64
    };

    AggregateScores {
        category_scores,
        category_max,
        overall_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::ResponseValue;

    fn response(question: &str, category: &str, score: f64, max_score: f64) -> ScoredResponse {
        ScoredResponse {
            question_id: question.to_string(),
            category: category.to_string(),
            raw_response: ResponseValue::Number(score),
            score,
            max_score,
        }
    }

    #[test]
    fn sums_per_category_and_averages_unweighted() {
        let scores = aggregate(&[
            response("q1", "education", 8.0, 10.0),
            response("q2", "education", 2.0, 10.0),
            response("q3", "language", 10.0, 10.0),
        ]);
        assert_eq!(scores.category_scores["education"], 10.0);
        assert_eq!(scores.category_scores["language"], 10.0);
        assert_eq!(scores.overall_score, 10.0);
        assert_eq!(scores.category_percentage("education"), Some(50.0));
    }

    #[test]
    fn no_responses_yield_zero_scores() {
        let scores = aggregate(&[]);
        assert!(scores.category_scores.is_empty());
        assert_eq!(scores.overall_score, 0.0);
        assert_eq!(scores.category_percentage("education"), None);
    }

    #[test]
    fn only_known_tags_with_maximums_become_factor_scores() {
        let scores = aggregate(&[
            response("q1", "Work Experience", 6.0, 12.0),
            response("q2", "finances", 5.0, 5.0),
            response("q3", "language", 3.0, 0.0),
        ]);
        let factors = scores.factor_scores();
        assert_eq!(factors.len(), 1);
        assert_eq!(
            factors.get(&Category::WorkExperience),
            Some(&FactorScore::new(6.0, 12.0))
        );
    }
}
