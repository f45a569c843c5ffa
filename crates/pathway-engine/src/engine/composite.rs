use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Category, FactorScore, FactorScores};

/// Pathway-specific category weights.
pub type WeightTable = BTreeMap<Category, f64>;

fn usable(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0
}

/// Weighted 0-100 score over the categories named in `weights`.
///
/// Categories absent from `weights` are ignored; weighted categories with no factor score
/// contribute nothing to the numerator but still count in the denominator.
pub fn compute(factors: &FactorScores, weights: &WeightTable) -> f64 {
    let (numerator, denominator) = weights
        .iter()
        .filter(|(_, weight)| usable(**weight))
        .fold((0.0, 0.0), |(numerator, denominator), (category, weight)| {
            let ratio = factors
                .get(category)
                .map(FactorScore::ratio)
                .unwrap_or(0.0);
            (numerator + ratio * weight, denominator + weight)
        });

    if denominator > 0.0 {
        (100.0 * numerator / denominator).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub score: f64,
    pub max_score: f64,
    pub weight: f64,
}

/// Per-category scores for every category a pathway weighs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub entries: BTreeMap<Category, BreakdownEntry>,
}

impl ScoreBreakdown {
    pub fn build(factors: &FactorScores, weights: &WeightTable) -> Self {
        let entries = weights
            .iter()
            .map(|(category, weight)| {
                let factor = factors.get(category).copied().unwrap_or_default();
                (
                    *category,
                    BreakdownEntry {
                        score: factor.value,
                        max_score: factor.max,
                        weight: *weight,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, category: Category) -> Option<&BreakdownEntry> {
        self.entries.get(&category)
    }
}
