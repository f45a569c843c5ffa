use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::catalog::{CatalogError, CatalogWarning, Pathway};
use super::composite::{self, ScoreBreakdown};
use super::domain::Reason;
use super::eligibility::{
    EligibilityEvaluator, EligibilityResult, EligibilityStatus, EvaluationContext,
};

/// Dials for turning a composite score and eligibility status into a match percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    pub composite_weight: f64,
    pub eligibility_weight: f64,
    /// Share of the eligibility component credited to potentially eligible pathways.
    pub potentially_eligible_credit: f64,
    /// Upper bound on the match percentage of a not-eligible pathway.
    pub not_eligible_ceiling: f64,
    pub strong_factor_ratio: f64,
    pub weak_factor_ratio: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            composite_weight: 0.7,
            eligibility_weight: 0.3,
            potentially_eligible_credit: 0.5,
            not_eligible_ceiling: 35.0,
            strong_factor_ratio: 0.75,
            weak_factor_ratio: 0.4,
        }
    }
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Blend of composite score and eligibility credit, rounded to one decimal. Bonus criteria
/// only reach this value through the eligibility status, which they cannot change.
pub fn match_percentage(policy: &MatchPolicy, composite: f64, status: EligibilityStatus) -> f64 {
    let credit = match status {
        EligibilityStatus::Eligible => 1.0,
        EligibilityStatus::PotentiallyEligible => policy.potentially_eligible_credit.clamp(0.0, 1.0),
        EligibilityStatus::NotEligible => 0.0,
    };
    let composite = if composite.is_finite() {
        composite.clamp(0.0, 100.0)
    } else {
        0.0
    };

    let composite_weight = sanitize_weight(policy.composite_weight);
    let eligibility_weight = sanitize_weight(policy.eligibility_weight);
    let total = composite_weight + eligibility_weight;
    let blended = if total > 0.0 {
        (composite_weight * composite + eligibility_weight * credit * 100.0) / total
    } else {
        composite
    };

    let bounded = blended.clamp(0.0, 100.0);
    let capped = if status == EligibilityStatus::NotEligible {
        bounded.min(policy.not_eligible_ceiling.clamp(0.0, 100.0))
    } else {
        bounded
    };
    round_tenth(capped)
}

/// Outcome of matching one profile against one pathway. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub pathway_id: String,
    pub pathway_name: String,
    pub pathway_category: String,
    pub composite_score: f64,
    pub match_percentage: f64,
    pub eligibility: EligibilityResult,
    pub breakdown: ScoreBreakdown,
    pub reasons: Vec<Reason>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// One entry per valid pathway, in catalog order.
    pub results: Vec<MatchResult>,
    pub warnings: Vec<CatalogWarning>,
}

fn status_rank(status: EligibilityStatus) -> u8 {
    match status {
        EligibilityStatus::Eligible => 0,
        EligibilityStatus::PotentiallyEligible => 1,
        EligibilityStatus::NotEligible => 2,
    }
}

/// Ordering used by `MatchReport::ranked`: best match first.
pub fn compare_results(left: &MatchResult, right: &MatchResult) -> Ordering {
    right
        .match_percentage
        .total_cmp(&left.match_percentage)
        .then_with(|| status_rank(left.eligibility.status).cmp(&status_rank(right.eligibility.status)))
        .then_with(|| right.composite_score.total_cmp(&left.composite_score))
        .then_with(|| left.pathway_id.cmp(&right.pathway_id))
}

impl MatchReport {
    pub fn ranked(&self) -> Vec<&MatchResult> {
        let mut ranked: Vec<&MatchResult> = self.results.iter().collect();
        ranked.sort_by(|left, right| compare_results(left, right));
        ranked
    }

    /// Highest ranked pathway that is eligible or potentially eligible.
    pub fn top_viable(&self) -> Option<&MatchResult> {
        self.ranked()
            .into_iter()
            .find(|result| result.eligibility.status != EligibilityStatus::NotEligible)
    }

    pub fn get(&self, pathway_id: &str) -> Option<&MatchResult> {
        self.results
            .iter()
            .find(|result| result.pathway_id == pathway_id)
    }
}

#[derive(Debug, Clone)]
pub struct PathwayMatcher {
    evaluator: EligibilityEvaluator,
    policy: MatchPolicy,
}

impl PathwayMatcher {
    pub fn new(evaluator: EligibilityEvaluator, policy: MatchPolicy) -> Self {
        Self { evaluator, policy }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    pub fn evaluator(&self) -> &EligibilityEvaluator {
        &self.evaluator
    }

    /// Match every pathway. Invalid entries are skipped with a warning instead of failing
    /// the whole run.
    pub fn match_all(&self, context: &EvaluationContext<'_>, pathways: &[Pathway]) -> MatchReport {
        let mut report = MatchReport::default();
        for pathway in pathways {
            match self.match_one(context, pathway) {
                Ok(result) => report.results.push(result),
                Err(error) => {
                    warn!(pathway = %pathway.id, %error, "excluding pathway from match results");
                    let id = Some(pathway.id.clone()).filter(|id| !id.trim().is_empty());
                    report.warnings.push(CatalogWarning::from_error(id, &error));
                }
            }
        }
        report
    }

    pub fn match_one(
        &self,
        context: &EvaluationContext<'_>,
        pathway: &Pathway,
    ) -> Result<MatchResult, CatalogError> {
        pathway.validate()?;

        let composite_score = composite::compute(context.factors, &pathway.weights);
        let breakdown = ScoreBreakdown::build(context.factors, &pathway.weights);
        let eligibility = self.evaluator.evaluate(context, &pathway.criteria);
        let match_percentage = match_percentage(&self.policy, composite_score, eligibility.status);
        let reasons = self.reasons(&eligibility, &breakdown);

        debug!(
            pathway = %pathway.id,
            composite_score,
            match_percentage,
            status = eligibility.status.label(),
            "evaluated pathway"
        );

        Ok(MatchResult {
            pathway_id: pathway.id.clone(),
            pathway_name: pathway.name.clone(),
            pathway_category: pathway.category.clone(),
            composite_score,
            match_percentage,
            eligibility,
            breakdown,
            reasons,
        })
    }

    /// Status first, then blocking criteria in declared order, then factor highlights by
    /// descending weight.
    fn reasons(&self, eligibility: &EligibilityResult, breakdown: &ScoreBreakdown) -> Vec<Reason> {
        let mut reasons = vec![Reason::new(format!(
            "match.status.{}",
            eligibility.status.label()
        ))];
        reasons.extend(eligibility.reasons.iter().cloned());

        let mut weighted: Vec<_> = breakdown.entries.iter().collect();
        weighted.sort_by(|left, right| right.1.weight.total_cmp(&left.1.weight));

        for (category, entry) in weighted {
            if entry.weight <= 0.0 {
                continue;
            }
            let ratio = if entry.max_score > 0.0 {
                entry.score / entry.max_score
            } else {
                0.0
            };
            let key = if ratio >= self.policy.strong_factor_ratio {
                "match.factor.strength"
            } else if ratio < self.policy.weak_factor_ratio {
                "match.factor.gap"
            } else {
                continue;
            };
            reasons.push(
                Reason::new(key)
                    .with("category", category)
                    .with("percent", format!("{:.0}", ratio * 100.0)),
            );
        }

        if eligibility.status == EligibilityStatus::NotEligible {
            reasons.push(
                Reason::new("match.capped")
                    .with("ceiling", format!("{:.0}", self.policy.not_eligible_ceiling)),
            );
        }

        reasons
    }
}
