use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregate::AggregateScores;
use crate::engine::{
    EligibilityStatus, MatchReport, MatchResult, Pathway, Profile, Reason, ScoringEngine,
    ScoringError,
};

/// Category percentage cutoffs used to classify strengths and weaknesses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportThresholds {
    pub strength_percentage: f64,
    pub weakness_percentage: f64,
    /// Guidance entries kept before the closing consultation step.
    pub max_next_steps: usize,
}

impl Default for ReportThresholds {
    fn default() -> Self {
        Self {
            strength_percentage: 70.0,
            weakness_percentage: 40.0,
            max_next_steps: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub scores: AggregateScores,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub matches: MatchReport,
    /// Id of the best eligible or potentially eligible pathway, if any.
    pub recommended_pathway: Option<String>,
    pub next_steps: Vec<Reason>,
}

/// Build the post-assessment report.
///
/// Assessment categories that name a scoring factor replace the profile-derived score for
/// that factor before matching. Fails only when the profile carries out-of-range language
/// scores.
pub fn build_report(
    engine: &ScoringEngine,
    profile: &Profile,
    scores: &AggregateScores,
    pathways: &[Pathway],
    thresholds: &ReportThresholds,
) -> Result<AssessmentReport, ScoringError> {
    let languages = engine.standardize(profile)?;
    let mut factors = engine.score_factors(profile)?;
    factors.extend(scores.factor_scores());

    let matches = engine.match_with_factors(profile, &languages, &factors, pathways);

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    for category in scores.category_scores.keys() {
        let Some(percentage) = scores.category_percentage(category) else {
            continue;
        };
        if percentage >= thresholds.strength_percentage {
            strengths.push(category.clone());
        } else if percentage < thresholds.weakness_percentage {
            weaknesses.push(category.clone());
        }
    }

    let top = matches.top_viable();
    let recommended_pathway = top.map(|result| result.pathway_id.clone());
    let next_steps = next_steps(top, &weaknesses, thresholds.max_next_steps);

    debug!(
        recommended = recommended_pathway.as_deref().unwrap_or("none"),
        strengths = strengths.len(),
        weaknesses = weaknesses.len(),
        "built assessment report"
    );

    Ok(AssessmentReport {
        scores: scores.clone(),
        strengths,
        weaknesses,
        matches,
        recommended_pathway,
        next_steps,
    })
}

fn next_steps(top: Option<&MatchResult>, weaknesses: &[String], limit: usize) -> Vec<Reason> {
    let mut steps = Vec::new();
    match top {
        Some(result) if result.eligibility.status == EligibilityStatus::Eligible => {
            steps.push(
                Reason::new("next_steps.prepare_application").with("pathway", &result.pathway_id),
            );
            steps.push(
                Reason::new("next_steps.gather_documents").with("pathway", &result.pathway_id),
            );
        }
        Some(result) => {
            steps.push(
                Reason::new("next_steps.strengthen_profile").with("pathway", &result.pathway_id),
            );
            for criterion in &result.eligibility.breakdown.optional.failed {
                steps.push(
                    Reason::new("next_steps.address_criterion")
                        .with("pathway", &result.pathway_id)
                        .with("criterion", criterion),
                );
            }
        }
        None => steps.push(Reason::new("next_steps.explore_alternatives")),
    }

    for category in weaknesses {
        steps.push(Reason::new("next_steps.improve_category").with("category", category));
    }

    steps.truncate(limit);
    steps.push(Reason::new("next_steps.book_consultation"));
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{aggregate, ResponseValue, ScoredResponse};
    use crate::engine::{
        Category, CriterionRule, CriterionType, EligibilityCriterion, EducationLevel,
        EducationRecord,
    };

    fn response(question: &str, category: &str, score: f64, max_score: f64) -> ScoredResponse {
        ScoredResponse {
            question_id: question.to_string(),
            category: category.to_string(),
            raw_response: ResponseValue::Number(score),
            score,
            max_score,
        }
    }

    fn education_pathway(required_level: EducationLevel, criterion_type: CriterionType) -> Pathway {
        Pathway {
            id: "skilled".to_string(),
            name: "Skilled Worker".to_string(),
            category: "economic".to_string(),
            criteria: vec![EligibilityCriterion {
                name: "education".to_string(),
                description: String::new(),
                criterion_type,
                points: 10,
                rule: CriterionRule::MinEducation {
                    level: required_level,
                },
            }],
            weights: [(Category::Education, 1.0), (Category::Adaptability, 1.0)]
                .into_iter()
                .collect(),
        }
    }

    fn graduate() -> Profile {
        Profile {
            education: vec![EducationRecord {
                level: EducationLevel::Masters,
                field: String::new(),
                country: "CA".to_string(),
                has_credential_equivalency: false,
            }],
            ..Profile::default()
        }
    }

    #[test]
    fn classifies_categories_and_recommends_eligible_pathway() {
        let scores = aggregate(&[
            response("q1", "education", 9.0, 10.0),
            response("q2", "finances", 1.0, 10.0),
            response("q3", "language", 5.0, 10.0),
        ]);
        let report = build_report(
            &ScoringEngine::default(),
            &graduate(),
            &scores,
            &[education_pathway(EducationLevel::Bachelors, CriterionType::Required)],
            &ReportThresholds::default(),
        )
        .expect("report builds");

        assert_eq!(report.strengths, vec!["education".to_string()]);
        assert_eq!(report.weaknesses, vec!["finances".to_string()]);
        assert_eq!(report.recommended_pathway.as_deref(), Some("skilled"));

        let keys: Vec<&str> = report.next_steps.iter().map(|step| step.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "next_steps.prepare_application",
                "next_steps.gather_documents",
                "next_steps.improve_category",
                "next_steps.book_consultation",
            ]
        );
    }

    #[test]
    fn assessment_scores_override_profile_factors() {
        let pathway = education_pathway(EducationLevel::Bachelors, CriterionType::Required);
        let engine = ScoringEngine::default();
        let scores = aggregate(&[response("q1", "education", 2.0, 10.0)]);

        let report = build_report(
            &engine,
            &graduate(),
            &scores,
            std::slice::from_ref(&pathway),
            &ReportThresholds::default(),
        )
        .expect("report builds");
        let entry = report
            .matches
            .get("skilled")
            .and_then(|result| result.breakdown.get(Category::Education))
            .copied()
            .expect("education entry");
        assert_eq!(entry.score, 2.0);
        assert_eq!(entry.max_score, 10.0);
    }

    #[test]
    fn no_viable_pathway_suggests_alternatives() {
        let report = build_report(
            &ScoringEngine::default(),
            &Profile::default(),
            &AggregateScores::default(),
            &[education_pathway(EducationLevel::Doctoral, CriterionType::Required)],
            &ReportThresholds::default(),
        )
        .expect("report builds");

        assert!(report.recommended_pathway.is_none());
        assert_eq!(report.next_steps[0].key, "next_steps.explore_alternatives");
        assert_eq!(
            report.next_steps.last().map(|step| step.key.as_str()),
            Some("next_steps.book_consultation")
        );
    }

    #[test]
    fn potentially_eligible_lists_missing_optional_criteria() {
        let report = build_report(
            &ScoringEngine::default(),
            &Profile::default(),
            &AggregateScores::default(),
            &[education_pathway(EducationLevel::Bachelors, CriterionType::Optional)],
            &ReportThresholds {
                max_next_steps: 1,
                ..ReportThresholds::default()
            },
        )
        .expect("report builds");

        assert_eq!(report.recommended_pathway.as_deref(), Some("skilled"));
        let keys: Vec<&str> = report.next_steps.iter().map(|step| step.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["next_steps.strengthen_profile", "next_steps.book_consultation"]
        );
    }
}
