//! End-to-end flow through the public API: catalog and profile JSON in, match results and an
//! assessment report out.

mod common {
    use pathway_engine::assessment::Question;
    use pathway_engine::engine::{PathwayCatalog, Profile};

    pub(super) const CATALOG: &str = r#"[
        {
            "id": "skilled-worker",
            "name": "Skilled Worker",
            "category": "economic",
            "criteria": [
                {"name": "Adult applicant", "type": "required", "points": 10,
                 "rule": {"kind": "min_age", "years": 18}},
                {"name": "Language benchmark 7", "type": "required", "points": 20,
                 "rule": {"kind": "min_language_benchmark", "level": 7}},
                {"name": "Nomination", "type": "bonus", "points": 50,
                 "rule": {"kind": "has_nomination"}}
            ],
            "weights": {"age": 25, "education": 25, "language": 30, "work_experience": 20}
        },
        {
            "id": "skilled-trades",
            "name": "Skilled Trades",
            "category": "economic",
            "criteria": [
                {"name": "Secondary education", "type": "required", "points": 10,
                 "rule": {"kind": "min_education", "level": "secondary"}},
                {"name": "Two years of work", "type": "required", "points": 15,
                 "rule": {"kind": "min_work_experience", "months": 24}}
            ],
            "weights": {"education": 1, "work_experience": 2}
        },
        {
            "id": "unweighted",
            "name": "Missing weights",
            "criteria": [
                {"name": "Adult applicant", "type": "required",
                 "rule": {"kind": "min_age", "years": 18}}
            ]
        }
    ]"#;

    pub(super) const PROFILE: &str = r#"{
        "age": 29,
        "language_proficiency": [
            {"language": "english", "test": "celpip",
             "scores": {"speaking": 9, "listening": 9, "reading": 9, "writing": 9}}
        ],
        "education": [{"level": "masters", "country": "CA"}],
        "work_experience": [
            {"occupation_code": "21231", "country": "IN", "is_domestic": false,
             "duration_months": 36, "hours_per_week": 40}
        ]
    }"#;

    pub(super) const QUESTIONS: &str = r#"[
        {"id": "degree", "category": "education",
         "kind": {"type": "single_choice", "options": [
            {"value": "bachelors", "points": 6}, {"value": "masters", "points": 10}]}},
        {"id": "study-years", "category": "education",
         "kind": {"type": "number", "min": 0, "max": 20,
                  "bands": [{"from": 2, "points": 2}, {"from": 6, "points": 10}]}},
        {"id": "confidence", "category": "language",
         "kind": {"type": "scale", "min": 0, "max": 10}}
    ]"#;

    pub(super) fn catalog() -> PathwayCatalog {
        let (catalog, warnings) =
            PathwayCatalog::from_json_str(CATALOG).expect("catalog is a JSON array");
        assert_eq!(warnings.len(), 1);
        catalog
    }

    pub(super) fn profile() -> Profile {
        serde_json::from_str(PROFILE).expect("profile parses")
    }

    pub(super) fn questions() -> Vec<Question> {
        serde_json::from_str(QUESTIONS).expect("questions parse")
    }
}

use common::*;
use pathway_engine::assessment::{
    aggregate, build_report, is_complete, progress, Assessment, ReportThresholds, ResponseValue,
    ScoredResponse,
};
use pathway_engine::engine::{EligibilityStatus, ScoringEngine};

#[test]
fn catalog_warnings_name_the_skipped_entry() {
    let (catalog, warnings) =
        pathway_engine::engine::PathwayCatalog::from_json_str(CATALOG).expect("valid array");
    assert_eq!(catalog.len(), 2);
    assert_eq!(warnings[0].pathway_id.as_deref(), Some("unweighted"));
}

#[test]
fn strong_profile_matches_catalog_in_order() {
    let engine = ScoringEngine::default();
    let report = engine
        .match_pathways(&profile(), catalog().pathways())
        .expect("valid profile");

    assert_eq!(report.results.len(), 2);
    let skilled = &report.results[0];
    assert_eq!(skilled.pathway_id, "skilled-worker");
    assert_eq!(skilled.eligibility.status, EligibilityStatus::Eligible);
    assert!(skilled.composite_score >= 75.0);

    let trades = &report.results[1];
    assert_eq!(trades.eligibility.status, EligibilityStatus::Eligible);
    assert_eq!(trades.eligibility.points, trades.eligibility.max_points);
}

#[test]
fn weak_language_is_the_only_blocking_reason() {
    let engine = ScoringEngine::default();
    let mut profile = profile();
    profile.language_proficiency[0].scores =
        pathway_engine::engine::SkillScores::uniform(3.0);

    let report = engine
        .match_pathways(&profile, catalog().pathways())
        .expect("valid profile");
    let skilled = report.get("skilled-worker").expect("matched");

    assert_eq!(skilled.eligibility.status, EligibilityStatus::NotEligible);
    assert_eq!(skilled.eligibility.reasons.len(), 1);
    assert_eq!(
        skilled.eligibility.reasons[0].param("criterion"),
        Some("Language benchmark 7")
    );
}

#[test]
fn empty_profile_json_is_scored_not_rejected() {
    let engine = ScoringEngine::default();
    let empty: pathway_engine::engine::Profile =
        serde_json::from_str("{}").expect("empty object parses");
    let report = engine
        .match_pathways(&empty, catalog().pathways())
        .expect("empty profile is valid");

    let trades = report.get("skilled-trades").expect("matched");
    assert_eq!(trades.eligibility.status, EligibilityStatus::NotEligible);
    assert_eq!(trades.eligibility.max_points, 25);
    assert_eq!(trades.composite_score, 0.0);
}

#[test]
fn aggregator_sums_categories_and_averages_them() {
    let response = |category: &str, score: f64| ScoredResponse {
        question_id: format!("{category}-{score}"),
        category: category.to_string(),
        raw_response: ResponseValue::Number(score),
        score,
        max_score: 10.0,
    };
    let scores = aggregate(&[
        response("education", 8.0),
        response("education", 2.0),
        response("language", 10.0),
    ]);

    assert_eq!(scores.category_scores.len(), 2);
    assert_eq!(scores.category_scores["education"], 10.0);
    assert_eq!(scores.category_scores["language"], 10.0);
    assert_eq!(scores.overall_score, 10.0);
}

#[test]
fn completed_assessment_produces_a_recommendation_report() {
    let questions = questions();
    let mut assessment = Assessment::new("intake-1", questions.len()).expect("has steps");

    let answers = [
        ("degree", ResponseValue::SingleChoice("masters".to_string())),
        ("study-years", ResponseValue::Number(7.0)),
        ("confidence", ResponseValue::Scale(2)),
    ];
    let mut completed = None;
    for (question_id, value) in answers {
        completed = assessment
            .answer_by_id(&questions, question_id, value)
            .expect("valid answer");
    }
    let scores = completed.expect("last answer completes the assessment");
    assert!(is_complete(&assessment));
    assert_eq!(progress(&assessment), 100.0);
    assert_eq!(scores.category_scores["education"], 20.0);

    let report = build_report(
        &ScoringEngine::default(),
        &profile(),
        &scores,
        catalog().pathways(),
        &ReportThresholds::default(),
    )
    .expect("report builds");

    assert_eq!(report.strengths, vec!["education".to_string()]);
    assert_eq!(report.weaknesses, vec!["language".to_string()]);
    assert!(report.recommended_pathway.is_some());
    assert_eq!(
        report.next_steps.first().map(|step| step.key.as_str()),
        Some("next_steps.prepare_application")
    );

    let json = serde_json::to_value(&report).expect("report serializes");
    assert!(json["matches"]["results"].is_array());
}
