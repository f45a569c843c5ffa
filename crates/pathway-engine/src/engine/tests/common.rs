use crate::engine::{
    Category, CriterionRule, CriterionType, EducationLevel, EducationRecord, EligibilityCriterion,
    LanguageTestResult, Pathway, Profile, SkillScores, TestType, WorkExperience,
};

pub(super) fn criterion(
    name: &str,
    criterion_type: CriterionType,
    points: u32,
    rule: CriterionRule,
) -> EligibilityCriterion {
    EligibilityCriterion {
        name: name.to_string(),
        description: String::new(),
        criterion_type,
        points,
        rule,
    }
}

pub(super) fn clb(language: &str, level: f64) -> LanguageTestResult {
    LanguageTestResult {
        language: language.to_string(),
        test: TestType::Clb,
        scores: SkillScores::uniform(level),
    }
}

pub(super) fn masters_domestic() -> EducationRecord {
    EducationRecord {
        level: EducationLevel::Masters,
        field: "Computer Science".to_string(),
        country: "CA".to_string(),
        has_credential_equivalency: false,
    }
}

pub(super) fn foreign_job(months: u32) -> WorkExperience {
    WorkExperience {
        occupation_code: "21231".to_string(),
        country: "IN".to_string(),
        is_domestic: false,
        duration_months: months,
        hours_per_week: 40,
    }
}

/// Age 29, domestic masters, benchmark 9 in English, three years of foreign work.
pub(super) fn skilled_profile() -> Profile {
    Profile {
        age: Some(29),
        language_proficiency: vec![clb("english", 9.0)],
        education: vec![masters_domestic()],
        work_experience: vec![foreign_job(36)],
        ..Profile::default()
    }
}

pub(super) fn skilled_worker_pathway() -> Pathway {
    Pathway {
        id: "skilled-worker".to_string(),
        name: "Skilled Worker".to_string(),
        category: "economic".to_string(),
        criteria: vec![
            criterion(
                "Adult applicant",
                CriterionType::Required,
                10,
                CriterionRule::MinAge { years: 18 },
            ),
            criterion(
                "Language benchmark 7",
                CriterionType::Required,
                20,
                CriterionRule::MinLanguageBenchmark {
                    level: 7,
                    slot: Default::default(),
                },
            ),
            criterion(
                "Provincial nomination",
                CriterionType::Bonus,
                50,
                CriterionRule::HasNomination,
            ),
        ],
        weights: [
            (Category::Age, 25.0),
            (Category::Education, 25.0),
            (Category::Language, 30.0),
            (Category::WorkExperience, 20.0),
        ]
        .into_iter()
        .collect(),
    }
}

pub(super) fn trades_pathway() -> Pathway {
    Pathway {
        id: "skilled-trades".to_string(),
        name: "Skilled Trades".to_string(),
        category: "economic".to_string(),
        criteria: vec![
            criterion(
                "Secondary education",
                CriterionType::Required,
                10,
                CriterionRule::MinEducation {
                    level: EducationLevel::Secondary,
                },
            ),
            criterion(
                "Two years of work",
                CriterionType::Required,
                15,
                CriterionRule::MinWorkExperience {
                    months: 24,
                    domestic_only: false,
                },
            ),
            criterion(
                "Job offer",
                CriterionType::Optional,
                5,
                CriterionRule::HasJobOffer,
            ),
        ],
        weights: [(Category::Education, 1.0), (Category::WorkExperience, 2.0)]
            .into_iter()
            .collect(),
    }
}
