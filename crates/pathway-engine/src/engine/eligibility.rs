//! Criteria model and the rule evaluator that turns a pathway's criteria into a verdict.

use serde::{Deserialize, Serialize};

use super::domain::{
    Category, EducationLevel, FactorScores, MaritalStatus, Profile, Reason,
    StandardizedProficiency,
};
use super::factors::WorkExperienceScorer;
use super::language::StandardizedLanguages;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionType {
    Required,
    Optional,
    Bonus,
}

impl CriterionType {
    pub const fn label(self) -> &'static str {
        match self {
            CriterionType::Required => "required",
            CriterionType::Optional => "optional",
            CriterionType::Bonus => "bonus",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageSlot {
    #[default]
    First,
    Second,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptabilityFlag {
    RelativesInCountry,
    SpouseEducationInCountry,
    PriorDomesticWork,
    PriorDomesticStudy,
}

impl AdaptabilityFlag {
    pub const fn label(self) -> &'static str {
        match self {
            AdaptabilityFlag::RelativesInCountry => "relatives_in_country",
            AdaptabilityFlag::SpouseEducationInCountry => "spouse_education_in_country",
            AdaptabilityFlag::PriorDomesticWork => "prior_domestic_work",
            AdaptabilityFlag::PriorDomesticStudy => "prior_domestic_study",
        }
    }
}

/// Predicate evaluated against a full profile snapshot. Criteria that depend on one another
/// are expressed as a single compound rule so evaluation stays order independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CriterionRule {
    MinAge {
        years: u32,
    },
    MaxAge {
        years: u32,
    },
    MinLanguageBenchmark {
        level: u8,
        #[serde(default)]
        slot: LanguageSlot,
    },
    MinEducation {
        level: EducationLevel,
    },
    MinWorkExperience {
        months: u32,
        #[serde(default)]
        domestic_only: bool,
    },
    HasNomination,
    HasJobOffer,
    Adaptability {
        flag: AdaptabilityFlag,
    },
    MaritalStatus {
        allowed: Vec<MaritalStatus>,
    },
    /// Share of a factor's maximum (0.0-1.0) the profile must reach.
    MinFactorScore {
        category: Category,
        ratio: f64,
    },
    AllOf {
        rules: Vec<CriterionRule>,
    },
    AnyOf {
        rules: Vec<CriterionRule>,
    },
}

impl CriterionRule {
    /// True when a compound rule, at any depth, has no children.
    pub fn has_empty_compound(&self) -> bool {
        match self {
            CriterionRule::AllOf { rules } | CriterionRule::AnyOf { rules } => {
                rules.is_empty() || rules.iter().any(CriterionRule::has_empty_compound)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityCriterion {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub criterion_type: CriterionType,
    #[serde(default)]
    pub points: u32,
    pub rule: CriterionRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    Eligible,
    PotentiallyEligible,
    NotEligible,
}

impl EligibilityStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EligibilityStatus::Eligible => "eligible",
            EligibilityStatus::PotentiallyEligible => "potentially_eligible",
            EligibilityStatus::NotEligible => "not_eligible",
        }
    }
}

/// Passed and failed criterion names for one criterion type, in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaTally {
    pub passed: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaBreakdown {
    pub required: CriteriaTally,
    pub optional: CriteriaTally,
    pub bonus: CriteriaTally,
}

impl CriteriaBreakdown {
    pub fn tally(&self, criterion_type: CriterionType) -> &CriteriaTally {
        match criterion_type {
            CriterionType::Required => &self.required,
            CriterionType::Optional => &self.optional,
            CriterionType::Bonus => &self.bonus,
        }
    }

    fn tally_mut(&mut self, criterion_type: CriterionType) -> &mut CriteriaTally {
        match criterion_type {
            CriterionType::Required => &mut self.required,
            CriterionType::Optional => &mut self.optional,
            CriterionType::Bonus => &mut self.bonus,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionOutcome {
    pub name: String,
    pub criterion_type: CriterionType,
    pub passed: bool,
    pub points: u32,
    pub detail: Reason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub status: EligibilityStatus,
    pub points: u32,
    pub max_points: u32,
    pub breakdown: CriteriaBreakdown,
    pub outcomes: Vec<CriterionOutcome>,
    /// One entry per failed required or optional criterion, in declared order.
    pub reasons: Vec<Reason>,
}

impl EligibilityResult {
    pub fn bonus_points(&self) -> u32 {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.passed && outcome.criterion_type == CriterionType::Bonus)
            .map(|outcome| outcome.points)
            .fold(0u32, u32::saturating_add)
    }
}

/// Everything a rule may look at. Built once per profile and shared across pathways.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub profile: &'a Profile,
    pub languages: &'a StandardizedLanguages,
    pub factors: &'a FactorScores,
}

struct RuleCheck {
    passed: bool,
    detail: Reason,
}

impl RuleCheck {
    fn new(passed: bool, detail: Reason) -> Self {
        Self { passed, detail }
    }
}

fn describe<T: ToString>(value: Option<T>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Stateless evaluator applying criteria lists to profile snapshots.
#[derive(Debug, Clone)]
pub struct EligibilityEvaluator {
    work: WorkExperienceScorer,
}

impl EligibilityEvaluator {
    pub fn new(work: WorkExperienceScorer) -> Self {
        Self { work }
    }

    pub fn evaluate(
        &self,
        context: &EvaluationContext<'_>,
        criteria: &[EligibilityCriterion],
    ) -> EligibilityResult {
        let mut breakdown = CriteriaBreakdown::default();
        let mut outcomes = Vec::with_capacity(criteria.len());
        let mut reasons = Vec::new();
        let mut points = 0u32;
        let mut max_points = 0u32;

        for criterion in criteria {
            let check = self.check(context, &criterion.rule);
            max_points = max_points.saturating_add(criterion.points);

            let tally = breakdown.tally_mut(criterion.criterion_type);
            if check.passed {
                points = points.saturating_add(criterion.points);
                tally.passed.push(criterion.name.clone());
            } else {
                tally.failed.push(criterion.name.clone());
                if criterion.criterion_type != CriterionType::Bonus {
                    let mut reason = check.detail.clone();
                    reason
                        .params
                        .insert("criterion".to_string(), criterion.name.clone());
                    reason.params.insert(
                        "type".to_string(),
                        criterion.criterion_type.label().to_string(),
                    );
                    reasons.push(reason);
                }
            }

            outcomes.push(CriterionOutcome {
                name: criterion.name.clone(),
                criterion_type: criterion.criterion_type,
                passed: check.passed,
                points: criterion.points,
                detail: check.detail,
            });
        }

        EligibilityResult {
            status: aggregate_status(&breakdown),
            points,
            max_points,
            breakdown,
            outcomes,
            reasons,
        }
    }

    fn check(&self, context: &EvaluationContext<'_>, rule: &CriterionRule) -> RuleCheck {
        let profile = context.profile;
        match rule {
            CriterionRule::MinAge { years } => RuleCheck::new(
                profile.age.is_some_and(|age| age >= *years),
                Reason::new("eligibility.age.below_minimum")
                    .with("required", years)
                    .with("actual", describe(profile.age)),
            ),
            CriterionRule::MaxAge { years } => RuleCheck::new(
                profile.age.is_some_and(|age| age <= *years),
                Reason::new("eligibility.age.above_maximum")
                    .with("required", years)
                    .with("actual", describe(profile.age)),
            ),
            CriterionRule::MinLanguageBenchmark { level, slot } => {
                let proficiency: Option<&StandardizedProficiency> = match slot {
                    LanguageSlot::First => context.languages.first.as_ref(),
                    LanguageSlot::Second => context.languages.second.as_ref(),
                };
                let actual = proficiency.map(StandardizedProficiency::min_level);
                RuleCheck::new(
                    actual.is_some_and(|actual| actual >= *level),
                    Reason::new("eligibility.language.below_benchmark")
                        .with("slot", slot_label(*slot))
                        .with("required", level)
                        .with("actual", describe(actual)),
                )
            }
            CriterionRule::MinEducation { level } => {
                let actual = profile.highest_education().map(|record| record.level);
                RuleCheck::new(
                    actual.is_some_and(|actual| actual >= *level),
                    Reason::new("eligibility.education.below_minimum")
                        .with("required", level.label())
                        .with("actual", describe(actual.map(EducationLevel::label))),
                )
            }
            CriterionRule::MinWorkExperience {
                months,
                domestic_only,
            } => {
                let actual = self
                    .work
                    .qualifying_months(&profile.work_experience, *domestic_only);
                RuleCheck::new(
                    actual >= *months,
                    Reason::new("eligibility.work.insufficient_experience")
                        .with("required_months", months)
                        .with("actual_months", actual)
                        .with("domestic_only", domestic_only),
                )
            }
            CriterionRule::HasNomination => RuleCheck::new(
                profile.has_nomination,
                Reason::new("eligibility.nomination.missing"),
            ),
            CriterionRule::HasJobOffer => RuleCheck::new(
                profile.has_job_offer(),
                Reason::new("eligibility.job_offer.missing"),
            ),
            CriterionRule::Adaptability { flag } => {
                let flags = &profile.adaptability;
                let present = match flag {
                    AdaptabilityFlag::RelativesInCountry => flags.relatives_in_country,
                    AdaptabilityFlag::SpouseEducationInCountry => flags.spouse_education_in_country,
                    AdaptabilityFlag::PriorDomesticWork => flags.prior_domestic_work,
                    AdaptabilityFlag::PriorDomesticStudy => flags.prior_domestic_study,
                };
                RuleCheck::new(
                    present,
                    Reason::new("eligibility.adaptability.missing").with("flag", flag.label()),
                )
            }
            CriterionRule::MaritalStatus { allowed } => RuleCheck::new(
                profile
                    .marital_status
                    .is_some_and(|status| allowed.contains(&status)),
                Reason::new("eligibility.marital_status.not_allowed"),
            ),
            CriterionRule::MinFactorScore { category, ratio } => {
                let actual = context
                    .factors
                    .get(category)
                    .map(|score| score.ratio())
                    .unwrap_or(0.0);
                RuleCheck::new(
                    actual >= *ratio,
                    Reason::new("eligibility.factor.below_minimum")
                        .with("category", category)
                        .with("required_percent", format!("{:.0}", ratio * 100.0))
                        .with("actual_percent", format!("{:.0}", actual * 100.0)),
                )
            }
            CriterionRule::AllOf { rules } => {
                let checks: Vec<RuleCheck> =
                    rules.iter().map(|rule| self.check(context, rule)).collect();
                match checks.into_iter().find(|check| !check.passed) {
                    Some(failed) => failed,
                    None => RuleCheck::new(true, Reason::new("eligibility.compound.all_of")),
                }
            }
            CriterionRule::AnyOf { rules } => {
                let passed = rules
                    .iter()
                    .filter(|rule| self.check(context, rule).passed)
                    .count();
                RuleCheck::new(
                    passed > 0,
                    Reason::new("eligibility.compound.none_satisfied")
                        .with("alternatives", rules.len()),
                )
            }
        }
    }
}

fn slot_label(slot: LanguageSlot) -> &'static str {
    match slot {
        LanguageSlot::First => "first",
        LanguageSlot::Second => "second",
    }
}

/// Bonus criteria never influence the status.
pub fn aggregate_status(breakdown: &CriteriaBreakdown) -> EligibilityStatus {
    if !breakdown.required.failed.is_empty() {
        EligibilityStatus::NotEligible
    } else if breakdown.optional.failed.is_empty() {
        EligibilityStatus::Eligible
    } else {
        EligibilityStatus::PotentiallyEligible
    }
}
