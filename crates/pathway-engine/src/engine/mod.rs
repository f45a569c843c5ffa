//! Eligibility and scoring engine.
//!
//! Data flows one way: raw profile, benchmark levels, factor scores, composite score and
//! eligibility verdicts, ranked pathway matches. Nothing here performs I/O or keeps state
//! between calls, so one engine can be shared freely across threads.

pub mod catalog;
pub mod composite;
pub mod domain;
pub mod eligibility;
pub mod export;
pub mod factors;
pub mod language;
pub mod matcher;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, CatalogWarning, Pathway, PathwayCatalog};
pub use composite::{BreakdownEntry, ScoreBreakdown, WeightTable};
pub use domain::{
    AdaptabilityFactors, Category, EducationLevel, EducationRecord, FactorScore, FactorScores,
    JobOffer, LanguageTestResult, MaritalStatus, Profile, Reason, Skill, SkillScores,
    StandardizedProficiency, TestType, WorkExperience,
};
pub use eligibility::{
    AdaptabilityFlag, CriteriaBreakdown, CriteriaTally, CriterionOutcome, CriterionRule,
    CriterionType, EligibilityCriterion, EligibilityResult, EligibilityStatus, LanguageSlot,
};
pub use factors::ScoringTables;
pub use language::{normalize, BandBoundary, ScoringError, StandardizedLanguages};
pub use matcher::{MatchPolicy, MatchReport, MatchResult};

use eligibility::{EligibilityEvaluator, EvaluationContext};
use factors::FactorScorers;
use language::LanguageNormalizer;
use matcher::PathwayMatcher;

use crate::config::EngineConfig;

/// Facade wiring the normalizer, factor scorers, evaluator, and matcher around one set of
/// immutable tables.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    normalizer: LanguageNormalizer,
    scorers: FactorScorers,
    matcher: PathwayMatcher,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(&ScoringTables::default(), MatchPolicy::default())
    }
}

impl ScoringEngine {
    pub fn new(tables: &ScoringTables, policy: MatchPolicy) -> Self {
        let scorers = FactorScorers::from_tables(tables);
        let evaluator = EligibilityEvaluator::new(scorers.work.clone());
        Self {
            normalizer: LanguageNormalizer::new(tables.banding.clone()),
            scorers,
            matcher: PathwayMatcher::new(evaluator, policy),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.tables, config.matching)
    }

    pub fn policy(&self) -> &MatchPolicy {
        self.matcher.policy()
    }

    pub fn normalize(&self, test: TestType, skill: Skill, raw: f64) -> Result<u8, ScoringError> {
        self.normalizer.normalize(test, skill, raw)
    }

    pub fn standardize(&self, profile: &Profile) -> Result<StandardizedLanguages, ScoringError> {
        self.normalizer.standardize_profile(profile)
    }

    /// Factor sub-scores for every category. Fails only on out-of-range language scores.
    pub fn score_factors(&self, profile: &Profile) -> Result<FactorScores, ScoringError> {
        let languages = self.standardize(profile)?;
        Ok(self.scorers.score_profile(profile, &languages))
    }

    pub fn composite(&self, profile: &Profile, weights: &WeightTable) -> Result<f64, ScoringError> {
        let factors = self.score_factors(profile)?;
        Ok(composite::compute(&factors, weights))
    }

    pub fn evaluate(
        &self,
        profile: &Profile,
        criteria: &[EligibilityCriterion],
    ) -> Result<EligibilityResult, ScoringError> {
        let languages = self.standardize(profile)?;
        let factors = self.scorers.score_profile(profile, &languages);
        let context = EvaluationContext {
            profile,
            languages: &languages,
            factors: &factors,
        };
        Ok(self.matcher.evaluator().evaluate(&context, criteria))
    }

    /// Match a profile against every pathway, in catalog order.
    pub fn match_pathways(
        &self,
        profile: &Profile,
        pathways: &[Pathway],
    ) -> Result<MatchReport, ScoringError> {
        let languages = self.standardize(profile)?;
        let factors = self.scorers.score_profile(profile, &languages);
        Ok(self.match_with_factors(profile, &languages, &factors, pathways))
    }

    /// Match using caller-supplied factor scores, e.g. scores merged from an assessment.
    pub fn match_with_factors(
        &self,
        profile: &Profile,
        languages: &StandardizedLanguages,
        factors: &FactorScores,
        pathways: &[Pathway],
    ) -> MatchReport {
        let context = EvaluationContext {
            profile,
            languages,
            factors,
        };
        self.matcher.match_all(&context, pathways)
    }
}
