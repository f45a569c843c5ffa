//! Conversion of raw language test scores into benchmark levels (0-10).

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{LanguageTestResult, Profile, Skill, StandardizedProficiency, TestType};

/// Highest benchmark level produced by the normalizer.
pub const MAX_BENCHMARK: u8 = 10;

const STEP_TOLERANCE: f64 = 1e-9;

/// Raised when a raw score falls outside the valid domain of its test.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("{test} {skill} score {score} is outside the valid range {min}..={max} (step {step})")]
    InvalidScoreRange {
        test: TestType,
        skill: Skill,
        score: f64,
        min: f64,
        max: f64,
        step: f64,
    },
}

/// How a raw score sitting exactly on a cutoff is banded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandBoundary {
    /// A score equal to the cutoff earns the higher level.
    #[default]
    Inclusive,
    /// A score must exceed the cutoff to earn the higher level.
    Exclusive,
}

impl BandBoundary {
    fn passes(self, raw: f64, cutoff: f64) -> bool {
        match self {
            BandBoundary::Inclusive => raw >= cutoff,
            BandBoundary::Exclusive => raw > cutoff,
        }
    }
}

/// Minimum raw score for benchmark levels 1, 2, 3, ... per skill, ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledBanding {
    pub speaking: Vec<f64>,
    pub listening: Vec<f64>,
    pub reading: Vec<f64>,
    pub writing: Vec<f64>,
}

impl ScaledBanding {
    pub fn cutoffs(&self, skill: Skill) -> &[f64] {
        match skill {
            Skill::Speaking => &self.speaking,
            Skill::Listening => &self.listening,
            Skill::Reading => &self.reading,
            Skill::Writing => &self.writing,
        }
    }

    /// Cutoffs must be strictly ascending and yield at most `MAX_BENCHMARK` levels.
    pub fn is_monotonic(&self) -> bool {
        Skill::ALL.iter().all(|skill| {
            let cutoffs = self.cutoffs(*skill);
            cutoffs.len() <= MAX_BENCHMARK as usize
                && cutoffs.iter().all(|cutoff| cutoff.is_finite())
                && cutoffs.windows(2).all(|pair| pair[0] < pair[1])
        })
    }

    fn level_for(&self, skill: Skill, raw: f64, boundary: BandBoundary) -> u8 {
        self.cutoffs(skill)
            .iter()
            .rposition(|cutoff| boundary.passes(raw, *cutoff))
            .map(|index| (index + 1).min(MAX_BENCHMARK as usize) as u8)
            .unwrap_or(0)
    }
}

/// Banding tables for the scaled tests. Fixed at construction; never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandingTables {
    #[serde(default)]
    pub boundary: BandBoundary,
    pub ielts: ScaledBanding,
    pub tef: ScaledBanding,
}

impl Default for BandingTables {
    fn default() -> Self {
        Self {
            boundary: BandBoundary::Inclusive,
            ielts: ScaledBanding {
                speaking: vec![2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.5, 6.0, 6.5, 7.0],
                listening: vec![3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.0, 7.5, 8.0, 8.5],
                reading: vec![2.5, 3.0, 3.5, 4.0, 5.0, 5.5, 6.0, 6.5, 7.0, 8.0],
                writing: vec![2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.5, 6.0, 6.5, 7.0],
            },
            tef: ScaledBanding {
                speaking: vec![46.0, 91.0, 136.0, 181.0, 226.0, 271.0, 310.0, 349.0, 371.0, 393.0],
                listening: vec![37.0, 73.0, 109.0, 145.0, 181.0, 217.0, 249.0, 280.0, 298.0, 316.0],
                reading: vec![31.0, 61.0, 91.0, 121.0, 151.0, 181.0, 207.0, 233.0, 248.0, 263.0],
                writing: vec![46.0, 91.0, 136.0, 181.0, 226.0, 271.0, 310.0, 349.0, 371.0, 393.0],
            },
        }
    }
}

/// Valid raw-score domain for a test and skill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreDomain {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ScoreDomain {
    pub fn for_test(test: TestType, skill: Skill) -> Self {
        match test {
            TestType::Ielts => Self {
                min: 0.0,
                max: 9.0,
                step: 0.5,
            },
            TestType::Celpip => Self {
                min: 0.0,
                max: 12.0,
                step: 1.0,
            },
            TestType::Clb => Self {
                min: 0.0,
                max: MAX_BENCHMARK as f64,
                step: 1.0,
            },
            TestType::Tef => {
                let max = match skill {
                    Skill::Listening => 360.0,
                    Skill::Reading => 300.0,
                    Skill::Speaking | Skill::Writing => 450.0,
                };
                Self {
                    min: 0.0,
                    max,
                    step: 1.0,
                }
            }
        }
    }

    pub fn contains(&self, raw: f64) -> bool {
        if !raw.is_finite() || raw < self.min || raw > self.max {
            return false;
        }
        let steps = (raw - self.min) / self.step;
        (steps - steps.round()).abs() < STEP_TOLERANCE
    }
}

/// Benchmark levels for a profile's first and second official languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardizedLanguages {
    pub first: Option<StandardizedProficiency>,
    pub second: Option<StandardizedProficiency>,
}

#[derive(Debug, Clone, Default)]
pub struct LanguageNormalizer {
    tables: BandingTables,
}

impl LanguageNormalizer {
    pub fn new(tables: BandingTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &BandingTables {
        &self.tables
    }

    pub fn normalize(&self, test: TestType, skill: Skill, raw: f64) -> Result<u8, ScoringError> {
        let domain = ScoreDomain::for_test(test, skill);
        if !domain.contains(raw) {
            return Err(ScoringError::InvalidScoreRange {
                test,
                skill,
                score: raw,
                min: domain.min,
                max: domain.max,
                step: domain.step,
            });
        }

        let level = match test {
            TestType::Clb => raw.round() as u8,
            TestType::Celpip => (raw.round() as u8).min(MAX_BENCHMARK),
            TestType::Ielts => {
                self.tables
                    .ielts
                    .level_for(skill, raw, self.tables.boundary)
            }
            TestType::Tef => self.tables.tef.level_for(skill, raw, self.tables.boundary),
        };

        debug!(%test, %skill, raw, level, "normalized language score");
        Ok(level)
    }

    pub fn standardize(
        &self,
        result: &LanguageTestResult,
    ) -> Result<StandardizedProficiency, ScoringError> {
        Ok(StandardizedProficiency {
            speaking: self.normalize(result.test, Skill::Speaking, result.scores.speaking)?,
            listening: self.normalize(result.test, Skill::Listening, result.scores.listening)?,
            reading: self.normalize(result.test, Skill::Reading, result.scores.reading)?,
            writing: self.normalize(result.test, Skill::Writing, result.scores.writing)?,
        })
    }

    /// The first listed test is the first official language; the second language is the first
    /// later test taken in a different language. Additional tests in the same language are
    /// ignored so nothing is counted twice.
    pub fn standardize_profile(
        &self,
        profile: &Profile,
    ) -> Result<StandardizedLanguages, ScoringError> {
        let mut tests = profile.language_proficiency.iter();
        let Some(first) = tests.next() else {
            return Ok(StandardizedLanguages::default());
        };

        let second = tests.find(|result| !result.language.eq_ignore_ascii_case(&first.language));

        Ok(StandardizedLanguages {
            first: Some(self.standardize(first)?),
            second: second.map(|result| self.standardize(result)).transpose()?,
        })
    }
}

/// Normalize with the default banding tables.
pub fn normalize(test: TestType, skill: Skill, raw: f64) -> Result<u8, ScoringError> {
    LanguageNormalizer::default().normalize(test, skill, raw)
}
