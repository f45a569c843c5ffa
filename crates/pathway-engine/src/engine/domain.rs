use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Candidate snapshot consumed by the engine. Every field is optional so partially completed
/// profiles can still be scored mid-assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub age: Option<u32>,
    pub marital_status: Option<MaritalStatus>,
    pub language_proficiency: Vec<LanguageTestResult>,
    pub education: Vec<EducationRecord>,
    pub work_experience: Vec<WorkExperience>,
    pub adaptability: AdaptabilityFactors,
    pub has_nomination: bool,
    pub job_offer: Option<JobOffer>,
}

impl Profile {
    pub fn has_job_offer(&self) -> bool {
        self.job_offer.is_some()
    }

    /// Highest credential on file, if any. Ties go to a record with credential equivalency.
    pub fn highest_education(&self) -> Option<&EducationRecord> {
        self.education
            .iter()
            .max_by_key(|record| (record.level, record.has_credential_equivalency))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
    CommonLaw,
    Separated,
    Divorced,
    Widowed,
}

/// Language tests understood by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    /// 0.0 to 9.0 band scale in half steps.
    Ielts,
    /// 0 to 12 levels aligned with the benchmark scale.
    Celpip,
    /// Per-skill point scales.
    Tef,
    /// Raw benchmark levels.
    Clb,
}

impl TestType {
    pub const fn label(self) -> &'static str {
        match self {
            TestType::Ielts => "ielts",
            TestType::Celpip => "celpip",
            TestType::Tef => "tef",
            TestType::Clb => "clb",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Speaking,
    Listening,
    Reading,
    Writing,
}

impl Skill {
    pub const ALL: [Skill; 4] = [
        Skill::Speaking,
        Skill::Listening,
        Skill::Reading,
        Skill::Writing,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Skill::Speaking => "speaking",
            Skill::Listening => "listening",
            Skill::Reading => "reading",
            Skill::Writing => "writing",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw per-skill scores exactly as printed on the test report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillScores {
    pub speaking: f64,
    pub listening: f64,
    pub reading: f64,
    pub writing: f64,
}

impl SkillScores {
    pub fn uniform(score: f64) -> Self {
        Self {
            speaking: score,
            listening: score,
            reading: score,
            writing: score,
        }
    }

    pub fn get(&self, skill: Skill) -> f64 {
        match skill {
            Skill::Speaking => self.speaking,
            Skill::Listening => self.listening,
            Skill::Reading => self.reading,
            Skill::Writing => self.writing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageTestResult {
    pub language: String,
    pub test: TestType,
    pub scores: SkillScores,
}

/// Benchmark levels (0-10) derived from a single language test result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardizedProficiency {
    pub speaking: u8,
    pub listening: u8,
    pub reading: u8,
    pub writing: u8,
}

impl StandardizedProficiency {
    pub fn uniform(level: u8) -> Self {
        Self {
            speaking: level,
            listening: level,
            reading: level,
            writing: level,
        }
    }

    pub fn level(&self, skill: Skill) -> u8 {
        match skill {
            Skill::Speaking => self.speaking,
            Skill::Listening => self.listening,
            Skill::Reading => self.reading,
            Skill::Writing => self.writing,
        }
    }

    /// Weakest skill, which is what program minimums are checked against.
    pub fn min_level(&self) -> u8 {
        Skill::ALL
            .iter()
            .map(|skill| self.level(*skill))
            .min()
            .unwrap_or(0)
    }
}

/// Credential levels ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    None,
    Secondary,
    OneYearPostSecondary,
    TwoYearPostSecondary,
    Bachelors,
    TwoOrMoreCredentials,
    Masters,
    Doctoral,
}

impl EducationLevel {
    pub const fn label(self) -> &'static str {
        match self {
            EducationLevel::None => "none",
            EducationLevel::Secondary => "secondary",
            EducationLevel::OneYearPostSecondary => "one_year_post_secondary",
            EducationLevel::TwoYearPostSecondary => "two_year_post_secondary",
            EducationLevel::Bachelors => "bachelors",
            EducationLevel::TwoOrMoreCredentials => "two_or_more_credentials",
            EducationLevel::Masters => "masters",
            EducationLevel::Doctoral => "doctoral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    pub level: EducationLevel,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub has_credential_equivalency: bool,
}

/// One distinct job. Callers deduplicate overlapping entries before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub occupation_code: String,
    #[serde(default)]
    pub country: String,
    pub is_domestic: bool,
    pub duration_months: u32,
    pub hours_per_week: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptabilityFactors {
    pub relatives_in_country: bool,
    pub spouse_education_in_country: bool,
    pub prior_domestic_work: bool,
    pub prior_domestic_study: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOffer {
    #[serde(default)]
    pub occupation_code: Option<String>,
    #[serde(default)]
    pub employer: Option<String>,
    #[serde(default)]
    pub is_permanent: bool,
}

/// Scoring dimensions shared by factor scorers, weight tables, and assessment tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Age,
    Education,
    Language,
    WorkExperience,
    Adaptability,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Age,
        Category::Education,
        Category::Language,
        Category::WorkExperience,
        Category::Adaptability,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Category::Age => "age",
            Category::Education => "education",
            Category::Language => "language",
            Category::WorkExperience => "work_experience",
            Category::Adaptability => "adaptability",
        }
    }

    /// Resolve a free-form assessment tag to a scoring category.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "age" => Some(Category::Age),
            "education" => Some(Category::Education),
            "language" | "languages" => Some(Category::Language),
            "work_experience" | "work" | "experience" => Some(Category::WorkExperience),
            "adaptability" => Some(Category::Adaptability),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sub-score produced by a single factor scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub value: f64,
    pub max: f64,
}

impl FactorScore {
    pub fn new(value: f64, max: f64) -> Self {
        let max = if max.is_finite() { max.max(0.0) } else { 0.0 };
        let value = if value.is_finite() {
            value.clamp(0.0, max)
        } else {
            0.0
        };
        Self { value, max }
    }

    pub fn empty(max: f64) -> Self {
        Self::new(0.0, max)
    }

    /// Fraction of the maximum achieved; zero when the maximum is zero.
    pub fn ratio(&self) -> f64 {
        if self.max > 0.0 {
            (self.value / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

pub type FactorScores = BTreeMap<Category, FactorScore>;

/// Human-readable message expressed as a translation key plus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub key: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl Reason {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            return f.write_str(&self.key);
        }
        let params = self
            .params
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} ({})", self.key, params)
    }
}
