//! Independent factor scorers and the immutable point tables that drive them.
//!
//! Each scorer only sees the slice of the profile it is declared over and degrades to a zero
//! sub-score when that slice is missing, so partially completed profiles still score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    AdaptabilityFactors, Category, EducationLevel, EducationRecord, FactorScore, FactorScores,
    Profile, Skill, StandardizedProficiency, WorkExperience,
};
use super::language::{BandingTables, StandardizedLanguages, MAX_BENCHMARK};

/// Every point table used by the engine. Built once and handed to scorers by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTables {
    /// ISO country code treated as domestic for credential and work checks.
    pub domestic_country: String,
    pub banding: BandingTables,
    pub age: AgeTable,
    pub education: EducationTable,
    pub language: LanguageTable,
    pub work: WorkTable,
    pub adaptability: AdaptabilityTable,
}

impl Default for ScoringTables {
    fn default() -> Self {
        Self {
            domestic_country: "CA".to_string(),
            banding: BandingTables::default(),
            age: AgeTable::default(),
            education: EducationTable::default(),
            language: LanguageTable::default(),
            work: WorkTable::default(),
            adaptability: AdaptabilityTable::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBand {
    pub from: u32,
    pub to: u32,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeTable {
    pub minimum_age: u32,
    pub bands: Vec<AgeBand>,
}

impl AgeTable {
    pub fn max_points(&self) -> u32 {
        self.bands.iter().map(|band| band.points).max().unwrap_or(0)
    }

    pub fn points_for(&self, age: u32) -> u32 {
        if age < self.minimum_age {
            return 0;
        }
        self.bands
            .iter()
            .find(|band| (band.from..=band.to).contains(&age))
            .map(|band| band.points)
            .unwrap_or(0)
    }
}

impl Default for AgeTable {
    fn default() -> Self {
        let band = |from, to, points| AgeBand { from, to, points };
        Self {
            minimum_age: 18,
            bands: vec![
                band(18, 18, 99),
                band(19, 19, 105),
                band(20, 29, 110),
                band(30, 30, 105),
                band(31, 31, 99),
                band(32, 32, 94),
                band(33, 33, 88),
                band(34, 34, 83),
                band(35, 35, 77),
                band(36, 36, 72),
                band(37, 37, 66),
                band(38, 38, 61),
                band(39, 39, 55),
                band(40, 40, 50),
                band(41, 41, 39),
                band(42, 42, 28),
                band(43, 43, 17),
                band(44, 44, 6),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationTable {
    pub points: BTreeMap<EducationLevel, u32>,
    /// Added when the highest credential is foreign and has an equivalency assessment.
    pub equivalency_bonus: u32,
}

impl EducationTable {
    pub fn points_for(&self, level: EducationLevel) -> u32 {
        self.points.get(&level).copied().unwrap_or(0)
    }

    pub fn max_points(&self) -> u32 {
        self.points.values().copied().max().unwrap_or(0) + self.equivalency_bonus
    }

    /// Higher credentials never earn fewer points than lower ones.
    pub fn is_monotonic(&self) -> bool {
        let ordered: Vec<u32> = self.points.values().copied().collect();
        ordered.windows(2).all(|pair| pair[0] <= pair[1])
    }
}

impl Default for EducationTable {
    fn default() -> Self {
        let points = BTreeMap::from([
            (EducationLevel::None, 0),
            (EducationLevel::Secondary, 30),
            (EducationLevel::OneYearPostSecondary, 90),
            (EducationLevel::TwoYearPostSecondary, 98),
            (EducationLevel::Bachelors, 120),
            (EducationLevel::TwoOrMoreCredentials, 128),
            (EducationLevel::Masters, 135),
            (EducationLevel::Doctoral, 150),
        ]);
        Self {
            points,
            equivalency_bonus: 10,
        }
    }
}

/// Per-skill points indexed by benchmark level (index 0 is level 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageTable {
    pub first_language: Vec<u32>,
    pub second_language: Vec<u32>,
}

impl LanguageTable {
    fn lookup(table: &[u32], level: u8) -> u32 {
        let index = (level.min(MAX_BENCHMARK) as usize).min(table.len().saturating_sub(1));
        table.get(index).copied().unwrap_or(0)
    }

    fn per_skill_max(table: &[u32]) -> u32 {
        table.iter().copied().max().unwrap_or(0)
    }

    pub fn max_points(&self) -> u32 {
        let skills = Skill::ALL.len() as u32;
        skills * (Self::per_skill_max(&self.first_language) + Self::per_skill_max(&self.second_language))
    }
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self {
            first_language: vec![0, 0, 0, 0, 6, 6, 9, 17, 23, 31, 34],
            second_language: vec![0, 0, 0, 0, 0, 1, 1, 3, 3, 6, 6],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationStep {
    pub min_months: u32,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkTable {
    /// Jobs below this weekly hour count do not qualify.
    pub min_hours_per_week: u32,
    pub domestic: Vec<DurationStep>,
    pub foreign: Vec<DurationStep>,
}

impl WorkTable {
    fn points_for(steps: &[DurationStep], months: u32) -> u32 {
        steps
            .iter()
            .filter(|step| months >= step.min_months)
            .map(|step| step.points)
            .max()
            .unwrap_or(0)
    }

    fn side_max(steps: &[DurationStep]) -> u32 {
        steps.iter().map(|step| step.points).max().unwrap_or(0)
    }

    pub fn max_points(&self) -> u32 {
        Self::side_max(&self.domestic) + Self::side_max(&self.foreign)
    }

    pub fn qualifies(&self, job: &WorkExperience) -> bool {
        job.hours_per_week >= self.min_hours_per_week && job.duration_months > 0
    }
}

impl Default for WorkTable {
    fn default() -> Self {
        let step = |min_months, points| DurationStep { min_months, points };
        Self {
            min_hours_per_week: 30,
            domestic: vec![step(12, 40), step(24, 53), step(36, 64), step(48, 72), step(60, 80)],
            foreign: vec![step(12, 13), step(24, 25), step(36, 50)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptabilityTable {
    pub relatives_in_country: u32,
    pub spouse_education_in_country: u32,
    pub prior_domestic_work: u32,
    pub prior_domestic_study: u32,
    pub nomination: u32,
    pub job_offer: u32,
    pub cap: u32,
}

impl AdaptabilityTable {
    pub fn max_points(&self) -> u32 {
        let uncapped = self.relatives_in_country
            + self.spouse_education_in_country
            + self.prior_domestic_work
            + self.prior_domestic_study
            + self.nomination
            + self.job_offer;
        uncapped.min(self.cap)
    }
}

impl Default for AdaptabilityTable {
    fn default() -> Self {
        Self {
            relatives_in_country: 15,
            spouse_education_in_country: 10,
            prior_domestic_work: 10,
            prior_domestic_study: 15,
            nomination: 50,
            job_offer: 50,
            cap: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgeScorer {
    table: AgeTable,
}

impl AgeScorer {
    pub fn new(table: AgeTable) -> Self {
        Self { table }
    }

    pub fn score(&self, age: Option<u32>) -> FactorScore {
        let max = self.table.max_points() as f64;
        match age {
            Some(age) => FactorScore::new(self.table.points_for(age) as f64, max),
            None => FactorScore::empty(max),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EducationScorer {
    table: EducationTable,
    domestic_country: String,
}

impl EducationScorer {
    pub fn new(table: EducationTable, domestic_country: impl Into<String>) -> Self {
        Self {
            table,
            domestic_country: domestic_country.into(),
        }
    }

    pub fn score(&self, highest: Option<&EducationRecord>) -> FactorScore {
        let max = self.table.max_points() as f64;
        let Some(record) = highest else {
            return FactorScore::empty(max);
        };

        let foreign = !record.country.trim().is_empty()
            && !record.country.trim().eq_ignore_ascii_case(&self.domestic_country);
        let bonus = if foreign && record.has_credential_equivalency {
            self.table.equivalency_bonus
        } else {
            0
        };

        FactorScore::new((self.table.points_for(record.level) + bonus) as f64, max)
    }
}

#[derive(Debug, Clone)]
pub struct LanguageScorer {
    table: LanguageTable,
}

impl LanguageScorer {
    pub fn new(table: LanguageTable) -> Self {
        Self { table }
    }

    pub fn score(
        &self,
        first: Option<&StandardizedProficiency>,
        second: Option<&StandardizedProficiency>,
    ) -> FactorScore {
        let sum = |table: &[u32], proficiency: Option<&StandardizedProficiency>| -> u32 {
            proficiency
                .map(|levels| {
                    Skill::ALL
                        .iter()
                        .map(|skill| LanguageTable::lookup(table, levels.level(*skill)))
                        .sum()
                })
                .unwrap_or(0)
        };

        // Without a first language there is nothing to rank a second one against.
        let second = if first.is_some() { second } else { None };
        let total = sum(&self.table.first_language, first) + sum(&self.table.second_language, second);
        FactorScore::new(total as f64, self.table.max_points() as f64)
    }
}

#[derive(Debug, Clone)]
pub struct WorkExperienceScorer {
    table: WorkTable,
}

impl WorkExperienceScorer {
    pub fn new(table: WorkTable) -> Self {
        Self { table }
    }

    pub fn score(&self, jobs: &[WorkExperience]) -> FactorScore {
        let mut domestic = 0u32;
        let mut foreign = 0u32;

        for job in jobs.iter().filter(|job| self.table.qualifies(job)) {
            if job.is_domestic {
                let points = WorkTable::points_for(&self.table.domestic, job.duration_months);
                domestic = domestic.saturating_add(points);
            } else {
                let points = WorkTable::points_for(&self.table.foreign, job.duration_months);
                foreign = foreign.saturating_add(points);
            }
        }

        let domestic = domestic.min(WorkTable::side_max(&self.table.domestic));
        let foreign = foreign.min(WorkTable::side_max(&self.table.foreign));
        FactorScore::new(domestic.saturating_add(foreign) as f64, self.table.max_points() as f64)
    }

    /// Months of qualifying experience, optionally restricted to domestic jobs.
    pub fn qualifying_months(&self, jobs: &[WorkExperience], domestic_only: bool) -> u32 {
        jobs.iter()
            .filter(|job| self.table.qualifies(job))
            .filter(|job| !domestic_only || job.is_domestic)
            .map(|job| job.duration_months)
            .fold(0u32, u32::saturating_add)
    }
}

#[derive(Debug, Clone)]
pub struct AdaptabilityScorer {
    table: AdaptabilityTable,
}

impl AdaptabilityScorer {
    pub fn new(table: AdaptabilityTable) -> Self {
        Self { table }
    }

    pub fn score(
        &self,
        flags: &AdaptabilityFactors,
        has_nomination: bool,
        has_job_offer: bool,
    ) -> FactorScore {
        let table = &self.table;
        let total: u32 = [
            (flags.relatives_in_country, table.relatives_in_country),
            (flags.spouse_education_in_country, table.spouse_education_in_country),
            (flags.prior_domestic_work, table.prior_domestic_work),
            (flags.prior_domestic_study, table.prior_domestic_study),
            (has_nomination, table.nomination),
            (has_job_offer, table.job_offer),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, points)| *points)
        .sum();

        FactorScore::new(total.min(table.cap) as f64, table.max_points() as f64)
    }
}

/// The full set of scorers, each owning its own table.
#[derive(Debug, Clone)]
pub struct FactorScorers {
    pub age: AgeScorer,
    pub education: EducationScorer,
    pub language: LanguageScorer,
    pub work: WorkExperienceScorer,
    pub adaptability: AdaptabilityScorer,
}

impl FactorScorers {
    pub fn from_tables(tables: &ScoringTables) -> Self {
        Self {
            age: AgeScorer::new(tables.age.clone()),
            education: EducationScorer::new(
                tables.education.clone(),
                tables.domestic_country.clone(),
            ),
            language: LanguageScorer::new(tables.language.clone()),
            work: WorkExperienceScorer::new(tables.work.clone()),
            adaptability: AdaptabilityScorer::new(tables.adaptability),
        }
    }

    /// Score every category. Each scorer is handed only its own slice of the profile.
    pub fn score_profile(&self, profile: &Profile, languages: &StandardizedLanguages) -> FactorScores {
        FactorScores::from([
            (Category::Age, self.age.score(profile.age)),
            (
                Category::Education,
                self.education.score(profile.highest_education()),
            ),
            (
                Category::Language,
                self.language
                    .score(languages.first.as_ref(), languages.second.as_ref()),
            ),
            (
                Category::WorkExperience,
                self.work.score(&profile.work_experience),
            ),
            (
                Category::Adaptability,
                self.adaptability.score(
                    &profile.adaptability,
                    profile.has_nomination,
                    profile.has_job_offer(),
                ),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorers() -> FactorScorers {
        FactorScorers::from_tables(&ScoringTables::default())
    }

    fn job(months: u32, domestic: bool) -> WorkExperience {
        WorkExperience {
            occupation_code: "21231".to_string(),
            country: if domestic { "CA" } else { "IN" }.to_string(),
            is_domestic: domestic,
            duration_months: months,
            hours_per_week: 40,
        }
    }

    #[test]
    fn age_peaks_in_prime_band_and_drops_outside() {
        let scorer = scorers().age;
        assert_eq!(scorer.score(Some(29)), FactorScore::new(110.0, 110.0));
        assert_eq!(scorer.score(Some(20)).value, 110.0);
        assert_eq!(scorer.score(Some(17)).value, 0.0);
        assert_eq!(scorer.score(Some(45)).value, 0.0);
        assert!(scorer.score(Some(35)).value < scorer.score(Some(30)).value);

        let mut previous = f64::MAX;
        for age in 29..=50 {
            let value = scorer.score(Some(age)).value;
            assert!(value <= previous, "points rose at age {age}");
            previous = value;
        }
    }

    #[test]
    fn missing_age_degrades_to_zero_with_table_max() {
        assert_eq!(scorers().age.score(None), FactorScore::new(0.0, 110.0));
    }

    #[test]
    fn education_awards_equivalency_bonus_only_for_foreign_credentials() {
        let scorer = scorers().education;
        let mut record = EducationRecord {
            level: EducationLevel::Masters,
            field: "Engineering".to_string(),
            country: "CA".to_string(),
            has_credential_equivalency: true,
        };
        assert_eq!(scorer.score(Some(&record)).value, 135.0);

        record.country = "FR".to_string();
        assert_eq!(scorer.score(Some(&record)).value, 145.0);

        record.has_credential_equivalency = false;
        assert_eq!(scorer.score(Some(&record)).value, 135.0);
        assert_eq!(scorer.score(None), FactorScore::new(0.0, 160.0));
    }

    #[test]
    fn education_table_is_monotonic() {
        assert!(EducationTable::default().is_monotonic());
    }

    #[test]
    fn language_counts_second_language_only_when_present() {
        let scorer = scorers().language;
        let clb9 = StandardizedProficiency::uniform(9);
        let only_first = scorer.score(Some(&clb9), None);
        assert_eq!(only_first.value, 124.0);
        assert_eq!(only_first.max, 160.0);

        let both = scorer.score(Some(&clb9), Some(&StandardizedProficiency::uniform(7)));
        assert_eq!(both.value, 136.0);

        assert_eq!(scorer.score(None, Some(&clb9)).value, 0.0);
    }

    #[test]
    fn language_points_never_decrease_with_level() {
        let scorer = scorers().language;
        let mut previous = 0.0;
        for level in 0..=MAX_BENCHMARK {
            let value = scorer
                .score(Some(&StandardizedProficiency::uniform(level)), None)
                .value;
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn work_experience_plateaus_after_cutoff() {
        let scorer = scorers().work;
        assert_eq!(scorer.score(&[job(36, false)]).value, 50.0);
        assert_eq!(scorer.score(&[job(120, false)]).value, 50.0);
        assert_eq!(scorer.score(&[job(60, true)]).value, 80.0);
        assert_eq!(scorer.score(&[job(11, true)]).value, 0.0);

        let mut previous = 0.0;
        for months in 0..=84 {
            let value = scorer.score(&[job(months, true)]).value;
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn work_experience_sums_distinct_jobs_within_side_caps() {
        let scorer = scorers().work;
        let score = scorer.score(&[job(12, true), job(24, false), job(12, false)]);
        assert_eq!(score.value, 40.0 + 25.0 + 13.0);
        assert_eq!(score.max, 130.0);

        let capped = scorer.score(&[job(60, true), job(60, true)]);
        assert_eq!(capped.value, 80.0);
    }

    #[test]
    fn part_time_jobs_do_not_qualify() {
        let scorer = scorers().work;
        let mut part_time = job(48, true);
        part_time.hours_per_week = 20;
        assert_eq!(scorer.score(&[part_time.clone()]).value, 0.0);
        assert_eq!(scorer.qualifying_months(&[part_time, job(24, false)], false), 24);
    }

    #[test]
    fn qualifying_months_saturate_on_extreme_durations() {
        let scorer = scorers().work;
        let jobs = [job(u32::MAX, false), job(u32::MAX, false)];
        assert_eq!(scorer.qualifying_months(&jobs, false), u32::MAX);
        assert_eq!(scorer.qualifying_months(&jobs, true), 0);
        assert_eq!(scorer.score(&jobs).value, 50.0);
    }

    #[test]
    fn tied_credentials_prefer_the_one_with_equivalency() {
        let scorer = scorers().education;
        let record = |has_credential_equivalency: bool| EducationRecord {
            level: EducationLevel::Masters,
            field: "Engineering".to_string(),
            country: "FR".to_string(),
            has_credential_equivalency,
        };
        let mut profile = Profile {
            education: vec![record(true), record(false)],
            ..Profile::default()
        };
        assert_eq!(scorer.score(profile.highest_education()).value, 145.0);

        profile.education.reverse();
        assert_eq!(scorer.score(profile.highest_education()).value, 145.0);
    }

    #[test]
    fn adaptability_flags_are_additive_and_capped() {
        let scorer = scorers().adaptability;
        let flags = AdaptabilityFactors {
            relatives_in_country: true,
            prior_domestic_study: true,
            ..AdaptabilityFactors::default()
        };
        assert_eq!(scorer.score(&flags, false, false).value, 30.0);
        assert_eq!(scorer.score(&flags, true, false).value, 80.0);
        assert_eq!(scorer.score(&flags, true, true).value, 100.0);
        assert_eq!(scorer.score(&AdaptabilityFactors::default(), false, false).max, 100.0);
    }

    #[test]
    fn empty_profile_scores_zero_everywhere() {
        let scores = scorers().score_profile(&Profile::default(), &StandardizedLanguages::default());
        assert_eq!(scores.len(), Category::ALL.len());
        for (category, score) in scores {
            assert_eq!(score.value, 0.0, "{category} should be zero");
            assert!(score.max > 0.0);
        }
    }
}
