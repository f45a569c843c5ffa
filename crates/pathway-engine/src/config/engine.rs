use serde::{Deserialize, Serialize};

use crate::assessment::ReportThresholds;
use crate::engine::{MatchPolicy, ScoringTables};

use super::ConfigError;

/// Immutable configuration handed to the engine at construction time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tables: ScoringTables,
    pub matching: MatchPolicy,
    pub report: ReportThresholds,
}

impl EngineConfig {
    /// Check the invariants the scorers rely on but cannot enforce themselves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let banding = &self.tables.banding;
        if !banding.ielts.is_monotonic() || !banding.tef.is_monotonic() {
            return Err(ConfigError::InvalidTables(
                "language banding cutoffs must be strictly ascending".to_string(),
            ));
        }
        if !self.tables.education.is_monotonic() {
            return Err(ConfigError::InvalidTables(
                "education points must not decrease with credential level".to_string(),
            ));
        }
        if self.tables.age.bands.iter().any(|band| band.from > band.to) {
            return Err(ConfigError::InvalidTables(
                "age bands must have from <= to".to_string(),
            ));
        }

        let ceiling = self.matching.not_eligible_ceiling;
        if !ceiling.is_finite() || !(0.0..=100.0).contains(&ceiling) {
            return Err(ConfigError::InvalidCeiling {
                value: ceiling.to_string(),
            });
        }

        let report = &self.report;
        if report.weakness_percentage > report.strength_percentage {
            return Err(ConfigError::InvalidTables(
                "weakness threshold must not exceed strength threshold".to_string(),
            ));
        }
        Ok(())
    }
}
