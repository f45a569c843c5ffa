use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::composite::WeightTable;
use super::domain::Category;
use super::eligibility::EligibilityCriterion;

/// Immigration program definition supplied by the catalog source. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pathway {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub criteria: Vec<EligibilityCriterion>,
    #[serde(default)]
    pub weights: WeightTable,
}

impl Pathway {
    /// Reject entries the matcher cannot evaluate meaningfully.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::MissingId {
                name: self.name.clone(),
            });
        }
        if self.criteria.is_empty() {
            return Err(CatalogError::MissingCriteria {
                id: self.id.clone(),
            });
        }
        if let Some(criterion) = self
            .criteria
            .iter()
            .find(|criterion| criterion.rule.has_empty_compound())
        {
            return Err(CatalogError::EmptyCompound {
                id: self.id.clone(),
                criterion: criterion.name.clone(),
            });
        }
        if self
            .criteria
            .iter()
            .try_fold(0u32, |total, criterion| total.checked_add(criterion.points))
            .is_none()
        {
            return Err(CatalogError::PointsOverflow {
                id: self.id.clone(),
            });
        }
        if let Some((category, _)) = self
            .weights
            .iter()
            .find(|(_, weight)| !weight.is_finite() || **weight < 0.0)
        {
            return Err(CatalogError::InvalidWeight {
                id: self.id.clone(),
                category: *category,
            });
        }
        if !self.weights.values().any(|weight| *weight > 0.0) {
            return Err(CatalogError::MissingWeights {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("pathway catalog must be a JSON array: {0}")]
    Document(#[source] serde_json::Error),
    #[error("pathway entry #{index} could not be parsed: {source}")]
    Entry {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("pathway '{name}' has no identifier")]
    MissingId { name: String },
    #[error("pathway '{id}' has no eligibility criteria")]
    MissingCriteria { id: String },
    #[error("pathway '{id}' has no positive category weights")]
    MissingWeights { id: String },
    #[error("pathway '{id}' weight for {category} must be finite and non-negative")]
    InvalidWeight { id: String, category: Category },
    #[error("pathway '{id}' criterion '{criterion}' contains an empty compound rule")]
    EmptyCompound { id: String, criterion: String },
    #[error("pathway '{id}' criterion points exceed the supported total")]
    PointsOverflow { id: String },
    #[error("pathway id '{id}' appears more than once")]
    DuplicateId { id: String },
}

/// Non-fatal problem with one catalog entry; the entry is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogWarning {
    pub pathway_id: Option<String>,
    pub message: String,
}

impl CatalogWarning {
    pub fn from_error(pathway_id: Option<String>, error: &CatalogError) -> Self {
        Self {
            pathway_id,
            message: error.to_string(),
        }
    }
}

/// Ordered, validated list of pathways.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathwayCatalog {
    pathways: Vec<Pathway>,
}

impl PathwayCatalog {
    /// Wrap an already-typed list without validation; the matcher validates per entry.
    pub fn new(pathways: Vec<Pathway>) -> Self {
        Self { pathways }
    }

    pub fn pathways(&self) -> &[Pathway] {
        &self.pathways
    }

    pub fn len(&self) -> usize {
        self.pathways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Pathway> {
        self.pathways.iter().find(|pathway| pathway.id == id)
    }

    /// Parse a JSON array of pathways. Entries that fail to parse or validate, and repeated
    /// ids after the first, are skipped and reported as warnings.
    pub fn from_json_str(raw: &str) -> Result<(Self, Vec<CatalogWarning>), CatalogError> {
        let entries: Vec<Value> = serde_json::from_str(raw).map_err(CatalogError::Document)?;
        let mut pathways = Vec::with_capacity(entries.len());
        let mut warnings = Vec::new();
        let mut seen = BTreeSet::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let declared_id = entry
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string);

            let parsed = serde_json::from_value::<Pathway>(entry)
                .map_err(|source| CatalogError::Entry { index, source })
                .and_then(|pathway| pathway.validate().map(|_| pathway))
                .and_then(|pathway| {
                    if seen.insert(pathway.id.clone()) {
                        Ok(pathway)
                    } else {
                        Err(CatalogError::DuplicateId { id: pathway.id })
                    }
                });

            match parsed {
                Ok(pathway) => pathways.push(pathway),
                Err(error) => {
                    warn!(index, pathway = ?declared_id, %error, "skipping malformed pathway entry");
                    warnings.push(CatalogWarning::from_error(declared_id, &error));
                }
            }
        }

        Ok((Self { pathways }, warnings))
    }
}

impl From<Vec<Pathway>> for PathwayCatalog {
    fn from(pathways: Vec<Pathway>) -> Self {
        Self::new(pathways)
    }
}
