use std::io::Write;

use serde::Serialize;

use super::matcher::MatchResult;

#[derive(Debug, Serialize)]
struct MatchRow<'a> {
    #[serde(rename = "Pathway ID")]
    pathway_id: &'a str,
    #[serde(rename = "Pathway")]
    pathway_name: &'a str,
    #[serde(rename = "Status")]
    status: &'static str,
    #[serde(rename = "Match %")]
    match_percentage: f64,
    #[serde(rename = "Composite Score")]
    composite_score: String,
    #[serde(rename = "Points")]
    points: u32,
    #[serde(rename = "Max Points")]
    max_points: u32,
    #[serde(rename = "Blocking Criteria")]
    blocking: String,
}

/// Write one CSV row per match result, in the order given.
pub fn write_match_csv<'a, W, I>(writer: W, results: I) -> Result<(), csv::Error>
where
    W: Write,
    I: IntoIterator<Item = &'a MatchResult>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    for result in results {
        let eligibility = &result.eligibility;
        let blocking = eligibility
            .breakdown
            .required
            .failed
            .iter()
            .chain(eligibility.breakdown.optional.failed.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ");

        csv_writer.serialize(MatchRow {
            pathway_id: &result.pathway_id,
            pathway_name: &result.pathway_name,
            status: eligibility.status.label(),
            match_percentage: result.match_percentage,
            composite_score: format!("{:.2}", result.composite_score),
            points: eligibility.points,
            max_points: eligibility.max_points,
            blocking,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        Category, CriterionRule, CriterionType, EligibilityCriterion, Pathway, Profile,
        ScoringEngine,
    };

    #[test]
    fn rows_list_blocking_criteria() {
        let pathway = Pathway {
            id: "family".to_string(),
            name: "Family Sponsorship".to_string(),
            category: "family".to_string(),
            criteria: vec![EligibilityCriterion {
                name: "Relatives in country".to_string(),
                description: String::new(),
                criterion_type: CriterionType::Required,
                points: 10,
                rule: CriterionRule::Adaptability {
                    flag: crate::engine::AdaptabilityFlag::RelativesInCountry,
                },
            }],
            weights: [(Category::Adaptability, 1.0)].into_iter().collect(),
        };
        let report = ScoringEngine::default()
            .match_pathways(&Profile::default(), &[pathway])
            .expect("empty profile is valid");

        let mut buffer = Vec::new();
        write_match_csv(&mut buffer, &report.results).expect("csv written");
        let text = String::from_utf8(buffer).expect("utf8 output");
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("Pathway ID,Pathway,Status,Match %,Composite Score,Points,Max Points,Blocking Criteria")
        );
        assert_eq!(
            lines.next(),
            Some("family,Family Sponsorship,not_eligible,0.0,0.00,0,10,Relatives in country")
        );
    }
}
