use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use pathway_engine::assessment::{
    aggregate, build_report, is_complete, Assessment, AssessmentReport, Question,
    ReportThresholds, ResponseValue,
};
use pathway_engine::config::AppConfig;
use pathway_engine::engine::export::write_match_csv;
use pathway_engine::engine::{
    MatchReport, MatchResult, PathwayCatalog, Profile, ScoringEngine, Skill, TestType,
};
use pathway_engine::error::AppError;
use pathway_engine::telemetry;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "pathway-engine",
    about = "Score candidate profiles and match them against immigration pathways",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one raw language test score into a benchmark level
    Normalize(NormalizeArgs),
    /// Match a profile against every pathway in a catalog
    Match(MatchArgs),
    /// Score questionnaire answers and build a recommendation report
    Assess(AssessArgs),
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// Test type (ielts, celpip, tef, clb)
    #[arg(long, value_parser = parse_test)]
    test: TestType,
    /// Skill (speaking, listening, reading, writing)
    #[arg(long, value_parser = parse_skill)]
    skill: Skill,
    /// Raw score as printed on the test report
    #[arg(long, allow_negative_numbers = true)]
    score: f64,
}

#[derive(Args, Debug)]
struct MatchArgs {
    /// Profile JSON file
    #[arg(long)]
    profile: PathBuf,
    /// Pathway catalog JSON file (array of pathways)
    #[arg(long)]
    catalog: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Sort by match percentage instead of catalog order
    #[arg(long)]
    ranked: bool,
}

#[derive(Args, Debug)]
struct AssessArgs {
    /// Question definitions JSON file
    #[arg(long)]
    questions: PathBuf,
    /// Answers JSON file: array of {"question_id", "response"}
    #[arg(long)]
    responses: PathBuf,
    /// Profile JSON file
    #[arg(long)]
    profile: PathBuf,
    /// Pathway catalog JSON file
    #[arg(long)]
    catalog: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Deserialize)]
struct AnswerInput {
    question_id: String,
    response: ResponseValue,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        let code = if err.is_invalid_input() { 2 } else { 1 };
        std::process::exit(code);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(environment = ?config.environment, "pathway engine configured");

    let engine = ScoringEngine::from_config(&config.engine);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Normalize(args) => {
            let level = engine.normalize(args.test, args.skill, args.score)?;
            writeln!(out, "{} {} {} -> benchmark {}", args.test, args.skill, args.score, level)?;
        }
        Command::Match(args) => {
            let report = match_report(&engine, &read(&args.profile)?, &read(&args.catalog)?)?;
            write_match_output(&mut out, &report, args.format, args.ranked)?;
        }
        Command::Assess(args) => {
            let report = assessment_report(
                &engine,
                &config.engine.report,
                &read(&args.questions)?,
                &read(&args.responses)?,
                &read(&args.profile)?,
                &read(&args.catalog)?,
            )?;
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, AppError> {
    Ok(fs::read_to_string(path)?)
}

fn parse_test(raw: &str) -> Result<TestType, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_ascii_lowercase()))
        .map_err(|_| format!("unknown test type '{raw}' (expected ielts, celpip, tef or clb)"))
}

fn parse_skill(raw: &str) -> Result<Skill, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_ascii_lowercase()))
        .map_err(|_| format!("unknown skill '{raw}'"))
}

/// Parse inputs and match. Catalog warnings come first in the report's warning list.
fn match_report(
    engine: &ScoringEngine,
    profile_json: &str,
    catalog_json: &str,
) -> Result<MatchReport, AppError> {
    let profile: Profile = serde_json::from_str(profile_json)?;
    let (catalog, mut warnings) = PathwayCatalog::from_json_str(catalog_json)?;
    let mut report = engine.match_pathways(&profile, catalog.pathways())?;
    warnings.append(&mut report.warnings);
    report.warnings = warnings;
    Ok(report)
}

fn assessment_report(
    engine: &ScoringEngine,
    thresholds: &ReportThresholds,
    questions_json: &str,
    answers_json: &str,
    profile_json: &str,
    catalog_json: &str,
) -> Result<AssessmentReport, AppError> {
    let questions: Vec<Question> = serde_json::from_str(questions_json)?;
    let answers: Vec<AnswerInput> = serde_json::from_str(answers_json)?;
    let profile: Profile = serde_json::from_str(profile_json)?;
    let (catalog, _) = PathwayCatalog::from_json_str(catalog_json)?;

    let mut assessment = Assessment::new("cli", questions.len())?;
    let mut scores = None;
    for answer in answers {
        if is_complete(&assessment) {
            warn!(question = %answer.question_id, "ignoring answer after completion");
            continue;
        }
        scores = assessment.answer_by_id(&questions, &answer.question_id, answer.response)?;
    }

    let scores = match scores {
        Some(scores) => scores,
        None => {
            warn!(
                answered = assessment.responses().len(),
                total = assessment.total_steps(),
                "assessment incomplete, reporting on answers so far"
            );
            aggregate(assessment.responses())
        }
    };

    Ok(build_report(
        engine,
        &profile,
        &scores,
        catalog.pathways(),
        thresholds,
    )?)
}

fn write_match_output<W: Write>(
    out: &mut W,
    report: &MatchReport,
    format: OutputFormat,
    ranked: bool,
) -> Result<(), AppError> {
    let results: Vec<&MatchResult> = if ranked {
        report.ranked()
    } else {
        report.results.iter().collect()
    };

    match format {
        OutputFormat::Text => out.write_all(render_match_text(report, &results, ranked).as_bytes())?,
        OutputFormat::Json => {
            let payload = MatchReport {
                results: results.into_iter().cloned().collect(),
                warnings: report.warnings.clone(),
            };
            serde_json::to_writer_pretty(&mut *out, &payload)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_match_csv(&mut *out, results)?,
    }
    Ok(())
}

fn render_match_text(report: &MatchReport, results: &[&MatchResult], ranked: bool) -> String {
    let mut text = String::new();
    let order = if ranked { "ranked" } else { "catalog order" };
    let _ = writeln!(text, "Pathway matches ({order})");

    if results.is_empty() {
        let _ = writeln!(text, "- none");
    }
    for result in results {
        let eligibility = &result.eligibility;
        let _ = writeln!(
            text,
            "- {} {}: {}, match {:.1}%, composite {:.1}, points {}/{}",
            result.pathway_id,
            result.pathway_name,
            eligibility.status.label(),
            result.match_percentage,
            result.composite_score,
            eligibility.points,
            eligibility.max_points
        );
        for reason in result.reasons.iter().skip(1) {
            let _ = writeln!(text, "    {reason}");
        }
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(text, "\nSkipped catalog entries");
        for warning in &report.warnings {
            let _ = writeln!(
                text,
                "- {}: {}",
                warning.pathway_id.as_deref().unwrap_or("(no id)"),
                warning.message
            );
        }
    }
    text
}
