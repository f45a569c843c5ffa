//! Questionnaire flow: typed questions, the assessment state machine, score aggregation, and
//! the recommendation report built on top of the engine.

pub mod aggregate;
pub mod questions;
pub mod report;
pub mod session;

pub use aggregate::{aggregate, AggregateScores};
pub use questions::{
    ChoiceOption, NumberBand, Question, QuestionKind, ResponseError, ResponseValue,
    ScoredResponse,
};
pub use report::{build_report, AssessmentReport, ReportThresholds};
pub use session::{is_complete, progress, Assessment, AssessmentError, AssessmentStatus};
