use serde::{Deserialize, Serialize};
use tracing::info;

use super::aggregate::{aggregate, AggregateScores};
use super::questions::{Question, ResponseError, ResponseValue, ScoredResponse};

/// Lifecycle of an assessment. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Started,
    InProgress,
    Completed,
}

impl AssessmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AssessmentStatus::Started => "started",
            AssessmentStatus::InProgress => "in_progress",
            AssessmentStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssessmentError {
    #[error("assessment '{id}' must declare at least one step")]
    NoSteps { id: String },
    #[error("assessment '{id}' is already completed")]
    AlreadyCompleted { id: String },
    #[error("question '{question}' is not part of this assessment")]
    UnknownQuestion { question: String },
    #[error(transparent)]
    Response(#[from] ResponseError),
}

/// In-memory assessment state. Persisting it is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    id: String,
    total_steps: usize,
    status: AssessmentStatus,
    responses: Vec<ScoredResponse>,
}

impl Assessment {
    pub fn new(id: impl Into<String>, total_steps: usize) -> Result<Self, AssessmentError> {
        let id = id.into();
        if total_steps == 0 {
            return Err(AssessmentError::NoSteps { id });
        }
        Ok(Self {
            id,
            total_steps,
            status: AssessmentStatus::Started,
            responses: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn status(&self) -> AssessmentStatus {
        self.status
    }

    pub fn responses(&self) -> &[ScoredResponse] {
        &self.responses
    }

    /// Record a scored response. Answering a question again replaces the earlier answer.
    ///
    /// Returns the aggregate exactly once: on the call that completes the assessment.
    pub fn record(
        &mut self,
        response: ScoredResponse,
    ) -> Result<Option<AggregateScores>, AssessmentError> {
        if self.status == AssessmentStatus::Completed {
            return Err(AssessmentError::AlreadyCompleted {
                id: self.id.clone(),
            });
        }

        match self
            .responses
            .iter_mut()
            .find(|existing| existing.question_id == response.question_id)
        {
            Some(existing) => *existing = response,
            None => self.responses.push(response),
        }

        if self.responses.len() >= self.total_steps {
            self.status = AssessmentStatus::Completed;
            let scores = aggregate(&self.responses);
            info!(
                assessment = %self.id,
                responses = self.responses.len(),
                overall_score = scores.overall_score,
                "assessment completed"
            );
            return Ok(Some(scores));
        }

        self.status = AssessmentStatus::InProgress;
        Ok(None)
    }

    /// Validate and score an answer, then record it.
    pub fn answer(
        &mut self,
        question: &Question,
        value: ResponseValue,
    ) -> Result<Option<AggregateScores>, AssessmentError> {
        let response = question.answer(value)?;
        self.record(response)
    }

    /// Look up `question_id` in `questions` and answer it.
    pub fn answer_by_id(
        &mut self,
        questions: &[Question],
        question_id: &str,
        value: ResponseValue,
    ) -> Result<Option<AggregateScores>, AssessmentError> {
        let question = questions
            .iter()
            .find(|question| question.id == question_id)
            .ok_or_else(|| AssessmentError::UnknownQuestion {
                question: question_id.to_string(),
            })?;
        self.answer(question, value)
    }
}

/// Completion percentage in `[0, 100]`.
pub fn progress(assessment: &Assessment) -> f64 {
    let answered = assessment.responses.len().min(assessment.total_steps);
    (answered as f64 / assessment.total_steps as f64 * 100.0).round()
}

pub fn is_complete(assessment: &Assessment) -> bool {
    assessment.status == AssessmentStatus::Completed
}
