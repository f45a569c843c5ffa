//! Assessment questions. Each kind carries its own validation and scoring rules, and answers
//! are dispatched by matching the kind against the response variant.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    #[serde(default)]
    pub points: f64,
}

/// Points earned once a numeric answer reaches `from`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumberBand {
    pub from: f64,
    pub points: f64,
}

fn default_step_points() -> f64 {
    1.0
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<ChoiceOption>,
        #[serde(default)]
        min_selections: usize,
        #[serde(default)]
        max_selections: Option<usize>,
    },
    SingleChoice {
        options: Vec<ChoiceOption>,
    },
    Text {
        #[serde(default)]
        min_length: usize,
        #[serde(default)]
        max_length: Option<usize>,
        #[serde(default)]
        points_if_answered: f64,
    },
    Number {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default)]
        bands: Vec<NumberBand>,
    },
    Date {
        #[serde(default)]
        not_before: Option<NaiveDate>,
        #[serde(default)]
        not_after: Option<NaiveDate>,
        #[serde(default)]
        points_if_answered: f64,
    },
    Boolean {
        #[serde(default)]
        points_if_true: f64,
        #[serde(default)]
        points_if_false: f64,
    },
    Scale {
        min: i32,
        max: i32,
        #[serde(default = "default_step_points")]
        points_per_step: f64,
    },
}

impl QuestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple_choice",
            QuestionKind::SingleChoice { .. } => "single_choice",
            QuestionKind::Text { .. } => "text",
            QuestionKind::Number { .. } => "number",
            QuestionKind::Date { .. } => "date",
            QuestionKind::Boolean { .. } => "boolean",
            QuestionKind::Scale { .. } => "scale",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResponseValue {
    MultipleChoice(Vec<String>),
    SingleChoice(String),
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Boolean(bool),
    Scale(i32),
}

impl ResponseValue {
    pub fn label(&self) -> &'static str {
        match self {
            ResponseValue::MultipleChoice(_) => "multiple_choice",
            ResponseValue::SingleChoice(_) => "single_choice",
            ResponseValue::Text(_) => "text",
            ResponseValue::Number(_) => "number",
            ResponseValue::Date(_) => "date",
            ResponseValue::Boolean(_) => "boolean",
            ResponseValue::Scale(_) => "scale",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResponseError {
    #[error("question '{question}' expects a {expected} answer, got {found}")]
    KindMismatch {
        question: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("question '{question}' has no option '{value}'")]
    UnknownOption { question: String, value: String },
    #[error("question '{question}' needs between {min} and {max} selections, got {found}")]
    SelectionCount {
        question: String,
        min: usize,
        max: usize,
        found: usize,
    },
    #[error("question '{question}' answer is out of range: {detail}")]
    OutOfRange { question: String, detail: String },
    #[error("question '{question}' requires an answer")]
    Empty { question: String },
}

/// One answered question, ready for aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResponse {
    pub question_id: String,
    pub category: String,
    pub raw_response: ResponseValue,
    pub score: f64,
    #[serde(default)]
    pub max_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub prompt_key: String,
    pub kind: QuestionKind,
    #[serde(default = "default_required")]
    pub required: bool,
}

impl Question {
    pub fn max_score(&self) -> f64 {
        let positive = |points: f64| points.max(0.0);
        match &self.kind {
            QuestionKind::MultipleChoice {
                options,
                max_selections,
                ..
            } => {
                let mut points: Vec<f64> = options.iter().map(|option| positive(option.points)).collect();
                points.sort_by(|left, right| right.total_cmp(left));
                let take = max_selections.unwrap_or(options.len());
                points.into_iter().take(take).sum()
            }
            QuestionKind::SingleChoice { options } => options
                .iter()
                .map(|option| positive(option.points))
                .fold(0.0, f64::max),
            QuestionKind::Text {
                points_if_answered, ..
            }
            | QuestionKind::Date {
                points_if_answered, ..
            } => positive(*points_if_answered),
            QuestionKind::Number { bands, .. } => bands
                .iter()
                .map(|band| positive(band.points))
                .fold(0.0, f64::max),
            QuestionKind::Boolean {
                points_if_true,
                points_if_false,
            } => positive(*points_if_true).max(positive(*points_if_false)),
            QuestionKind::Scale {
                min,
                max,
                points_per_step,
            } => positive((i64::from(*max) - i64::from(*min)).max(0) as f64 * points_per_step),
        }
    }

    pub fn validate(&self, value: &ResponseValue) -> Result<(), ResponseError> {
        let question = || self.id.clone();
        match (&self.kind, value) {
            (
                QuestionKind::MultipleChoice {
                    options,
                    min_selections,
                    max_selections,
                },
                ResponseValue::MultipleChoice(selected),
            ) => {
                let distinct: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
                let min = if self.required {
                    (*min_selections).max(1)
                } else {
                    *min_selections
                };
                let max = max_selections.unwrap_or(options.len());
                if distinct.len() < min || distinct.len() > max {
                    return Err(ResponseError::SelectionCount {
                        question: question(),
                        min,
                        max,
                        found: distinct.len(),
                    });
                }
                for value in distinct {
                    find_option(options, value).ok_or_else(|| ResponseError::UnknownOption {
                        question: question(),
                        value: value.to_string(),
                    })?;
                }
                Ok(())
            }
            (QuestionKind::SingleChoice { options }, ResponseValue::SingleChoice(selected)) => {
                find_option(options, selected)
                    .map(|_| ())
                    .ok_or_else(|| ResponseError::UnknownOption {
                        question: question(),
                        value: selected.clone(),
                    })
            }
            (
                QuestionKind::Text {
                    min_length,
                    max_length,
                    ..
                },
                ResponseValue::Text(text),
            ) => {
                let length = text.trim().chars().count();
                if length == 0 && self.required {
                    return Err(ResponseError::Empty { question: question() });
                }
                if length < *min_length || max_length.is_some_and(|max| length > max) {
                    return Err(ResponseError::OutOfRange {
                        question: question(),
                        detail: format!("length {length}"),
                    });
                }
                Ok(())
            }
            (QuestionKind::Number { min, max, .. }, ResponseValue::Number(number)) => {
                let below = min.is_some_and(|min| *number < min);
                let above = max.is_some_and(|max| *number > max);
                if !number.is_finite() || below || above {
                    return Err(ResponseError::OutOfRange {
                        question: question(),
                        detail: number.to_string(),
                    });
                }
                Ok(())
            }
            (
                QuestionKind::Date {
                    not_before,
                    not_after,
                    ..
                },
                ResponseValue::Date(date),
            ) => {
                let early = not_before.is_some_and(|bound| *date < bound);
                let late = not_after.is_some_and(|bound| *date > bound);
                if early || late {
                    return Err(ResponseError::OutOfRange {
                        question: question(),
                        detail: date.to_string(),
                    });
                }
                Ok(())
            }
            (QuestionKind::Boolean { .. }, ResponseValue::Boolean(_)) => Ok(()),
            (QuestionKind::Scale { min, max, .. }, ResponseValue::Scale(step)) => {
                if step < min || step > max {
                    return Err(ResponseError::OutOfRange {
                        question: question(),
                        detail: format!("{step} not in {min}..={max}"),
                    });
                }
                Ok(())
            }
            (kind, value) => Err(ResponseError::KindMismatch {
                question: question(),
                expected: kind.label(),
                found: value.label(),
            }),
        }
    }

    /// Score an already validated answer. Mismatched kinds score zero.
    pub fn score(&self, value: &ResponseValue) -> f64 {
        let raw = match (&self.kind, value) {
            (QuestionKind::MultipleChoice { options, .. }, ResponseValue::MultipleChoice(selected)) => {
                let distinct: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
                distinct
                    .into_iter()
                    .filter_map(|value| find_option(options, value))
                    .map(|option| option.points)
                    .sum()
            }
            (QuestionKind::SingleChoice { options }, ResponseValue::SingleChoice(selected)) => {
                find_option(options, selected)
                    .map(|option| option.points)
                    .unwrap_or(0.0)
            }
            (
                QuestionKind::Text {
                    points_if_answered, ..
                },
                ResponseValue::Text(text),
            ) => {
                if text.trim().is_empty() {
                    0.0
                } else {
                    *points_if_answered
                }
            }
            (QuestionKind::Number { bands, .. }, ResponseValue::Number(number)) => bands
                .iter()
                .filter(|band| *number >= band.from)
                .map(|band| band.points)
                .fold(0.0, f64::max),
            (
                QuestionKind::Date {
                    points_if_answered, ..
                },
                ResponseValue::Date(_),
            ) => *points_if_answered,
            (
                QuestionKind::Boolean {
                    points_if_true,
                    points_if_false,
                },
                ResponseValue::Boolean(answer),
            ) => {
                if *answer {
                    *points_if_true
                } else {
                    *points_if_false
                }
            }
            (
                QuestionKind::Scale {
                    min,
                    points_per_step,
                    ..
                },
                ResponseValue::Scale(step),
            ) => (i64::from(*step) - i64::from(*min)).max(0) as f64 * points_per_step,
            _ => 0.0,
        };
        raw.clamp(0.0, self.max_score())
    }

    pub fn answer(&self, value: ResponseValue) -> Result<ScoredResponse, ResponseError> {
        self.validate(&value)?;
        let score = self.score(&value);
        Ok(ScoredResponse {
            question_id: self.id.clone(),
            category: self.category.clone(),
            raw_response: value,
            score,
            max_score: self.max_score(),
        })
    }
}

fn find_option<'a>(options: &'a [ChoiceOption], value: &str) -> Option<&'a ChoiceOption> {
    options
        .iter()
        .find(|option| option.value.eq_ignore_ascii_case(value.trim()))
}
