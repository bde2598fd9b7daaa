// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::explicit_null;
use crate::validation::not_blank;

/// Difficulty level of a question. Stored as lowercase text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty '{0}'")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| UnknownDifficulty(s.to_string()))
    }
}

/// A multiple-choice question with its quiz and category titles resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub category_id: i64,
    pub category_title: String,

    /// The text content of the question.
    pub text: String,
    pub description: Option<String>,

    /// Selectable answers, in display order. Stored as a JSON array.
    pub options: Vec<String>,

    /// Always one of `options`.
    pub correct_answer: String,

    /// Explanation of the correct answer.
    pub explanation: Option<String>,
    pub difficulty: Difficulty,
}

impl Question {
    /// The writable part of this question, used as the base of an update.
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            quiz_id: self.quiz_id,
            category_id: self.category_id,
            text: self.text.clone(),
            description: self.description.clone(),
            options: self.options.clone(),
            correct_answer: self.correct_answer.clone(),
            explanation: self.explanation.clone(),
            difficulty: self.difficulty,
        }
    }
}

/// Fully validated question fields, ready to be written by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub quiz_id: i64,
    pub category_id: i64,
    pub text: String,
    pub description: Option<String>,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub difficulty: Difficulty,
}

/// Selects questions by owner and/or text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub quiz_id: Option<i64>,
    pub category_id: Option<i64>,
    /// Case-insensitive substring of `text` or `description`.
    pub text_contains: Option<String>,
}

impl QuestionFilter {
    pub fn for_quiz(quiz_id: i64) -> Self {
        Self {
            quiz_id: Some(quiz_id),
            ..Self::default()
        }
    }

    pub fn for_category(category_id: i64) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    pub fn matching_text(text: impl Into<String>) -> Self {
        Self {
            text_contains: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Input for creating a question inside a quiz.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub category_id: Option<i64>,
    pub text: String,
    pub description: Option<String>,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
    /// Defaults to `medium` when absent.
    pub difficulty: Option<String>,
}

/// DTO for `POST /api/questions`: the owning quiz plus the question itself.
#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub quiz_id: i64,
    #[serde(flatten)]
    pub question: NewQuestion,
}

/// Partial update of a question. Omitted fields keep their stored values.
///
/// `description` and `explanation` distinguish "omitted" (`None`) from an
/// explicit `null` (`Some(None)`), which clears the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionChanges {
    pub quiz_id: Option<i64>,
    pub category_id: Option<i64>,
    pub text: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub explanation: Option<Option<String>>,
}

/// DTO for checking a user's answer.
#[derive(Debug, Deserialize, Validate)]
pub struct CheckAnswerRequest {
    #[validate(custom(function = not_blank))]
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct CheckAnswerResponse {
    pub question_id: i64,
    pub is_correct: bool,
}

/// Query parameters for text search.
#[derive(Debug, Deserialize, Validate)]
pub struct SearchParams {
    #[serde(default)]
    #[validate(custom(function = not_blank))]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_only_lowercase_names() {
        assert_eq!("hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("Hard".parse::<Difficulty>().is_err());
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn changes_tell_explicit_null_from_missing_field() {
        let changes: QuestionChanges =
            serde_json::from_str(r#"{"description": null, "text": "New"}"#).unwrap();

        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.explanation, None);
        assert_eq!(changes.text.as_deref(), Some("New"));
    }

    #[test]
    fn create_request_flattens_question_fields() {
        let req: CreateQuestionRequest = serde_json::from_str(
            r#"{"quiz_id": 3, "category_id": 7, "text": "2+2?", "options": ["3", "4"], "correct_answer": "4"}"#,
        )
        .unwrap();

        assert_eq!(req.quiz_id, 3);
        assert_eq!(req.question.category_id, Some(7));
        assert_eq!(req.question.difficulty, None);
    }
}
