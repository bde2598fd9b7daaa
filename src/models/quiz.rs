// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use super::explicit_null;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
}

/// Validated quiz fields, ready to be written by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub title: String,
    pub description: Option<String>,
}

/// DTO for creating a new quiz.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuiz {
    pub title: String,
    pub description: Option<String>,
}

/// DTO for replacing a quiz (PUT). The title is mandatory; a missing
/// description clears the stored one.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceQuizRequest {
    pub title: String,
    pub description: Option<String>,
}

/// Partial update of a quiz. An explicit `null` description clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizChanges {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
}

impl From<ReplaceQuizRequest> for QuizChanges {
    fn from(req: ReplaceQuizRequest) -> Self {
        Self {
            title: Some(req.title),
            description: Some(req.description),
        }
    }
}

/// Query parameters for listing quizzes.
#[derive(Debug, Default, Deserialize)]
pub struct QuizListParams {
    /// When non-empty, switches the listing to a title search.
    pub title: Option<String>,
}
