// src/services/quiz.rs

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{ServiceError, ServiceResult, StorageContext, begin, require_quiz};
use crate::{
    models::{
        question::QuestionFilter,
        quiz::{NewQuiz, Quiz, QuizChanges, QuizDraft},
    },
    storage::QuizStore,
    validation,
};

/// CRUD and title search over quizzes.
#[derive(Clone)]
pub struct QuizService {
    store: Arc<dyn QuizStore>,
}

impl QuizService {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self { store }
    }

    /// All quizzes ordered by title.
    pub async fn list(&self) -> ServiceResult<Vec<Quiz>> {
        let mut tx = begin(self.store.as_ref()).await?;
        tx.quizzes(None).await.during("list quizzes")
    }

    /// Quizzes whose title contains `text`, ignoring case. Blank input
    /// matches nothing.
    pub async fn search_by_title(&self, text: &str) -> ServiceResult<Vec<Quiz>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = begin(self.store.as_ref()).await?;
        tx.quizzes(Some(text)).await.during("search quizzes")
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Quiz> {
        let mut tx = begin(self.store.as_ref()).await?;
        require_quiz(&mut *tx, id).await
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewQuiz) -> ServiceResult<Quiz> {
        let draft = QuizDraft {
            title: validation::quiz_title(&input.title)?,
            description: validation::quiz_description(input.description.as_deref())?,
        };

        let mut tx = begin(self.store.as_ref()).await?;
        let quiz = tx.insert_quiz(&draft).await.during("insert quiz")?;
        tx.commit().await.during("commit quiz")?;

        info!(quiz_id = quiz.id, "quiz created");
        Ok(quiz)
    }

    /// Applies the supplied fields. An explicit `null` or blank description
    /// clears it.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: i64, changes: QuizChanges) -> ServiceResult<Quiz> {
        let mut tx = begin(self.store.as_ref()).await?;
        let current = require_quiz(&mut *tx, id).await?;

        let mut draft = QuizDraft {
            title: current.title,
            description: current.description,
        };
        if let Some(title) = changes.title {
            draft.title = validation::quiz_title(&title)?;
        }
        if let Some(description) = changes.description {
            draft.description = validation::quiz_description(description.as_deref())?;
        }

        let quiz = tx.update_quiz(id, &draft).await.during("update quiz")?;
        tx.commit().await.during("commit quiz")?;

        info!(quiz_id = id, "quiz updated");
        Ok(quiz)
    }

    /// Deletes a quiz that owns no questions.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let mut tx = begin(self.store.as_ref()).await?;
        require_quiz(&mut *tx, id).await?;

        if tx
            .questions_exist(&QuestionFilter::for_quiz(id))
            .await
            .during("check quiz questions")?
        {
            warn!(quiz_id = id, "refusing to delete quiz with questions");
            return Err(ServiceError::Conflict(
                "cannot delete quiz with linked questions".to_string(),
            ));
        }

        tx.delete_quiz(id).await.during("delete quiz")?;
        tx.commit().await.during("commit quiz deletion")?;

        info!(quiz_id = id, "quiz deleted");
        Ok(())
    }
}
