// src/storage/memory.rs

//! In-process store. A transaction works on a private copy of the tables
//! while holding the store lock; `commit` publishes the copy, dropping the
//! transaction discards it. Writers are therefore fully serialized.

use std::{cmp::Ordering, collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{QuizStore, StorageError, StorageResult, StoreTx};
use crate::models::{
    category::{Category, CategoryFilter, CategoryOrder},
    question::{Question, QuestionDraft, QuestionFilter},
    quiz::{Quiz, QuizDraft},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    categories: BTreeMap<i64, Category>,
    quizzes: BTreeMap<i64, Quiz>,
    questions: BTreeMap<i64, QuestionDraft>,
    next_category_id: i64,
    next_quiz_id: i64,
    next_question_id: i64,
}

impl Tables {
    fn allocate(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    /// Joins a stored question with its quiz and category titles.
    fn resolve(&self, id: i64, row: &QuestionDraft) -> StorageResult<Question> {
        let quiz = self.quizzes.get(&row.quiz_id).ok_or(StorageError::RowMissing {
            table: "quizzes",
            id: row.quiz_id,
        })?;
        let category = self
            .categories
            .get(&row.category_id)
            .ok_or(StorageError::RowMissing {
                table: "categories",
                id: row.category_id,
            })?;

        Ok(Question {
            id,
            quiz_id: row.quiz_id,
            quiz_title: quiz.title.clone(),
            category_id: row.category_id,
            category_title: category.title.clone(),
            text: row.text.clone(),
            description: row.description.clone(),
            options: row.options.clone(),
            correct_answer: row.correct_answer.clone(),
            explanation: row.explanation.clone(),
            difficulty: row.difficulty,
        })
    }

    fn question_matches(row: &QuestionDraft, filter: &QuestionFilter) -> bool {
        if filter.quiz_id.is_some_and(|id| id != row.quiz_id) {
            return false;
        }
        if filter.category_id.is_some_and(|id| id != row.category_id) {
            return false;
        }
        match &filter.text_contains {
            None => true,
            Some(needle) => {
                contains_ignore_case(&row.text, needle)
                    || row
                        .description
                        .as_deref()
                        .is_some_and(|d| contains_ignore_case(d, needle))
            }
        }
    }

    fn check_references(&self, draft: &QuestionDraft) -> StorageResult<()> {
        if !self.quizzes.contains_key(&draft.quiz_id) {
            return Err(StorageError::RowMissing {
                table: "quizzes",
                id: draft.quiz_id,
            });
        }
        if !self.categories.contains_key(&draft.category_id) {
            return Err(StorageError::RowMissing {
                table: "categories",
                id: draft.category_id,
            });
        }
        Ok(())
    }
}

/// Title order close to a locale collation: case-folded first, then raw
/// text, then id.
fn by_title(a: &str, a_id: i64, b: &str, b_id: i64) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
        .then(a_id.cmp(&b_id))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Store kept entirely in memory; used by tests and `STORAGE=memory` runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn begin(&self) -> StorageResult<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryTx {
            guard: Some(guard),
            working,
        }))
    }
}

struct MemoryTx {
    guard: Option<OwnedMutexGuard<Tables>>,
    working: Tables,
}

impl MemoryTx {
    fn tables(&mut self) -> StorageResult<&mut Tables> {
        if self.guard.is_none() {
            return Err(StorageError::TransactionClosed);
        }
        Ok(&mut self.working)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn category(&mut self, id: i64) -> StorageResult<Option<Category>> {
        Ok(self.tables()?.categories.get(&id).cloned())
    }

    async fn categories(&mut self, filter: &CategoryFilter) -> StorageResult<Vec<Category>> {
        let tables = self.tables()?;
        let mut found: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| {
                filter
                    .title
                    .as_deref()
                    .is_none_or(|needle| contains_ignore_case(&c.title, needle))
            })
            .cloned()
            .collect();
        if filter.order == CategoryOrder::Title {
            found.sort_by(|a, b| by_title(&a.title, a.id, &b.title, b.id));
        }
        Ok(found)
    }

    async fn category_title_taken(&mut self, title: &str) -> StorageResult<bool> {
        Ok(self.tables()?.categories.values().any(|c| c.title == title))
    }

    async fn insert_category(&mut self, title: &str) -> StorageResult<Category> {
        let tables = self.tables()?;
        let id = Tables::allocate(&mut tables.next_category_id);
        let category = Category {
            id,
            title: title.to_string(),
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(&mut self, category: &Category) -> StorageResult<Category> {
        let stored = self
            .tables()?
            .categories
            .get_mut(&category.id)
            .ok_or(StorageError::RowMissing {
                table: "categories",
                id: category.id,
            })?;
        *stored = category.clone();
        Ok(category.clone())
    }

    async fn delete_category(&mut self, id: i64) -> StorageResult<()> {
        let tables = self.tables()?;
        if tables.questions.values().any(|q| q.category_id == id) {
            return Err(StorageError::StillReferenced {
                table: "categories",
                id,
            });
        }
        tables
            .categories
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::RowMissing {
                table: "categories",
                id,
            })
    }

    async fn quiz(&mut self, id: i64) -> StorageResult<Option<Quiz>> {
        Ok(self.tables()?.quizzes.get(&id).cloned())
    }

    async fn quizzes(&mut self, title_contains: Option<&str>) -> StorageResult<Vec<Quiz>> {
        let mut found: Vec<Quiz> = self
            .tables()?
            .quizzes
            .values()
            .filter(|q| title_contains.is_none_or(|needle| contains_ignore_case(&q.title, needle)))
            .cloned()
            .collect();
        found.sort_by(|a, b| by_title(&a.title, a.id, &b.title, b.id));
        Ok(found)
    }

    async fn insert_quiz(&mut self, draft: &QuizDraft) -> StorageResult<Quiz> {
        let tables = self.tables()?;
        let id = Tables::allocate(&mut tables.next_quiz_id);
        let quiz = Quiz {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
        };
        tables.quizzes.insert(id, quiz.clone());
        Ok(quiz)
    }

    async fn update_quiz(&mut self, id: i64, draft: &QuizDraft) -> StorageResult<Quiz> {
        let stored = self
            .tables()?
            .quizzes
            .get_mut(&id)
            .ok_or(StorageError::RowMissing { table: "quizzes", id })?;
        stored.title = draft.title.clone();
        stored.description = draft.description.clone();
        Ok(stored.clone())
    }

    async fn delete_quiz(&mut self, id: i64) -> StorageResult<()> {
        let tables = self.tables()?;
        if tables.questions.values().any(|q| q.quiz_id == id) {
            return Err(StorageError::StillReferenced { table: "quizzes", id });
        }
        tables
            .quizzes
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::RowMissing { table: "quizzes", id })
    }

    async fn question(&mut self, id: i64) -> StorageResult<Option<Question>> {
        let tables = self.tables()?;
        tables
            .questions
            .get(&id)
            .map(|row| tables.resolve(id, row))
            .transpose()
    }

    async fn questions(&mut self, filter: &QuestionFilter) -> StorageResult<Vec<Question>> {
        let tables = self.tables()?;
        tables
            .questions
            .iter()
            .filter(|(_, row)| Tables::question_matches(row, filter))
            .map(|(id, row)| tables.resolve(*id, row))
            .collect()
    }

    async fn questions_exist(&mut self, filter: &QuestionFilter) -> StorageResult<bool> {
        Ok(self
            .tables()?
            .questions
            .values()
            .any(|row| Tables::question_matches(row, filter)))
    }

    async fn insert_question(&mut self, draft: &QuestionDraft) -> StorageResult<Question> {
        let tables = self.tables()?;
        tables.check_references(draft)?;
        let id = Tables::allocate(&mut tables.next_question_id);
        tables.questions.insert(id, draft.clone());
        tables.resolve(id, draft)
    }

    async fn update_question(&mut self, id: i64, draft: &QuestionDraft) -> StorageResult<Question> {
        let tables = self.tables()?;
        tables.check_references(draft)?;
        let stored = tables
            .questions
            .get_mut(&id)
            .ok_or(StorageError::RowMissing { table: "questions", id })?;
        *stored = draft.clone();
        tables.resolve(id, draft)
    }

    async fn delete_question(&mut self, id: i64) -> StorageResult<()> {
        self.tables()?
            .questions
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::RowMissing { table: "questions", id })
    }

    async fn commit(&mut self) -> StorageResult<()> {
        let mut guard = self.guard.take().ok_or(StorageError::TransactionClosed)?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(&mut self) -> StorageResult<()> {
        self.guard.take().ok_or(StorageError::TransactionClosed)?;
        self.working = Tables::default();
        Ok(())
    }
}
