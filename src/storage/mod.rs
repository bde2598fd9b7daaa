// src/storage/mod.rs

//! Persistence boundary. Every access goes through a [`StoreTx`] obtained
//! from [`QuizStore::begin`]; a transaction dropped without [`StoreTx::commit`]
//! is rolled back.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    category::{Category, CategoryFilter},
    question::{Question, QuestionDraft, QuestionFilter},
    quiz::{Quiz, QuizDraft},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{table} row with id={id} is missing")]
    RowMissing { table: &'static str, id: i64 },

    #[error("{table} row with id={id} is still referenced")]
    StillReferenced { table: &'static str, id: i64 },

    #[error("invalid stored value: {0}")]
    Corrupt(String),

    #[error("transaction already finished")]
    TransactionClosed,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Handle to a storage backend shared by all services.
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn begin(&self) -> StorageResult<Box<dyn StoreTx>>;
}

/// One atomic unit of work over categories, quizzes, and questions.
#[async_trait]
pub trait StoreTx: Send {
    async fn category(&mut self, id: i64) -> StorageResult<Option<Category>>;
    /// Ordered by id, or by title when requested. `filter.title` is matched
    /// case-insensitively as a substring. Title order follows the backend's
    /// collation; the memory store folds case first.
    async fn categories(&mut self, filter: &CategoryFilter) -> StorageResult<Vec<Category>>;
    async fn category_title_taken(&mut self, title: &str) -> StorageResult<bool>;
    async fn insert_category(&mut self, title: &str) -> StorageResult<Category>;
    async fn update_category(&mut self, category: &Category) -> StorageResult<Category>;
    async fn delete_category(&mut self, id: i64) -> StorageResult<()>;

    async fn quiz(&mut self, id: i64) -> StorageResult<Option<Quiz>>;
    /// Ordered by title (see [`StoreTx::categories`] on collation), then id.
    async fn quizzes(&mut self, title_contains: Option<&str>) -> StorageResult<Vec<Quiz>>;
    async fn insert_quiz(&mut self, draft: &QuizDraft) -> StorageResult<Quiz>;
    async fn update_quiz(&mut self, id: i64, draft: &QuizDraft) -> StorageResult<Quiz>;
    async fn delete_quiz(&mut self, id: i64) -> StorageResult<()>;

    async fn question(&mut self, id: i64) -> StorageResult<Option<Question>>;
    /// Ordered by id.
    async fn questions(&mut self, filter: &QuestionFilter) -> StorageResult<Vec<Question>>;
    async fn questions_exist(&mut self, filter: &QuestionFilter) -> StorageResult<bool>;
    async fn insert_question(&mut self, draft: &QuestionDraft) -> StorageResult<Question>;
    async fn update_question(&mut self, id: i64, draft: &QuestionDraft) -> StorageResult<Question>;
    async fn delete_question(&mut self, id: i64) -> StorageResult<()>;

    async fn commit(&mut self) -> StorageResult<()>;
    async fn rollback(&mut self) -> StorageResult<()>;
}
