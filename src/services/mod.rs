// src/services/mod.rs

//! Validation and orchestration for each entity kind, between the HTTP
//! handlers and the store.

pub mod category;
pub mod question;
pub mod quiz;

use std::fmt;

use thiserror::Error;

use crate::{
    models::{category::Category, question::Question, quiz::Quiz},
    storage::{QuizStore, StorageError, StorageResult, StoreTx},
    validation::RuleViolation,
};

pub use category::CategoryService;
pub use question::QuestionService;
pub use quiz::QuizService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Category,
    Quiz,
    Question,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Category => "Category",
            Entity::Quiz => "Quiz",
            Entity::Question => "Question",
        })
    }
}

/// Coarse classification of a [`ServiceError`], used by callers that only
/// care about how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Storage,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} with id={id} not found")]
    NotFound { entity: Entity, id: i64 },

    /// A record referenced by the input (not the one addressed) is missing.
    #[error("required objects not found: {entity} with id={id} not found")]
    RelatedNotFound { entity: Entity, id: i64 },

    #[error("no questions in quiz with id={0}")]
    EmptyQuiz(i64),

    #[error(transparent)]
    Validation(#[from] RuleViolation),

    #[error("{0}")]
    Conflict(String),

    #[error("storage failure while trying to {operation}")]
    Storage {
        operation: &'static str,
        #[source]
        source: StorageError,
    },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound { .. }
            | ServiceError::RelatedNotFound { .. }
            | ServiceError::EmptyQuiz(_) => ErrorKind::NotFound,
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Storage { .. } => ErrorKind::Storage,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Attaches the operation in flight to a storage failure.
pub(crate) trait StorageContext<T> {
    fn during(self, operation: &'static str) -> ServiceResult<T>;
}

impl<T> StorageContext<T> for StorageResult<T> {
    fn during(self, operation: &'static str) -> ServiceResult<T> {
        self.map_err(|source| ServiceError::Storage { operation, source })
    }
}

pub(crate) async fn begin(store: &dyn QuizStore) -> ServiceResult<Box<dyn StoreTx>> {
    store.begin().await.during("begin transaction")
}

pub(crate) async fn require_category(tx: &mut dyn StoreTx, id: i64) -> ServiceResult<Category> {
    tx.category(id)
        .await
        .during("load category")?
        .ok_or(ServiceError::NotFound {
            entity: Entity::Category,
            id,
        })
}

pub(crate) async fn require_quiz(tx: &mut dyn StoreTx, id: i64) -> ServiceResult<Quiz> {
    tx.quiz(id)
        .await
        .during("load quiz")?
        .ok_or(ServiceError::NotFound {
            entity: Entity::Quiz,
            id,
        })
}

pub(crate) async fn require_question(tx: &mut dyn StoreTx, id: i64) -> ServiceResult<Question> {
    tx.question(id)
        .await
        .during("load question")?
        .ok_or(ServiceError::NotFound {
            entity: Entity::Question,
            id,
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::storage::{MemoryStore, QuizStore, StorageError, StorageResult, StoreTx};

    pub fn memory_store() -> Arc<dyn QuizStore> {
        Arc::new(MemoryStore::new())
    }

    /// A store whose backend is unreachable.
    pub struct UnavailableStore;

    #[async_trait]
    impl QuizStore for UnavailableStore {
        async fn begin(&self) -> StorageResult<Box<dyn StoreTx>> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
    }
}
