// src/storage/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    PgConnection, PgPool, Postgres, QueryBuilder, Transaction, postgres::PgPoolOptions,
    prelude::FromRow, types::Json,
};

use super::{QuizStore, StorageError, StorageResult, StoreTx};
use crate::models::{
    category::{Category, CategoryFilter, CategoryOrder},
    question::{Question, QuestionDraft, QuestionFilter},
    quiz::{Quiz, QuizDraft},
};

/// Questions joined with the titles of their quiz and category.
const QUESTION_SELECT: &str = r#"
    SELECT
        q.id, q.quiz_id, z.title AS quiz_title, q.category_id, c.title AS category_title,
        q.text, q.description, q.options, q.correct_answer, q.explanation, q.difficulty
    FROM questions q
    JOIN quizzes z ON z.id = q.quiz_id
    JOIN categories c ON c.id = q.category_id
"#;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database, retrying every 2s up to `retries` times.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        retries: u32,
    ) -> StorageResult<Self> {
        let mut retry_count = 0;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(Duration::from_secs(3))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) if retry_count < retries => {
                    retry_count += 1;
                    tracing::warn!(
                        "Database not ready, retrying in 2s... (Attempt {}): {}",
                        retry_count,
                        e
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!("Database connected...");
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations from `./migrations`.
    pub async fn migrate(&self) -> StorageResult<()> {
        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations applied successfully.");
        Ok(())
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn begin(&self) -> StorageResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx: Some(tx) }))
    }
}

/// Helper struct for decoding joined question rows.
#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    quiz_id: i64,
    quiz_title: String,
    category_id: i64,
    category_title: String,
    text: String,
    description: Option<String>,
    options: Json<Vec<String>>,
    correct_answer: String,
    explanation: Option<String>,
    difficulty: String,
}

impl TryFrom<QuestionRow> for Question {
    type Error = StorageError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let difficulty = row
            .difficulty
            .parse()
            .map_err(|e| StorageError::Corrupt(format!("question {}: {}", row.id, e)))?;

        Ok(Question {
            id: row.id,
            quiz_id: row.quiz_id,
            quiz_title: row.quiz_title,
            category_id: row.category_id,
            category_title: row.category_title,
            text: row.text,
            description: row.description,
            options: row.options.0,
            correct_answer: row.correct_answer,
            explanation: row.explanation,
            difficulty,
        })
    }
}

/// Builds an `ILIKE` pattern matching `needle` anywhere, with wildcards escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn push_question_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &QuestionFilter) {
    builder.push(" WHERE TRUE");

    if let Some(quiz_id) = filter.quiz_id {
        builder.push(" AND q.quiz_id = ").push_bind(quiz_id);
    }

    if let Some(category_id) = filter.category_id {
        builder.push(" AND q.category_id = ").push_bind(category_id);
    }

    if let Some(text) = &filter.text_contains {
        let pattern = like_pattern(text);
        builder
            .push(" AND (q.text ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR q.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

struct PgTx {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgTx {
    fn conn(&mut self) -> StorageResult<&mut PgConnection> {
        self.tx.as_deref_mut().ok_or(StorageError::TransactionClosed)
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn category(&mut self, id: i64) -> StorageResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, title FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(self.conn()?)
                .await?;
        Ok(category)
    }

    async fn categories(&mut self, filter: &CategoryFilter) -> StorageResult<Vec<Category>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, title FROM categories");

        if let Some(title) = &filter.title {
            builder.push(" WHERE title ILIKE ").push_bind(like_pattern(title));
        }

        builder.push(match filter.order {
            CategoryOrder::Id => " ORDER BY id",
            CategoryOrder::Title => " ORDER BY title, id",
        });

        let categories = builder
            .build_query_as::<Category>()
            .fetch_all(self.conn()?)
            .await?;
        Ok(categories)
    }

    async fn category_title_taken(&mut self, title: &str) -> StorageResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE title = $1)",
        )
        .bind(title)
        .fetch_one(self.conn()?)
        .await?;
        Ok(taken)
    }

    async fn insert_category(&mut self, title: &str) -> StorageResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (title) VALUES ($1) RETURNING id, title",
        )
        .bind(title)
        .fetch_one(self.conn()?)
        .await?;
        Ok(category)
    }

    async fn update_category(&mut self, category: &Category) -> StorageResult<Category> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET title = $1 WHERE id = $2 RETURNING id, title",
        )
        .bind(category.title.as_str())
        .bind(category.id)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or(StorageError::RowMissing {
            table: "categories",
            id: category.id,
        })
    }

    async fn delete_category(&mut self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::RowMissing {
                table: "categories",
                id,
            });
        }
        Ok(())
    }

    async fn quiz(&mut self, id: i64) -> StorageResult<Option<Quiz>> {
        let quiz =
            sqlx::query_as::<_, Quiz>("SELECT id, title, description FROM quizzes WHERE id = $1")
                .bind(id)
                .fetch_optional(self.conn()?)
                .await?;
        Ok(quiz)
    }

    async fn quizzes(&mut self, title_contains: Option<&str>) -> StorageResult<Vec<Quiz>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, title, description FROM quizzes");

        if let Some(title) = title_contains {
            builder.push(" WHERE title ILIKE ").push_bind(like_pattern(title));
        }
        builder.push(" ORDER BY title, id");

        let quizzes = builder
            .build_query_as::<Quiz>()
            .fetch_all(self.conn()?)
            .await?;
        Ok(quizzes)
    }

    async fn insert_quiz(&mut self, draft: &QuizDraft) -> StorageResult<Quiz> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (title, description)
            VALUES ($1, $2)
            RETURNING id, title, description
            "#,
        )
        .bind(draft.title.as_str())
        .bind(draft.description.as_deref())
        .fetch_one(self.conn()?)
        .await?;
        Ok(quiz)
    }

    async fn update_quiz(&mut self, id: i64, draft: &QuizDraft) -> StorageResult<Quiz> {
        sqlx::query_as::<_, Quiz>(
            r#"
            UPDATE quizzes SET title = $1, description = $2
            WHERE id = $3
            RETURNING id, title, description
            "#,
        )
        .bind(draft.title.as_str())
        .bind(draft.description.as_deref())
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or(StorageError::RowMissing { table: "quizzes", id })
    }

    async fn delete_quiz(&mut self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::RowMissing { table: "quizzes", id });
        }
        Ok(())
    }

    async fn question(&mut self, id: i64) -> StorageResult<Option<Question>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(QUESTION_SELECT);
        builder.push(" WHERE q.id = ").push_bind(id);

        builder
            .build_query_as::<QuestionRow>()
            .fetch_optional(self.conn()?)
            .await?
            .map(Question::try_from)
            .transpose()
    }

    async fn questions(&mut self, filter: &QuestionFilter) -> StorageResult<Vec<Question>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(QUESTION_SELECT);
        push_question_filter(&mut builder, filter);
        builder.push(" ORDER BY q.id");

        builder
            .build_query_as::<QuestionRow>()
            .fetch_all(self.conn()?)
            .await?
            .into_iter()
            .map(Question::try_from)
            .collect()
    }

    async fn questions_exist(&mut self, filter: &QuestionFilter) -> StorageResult<bool> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT EXISTS(SELECT 1 FROM questions q");
        push_question_filter(&mut builder, filter);
        builder.push(")");

        let exists = builder
            .build_query_scalar::<bool>()
            .fetch_one(self.conn()?)
            .await?;
        Ok(exists)
    }

    async fn insert_question(&mut self, draft: &QuestionDraft) -> StorageResult<Question> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO questions
            (quiz_id, category_id, text, description, options, correct_answer, explanation, difficulty)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(draft.quiz_id)
        .bind(draft.category_id)
        .bind(draft.text.as_str())
        .bind(draft.description.as_deref())
        .bind(Json(draft.options.clone()))
        .bind(draft.correct_answer.as_str())
        .bind(draft.explanation.as_deref())
        .bind(draft.difficulty.as_str())
        .fetch_one(self.conn()?)
        .await?;

        self.question(id)
            .await?
            .ok_or(StorageError::RowMissing { table: "questions", id })
    }

    async fn update_question(&mut self, id: i64, draft: &QuestionDraft) -> StorageResult<Question> {
        let result = sqlx::query(
            r#"
            UPDATE questions SET
                quiz_id = $1, category_id = $2, text = $3, description = $4,
                options = $5, correct_answer = $6, explanation = $7, difficulty = $8
            WHERE id = $9
            "#,
        )
        .bind(draft.quiz_id)
        .bind(draft.category_id)
        .bind(draft.text.as_str())
        .bind(draft.description.as_deref())
        .bind(Json(draft.options.clone()))
        .bind(draft.correct_answer.as_str())
        .bind(draft.explanation.as_deref())
        .bind(draft.difficulty.as_str())
        .bind(id)
        .execute(self.conn()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::RowMissing { table: "questions", id });
        }

        self.question(id)
            .await?
            .ok_or(StorageError::RowMissing { table: "questions", id })
    }

    async fn delete_question(&mut self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::RowMissing { table: "questions", id });
        }
        Ok(())
    }

    async fn commit(&mut self) -> StorageResult<()> {
        let tx = self.tx.take().ok_or(StorageError::TransactionClosed)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> StorageResult<()> {
        let tx = self.tx.take().ok_or(StorageError::TransactionClosed)?;
        tx.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
