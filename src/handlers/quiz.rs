// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::JsonBody;
use crate::{
    error::AppError,
    models::quiz::{NewQuiz, QuizChanges, QuizListParams, ReplaceQuizRequest},
    services::QuizService,
};

/// Lists quizzes by title. A non-empty `title` parameter turns the listing
/// into a case-insensitive title search.
pub async fn list_quizzes(
    State(service): State<QuizService>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = match params.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => service.search_by_title(title).await?,
        _ => service.list().await?,
    };
    Ok(Json(quizzes))
}

pub async fn get_quiz(
    State(service): State<QuizService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = service.get(id).await?;
    Ok(Json(quiz))
}

pub async fn create_quiz(
    State(service): State<QuizService>,
    JsonBody(payload): JsonBody<NewQuiz>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Full replacement (PUT). Omitting `description` clears it.
pub async fn replace_quiz(
    State(service): State<QuizService>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<ReplaceQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = service.update(id, payload.into()).await?;
    Ok(Json(quiz))
}

pub async fn patch_quiz(
    State(service): State<QuizService>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<QuizChanges>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = service.update(id, payload).await?;
    Ok(Json(quiz))
}

pub async fn delete_quiz(
    State(service): State<QuizService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
