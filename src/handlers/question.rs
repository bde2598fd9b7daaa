// src/handlers/question.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use super::JsonBody;
use crate::{
    error::AppError,
    models::question::{
        CheckAnswerRequest, CheckAnswerResponse, CreateQuestionRequest, QuestionChanges,
        SearchParams,
    },
    services::QuestionService,
};

pub async fn list_questions(
    State(service): State<QuestionService>,
) -> Result<impl IntoResponse, AppError> {
    let questions = service.list().await?;
    Ok(Json(questions))
}

/// Searches question text and description. `text` must not be blank.
pub async fn search_questions(
    State(service): State<QuestionService>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;

    let questions = service.search_by_text(&params.text).await?;
    Ok(Json(questions))
}

pub async fn get_question(
    State(service): State<QuestionService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = service.get(id).await?;
    Ok(Json(question))
}

pub async fn create_question(
    State(service): State<QuestionService>,
    JsonBody(payload): JsonBody<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = service.create(payload.quiz_id, payload.question).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// Serves both PUT and PATCH: every field is optional.
pub async fn update_question(
    State(service): State<QuestionService>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<QuestionChanges>,
) -> Result<impl IntoResponse, AppError> {
    let question = service.update(id, payload).await?;
    Ok(Json(question))
}

pub async fn delete_question(
    State(service): State<QuestionService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check_answer(
    State(service): State<QuestionService>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<CheckAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let is_correct = service.check_answer(id, &payload.answer).await?;
    Ok(Json(CheckAnswerResponse {
        question_id: id,
        is_correct,
    }))
}

pub async fn list_quiz_questions(
    State(service): State<QuestionService>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions = service.list_for_quiz(quiz_id).await?;
    Ok(Json(questions))
}

pub async fn random_question(
    State(service): State<QuestionService>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = service.random_question_from_quiz(quiz_id).await?;
    Ok(Json(question))
}
