// src/handlers/category.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::JsonBody;
use crate::{
    error::AppError,
    models::category::{CategoryChanges, CategoryFilter, NewCategory},
    services::CategoryService,
};

/// Lists categories, optionally filtered by title and sorted by `order`.
pub async fn list_categories(
    State(service): State<CategoryService>,
    Query(filter): Query<CategoryFilter>,
) -> Result<impl IntoResponse, AppError> {
    let categories = service.list(&filter).await?;
    Ok(Json(categories))
}

pub async fn get_category(
    State(service): State<CategoryService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let category = service.get(id).await?;
    Ok(Json(category))
}

pub async fn create_category(
    State(service): State<CategoryService>,
    JsonBody(payload): JsonBody<NewCategory>,
) -> Result<impl IntoResponse, AppError> {
    let category = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Full replacement (PUT): the title must be present.
pub async fn replace_category(
    State(service): State<CategoryService>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<CategoryChanges>,
) -> Result<impl IntoResponse, AppError> {
    let category = service.update(id, payload, false).await?;
    Ok(Json(category))
}

pub async fn patch_category(
    State(service): State<CategoryService>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<CategoryChanges>,
) -> Result<impl IntoResponse, AppError> {
    let category = service.update(id, payload, true).await?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(service): State<CategoryService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
