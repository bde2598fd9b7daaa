// src/models/category.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'categories' table in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
}

/// Sort order for category listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryOrder {
    #[default]
    Id,
    /// Alphabetical browsing.
    Title,
}

/// Query parameters for listing categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    #[serde(default)]
    pub order: CategoryOrder,
}

/// DTO for creating a category, also used for full replacement (PUT).
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub title: String,
}

/// DTO for updating a category. With a partial update the title may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryChanges {
    pub title: Option<String>,
}
