// src/services/category.rs

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{ServiceError, ServiceResult, StorageContext, begin, require_category};
use crate::{
    models::{
        category::{Category, CategoryChanges, CategoryFilter, NewCategory},
        question::QuestionFilter,
    },
    storage::QuizStore,
    validation::{self, RuleViolation},
};

/// CRUD over categories.
#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn QuizStore>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self { store }
    }

    /// Lists categories by id (or by title), optionally narrowed to titles
    /// containing `filter.title`. A blank title filter is ignored.
    pub async fn list(&self, filter: &CategoryFilter) -> ServiceResult<Vec<Category>> {
        let filter = CategoryFilter {
            title: filter
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            order: filter.order,
        };

        let mut tx = begin(self.store.as_ref()).await?;
        tx.categories(&filter).await.during("list categories")
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Category> {
        let mut tx = begin(self.store.as_ref()).await?;
        require_category(&mut *tx, id).await
    }

    /// Creates a category. A category with the same trimmed title is rejected.
    ///
    /// The title check and the insert share a transaction, but nothing in the
    /// schema enforces uniqueness, so two concurrent creates can still both
    /// succeed.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewCategory) -> ServiceResult<Category> {
        let title = validation::category_title(&input.title)?;

        let mut tx = begin(self.store.as_ref()).await?;
        if tx
            .category_title_taken(&title)
            .await
            .during("check category title")?
        {
            return Err(RuleViolation::new(
                "title",
                format!("category with title \"{title}\" already exists"),
            )
            .into());
        }

        let category = tx.insert_category(&title).await.during("insert category")?;
        tx.commit().await.during("commit category")?;

        info!(category_id = category.id, "category created");
        Ok(category)
    }

    /// Updates the title. With `partial == false` the title must be supplied.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: i64,
        changes: CategoryChanges,
        partial: bool,
    ) -> ServiceResult<Category> {
        let mut tx = begin(self.store.as_ref()).await?;
        let mut category = require_category(&mut *tx, id).await?;

        match changes.title {
            Some(title) => category.title = validation::category_title(&title)?,
            None if !partial => {
                return Err(RuleViolation::new("title", "title is required").into());
            }
            None => {}
        }

        let category = tx
            .update_category(&category)
            .await
            .during("update category")?;
        tx.commit().await.during("commit category")?;

        info!(category_id = id, "category updated");
        Ok(category)
    }

    /// Deletes a category that no question refers to.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let mut tx = begin(self.store.as_ref()).await?;
        require_category(&mut *tx, id).await?;

        if tx
            .questions_exist(&QuestionFilter::for_category(id))
            .await
            .during("check category questions")?
        {
            warn!(category_id = id, "refusing to delete category with questions");
            return Err(ServiceError::Conflict(
                "cannot delete category with linked questions".to_string(),
            ));
        }

        tx.delete_category(id).await.during("delete category")?;
        tx.commit().await.during("commit category deletion")?;

        info!(category_id = id, "category deleted");
        Ok(())
    }
}
