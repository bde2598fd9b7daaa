// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    services::{CategoryService, QuestionService, QuizService},
    storage::QuizStore,
};

#[derive(Clone)]
pub struct AppState {
    pub categories: CategoryService,
    pub quizzes: QuizService,
    pub questions: QuestionService,
}

impl AppState {
    /// Builds every service on top of one shared store.
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self {
            categories: CategoryService::new(store.clone()),
            quizzes: QuizService::new(store.clone()),
            questions: QuestionService::new(store),
        }
    }
}

impl FromRef<AppState> for CategoryService {
    fn from_ref(state: &AppState) -> Self {
        state.categories.clone()
    }
}

impl FromRef<AppState> for QuizService {
    fn from_ref(state: &AppState) -> Self {
        state.quizzes.clone()
    }
}

impl FromRef<AppState> for QuestionService {
    fn from_ref(state: &AppState) -> Self {
        state.questions.clone()
    }
}
