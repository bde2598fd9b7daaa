// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{category, question, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Nests the category, quiz and question routers under `/api`.
/// * Applies global middleware (Trace, CORS).
/// * Injects the shared services.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    let category_routes = Router::new()
        .route(
            "/",
            get(category::list_categories).post(category::create_category),
        )
        .route(
            "/{id}",
            get(category::get_category)
                .put(category::replace_category)
                .patch(category::patch_category)
                .delete(category::delete_category),
        );

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes).post(quiz::create_quiz))
        .route(
            "/{id}",
            get(quiz::get_quiz)
                .put(quiz::replace_quiz)
                .patch(quiz::patch_quiz)
                .delete(quiz::delete_quiz),
        )
        .route("/{id}/questions", get(question::list_quiz_questions))
        .route("/{id}/random-question", get(question::random_question));

    let question_routes = Router::new()
        .route(
            "/",
            get(question::list_questions).post(question::create_question),
        )
        .route("/search", get(question::search_questions))
        .route(
            "/{id}",
            get(question::get_question)
                .put(question::update_question)
                .patch(question::update_question)
                .delete(question::delete_question),
        )
        .route("/{id}/check", post(question::check_answer));

    Router::new()
        .nest("/api/categories", category_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/questions", question_routes)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
