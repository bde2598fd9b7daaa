// tests/postgres_store_tests.rs
//
// These tests need a running PostgreSQL instance:
//   DATABASE_URL=postgres://... cargo test -- --ignored

use std::sync::Arc;

use quizbank::{
    models::{
        category::NewCategory,
        question::{NewQuestion, QuestionChanges},
        quiz::NewQuiz,
    },
    services::{CategoryService, ErrorKind, QuestionService, QuizService},
    storage::{PgStore, QuizStore},
};

async fn store() -> Arc<dyn QuizStore> {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PgStore::connect(&database_url, 1, 0)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");
    store.migrate().await.expect("Failed to migrate database");
    Arc::new(store)
}

/// A title no other test run will use.
fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn question_lifecycle_against_postgres() {
    let store = store().await;
    let categories = CategoryService::new(store.clone());
    let quizzes = QuizService::new(store.clone());
    let questions = QuestionService::new(store);

    let category = categories
        .create(NewCategory {
            title: unique("cat"),
        })
        .await
        .unwrap();
    let quiz = quizzes
        .create(NewQuiz {
            title: unique("quiz"),
            description: Some("postgres run".to_string()),
        })
        .await
        .unwrap();

    let question = questions
        .create(
            quiz.id,
            NewQuestion {
                category_id: Some(category.id),
                text: "100% sure?".to_string(),
                description: None,
                options: vec!["Yes".to_string(), "No".to_string()],
                correct_answer: "Yes".to_string(),
                explanation: Some("Trust me".to_string()),
                difficulty: Some("easy".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(question.quiz_title, quiz.title);
    assert_eq!(question.category_title, category.title);

    // '%' must be matched literally.
    let found = questions.search_by_text("100%").await.unwrap();
    assert!(found.iter().any(|q| q.id == question.id));

    let updated = questions
        .update(
            question.id,
            QuestionChanges {
                options: Some(vec!["X".into(), "Y".into(), "Z".into()]),
                correct_answer: Some("Y".into()),
                explanation: Some(None),
                ..QuestionChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.options, ["X", "Y", "Z"]);
    assert_eq!(updated.explanation, None);
    assert_eq!(questions.get(question.id).await.unwrap(), updated);

    let err = quizzes.delete(quiz.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let err = categories.delete(category.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    questions.delete(question.id).await.unwrap();
    quizzes.delete(quiz.id).await.unwrap();
    categories.delete(category.id).await.unwrap();
    assert_eq!(
        quizzes.get(quiz.id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn failed_validation_leaves_no_row_behind() {
    let store = store().await;
    let quizzes = QuizService::new(store.clone());
    let questions = QuestionService::new(store);

    let quiz = quizzes
        .create(NewQuiz {
            title: unique("quiz"),
            description: None,
        })
        .await
        .unwrap();

    let err = questions
        .create(
            quiz.id,
            NewQuestion {
                category_id: Some(i64::MAX),
                text: "Orphan".to_string(),
                description: None,
                options: vec!["A".to_string(), "B".to_string()],
                correct_answer: "A".to_string(),
                explanation: None,
                difficulty: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(questions.list_for_quiz(quiz.id).await.unwrap().is_empty());

    quizzes.delete(quiz.id).await.unwrap();
}
