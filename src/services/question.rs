// src/services/question.rs

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, instrument};

use super::{
    Entity, ServiceError, ServiceResult, StorageContext, begin, require_question, require_quiz,
};
use crate::{
    models::question::{
        Difficulty, NewQuestion, Question, QuestionChanges, QuestionDraft, QuestionFilter,
    },
    storage::{QuizStore, StoreTx},
    validation::{self, RuleViolation},
};

/// Questions, their consistency rules, search, random pick and answer checks.
#[derive(Clone)]
pub struct QuestionService {
    store: Arc<dyn QuizStore>,
}

impl QuestionService {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self { store }
    }

    /// All questions ordered by id.
    pub async fn list(&self) -> ServiceResult<Vec<Question>> {
        let mut tx = begin(self.store.as_ref()).await?;
        tx.questions(&QuestionFilter::default())
            .await
            .during("list questions")
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Question> {
        let mut tx = begin(self.store.as_ref()).await?;
        require_question(&mut *tx, id).await
    }

    /// Questions whose text or description contains `text`, ignoring case.
    /// Blank input matches nothing.
    pub async fn search_by_text(&self, text: &str) -> ServiceResult<Vec<Question>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = begin(self.store.as_ref()).await?;
        tx.questions(&QuestionFilter::matching_text(text))
            .await
            .during("search questions")
    }

    pub async fn list_for_quiz(&self, quiz_id: i64) -> ServiceResult<Vec<Question>> {
        let mut tx = begin(self.store.as_ref()).await?;
        require_quiz(&mut *tx, quiz_id).await?;
        tx.questions(&QuestionFilter::for_quiz(quiz_id))
            .await
            .during("list quiz questions")
    }

    /// Validates `input` and adds it to quiz `quiz_id`.
    ///
    /// Checks run in a fixed order so the first failing rule is the one
    /// reported: quiz, category, text, description, correct answer, options,
    /// difficulty, explanation.
    #[instrument(skip(self, input))]
    pub async fn create(&self, quiz_id: i64, input: NewQuestion) -> ServiceResult<Question> {
        let mut tx = begin(self.store.as_ref()).await?;
        require_quiz(&mut *tx, quiz_id).await?;

        let category_id = input
            .category_id
            .ok_or_else(|| RuleViolation::new("category_id", "category required"))?;
        resolve_category(&mut *tx, category_id).await?;

        let text = validation::question_text(&input.text)?;
        let description = validation::question_description(input.description.as_deref())?;
        validation::correct_answer(&input.correct_answer)?;
        validation::options(&input.options)?;
        validation::answer_in_options(&input.correct_answer, &input.options)?;
        let difficulty = match input.difficulty.as_deref() {
            Some(value) => validation::difficulty(value)?,
            None => Difficulty::default(),
        };
        let explanation = validation::explanation(input.explanation.as_deref())?;

        let draft = QuestionDraft {
            quiz_id,
            category_id,
            text,
            description,
            options: input.options,
            correct_answer: input.correct_answer,
            explanation,
            difficulty,
        };
        let question = tx
            .insert_question(&draft)
            .await
            .during("insert question")?;
        tx.commit().await.during("commit question")?;

        info!(question_id = question.id, quiz_id, "question created");
        Ok(question)
    }

    /// Applies the supplied fields on top of the stored question.
    ///
    /// Whenever `options` or `correct_answer` is supplied, the answer is
    /// checked against the options that will be stored after this call.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: i64, changes: QuestionChanges) -> ServiceResult<Question> {
        let mut tx = begin(self.store.as_ref()).await?;
        let mut draft = require_question(&mut *tx, id).await?.to_draft();

        if let Some(quiz_id) = changes.quiz_id {
            resolve_quiz(&mut *tx, quiz_id).await?;
            draft.quiz_id = quiz_id;
        }
        if let Some(category_id) = changes.category_id {
            resolve_category(&mut *tx, category_id).await?;
            draft.category_id = category_id;
        }
        if let Some(text) = changes.text {
            draft.text = validation::question_text(&text)?;
        }
        if let Some(description) = changes.description {
            draft.description = validation::question_description(description.as_deref())?;
        }

        let answer_touched = changes.options.is_some() || changes.correct_answer.is_some();
        if let Some(options) = changes.options {
            validation::options(&options)?;
            draft.options = options;
        }
        if let Some(answer) = changes.correct_answer {
            validation::correct_answer(&answer)?;
            draft.correct_answer = answer;
        }
        if answer_touched {
            validation::answer_in_options(&draft.correct_answer, &draft.options)?;
        }

        if let Some(difficulty) = changes.difficulty {
            draft.difficulty = validation::difficulty(&difficulty)?;
        }
        if let Some(explanation) = changes.explanation {
            draft.explanation = validation::explanation(explanation.as_deref())?;
        }

        let question = tx
            .update_question(id, &draft)
            .await
            .during("update question")?;
        tx.commit().await.during("commit question")?;

        info!(question_id = id, "question updated");
        Ok(question)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let mut tx = begin(self.store.as_ref()).await?;
        require_question(&mut *tx, id).await?;
        tx.delete_question(id).await.during("delete question")?;
        tx.commit().await.during("commit question deletion")?;

        info!(question_id = id, "question deleted");
        Ok(())
    }

    /// Compares `answer` with the stored correct answer, ignoring case and
    /// surrounding whitespace.
    pub async fn check_answer(&self, id: i64, answer: &str) -> ServiceResult<bool> {
        let question = self.get(id).await?;
        let correct = validation::answers_match(&question.correct_answer, answer);
        debug!(question_id = id, correct, "answer checked");
        Ok(correct)
    }

    /// Picks one question of the quiz uniformly at random.
    pub async fn random_question_from_quiz(&self, quiz_id: i64) -> ServiceResult<Question> {
        let mut questions = self.list_for_quiz(quiz_id).await?;
        if questions.is_empty() {
            return Err(ServiceError::EmptyQuiz(quiz_id));
        }

        let index = rand::rng().random_range(0..questions.len());
        Ok(questions.swap_remove(index))
    }
}

async fn resolve_category(tx: &mut dyn StoreTx, id: i64) -> ServiceResult<()> {
    match tx.category(id).await.during("load category")? {
        Some(_) => Ok(()),
        None => Err(ServiceError::RelatedNotFound {
            entity: Entity::Category,
            id,
        }),
    }
}

async fn resolve_quiz(tx: &mut dyn StoreTx, id: i64) -> ServiceResult<()> {
    match tx.quiz(id).await.during("load quiz")? {
        Some(_) => Ok(()),
        None => Err(ServiceError::RelatedNotFound {
            entity: Entity::Quiz,
            id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        models::{category::NewCategory, quiz::NewQuiz},
        services::{CategoryService, ErrorKind, QuizService, test_support::memory_store},
    };

    struct Fixture {
        questions: QuestionService,
        quiz_id: i64,
        category_id: i64,
    }

    async fn fixture() -> Fixture {
        let store = memory_store();
        let quiz = QuizService::new(store.clone())
            .create(NewQuiz {
                title: "Geography".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let category = CategoryService::new(store.clone())
            .create(NewCategory {
                title: "Capitals".to_string(),
            })
            .await
            .unwrap();
        Fixture {
            questions: QuestionService::new(store),
            quiz_id: quiz.id,
            category_id: category.id,
        }
    }

    fn question(category_id: i64, text: &str, options: &[&str], answer: &str) -> NewQuestion {
        NewQuestion {
            category_id: Some(category_id),
            text: text.to_string(),
            description: None,
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: answer.to_string(),
            explanation: None,
            difficulty: None,
        }
    }

    #[tokio::test]
    async fn create_resolves_titles_and_defaults_difficulty() {
        let f = fixture().await;

        let created = f
            .questions
            .create(
                f.quiz_id,
                question(f.category_id, "  Capital of France? ", &["Paris", "Lyon"], "Paris"),
            )
            .await
            .unwrap();

        assert_eq!(created.text, "Capital of France?");
        assert_eq!(created.quiz_title, "Geography");
        assert_eq!(created.category_title, "Capitals");
        assert_eq!(created.difficulty, Difficulty::Medium);
        assert_eq!(f.questions.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn answer_outside_options_is_rejected_and_nothing_is_stored() {
        let f = fixture().await;

        let err = f
            .questions
            .create(f.quiz_id, question(f.category_id, "Pick", &["A", "B"], "C"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("one of the options"));
        assert!(f.questions.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_quiz_wins_over_missing_category() {
        let f = fixture().await;

        let err = f
            .questions
            .create(999, question(998, "Pick", &["A", "B"], "A"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Quiz with id=999 not found");

        let err = f
            .questions
            .create(f.quiz_id, question(998, "Pick", &["A", "B"], "A"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("required objects not found"));

        let mut no_category = question(f.category_id, "Pick", &["A", "B"], "A");
        no_category.category_id = None;
        let err = f.questions.create(f.quiz_id, no_category).await.unwrap_err();
        assert_eq!(err.to_string(), "category_id: category required");
    }

    #[tokio::test]
    async fn create_checks_rules_in_order() {
        let f = fixture().await;

        // Blank text and a bad answer: text is reported first.
        let err = f
            .questions
            .create(f.quiz_id, question(f.category_id, " ", &["A", "B"], "Z"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("text:"));

        let err = f
            .questions
            .create(f.quiz_id, question(f.category_id, "Pick", &["A", "B"], " "))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "correct_answer: correct answer is required");

        let err = f
            .questions
            .create(f.quiz_id, question(f.category_id, "Pick", &["A"], "A"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("options:"));

        let mut bad_difficulty = question(f.category_id, "Pick", &["A", "B"], "A");
        bad_difficulty.difficulty = Some("extreme".to_string());
        bad_difficulty.explanation = Some("x".repeat(300));
        let err = f
            .questions
            .create(f.quiz_id, bad_difficulty)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("easy, medium, hard"));
    }

    #[tokio::test]
    async fn updating_options_and_answer_together_keeps_invariant() {
        let f = fixture().await;
        let q = f
            .questions
            .create(f.quiz_id, question(f.category_id, "Pick", &["A", "B"], "A"))
            .await
            .unwrap();

        let updated = f
            .questions
            .update(
                q.id,
                QuestionChanges {
                    options: Some(vec!["X".into(), "Y".into(), "Z".into()]),
                    correct_answer: Some("Y".into()),
                    ..QuestionChanges::default()
                },
            )
            .await
            .unwrap();

        let fetched = f.questions.get(q.id).await.unwrap();
        assert_eq!(fetched, updated);
        assert_eq!(fetched.options, ["X", "Y", "Z"]);
        assert_eq!(fetched.correct_answer, "Y");
        assert_eq!(fetched.text, "Pick");
    }

    #[tokio::test]
    async fn update_checks_answer_against_current_options() {
        let f = fixture().await;
        let q = f
            .questions
            .create(f.quiz_id, question(f.category_id, "Pick", &["A", "B"], "A"))
            .await
            .unwrap();

        // New options that drop the stored answer.
        let err = f
            .questions
            .update(
                q.id,
                QuestionChanges {
                    options: Some(vec!["C".into(), "D".into()]),
                    ..QuestionChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        // New answer checked against the stored options.
        let err = f
            .questions
            .update(
                q.id,
                QuestionChanges {
                    correct_answer: Some("C".into()),
                    ..QuestionChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("one of the options"));

        assert_eq!(f.questions.get(q.id).await.unwrap(), q);
    }

    #[tokio::test]
    async fn update_clears_nullable_fields_and_reassigns_category() {
        let f = fixture().await;
        let other = CategoryService::new(f.questions.store.clone())
            .create(NewCategory {
                title: "Rivers".to_string(),
            })
            .await
            .unwrap();

        let mut input = question(f.category_id, "Longest river?", &["Nile", "Amazon"], "Nile");
        input.description = Some("Africa".to_string());
        input.explanation = Some("About 6650 km".to_string());
        let q = f.questions.create(f.quiz_id, input).await.unwrap();

        let updated = f
            .questions
            .update(
                q.id,
                QuestionChanges {
                    category_id: Some(other.id),
                    description: Some(None),
                    explanation: Some(Some("  ".to_string())),
                    difficulty: Some("hard".to_string()),
                    ..QuestionChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.category_id, other.id);
        assert_eq!(updated.category_title, "Rivers");
        assert_eq!(updated.description, None);
        assert_eq!(updated.explanation, None);
        assert_eq!(updated.difficulty, Difficulty::Hard);

        let err = f
            .questions
            .update(
                q.id,
                QuestionChanges {
                    category_id: Some(404),
                    ..QuestionChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn update_moves_question_to_another_quiz() {
        let f = fixture().await;
        let history = QuizService::new(f.questions.store.clone())
            .create(NewQuiz {
                title: "History".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let q = f
            .questions
            .create(
                f.quiz_id,
                question(f.category_id, "Year of Hastings?", &["1066", "1215"], "1066"),
            )
            .await
            .unwrap();

        let moved = f
            .questions
            .update(
                q.id,
                QuestionChanges {
                    quiz_id: Some(history.id),
                    ..QuestionChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(moved.quiz_id, history.id);
        assert_eq!(moved.quiz_title, "History");
        assert!(f.questions.list_for_quiz(f.quiz_id).await.unwrap().is_empty());
        assert_eq!(f.questions.list_for_quiz(history.id).await.unwrap(), [moved.clone()]);

        let err = f
            .questions
            .update(
                q.id,
                QuestionChanges {
                    quiz_id: Some(999),
                    ..QuestionChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "required objects not found: Quiz with id=999 not found"
        );
        assert_eq!(f.questions.get(q.id).await.unwrap(), moved);
    }

    #[tokio::test]
    async fn update_of_missing_question_is_not_found() {
        let f = fixture().await;

        let err = f
            .questions
            .update(
                12345,
                QuestionChanges {
                    text: Some("Anything".to_string()),
                    ..QuestionChanges::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Question with id=12345 not found");
        assert!(f.questions.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_update_leaves_question_unchanged() {
        let f = fixture().await;
        let q = f
            .questions
            .create(f.quiz_id, question(f.category_id, "Pick", &["A", "B"], "A"))
            .await
            .unwrap();

        let err = f
            .questions
            .update(
                q.id,
                QuestionChanges {
                    text: Some("t".repeat(501)),
                    ..QuestionChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("at most 500"));

        let err = f
            .questions
            .update(
                q.id,
                QuestionChanges {
                    options: Some(vec!["A".to_string()]),
                    ..QuestionChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().starts_with("options:"));

        assert_eq!(f.questions.get(q.id).await.unwrap(), q);
    }

    #[tokio::test]
    async fn check_answer_ignores_case_and_whitespace() {
        let f = fixture().await;
        let q = f
            .questions
            .create(f.quiz_id, question(f.category_id, "Ответ?", &["Да", "Нет"], "Да"))
            .await
            .unwrap();

        assert!(f.questions.check_answer(q.id, " Да ").await.unwrap());
        assert!(f.questions.check_answer(q.id, "да").await.unwrap());
        assert!(!f.questions.check_answer(q.id, "Нет").await.unwrap());
        assert_eq!(f.questions.get(q.id).await.unwrap(), q);

        let err = f.questions.check_answer(q.id + 1, "Да").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn search_matches_text_or_description() {
        let f = fixture().await;
        let mut with_description = question(f.category_id, "Which one?", &["A", "B"], "A");
        with_description.description = Some("About volcanoes".to_string());
        let first = f.questions.create(f.quiz_id, with_description).await.unwrap();
        let second = f
            .questions
            .create(
                f.quiz_id,
                question(f.category_id, "Biggest VOLCANO?", &["Etna", "Mauna Loa"], "Mauna Loa"),
            )
            .await
            .unwrap();
        f.questions
            .create(f.quiz_id, question(f.category_id, "Unrelated", &["A", "B"], "B"))
            .await
            .unwrap();

        let ids: Vec<_> = f
            .questions
            .search_by_text("volcano")
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, [first.id, second.id]);
        assert!(f.questions.search_by_text(" ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn random_pick_covers_more_than_one_question() {
        let f = fixture().await;
        for n in 0..5 {
            f.questions
                .create(
                    f.quiz_id,
                    question(f.category_id, &format!("Question {n}"), &["A", "B"], "A"),
                )
                .await
                .unwrap();
        }

        let mut seen = HashSet::new();
        for _ in 0..100 {
            let q = f.questions.random_question_from_quiz(f.quiz_id).await.unwrap();
            assert_eq!(q.quiz_id, f.quiz_id);
            seen.insert(q.id);
        }
        assert!(seen.len() > 1);
    }

    #[tokio::test]
    async fn random_pick_fails_on_empty_or_missing_quiz() {
        let f = fixture().await;

        let err = f
            .questions
            .random_question_from_quiz(f.quiz_id)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("no questions in quiz with id={}", f.quiz_id));

        let err = f.questions.random_question_from_quiz(77).await.unwrap_err();
        assert_eq!(err.to_string(), "Quiz with id=77 not found");
    }

    #[tokio::test]
    async fn list_for_quiz_requires_the_quiz() {
        let f = fixture().await;
        assert!(f.questions.list_for_quiz(f.quiz_id).await.unwrap().is_empty());

        let err = f.questions.list_for_quiz(5).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
