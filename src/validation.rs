// src/validation.rs

//! Field-level rules shared by the services. Every rule is a pure function:
//! it either returns the normalized (trimmed) value or a [`RuleViolation`]
//! naming the offending field.

use std::collections::HashSet;

use thiserror::Error;

use crate::models::question::Difficulty;

pub const CATEGORY_TITLE_MAX: usize = 100;
pub const QUIZ_TITLE_MAX: usize = 200;
pub const QUIZ_DESCRIPTION_MAX: usize = 500;
pub const QUESTION_TEXT_MAX: usize = 500;
pub const QUESTION_DESCRIPTION_MAX: usize = 500;
pub const EXPLANATION_MAX: usize = 250;
pub const OPTION_MAX: usize = 500;
pub const MIN_OPTIONS: usize = 2;

/// A single field failing a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct RuleViolation {
    pub field: &'static str,
    pub reason: String,
}

impl RuleViolation {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

pub type RuleResult<T> = Result<T, RuleViolation>;

/// Trims `value` and checks it is non-empty and at most `max` characters.
pub fn required_text(field: &'static str, value: &str, max: usize) -> RuleResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RuleViolation::new(field, format!("{field} must not be empty")));
    }
    check_length(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

/// Trims an optional value; blank collapses to `None`.
pub fn optional_text(field: &'static str, value: Option<&str>, max: usize) -> RuleResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            check_length(field, trimmed, max)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

fn check_length(field: &'static str, value: &str, max: usize) -> RuleResult<()> {
    if value.chars().count() > max {
        return Err(RuleViolation::new(
            field,
            format!("{field} must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub fn category_title(value: &str) -> RuleResult<String> {
    required_text("title", value, CATEGORY_TITLE_MAX)
}

pub fn quiz_title(value: &str) -> RuleResult<String> {
    required_text("title", value, QUIZ_TITLE_MAX)
}

pub fn quiz_description(value: Option<&str>) -> RuleResult<Option<String>> {
    optional_text("description", value, QUIZ_DESCRIPTION_MAX)
}

pub fn question_text(value: &str) -> RuleResult<String> {
    required_text("text", value, QUESTION_TEXT_MAX)
}

pub fn question_description(value: Option<&str>) -> RuleResult<Option<String>> {
    optional_text("description", value, QUESTION_DESCRIPTION_MAX)
}

pub fn explanation(value: Option<&str>) -> RuleResult<Option<String>> {
    optional_text("explanation", value, EXPLANATION_MAX)
}

/// At least [`MIN_OPTIONS`] non-blank, pairwise distinct options.
pub fn options(options: &[String]) -> RuleResult<()> {
    if options.len() < MIN_OPTIONS {
        return Err(RuleViolation::new(
            "options",
            format!("at least {MIN_OPTIONS} answer options are required"),
        ));
    }

    let mut seen = HashSet::with_capacity(options.len());
    for option in options {
        if option.trim().is_empty() {
            return Err(RuleViolation::new("options", "options must not be blank"));
        }
        if option.chars().count() > OPTION_MAX {
            return Err(RuleViolation::new(
                "options",
                format!("each option must be at most {OPTION_MAX} characters"),
            ));
        }
        if !seen.insert(option.as_str()) {
            return Err(RuleViolation::new(
                "options",
                format!("duplicate option \"{option}\""),
            ));
        }
    }
    Ok(())
}

pub fn correct_answer(value: &str) -> RuleResult<()> {
    if value.trim().is_empty() {
        return Err(RuleViolation::new("correct_answer", "correct answer is required"));
    }
    Ok(())
}

pub fn answer_in_options(answer: &str, options: &[String]) -> RuleResult<()> {
    if !options.iter().any(|option| option == answer) {
        return Err(RuleViolation::new(
            "correct_answer",
            "correct answer must be one of the options",
        ));
    }
    Ok(())
}

pub fn difficulty(value: &str) -> RuleResult<Difficulty> {
    value.parse().map_err(|_| {
        let valid: Vec<&str> = Difficulty::ALL.iter().map(|d| d.as_str()).collect();
        RuleViolation::new(
            "difficulty",
            format!("difficulty must be one of: {}", valid.join(", ")),
        )
    })
}

/// Answer comparison used by answer checking: surrounding whitespace and
/// letter case are ignored.
pub fn answers_match(expected: &str, given: &str) -> bool {
    expected.trim().to_lowercase() == given.trim().to_lowercase()
}

/// `validator` hook for request DTOs whose field must carry some text.
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("must_not_be_blank"));
    }
    Ok(())
}
