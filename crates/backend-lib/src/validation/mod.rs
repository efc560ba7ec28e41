// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation module.

use regex::Regex;
use std::sync::LazyLock;
use taskboard_common::TaskMutation;
use thiserror::Error;

use crate::error::AppError;

const MAX_TASK_ID_LENGTH: usize = 64;
const MAX_NAME_LENGTH: usize = 200;
const MAX_NOTES_LENGTH: usize = 10_000;

// Task ids double as file names for the file backend
static TASK_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid task id: {0}")]
    InvalidTaskId(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid notes: {0}")]
    InvalidNotes(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Validate a task id
pub fn validate_task_id(id: &str) -> ValidationResult<&str> {
    if id.is_empty() {
        return Err(ValidationError::InvalidTaskId(
            "Task id must not be empty".to_string(),
        ));
    }

    if id.len() > MAX_TASK_ID_LENGTH {
        return Err(ValidationError::InvalidTaskId(format!(
            "Task id cannot exceed {MAX_TASK_ID_LENGTH} characters"
        )));
    }

    if !TASK_ID_REGEX.is_match(id) {
        return Err(ValidationError::InvalidTaskId(
            "Task id must contain only letters, digits, hyphens and underscores".to_string(),
        ));
    }

    Ok(id)
}

/// Validate the fields of a task mutation
pub fn validate_mutation(values: &TaskMutation) -> ValidationResult<()> {
    if let Some(id) = &values.id {
        validate_task_id(id)?;
    }

    if let Some(name) = &values.name {
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::InvalidName(format!(
                "Name cannot exceed {MAX_NAME_LENGTH} characters"
            )));
        }
    }

    if let Some(notes) = &values.notes {
        if notes.chars().count() > MAX_NOTES_LENGTH {
            return Err(ValidationError::InvalidNotes(format!(
                "Notes cannot exceed {MAX_NOTES_LENGTH} characters"
            )));
        }
    }

    Ok(())
}

/// Reduce a requested post-login destination to a same-site path.
/// Anything that is not a plain absolute path becomes `/`.
pub fn sanitize_return_to(return_to: Option<&str>) -> String {
    match return_to {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        },
        _ => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_task_id() {
        assert!(validate_task_id("1").is_ok());
        assert!(validate_task_id("k3j9x0a").is_ok());
        assert!(validate_task_id("my_task-2").is_ok());

        assert!(validate_task_id("").is_err());
        assert!(validate_task_id("../etc").is_err());
        assert!(validate_task_id("a b").is_err());
        assert!(validate_task_id(&"a".repeat(MAX_TASK_ID_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_mutation() {
        assert!(validate_mutation(&TaskMutation::default()).is_ok());

        let long_name = TaskMutation {
            name: Some("n".repeat(MAX_NAME_LENGTH + 1)),
            ..Default::default()
        };
        assert!(matches!(
            validate_mutation(&long_name),
            Err(ValidationError::InvalidName(_))
        ));

        let long_notes = TaskMutation {
            notes: Some("n".repeat(MAX_NOTES_LENGTH + 1)),
            ..Default::default()
        };
        assert!(matches!(
            validate_mutation(&long_notes),
            Err(ValidationError::InvalidNotes(_))
        ));

        let bad_id = TaskMutation {
            id: Some("a/b".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_mutation(&bad_id),
            Err(ValidationError::InvalidTaskId(_))
        ));

        // multi-byte characters count once
        let accents = TaskMutation {
            name: Some("é".repeat(MAX_NAME_LENGTH)),
            ..Default::default()
        };
        assert!(validate_mutation(&accents).is_ok());
    }

    #[test]
    fn test_sanitize_return_to() {
        assert_eq!(sanitize_return_to(None), "/");
        assert_eq!(sanitize_return_to(Some("/tasks/1")), "/tasks/1");
        assert_eq!(sanitize_return_to(Some("/?q=ada")), "/?q=ada");

        assert_eq!(sanitize_return_to(Some("")), "/");
        assert_eq!(sanitize_return_to(Some("tasks")), "/");
        assert_eq!(sanitize_return_to(Some("//evil.example")), "/");
        assert_eq!(sanitize_return_to(Some("https://evil.example")), "/");
        assert_eq!(sanitize_return_to(Some("/\\evil.example")), "/");
        assert_eq!(sanitize_return_to(Some("/a\r\nSet-Cookie: x")), "/");
    }

    #[test]
    fn test_validation_error_into_app_error() {
        let err: AppError = ValidationError::InvalidName("too long".to_string()).into();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
