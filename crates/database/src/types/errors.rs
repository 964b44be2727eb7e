//! Error types for the database layer

use thiserror::Error;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database query error: {0}")]
    QueryError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),
}

/// User-specific database errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserError {
    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("User is not pending approval")]
    NotPending,

    #[error("User is still pending approval")]
    StillPending,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Course-specific database errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CourseError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("Course already exists")]
    CourseAlreadyExists,

    #[error("File not found")]
    FileNotFound,

    #[error("File already exists")]
    FileAlreadyExists,

    #[error("Invalid course: {0}")]
    InvalidCourse(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Waitlist-specific database errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WaitlistError {
    #[error("Waitlist entry not found")]
    EntryNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            return UserError::EmailAlreadyExists;
        }
        UserError::DatabaseError(err.to_string())
    }
}

impl From<sqlx::Error> for CourseError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            return CourseError::FileAlreadyExists;
        }
        CourseError::DatabaseError(err.to_string())
    }
}

impl From<sqlx::Error> for WaitlistError {
    fn from(err: sqlx::Error) -> Self {
        WaitlistError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for UserError {
    fn from(err: serde_json::Error) -> Self {
        UserError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for CourseError {
    fn from(err: serde_json::Error) -> Self {
        CourseError::SerializationError(err.to_string())
    }
}
