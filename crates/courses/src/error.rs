use thiserror::Error;
use tutorhub_database::CourseError;

use crate::blob_store::BlobError;

#[derive(Debug, Error)]
pub enum CourseServiceError {
    #[error("course not found")]
    CourseNotFound,
    #[error("file not found")]
    FileNotFound,
    #[error("course already exists")]
    CourseExists,
    #[error("access to this course is not allowed")]
    Forbidden,
    #[error("{0}")]
    InvalidInput(String),
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("blob storage error: {0}")]
    Storage(#[from] BlobError),
    #[error("course repository error: {0}")]
    Repository(CourseError),
}

impl From<CourseError> for CourseServiceError {
    fn from(err: CourseError) -> Self {
        match err {
            CourseError::CourseNotFound => CourseServiceError::CourseNotFound,
            CourseError::FileNotFound => CourseServiceError::FileNotFound,
            CourseError::CourseAlreadyExists => CourseServiceError::CourseExists,
            CourseError::InvalidCourse(message) => CourseServiceError::InvalidInput(message),
            other => CourseServiceError::Repository(other),
        }
    }
}

pub type CourseServiceResult<T> = Result<T, CourseServiceError>;
